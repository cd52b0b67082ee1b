//! Plan summary types and functionality.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{CollaborationPlan, PlanStatus};

/// Summary information about a collaboration plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    /// Plan ID
    pub id: String,
    /// Owner of the plan
    pub user_id: String,
    /// Project the plan was scoped to, if any
    pub project_id: Option<String>,
    /// Trimmed goal text
    pub goal: String,
    /// Plan status
    pub status: PlanStatus,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Last update timestamp
    pub updated_at: Timestamp,
    /// Number of workflow steps, zero before modes are generated
    pub workflow_steps: u32,
    /// Number of decomposed tasks, zero before modes are generated
    pub decomposed_tasks: u32,
}

impl From<&CollaborationPlan> for PlanSummary {
    fn from(plan: &CollaborationPlan) -> Self {
        let workflow_steps = plan
            .workflow_orchestration()
            .map_or(0, |workflow| workflow.steps.len() as u32);
        let decomposed_tasks = plan
            .task_decomposition()
            .map_or(0, |tasks| tasks.main_tasks.len() as u32);

        Self {
            id: plan.id().to_string(),
            user_id: plan.user_id().to_string(),
            project_id: plan.project_id().map(str::to_string),
            goal: plan.goal().to_string(),
            status: plan.status(),
            created_at: plan.created_at(),
            updated_at: plan.updated_at(),
            workflow_steps,
            decomposed_tasks,
        }
    }
}
