//! The collaboration plan aggregate and its state machine.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{
    CapabilityAnalysis, ExecutionMode, ExecutionOutcome, ExecutionResult, PlanStatus,
    PlanSummary, RoleRecommendation, TaskDecomposition, WorkflowOrchestration,
};
use crate::error::{CollabError, PreconditionFailure, Result};

/// Minimum goal length, in characters, after trimming.
pub const MIN_GOAL_CHARS: usize = 10;

/// One entry of the append-only adjustment audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRecord {
    /// Plan version this adjustment produced
    pub version: u32,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_suggestion: Option<Value>,
}

/// A user goal together with everything derived from it: the capability
/// analysis, the three collaboration modes and the outcome of the last run.
///
/// Fields are private; every state change goes through a method that checks
/// the current status first and refuses with a [`PreconditionFailure`]
/// otherwise.
///
/// ```text
/// DRAFT ──analysis──▶ READY ──start──▶ EXECUTING ──▶ COMPLETED
///   ▲                   │                   │
///   └──insufficient─────┘                   └──────▶ FAILED
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationPlan {
    id: String,
    user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    goal: String,
    #[serde(default)]
    status: PlanStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
    #[serde(default)]
    capability_analysis: Option<CapabilityAnalysis>,
    #[serde(default)]
    role_recommendation: Option<RoleRecommendation>,
    #[serde(default)]
    workflow_orchestration: Option<WorkflowOrchestration>,
    #[serde(default)]
    task_decomposition: Option<TaskDecomposition>,
    #[serde(default, rename = "executionResult")]
    execution: Option<ExecutionOutcome>,
    version: u32,
    #[serde(default)]
    adjustment_history: Vec<AdjustmentRecord>,
}

impl CollaborationPlan {
    /// Creates a new DRAFT plan with a fresh id.
    ///
    /// The goal is trimmed and must be at least `min_goal_chars` characters
    /// long; the user id must not be blank.
    pub fn create(
        user_id: impl Into<String>,
        goal: &str,
        project_id: Option<String>,
        min_goal_chars: usize,
    ) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(CollabError::validation("user_id").with_reason("must not be empty"));
        }

        let goal = goal.trim();
        if goal.chars().count() < min_goal_chars {
            return Err(CollabError::validation("goal").with_reason(format!(
                "must be at least {min_goal_chars} characters"
            )));
        }

        let now = Timestamp::now();
        Ok(Self {
            id: format!("collab_{}", Uuid::new_v4().simple()),
            user_id,
            project_id: project_id.filter(|p| !p.trim().is_empty()),
            goal: goal.to_string(),
            status: PlanStatus::Draft,
            created_at: now,
            updated_at: now,
            capability_analysis: None,
            role_recommendation: None,
            workflow_orchestration: None,
            task_decomposition: None,
            execution: None,
            version: 1,
            adjustment_history: Vec::new(),
        })
    }

    /// Returns every structural problem with this plan.
    pub fn validate(&self, min_goal_chars: usize) -> Vec<String> {
        let mut violations = Vec::new();
        if self.id.trim().is_empty() {
            violations.push("plan id must not be empty".to_string());
        }
        if self.user_id.trim().is_empty() {
            violations.push("user id must not be empty".to_string());
        }
        if self.goal.trim().chars().count() < min_goal_chars {
            violations.push(format!("goal must be at least {min_goal_chars} characters"));
        }
        if self.version == 0 {
            violations.push("version must start at 1".to_string());
        }
        violations
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn status(&self) -> PlanStatus {
        self.status
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn capability_analysis(&self) -> Option<&CapabilityAnalysis> {
        self.capability_analysis.as_ref()
    }

    pub fn role_recommendation(&self) -> Option<&RoleRecommendation> {
        self.role_recommendation.as_ref()
    }

    pub fn workflow_orchestration(&self) -> Option<&WorkflowOrchestration> {
        self.workflow_orchestration.as_ref()
    }

    pub fn task_decomposition(&self) -> Option<&TaskDecomposition> {
        self.task_decomposition.as_ref()
    }

    /// Outcome of the last execution run, if any.
    pub fn execution(&self) -> Option<&ExecutionOutcome> {
        self.execution.as_ref()
    }

    pub fn execution_result(&self) -> Option<&ExecutionResult> {
        self.execution.as_ref().and_then(ExecutionOutcome::result)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn adjustment_history(&self) -> &[AdjustmentRecord] {
        &self.adjustment_history
    }

    /// Checks that a capability analysis may be attached right now.
    pub fn ensure_can_analyze(&self) -> std::result::Result<(), PreconditionFailure> {
        match self.status {
            PlanStatus::Draft | PlanStatus::Analyzing => Ok(()),
            status => Err(PreconditionFailure::InvalidTransition {
                operation: "attach a capability analysis",
                status,
            }),
        }
    }

    /// Replaces the analysis. The plan becomes READY when the roster is
    /// sufficient and returns to DRAFT otherwise.
    pub fn set_capability_analysis(
        &mut self,
        analysis: CapabilityAnalysis,
    ) -> std::result::Result<(), PreconditionFailure> {
        self.ensure_can_analyze()?;
        self.status = if analysis.is_sufficient {
            PlanStatus::Ready
        } else {
            PlanStatus::Draft
        };
        self.capability_analysis = Some(analysis);
        self.touch();
        Ok(())
    }

    /// Checks that modes may be generated, distinguishing a missing analysis
    /// from an insufficient one.
    pub fn ensure_can_generate_modes(&self) -> std::result::Result<(), PreconditionFailure> {
        match &self.capability_analysis {
            None => Err(PreconditionFailure::AnalysisMissing),
            Some(analysis) if !analysis.is_sufficient => {
                Err(PreconditionFailure::CapabilityInsufficient)
            }
            Some(_) if self.status != PlanStatus::Ready => {
                Err(PreconditionFailure::InvalidTransition {
                    operation: "generate collaboration modes",
                    status: self.status,
                })
            }
            Some(_) => Ok(()),
        }
    }

    /// Stores the three representations. Status is unchanged.
    pub fn set_collaboration_modes(
        &mut self,
        role_recommendation: RoleRecommendation,
        workflow_orchestration: WorkflowOrchestration,
        task_decomposition: TaskDecomposition,
    ) -> std::result::Result<(), PreconditionFailure> {
        if self.status != PlanStatus::Ready {
            return Err(PreconditionFailure::InvalidTransition {
                operation: "set collaboration modes",
                status: self.status,
            });
        }
        self.role_recommendation = Some(role_recommendation);
        self.workflow_orchestration = Some(workflow_orchestration);
        self.task_decomposition = Some(task_decomposition);
        self.touch();
        Ok(())
    }

    /// Moves a READY plan to EXECUTING. The representation the run will
    /// drive must be defined and non-empty.
    pub fn start_execution(
        &mut self,
        mode: ExecutionMode,
    ) -> std::result::Result<(), PreconditionFailure> {
        if self.status != PlanStatus::Ready {
            return Err(PreconditionFailure::InvalidTransition {
                operation: "start execution",
                status: self.status,
            });
        }
        match mode {
            ExecutionMode::Workflow => {
                if self.workflow_orchestration.as_ref().map_or(true, WorkflowOrchestration::is_empty) {
                    return Err(PreconditionFailure::WorkflowEmpty);
                }
            }
            ExecutionMode::TaskDecomposition => {
                if self.task_decomposition.as_ref().map_or(true, TaskDecomposition::is_empty) {
                    return Err(PreconditionFailure::TaskDecompositionEmpty);
                }
            }
        }
        self.status = PlanStatus::Executing;
        self.touch();
        Ok(())
    }

    /// Records a successful run and moves the plan to COMPLETED. Returns the
    /// completion timestamp stamped onto the stored result.
    pub fn complete_execution(
        &mut self,
        mut result: ExecutionResult,
    ) -> std::result::Result<Timestamp, PreconditionFailure> {
        if self.status != PlanStatus::Executing {
            return Err(PreconditionFailure::InvalidTransition {
                operation: "complete execution",
                status: self.status,
            });
        }
        let now = Timestamp::now();
        result.completed_at = now;
        self.execution = Some(ExecutionOutcome::Completed(result));
        self.status = PlanStatus::Completed;
        self.updated_at = now;
        Ok(now)
    }

    /// Records a failed run and moves the plan to FAILED.
    pub fn fail_execution(
        &mut self,
        error: impl Into<String>,
    ) -> std::result::Result<(), PreconditionFailure> {
        if self.status.is_terminal() {
            return Err(PreconditionFailure::InvalidTransition {
                operation: "fail execution",
                status: self.status,
            });
        }
        self.execution = Some(ExecutionOutcome::Failed {
            error: error.into(),
            failed_at: Timestamp::now(),
        });
        self.status = PlanStatus::Failed;
        self.touch();
        Ok(())
    }

    /// Bumps the version and appends an audit entry. Returns the new version.
    pub fn record_adjustment(
        &mut self,
        kind: impl Into<String>,
        data: Value,
        ai_suggestion: Option<Value>,
    ) -> u32 {
        self.version += 1;
        let now = Timestamp::now();
        self.adjustment_history.push(AdjustmentRecord {
            version: self.version,
            timestamp: now,
            kind: kind.into(),
            data,
            ai_suggestion,
        });
        self.updated_at = now;
        self.version
    }

    /// True when the plan is READY with at least one workflow step.
    pub fn can_execute(&self) -> bool {
        self.status == PlanStatus::Ready
            && self
                .workflow_orchestration
                .as_ref()
                .is_some_and(|workflow| !workflow.is_empty())
    }

    pub fn is_completed(&self) -> bool {
        self.status == PlanStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == PlanStatus::Failed
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary::from(self)
    }

    /// Serializes the full detail representation.
    pub fn to_detail_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuilds a plan from its detail representation.
    pub fn from_detail_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
