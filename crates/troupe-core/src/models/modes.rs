//! The three collaboration modes generated for a ready plan.
//!
//! Field names accept both the `worker*` spelling used by this crate and the
//! `agent*` spelling common in generator replies.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{lenient_count, null_as_default, Level};
use crate::error::ReplyError;

/// A worker picked by the role recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPick {
    #[serde(alias = "agentId")]
    pub worker_id: String,
    #[serde(alias = "agentName", default, deserialize_with = "null_as_default")]
    pub worker_name: String,
    #[serde(alias = "agentType", default, deserialize_with = "null_as_default")]
    pub worker_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
}

/// Which workers to involve, with rationale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecommendation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended: Vec<WorkerPick>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub optional: Vec<WorkerPick>,
}

/// One step of the workflow representation, as generated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub step_id: String,
    #[serde(alias = "agentId", alias = "workerId")]
    pub worker_ref: String,
    #[serde(alias = "agentName", default, deserialize_with = "null_as_default")]
    pub worker_name: String,
    #[serde(alias = "agentType", default, deserialize_with = "null_as_default")]
    pub worker_type: String,
    pub task: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: Vec<String>,
    /// Seconds
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_duration: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl StepDefinition {
    /// Returns every missing required field.
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.step_id.trim().is_empty() {
            violations.push("step id must not be empty".to_string());
        }
        if self.worker_ref.trim().is_empty() {
            violations.push("worker reference must not be empty".to_string());
        }
        if self.task.trim().is_empty() {
            violations.push("task must not be empty".to_string());
        }
        violations
    }
}

/// Ordered steps with dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOrchestration {
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<StepDefinition>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_estimated_duration: Option<u64>,
    /// Step ids the generator considers independent. Informational only;
    /// execution stays sequential.
    #[serde(default, deserialize_with = "null_as_default")]
    pub parallelizable: Vec<String>,
}

impl WorkflowOrchestration {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Worker a decomposed task is assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignedWorker {
    #[serde(alias = "agentId")]
    pub worker_id: String,
    #[serde(alias = "agentName", default, deserialize_with = "null_as_default")]
    pub worker_name: String,
    #[serde(alias = "agentType", default, deserialize_with = "null_as_default")]
    pub worker_type: String,
}

/// One independent task of the decomposition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MainTask {
    pub task_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(alias = "assignedAgent")]
    pub assigned_worker: AssignedWorker,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtasks: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deliverables: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_duration: Option<u64>,
}

impl MainTask {
    /// Title, description and subtask bullets folded into one instruction.
    pub fn instruction(&self) -> String {
        let mut text = self.title.clone();
        if !self.description.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.description);
        }
        if !self.subtasks.is_empty() {
            text.push_str("\n\nSubtasks:");
            for subtask in &self.subtasks {
                text.push_str("\n- ");
                text.push_str(subtask);
            }
        }
        text
    }
}

/// Independent tasks with assigned workers and deliverables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskDecomposition {
    #[serde(default, deserialize_with = "null_as_default")]
    pub main_tasks: Vec<MainTask>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_tasks: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub critical_path: Vec<String>,
}

impl TaskDecomposition {
    pub fn is_empty(&self) -> bool {
        self.main_tasks.is_empty()
    }
}

/// Informational extras returned alongside the modes. Not subject to any
/// plan invariant and never stored on the plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Level>,
    #[serde(
        default,
        deserialize_with = "lenient_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_total_time: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk_factors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub success_metrics: Vec<String>,
}

/// All three representations plus metadata, as parsed from one generator reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationModes {
    pub role_recommendation: RoleRecommendation,
    pub workflow_orchestration: WorkflowOrchestration,
    pub task_decomposition: TaskDecomposition,
    #[serde(default)]
    pub metadata: ModeMetadata,
}

const ROLE_RECOMMENDATION: &str = "roleRecommendation";
const WORKFLOW_ORCHESTRATION: &str = "workflowOrchestration";
const TASK_DECOMPOSITION: &str = "taskDecomposition";

impl CollaborationModes {
    /// Builds the modes from a parsed generator reply.
    ///
    /// All three representations must be present. An empty workflow step list
    /// is accepted here; it is refused when execution starts.
    pub fn from_reply(reply: &Value) -> Result<Self, ReplyError> {
        let present = |key: &str| reply.get(key).is_some_and(|value| !value.is_null());

        let missing: Vec<&'static str> = [ROLE_RECOMMENDATION, WORKFLOW_ORCHESTRATION, TASK_DECOMPOSITION]
            .into_iter()
            .filter(|key| !present(key))
            .collect();
        if !missing.is_empty() {
            return Err(ReplyError::MissingModes { missing });
        }

        let role_recommendation: RoleRecommendation = parse_mode(reply, ROLE_RECOMMENDATION)?;
        let workflow_orchestration: WorkflowOrchestration = parse_mode(reply, WORKFLOW_ORCHESTRATION)?;
        let task_decomposition: TaskDecomposition = parse_mode(reply, TASK_DECOMPOSITION)?;

        for step in &workflow_orchestration.steps {
            let violations = step.validate();
            if !violations.is_empty() {
                return Err(ReplyError::MalformedMode {
                    mode: WORKFLOW_ORCHESTRATION,
                    reason: format!("step '{}': {}", step.step_id, violations.join(", ")),
                });
            }
        }

        let metadata = match reply.get("metadata") {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone())
                .unwrap_or_else(|e| {
                    log::debug!("Ignoring malformed mode metadata: {e}");
                    ModeMetadata::default()
                }),
            _ => ModeMetadata::default(),
        };

        Ok(Self {
            role_recommendation,
            workflow_orchestration,
            task_decomposition,
            metadata,
        })
    }
}

fn parse_mode<T: DeserializeOwned>(reply: &Value, key: &'static str) -> Result<T, ReplyError> {
    let value = reply.get(key).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| ReplyError::MalformedMode {
        mode: key,
        reason: e.to_string(),
    })
}
