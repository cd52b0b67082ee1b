//! Execution modes, per-unit outputs and run results.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};

use super::AssignedWorker;

/// Which representation of a ready plan an execution run drives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Dependency-gated steps, in the order the workflow lists them
    Workflow,
    /// Independent tasks, in list order
    TaskDecomposition,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Workflow => "workflow",
            ExecutionMode::TaskDecomposition => "task_decomposition",
        }
    }

    /// Parses a caller-supplied mode name.
    ///
    /// # Errors
    ///
    /// Returns `CollabError::Validation` for anything other than
    /// `workflow` or `task_decomposition`.
    pub fn parse(value: &str) -> crate::Result<Self> {
        value
            .parse()
            .map_err(|reason: String| crate::CollabError::validation("mode").with_reason(reason))
    }

    /// Name of one execution unit in this mode.
    pub fn unit_label(&self) -> &'static str {
        match self {
            ExecutionMode::Workflow => "step",
            ExecutionMode::TaskDecomposition => "task",
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "workflow" => Ok(ExecutionMode::Workflow),
            "task_decomposition" | "task-decomposition" => Ok(ExecutionMode::TaskDecomposition),
            _ => Err(format!("Unsupported execution mode: {s}")),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a worker produced for one task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutput {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

impl TaskOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tokens_used: None,
        }
    }
}

/// Output of one completed step or task, keyed by its id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnitResult {
    pub unit_id: String,
    /// Task title; absent for workflow steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub worker: AssignedWorker,
    pub output: TaskOutput,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deliverables: Vec<String>,
}

/// Result of a run in which every unit succeeded.
///
/// The unit fields serialize under the mode's own names: `totalSteps`,
/// `completedSteps` and `stepResults` for workflow runs, `totalTasks`,
/// `completedTasks` and `taskResults` for task runs. Either set is read back.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub execution_mode: ExecutionMode,
    #[serde(alias = "totalSteps", alias = "totalTasks")]
    pub total_units: usize,
    #[serde(alias = "completedSteps", alias = "completedTasks")]
    pub completed_units: usize,
    /// In execution order
    #[serde(alias = "stepResults", alias = "taskResults")]
    pub unit_results: Vec<UnitResult>,
    /// Human-readable aggregation of every unit's output
    pub summary: String,
    pub completed_at: Timestamp,
}

impl ExecutionResult {
    pub fn result_for(&self, unit_id: &str) -> Option<&UnitResult> {
        self.unit_results.iter().find(|r| r.unit_id == unit_id)
    }

    pub fn is_complete(&self) -> bool {
        self.completed_units == self.total_units
    }
}

impl Serialize for ExecutionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (total, completed, results) = match self.execution_mode {
            ExecutionMode::Workflow => ("totalSteps", "completedSteps", "stepResults"),
            ExecutionMode::TaskDecomposition => ("totalTasks", "completedTasks", "taskResults"),
        };

        let mut state = serializer.serialize_struct("ExecutionResult", 6)?;
        state.serialize_field("executionMode", &self.execution_mode)?;
        state.serialize_field(total, &self.total_units)?;
        state.serialize_field(completed, &self.completed_units)?;
        state.serialize_field(results, &self.unit_results)?;
        state.serialize_field("summary", &self.summary)?;
        state.serialize_field("completedAt", &self.completed_at)?;
        state.end()
    }
}

/// Terminal record of the last execution run of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ExecutionOutcome {
    Completed(ExecutionResult),
    Failed {
        error: String,
        #[serde(rename = "failedAt")]
        failed_at: Timestamp,
    },
}

impl ExecutionOutcome {
    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            ExecutionOutcome::Completed(result) => Some(result),
            ExecutionOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExecutionOutcome::Completed(_) => None,
            ExecutionOutcome::Failed { error, .. } => Some(error),
        }
    }
}
