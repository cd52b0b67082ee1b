//! Per-step execution state for one workflow run.

use std::collections::HashSet;

use jiff::Timestamp;

use super::{StepDefinition, StepStatus, TaskOutput};
use crate::error::ExecutionError;

/// Where a step is in its lifecycle. Each state carries only what is known
/// in that state, so a completed step always has a result and a failed step
/// always has an error.
#[derive(Debug, Clone, PartialEq)]
pub enum StepState {
    Pending,
    Running {
        started_at: Timestamp,
    },
    Completed {
        started_at: Option<Timestamp>,
        completed_at: Timestamp,
        result: TaskOutput,
    },
    Failed {
        started_at: Option<Timestamp>,
        completed_at: Timestamp,
        error: String,
    },
}

impl StepState {
    pub fn status(&self) -> StepStatus {
        match self {
            StepState::Pending => StepStatus::Pending,
            StepState::Running { .. } => StepStatus::Running,
            StepState::Completed { .. } => StepStatus::Completed,
            StepState::Failed { .. } => StepStatus::Failed,
        }
    }

    fn started_at(&self) -> Option<Timestamp> {
        match self {
            StepState::Pending => None,
            StepState::Running { started_at } => Some(*started_at),
            StepState::Completed { started_at, .. } | StepState::Failed { started_at, .. } => {
                *started_at
            }
        }
    }
}

/// One unit of work inside a workflow run.
///
/// Steps are rebuilt from the plan's workflow representation at the start of
/// every run and are never stored. Transitions return a new step and leave
/// the original untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowStep {
    definition: StepDefinition,
    state: StepState,
}

impl WorkflowStep {
    /// Creates a pending step, rejecting definitions with missing fields.
    pub fn from_definition(definition: StepDefinition) -> Result<Self, ExecutionError> {
        let violations = definition.validate();
        if !violations.is_empty() {
            return Err(ExecutionError::InvalidStep {
                step_id: definition.step_id,
                violations,
            });
        }
        Ok(Self {
            definition,
            state: StepState::Pending,
        })
    }

    pub fn definition(&self) -> &StepDefinition {
        &self.definition
    }

    pub fn step_id(&self) -> &str {
        &self.definition.step_id
    }

    pub fn worker_ref(&self) -> &str {
        &self.definition.worker_ref
    }

    /// Display name of the worker, falling back to its reference.
    pub fn worker_name(&self) -> &str {
        if self.definition.worker_name.is_empty() {
            &self.definition.worker_ref
        } else {
            &self.definition.worker_name
        }
    }

    pub fn task(&self) -> &str {
        &self.definition.task
    }

    pub fn context(&self) -> Option<&str> {
        self.definition.context.as_deref()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.definition.dependencies
    }

    pub fn state(&self) -> &StepState {
        &self.state
    }

    pub fn status(&self) -> StepStatus {
        self.state.status()
    }

    pub fn is_pending(&self) -> bool {
        self.status() == StepStatus::Pending
    }

    pub fn is_running(&self) -> bool {
        self.status() == StepStatus::Running
    }

    pub fn is_completed(&self) -> bool {
        self.status() == StepStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status() == StepStatus::Failed
    }

    pub fn result(&self) -> Option<&TaskOutput> {
        match &self.state {
            StepState::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            StepState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn mark_as_running(&self) -> Self {
        self.with_state(StepState::Running {
            started_at: Timestamp::now(),
        })
    }

    pub fn mark_as_completed(&self, result: TaskOutput) -> Self {
        self.with_state(StepState::Completed {
            started_at: self.state.started_at(),
            completed_at: Timestamp::now(),
            result,
        })
    }

    pub fn mark_as_failed(&self, error: impl Into<String>) -> Self {
        self.with_state(StepState::Failed {
            started_at: self.state.started_at(),
            completed_at: Timestamp::now(),
            error: error.into(),
        })
    }

    /// True when every dependency is in `completed`. Vacuously true for a
    /// step without dependencies.
    pub fn are_dependencies_met(&self, completed: &HashSet<String>) -> bool {
        self.dependencies().iter().all(|dep| completed.contains(dep))
    }

    /// Dependencies not yet in `completed`, in declaration order.
    pub fn unmet_dependencies(&self, completed: &HashSet<String>) -> Vec<String> {
        self.dependencies()
            .iter()
            .filter(|dep| !completed.contains(*dep))
            .cloned()
            .collect()
    }

    /// Whole seconds between start and completion, if both are known.
    pub fn actual_duration(&self) -> Option<i64> {
        match &self.state {
            StepState::Completed {
                started_at: Some(started_at),
                completed_at,
                ..
            }
            | StepState::Failed {
                started_at: Some(started_at),
                completed_at,
                ..
            } => Some(completed_at.duration_since(*started_at).as_secs()),
            _ => None,
        }
    }

    fn with_state(&self, state: StepState) -> Self {
        Self {
            definition: self.definition.clone(),
            state,
        }
    }
}
