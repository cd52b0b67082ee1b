//! Interfaces to the collaborators the engine drives but does not own.
//!
//! The engine never retries, times out or rate-limits these calls. Each
//! implementation owns its own policy and must report a definitive success
//! or failure.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    error::{CollabError, ExecutionError},
    models::{TaskOutput, Worker},
};

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Tunables passed through to a reasoning call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningOptions {
    pub max_output_tokens: u32,
    pub temperature: f32,
    /// Retry budget the client may spend before reporting failure
    pub retry_count: u32,
    /// `None` leaves timing entirely to the client
    pub timeout: Option<Duration>,
}

impl Default for ReasoningOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: 1500,
            temperature: 0.5,
            retry_count: 3,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningRequest {
    pub prompt: String,
    pub system_role: Option<String>,
    pub options: ReasoningOptions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningReply {
    pub text: String,
    pub model_id: String,
    pub token_usage: TokenUsage,
}

/// A language-model-style oracle answering one prompt at a time.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningReply, CollaboratorError>;
}

/// Read access to the worker roster.
#[async_trait]
pub trait WorkerRoster: Send + Sync {
    /// Every worker the user has, in any status.
    async fn list_workers(&self, user_id: &str) -> Result<Vec<Worker>, CollaboratorError>;

    async fn worker(&self, user_id: &str, worker_id: &str) -> Result<Option<Worker>, CollaboratorError>;

    /// Workers free to take on new work.
    async fn available_workers(&self, user_id: &str) -> Result<Vec<Worker>, CollaboratorError> {
        let workers = self.list_workers(user_id).await?;
        Ok(workers.into_iter().filter(Worker::can_accept_task).collect())
    }
}

/// Outcome of handing one task to one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskAssignment {
    pub success: bool,
    pub result: Option<TaskOutput>,
    pub error: Option<String>,
}

impl TaskAssignment {
    pub fn succeeded(output: TaskOutput) -> Self {
        Self {
            success: true,
            result: Some(output),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// A report without `success` or without output counts as a failure.
    pub fn into_result(self) -> Result<TaskOutput, String> {
        match (self.success, self.result) {
            (true, Some(output)) => Ok(output),
            (true, None) => Err("worker reported success without output".to_string()),
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "worker reported failure".to_string())),
        }
    }
}

/// Runs one worker against one task. Owns marking the worker busy and idle.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn assign_task(
        &self,
        user_id: &str,
        worker_ref: &str,
        task: &str,
        context: Option<&str>,
    ) -> Result<TaskAssignment, CollaboratorError>;
}

pub(crate) fn roster_failure(error: CollaboratorError) -> CollabError {
    CollabError::Collaborator {
        collaborator: "worker roster",
        message: error.message,
    }
}

pub(crate) fn reasoning_failure(error: CollaboratorError) -> CollabError {
    CollabError::Collaborator {
        collaborator: "reasoning",
        message: error.message,
    }
}

/// Wraps an executor failure with the identity of the unit that hit it.
pub(crate) fn unit_failure(
    unit: &'static str,
    unit_id: &str,
    worker: &str,
    message: impl Into<String>,
) -> ExecutionError {
    ExecutionError::UnitFailed {
        unit,
        unit_id: unit_id.to_string(),
        worker: worker.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_into_result() {
        let ok = TaskAssignment::succeeded(TaskOutput::new("draft"));
        assert_eq!(ok.into_result().unwrap().content, "draft");

        let failed = TaskAssignment::failed("worker is busy");
        assert_eq!(failed.into_result().unwrap_err(), "worker is busy");

        let hollow = TaskAssignment {
            success: true,
            result: None,
            error: None,
        };
        assert!(hollow.into_result().is_err());

        let silent = TaskAssignment {
            success: false,
            result: Some(TaskOutput::new("ignored")),
            error: None,
        };
        assert_eq!(silent.into_result().unwrap_err(), "worker reported failure");
    }
}
