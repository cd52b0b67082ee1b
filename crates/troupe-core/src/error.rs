//! Error types for the collaboration engine.
//!
//! Every fallible operation returns [`CollabError`]. Only
//! [`CollabError::Execution`] is ever paired with a plan state change: the
//! execution service records the failure on the plan before handing the error
//! back. All other variants leave the plan exactly as it was.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::PlanStatus;

/// Comprehensive error type for all engine operations.
#[derive(Error, Debug)]
pub enum CollabError {
    /// Malformed caller input (short goal, empty id, unknown mode)
    #[error("Invalid input for field '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// No plan is registered under the given id
    #[error("Collaboration plan {id} not found")]
    PlanNotFound { id: String },

    /// The operation is not allowed in the plan's current state
    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionFailure),

    /// A reasoning reply could not be turned into the expected structure
    #[error("Unusable reasoning reply: {0}")]
    UpstreamParse(#[from] ReplyError),

    /// A workflow step or decomposed task failed during a run
    #[error("Execution failed: {0}")]
    Execution(#[from] ExecutionError),

    /// An external collaborator (reasoning call, roster) reported failure
    #[error("{collaborator} call failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },

    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// The distinct ways a state-dependent operation can be refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionFailure {
    #[error("cannot {operation} while the plan is {status}")]
    InvalidTransition {
        operation: &'static str,
        status: PlanStatus,
    },

    #[error("capability analysis has not been run for this plan")]
    AnalysisMissing,

    #[error("the current roster cannot fulfil the goal; hire the recommended workers first")]
    CapabilityInsufficient,

    #[error("the workflow is undefined or has no steps")]
    WorkflowEmpty,

    #[error("the task decomposition is undefined or has no tasks")]
    TaskDecompositionEmpty,

    #[error("no workers are currently available for new work")]
    NoAvailableWorkers,
}

/// Failures turning a reasoning reply into structured data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplyError {
    #[error("no structured data could be parsed from the reply (starts with: {raw_prefix:?})")]
    Unparsable { raw_prefix: String },

    #[error("capability analysis is invalid: {}", .violations.join(", "))]
    InvalidAnalysis { violations: Vec<String> },

    #[error("collaboration modes are incomplete, missing: {}", .missing.join(", "))]
    MissingModes { missing: Vec<&'static str> },

    #[error("collaboration mode '{mode}' is malformed: {reason}")]
    MalformedMode { mode: &'static str, reason: String },

    #[error("adjustment suggestion is malformed: {reason}")]
    MalformedSuggestion { reason: String },
}

/// Failures of a single execution unit. Any of these aborts the whole run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("step {step_id} has unmet dependencies: {}", .missing.join(", "))]
    DependencyUnmet {
        step_id: String,
        missing: Vec<String>,
    },

    #[error("step {step_id} is invalid: {}", .violations.join(", "))]
    InvalidStep {
        step_id: String,
        violations: Vec<String>,
    },

    #[error("{unit} {unit_id} ({worker}) failed - {message}")]
    UnitFailed {
        unit: &'static str,
        unit_id: String,
        worker: String,
        message: String,
    },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> CollabError {
        CollabError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct ValidationErrorBuilder {
    field: String,
}

impl ValidationErrorBuilder {
    /// Create a new validation error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> CollabError {
        CollabError::Validation {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl CollabError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn validation(field: impl Into<String>) -> ValidationErrorBuilder {
        ValidationErrorBuilder::new(field)
    }

    pub fn plan_not_found(id: impl Into<String>) -> Self {
        CollabError::PlanNotFound { id: id.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CollabError::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CollabError::PlanNotFound { .. })
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, CollabError::Precondition(_))
    }

    pub fn is_upstream_parse(&self) -> bool {
        matches!(self, CollabError::UpstreamParse(_))
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, CollabError::Execution(_))
    }
}

/// Extension trait for Result to provide concise error mapping with
/// anyhow-style context.
pub trait ResultExt<T, E> {
    /// Add context to any error type, converting to CollabError.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| CollabError::Configuration {
            message: format!("{}: {}", context, e),
        })
    }
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| CollabError::database(message).with_source(e))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CollabError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_kinds_are_distinct() {
        let missing = CollabError::from(PreconditionFailure::AnalysisMissing);
        let insufficient = CollabError::from(PreconditionFailure::CapabilityInsufficient);

        assert!(missing.is_precondition());
        assert!(insufficient.is_precondition());
        assert_ne!(missing.to_string(), insufficient.to_string());
    }

    #[test]
    fn test_validation_builder() {
        let err = CollabError::validation("goal").with_reason("too short");
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Invalid input for field 'goal': too short"
        );
    }

    #[test]
    fn test_execution_error_names_the_unit() {
        let err = CollabError::from(ExecutionError::DependencyUnmet {
            step_id: "step_2".to_string(),
            missing: vec!["step_1".to_string()],
        });
        let message = err.to_string();
        assert!(message.contains("step_2"));
        assert!(message.contains("step_1"));
    }

    #[test]
    fn test_invalid_analysis_lists_every_violation() {
        let err = ReplyError::InvalidAnalysis {
            violations: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "capability analysis is invalid: a, b");
    }
}
