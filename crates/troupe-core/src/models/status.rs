//! Status and level enumerations for plans, steps and analysis entries.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a collaboration plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Just created, or last analysis found the roster insufficient
    #[default]
    Draft,

    /// Capability analysis in progress
    Analyzing,

    /// Roster is sufficient; modes may be generated and executed
    Ready,

    /// An execution run holds the plan
    Executing,

    /// Last run finished every unit
    Completed,

    /// Last run aborted on a failing unit
    Failed,
}

impl PlanStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [PlanStatus; 6] = [
        PlanStatus::Draft,
        PlanStatus::Analyzing,
        PlanStatus::Ready,
        PlanStatus::Executing,
        PlanStatus::Completed,
        PlanStatus::Failed,
    ];

    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Draft => "draft",
            PlanStatus::Analyzing => "analyzing",
            PlanStatus::Ready => "ready",
            PlanStatus::Executing => "executing",
            PlanStatus::Completed => "completed",
            PlanStatus::Failed => "failed",
        }
    }

    /// Completed and failed plans never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Completed | PlanStatus::Failed)
    }
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PlanStatus::Draft),
            "analyzing" => Ok(PlanStatus::Analyzing),
            "ready" => Ok(PlanStatus::Ready),
            "executing" => Ok(PlanStatus::Executing),
            "completed" => Ok(PlanStatus::Completed),
            "failed" => Ok(PlanStatus::Failed),
            _ => Err(format!("Invalid plan status: {s}")),
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single workflow step within one execution pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }

    /// Get status with consistent icon formatting for display.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use troupe_core::models::StepStatus;
    ///
    /// assert_eq!(StepStatus::Completed.with_icon(), "✓ Completed");
    /// assert_eq!(StepStatus::Running.with_icon(), "➤ Running");
    /// assert_eq!(StepStatus::Pending.with_icon(), "○ Pending");
    /// assert_eq!(StepStatus::Failed.with_icon(), "✗ Failed");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::Completed => "✓ Completed",
            StepStatus::Running => "➤ Running",
            StepStatus::Pending => "○ Pending",
            StepStatus::Failed => "✗ Failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority or severity level attached to roles, gaps, steps and warnings.
///
/// Reasoning replies are free text, so unknown labels are kept verbatim in
/// [`Level::Other`] instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Level {
    High,
    #[default]
    Medium,
    Low,
    Other(String),
}

impl Level {
    pub fn as_str(&self) -> &str {
        match self {
            Level::High => "high",
            Level::Medium => "medium",
            Level::Low => "low",
            Level::Other(label) => label,
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<String> for Level {
    fn from(label: String) -> Self {
        match label.to_lowercase().as_str() {
            "high" | "critical" => Level::High,
            "medium" => Level::Medium,
            "low" => Level::Low,
            _ => Level::Other(label),
        }
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
