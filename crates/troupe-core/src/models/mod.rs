//! Data models for collaboration plans.
//!
//! The models split into three groups:
//!
//! - **Aggregate**: [`CollaborationPlan`] owns a goal and everything derived
//!   from it, and is the only type with a lifecycle
//!   ([`PlanStatus`]). Its fields are private; state changes go through its
//!   transition methods.
//! - **Value objects**: [`CapabilityAnalysis`], the three collaboration modes
//!   ([`RoleRecommendation`], [`WorkflowOrchestration`],
//!   [`TaskDecomposition`]) and [`ExecutionResult`] are plain owned data,
//!   built from reasoning replies or execution runs and attached to a plan
//!   by value.
//! - **Run state**: [`WorkflowStep`] tracks one step during a single
//!   execution pass. It is rebuilt from the workflow at the start of every
//!   run and never stored.
//!
//! Display implementations live in [`crate::display::models`].
//!
//! # Examples
//!
//! ```rust
//! use troupe_core::models::{CollaborationPlan, PlanStatus, MIN_GOAL_CHARS};
//!
//! let plan = CollaborationPlan::create(
//!     "user_1",
//!     "  Launch a new SaaS product  ",
//!     None,
//!     MIN_GOAL_CHARS,
//! )
//! .unwrap();
//!
//! assert_eq!(plan.goal(), "Launch a new SaaS product");
//! assert_eq!(plan.status(), PlanStatus::Draft);
//! assert_eq!(plan.version(), 1);
//! assert!(!plan.can_execute());
//! ```

pub mod adjustment;
pub mod analysis;
pub mod filters;
pub mod modes;
pub mod plan;
pub mod result;
pub mod stats;
pub mod status;
pub mod step;
pub mod summary;
pub mod worker;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Deserializer};

pub use adjustment::{AdjustmentSuggestion, SuggestedChange};
pub use analysis::{CapabilityAnalysis, HiringAdvice, RequiredRole, RoleGap, SkillGap, Warning};
pub use filters::PlanFilter;
pub use modes::{
    AssignedWorker, CollaborationModes, MainTask, ModeMetadata, RoleRecommendation,
    StepDefinition, TaskDecomposition, WorkerPick, WorkflowOrchestration,
};
pub use plan::{AdjustmentRecord, CollaborationPlan, MIN_GOAL_CHARS};
pub use result::{ExecutionMode, ExecutionOutcome, ExecutionResult, TaskOutput, UnitResult};
pub use stats::{StoreStats, UserPlanStats};
pub use status::{Level, PlanStatus, StepStatus};
pub use step::{StepState, WorkflowStep};
pub use summary::PlanSummary;
pub use worker::{Worker, WorkerSnapshot, WorkerStatus};

/// Deserializes an informational count or duration. Whole floats are
/// truncated, numeric strings are parsed, and anything else reads as `None`.
pub(crate) fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok().and_then(|f| {
            (f.is_finite() && f >= 0.0).then(|| f.trunc() as u64)
        }),
        _ => None,
    };
    Ok(count)
}

/// Deserializes an explicit `null` as the type's default. Reasoning replies
/// often send `null` where an empty list or string is meant.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
