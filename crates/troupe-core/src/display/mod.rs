//! Markdown formatting for terminal output.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! the wrappers here add the context a command needs around them: a list of
//! summaries, a creation or deletion notice, a status line.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Display Wrapper │    │    Markdown     │
//! │ (Plan, Result)  │───▶│      Types      │───▶│ (termimad skin) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ```rust
//! use troupe_core::{display::OperationStatus, models::CollaborationPlan};
//!
//! let plan = CollaborationPlan::create("user_1", "Launch a new SaaS product", None, 10).unwrap();
//! let status = OperationStatus::success(format!("analysis queued for {}", plan.id()));
//! assert!(status.to_string().starts_with("Success:"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::PlanSummaries;
pub use datetime::LocalDateTime;
pub use results::{CreateResult, DeleteResult};
pub use status::OperationStatus;
