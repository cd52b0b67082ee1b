//! Core library for troupe, a collaboration planning and execution engine.
//!
//! A user states a goal. The engine asks a reasoning collaborator whether the
//! user's roster of workers can meet it, then asks again for three ways of
//! organizing the work (who to involve, a dependency-ordered workflow, and a
//! task decomposition), and finally drives one of those representations to
//! completion by handing each unit to a task executor.
//!
//! The roster, the reasoning oracle and the executor are all external and
//! reached through the traits in [`ports`]. Plans live in an in-memory
//! registry and can be written through to SQLite via [`PlanStore`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use troupe_core::{
//!     models::ExecutionMode,
//!     ports::{ReasoningClient, TaskExecutor, WorkerRoster},
//!     EngineBuilder, PlanStore,
//! };
//!
//! # async fn example(
//! #     roster: Arc<dyn WorkerRoster>,
//! #     reasoning: Arc<dyn ReasoningClient>,
//! #     executor: Arc<dyn TaskExecutor>,
//! # ) -> troupe_core::Result<()> {
//! let store = PlanStore::open(Some("plans.db")).await?;
//! let engine = EngineBuilder::new()
//!     .with_store(store)
//!     .build(roster, reasoning, executor)
//!     .await?;
//!
//! let plan = engine
//!     .planning
//!     .create_plan("user_1", "Launch a new SaaS product", None)
//!     .await?;
//! engine.planning.analyze_capability(plan.id(), None).await?;
//! engine.planning.generate_collaboration_modes(plan.id()).await?;
//!
//! let result = engine.execution.execute(plan.id(), ExecutionMode::Workflow).await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod execution;
pub mod models;
pub mod observer;
pub mod planning;
pub mod ports;
pub mod prompts;
pub mod reply;
pub mod store;

pub use config::EngineConfig;
pub use db::Database;
pub use display::{CreateResult, DeleteResult, LocalDateTime, OperationStatus, PlanSummaries};
pub use error::{CollabError, Result};
pub use execution::{ExecutionProgress, ExecutionService, ProgressEvent};
pub use models::{CollaborationPlan, ExecutionMode, PlanFilter, PlanStatus, PlanSummary};
pub use observer::{LogObserver, PlanEvent, PlanObserver};
pub use planning::{Engine, EngineBuilder, PlanningService};
pub use store::PlanStore;
