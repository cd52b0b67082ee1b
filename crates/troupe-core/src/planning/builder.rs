//! Builder for assembling the planning and execution services.

use std::sync::Arc;

use super::PlanningService;
use crate::{
    config::EngineConfig,
    error::Result,
    execution::ExecutionService,
    models::{CollaborationPlan, PlanStatus},
    observer::{LogObserver, PlanObserver},
    ports::{ReasoningClient, TaskExecutor, WorkerRoster},
    store::PlanStore,
};

/// The two services sharing one plan registry.
pub struct Engine {
    pub planning: Arc<PlanningService>,
    pub execution: ExecutionService,
}

/// Builder for creating and configuring an [`Engine`].
pub struct EngineBuilder {
    config: EngineConfig,
    observer: Arc<dyn PlanObserver>,
    store: Option<PlanStore>,
}

impl EngineBuilder {
    /// Creates a new builder with default settings, logging events through
    /// the `log` facade and keeping plans in memory only.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            observer: Arc::new(LogObserver),
            store: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default [`LogObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn PlanObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Writes every plan change through to `store` and restores the plans
    /// already saved there.
    pub fn with_store(mut self, store: PlanStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the engine around the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns `CollabError::Database` if the saved plans cannot be queried.
    /// Saved plans that fail to decode or validate are skipped with a warning.
    pub async fn build(
        self,
        roster: Arc<dyn WorkerRoster>,
        reasoning: Arc<dyn ReasoningClient>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Result<Engine> {
        let restored = match &self.store {
            Some(store) => self.restore(store).await?,
            None => Vec::new(),
        };
        if !restored.is_empty() {
            log::info!("Restored {} collaboration plans", restored.len());
        }

        let planning = Arc::new(PlanningService::new(
            roster,
            reasoning,
            self.observer,
            self.store,
            self.config,
            restored,
        ));
        let execution = ExecutionService::new(Arc::clone(&planning), executor);

        Ok(Engine {
            planning,
            execution,
        })
    }

    async fn restore(&self, store: &PlanStore) -> Result<Vec<CollaborationPlan>> {
        let mut restored = Vec::new();
        for (id, plan) in store.load_all().await? {
            let mut plan = match plan {
                Ok(plan) => plan,
                Err(e) => {
                    log::warn!("Skipping unreadable stored plan {id}: {e}");
                    continue;
                }
            };
            let violations = plan.validate(self.config.min_goal_chars);
            if !violations.is_empty() {
                log::warn!("Skipping stored plan {}: {}", plan.id(), violations.join(", "));
                continue;
            }

            // A run cannot survive a restart
            if plan.status() == PlanStatus::Executing {
                plan.fail_execution("execution interrupted by shutdown")?;
                store.save(&plan).await?;
            }
            restored.push(plan);
        }
        Ok(restored)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
