//! Plan creation, capability analysis and mode generation.
//!
//! [`PlanningService`] owns the in-memory plan registry. Every plan lives in
//! exactly one place, keyed by id, and is only changed through
//! [`CollaborationPlan`]'s own transition methods while the registry lock is
//! held. The lock is never held across a collaborator call: services copy
//! what they need, release the lock, call out, and re-acquire it to apply
//! the result. A transition refused on re-acquisition leaves the plan as the
//! concurrent winner left it.
//!
//! ```text
//! create_plan ──▶ analyze_capability ──▶ generate_collaboration_modes ──▶ ExecutionService::execute
//!     DRAFT          DRAFT | READY               READY (+ modes)            EXECUTING ──▶ COMPLETED | FAILED
//! ```
//!
//! When a [`PlanStore`] is configured, every successful mutation is written
//! through to it. A failed write is logged and does not fail the operation.

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::{
    config::EngineConfig,
    error::{CollabError, PreconditionFailure, Result},
    models::{
        AdjustmentSuggestion, CapabilityAnalysis, CollaborationModes, CollaborationPlan,
        PlanSummary, Worker,
    },
    observer::{PlanEvent, PlanObserver},
    ports::{
        reasoning_failure, roster_failure, ReasoningClient, ReasoningOptions, ReasoningRequest,
        WorkerRoster,
    },
    prompts, reply,
    store::PlanStore,
};

pub mod builder;

pub use builder::{Engine, EngineBuilder};

/// What the caller should do after a capability analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    /// The roster is sufficient; generate collaboration modes
    GenerateModes,
    /// The roster falls short; hire the recommended workers and re-analyse
    #[serde(rename = "hire_agents")]
    HireWorkers,
}

impl NextStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextStep::GenerateModes => "generate_modes",
            NextStep::HireWorkers => "hire_agents",
        }
    }
}

/// Result of [`PlanningService::analyze_capability`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    pub plan_id: String,
    pub analysis: CapabilityAnalysis,
    pub next_step: NextStep,
}

/// Creates plans and drives them from DRAFT to READY with modes attached.
pub struct PlanningService {
    plans: Mutex<HashMap<String, CollaborationPlan>>,
    roster: Arc<dyn WorkerRoster>,
    reasoning: Arc<dyn ReasoningClient>,
    observer: Arc<dyn PlanObserver>,
    store: Option<PlanStore>,
    config: EngineConfig,
}

impl PlanningService {
    pub(crate) fn new(
        roster: Arc<dyn WorkerRoster>,
        reasoning: Arc<dyn ReasoningClient>,
        observer: Arc<dyn PlanObserver>,
        store: Option<PlanStore>,
        config: EngineConfig,
        restored: Vec<CollaborationPlan>,
    ) -> Self {
        let plans = restored
            .into_iter()
            .map(|plan| (plan.id().to_string(), plan))
            .collect();
        Self {
            plans: Mutex::new(plans),
            roster,
            reasoning,
            observer,
            store,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates and registers a new DRAFT plan.
    ///
    /// # Errors
    ///
    /// Returns `CollabError::Validation` if the trimmed goal is shorter than
    /// the configured minimum or the user id is blank. Nothing is registered
    /// in that case.
    pub async fn create_plan(
        &self,
        user_id: &str,
        goal: &str,
        project_id: Option<&str>,
    ) -> Result<CollaborationPlan> {
        let plan = CollaborationPlan::create(
            user_id,
            goal,
            project_id.map(str::to_string),
            self.config.min_goal_chars,
        )?;

        {
            let mut plans = self.plans.lock().await;
            plans.insert(plan.id().to_string(), plan.clone());
            self.persist(&plan).await;
        }

        self.emit(PlanEvent::Created {
            plan_id: plan.id().to_string(),
            user_id: plan.user_id().to_string(),
        });
        Ok(plan)
    }

    /// Asks the capability oracle whether the roster can meet the plan's goal
    /// and attaches the resulting analysis.
    ///
    /// `worker_ids` narrows the roster to a project's workers; `None` or an
    /// empty slice uses the user's full roster.
    ///
    /// A failure at any point leaves the plan exactly as it was.
    pub async fn analyze_capability(
        &self,
        plan_id: &str,
        worker_ids: Option<&[String]>,
    ) -> Result<AnalysisOutcome> {
        let plan = self.get_plan(plan_id).await?;
        plan.ensure_can_analyze()?;

        let mut workers = self
            .roster
            .list_workers(plan.user_id())
            .await
            .map_err(roster_failure)?;
        if let Some(ids) = worker_ids.filter(|ids| !ids.is_empty()) {
            workers.retain(|worker| ids.contains(&worker.id));
        }

        let prompt = prompts::capability_analysis(plan.goal(), &workers);
        let value = self.reason(prompt, &self.config.analysis).await?;
        let snapshot = workers.iter().map(Worker::snapshot).collect();
        let analysis = CapabilityAnalysis::from_reply(&value, snapshot)?;

        let status = self
            .update_plan(plan_id, |plan| {
                plan.set_capability_analysis(analysis.clone())?;
                Ok(plan.status())
            })
            .await?;

        self.emit(PlanEvent::AnalysisAttached {
            plan_id: plan_id.to_string(),
            sufficient: analysis.is_sufficient,
            confidence_score: analysis.confidence_score,
            status,
        });

        let next_step = if analysis.is_sufficient {
            NextStep::GenerateModes
        } else {
            NextStep::HireWorkers
        };
        Ok(AnalysisOutcome {
            plan_id: plan_id.to_string(),
            analysis,
            next_step,
        })
    }

    /// Generates the three collaboration modes for a READY plan.
    ///
    /// # Errors
    ///
    /// - `PreconditionFailure::AnalysisMissing` if no analysis has been run
    /// - `PreconditionFailure::CapabilityInsufficient` if the last analysis
    ///   found the roster insufficient
    /// - `PreconditionFailure::NoAvailableWorkers` if every worker is busy
    /// - `CollabError::UpstreamParse` if the reply lacks any of the three
    ///   representations
    ///
    /// An empty workflow step list is accepted here and refused when a
    /// workflow run is started.
    pub async fn generate_collaboration_modes(&self, plan_id: &str) -> Result<CollaborationModes> {
        let plan = self.get_plan(plan_id).await?;
        plan.ensure_can_generate_modes()?;
        let analysis = plan
            .capability_analysis()
            .ok_or(PreconditionFailure::AnalysisMissing)?;

        let available = self
            .roster
            .available_workers(plan.user_id())
            .await
            .map_err(roster_failure)?;
        if available.is_empty() {
            return Err(PreconditionFailure::NoAvailableWorkers.into());
        }

        let prompt = prompts::collaboration_modes(plan.goal(), analysis, &available);
        let value = self.reason(prompt, &self.config.modes).await?;
        let modes = CollaborationModes::from_reply(&value)?;

        self.update_plan(plan_id, |plan| {
            plan.set_collaboration_modes(
                modes.role_recommendation.clone(),
                modes.workflow_orchestration.clone(),
                modes.task_decomposition.clone(),
            )?;
            Ok(())
        })
        .await?;

        self.emit(PlanEvent::ModesGenerated {
            plan_id: plan_id.to_string(),
            workflow_steps: modes.workflow_orchestration.steps.len(),
            recommended_workers: modes.role_recommendation.recommended.len(),
            main_tasks: modes.task_decomposition.main_tasks.len(),
        });
        Ok(modes)
    }

    /// Asks the reasoning oracle to judge a requested change and records the
    /// judgment in the plan's adjustment history. Status and modes are left
    /// untouched.
    pub async fn suggest_adjustment(
        &self,
        plan_id: &str,
        request: &str,
    ) -> Result<AdjustmentSuggestion> {
        let request = request.trim();
        if request.is_empty() {
            return Err(CollabError::validation("request").with_reason("must not be empty"));
        }

        let plan = self.get_plan(plan_id).await?;
        let prompt = prompts::adjustment(&plan, request);
        let value = self.reason(prompt, &self.config.adjustment).await?;
        let suggestion = AdjustmentSuggestion::from_reply(&value)?;

        self.record_adjustment(
            plan_id,
            "user_request",
            json!({ "request": request }),
            Some(serde_json::to_value(&suggestion)?),
        )
        .await?;
        Ok(suggestion)
    }

    /// Appends an audit entry and bumps the plan version. Returns the new
    /// version.
    pub async fn record_adjustment(
        &self,
        plan_id: &str,
        kind: &str,
        data: Value,
        ai_suggestion: Option<Value>,
    ) -> Result<u32> {
        let version = self
            .update_plan(plan_id, |plan| {
                Ok(plan.record_adjustment(kind, data, ai_suggestion))
            })
            .await?;

        self.emit(PlanEvent::AdjustmentRecorded {
            plan_id: plan_id.to_string(),
            version,
            kind: kind.to_string(),
        });
        Ok(version)
    }

    /// Returns a copy of the plan.
    pub async fn get_plan(&self, plan_id: &str) -> Result<CollaborationPlan> {
        self.plans
            .lock()
            .await
            .get(plan_id)
            .cloned()
            .ok_or_else(|| CollabError::plan_not_found(plan_id))
    }

    /// All of a user's plans, newest first.
    pub async fn get_user_plans(&self, user_id: &str) -> Vec<CollaborationPlan> {
        let mut plans: Vec<CollaborationPlan> = self
            .plans
            .lock()
            .await
            .values()
            .filter(|plan| plan.user_id() == user_id)
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        plans
    }

    pub async fn get_user_plan_summaries(&self, user_id: &str) -> Vec<PlanSummary> {
        self.get_user_plans(user_id)
            .await
            .iter()
            .map(PlanSummary::from)
            .collect()
    }

    /// Removes a plan from the registry. Nothing else is removed with it.
    pub async fn delete_plan(&self, plan_id: &str) -> Result<()> {
        {
            let mut plans = self.plans.lock().await;
            let removed = plans
                .remove(plan_id)
                .ok_or_else(|| CollabError::plan_not_found(plan_id))?;

            if let Some(store) = &self.store {
                if let Err(e) = store.delete(removed.id(), removed.user_id()).await {
                    log::warn!("Failed to delete plan {plan_id} from the store: {e}");
                }
            }
        }

        self.emit(PlanEvent::Deleted {
            plan_id: plan_id.to_string(),
        });
        Ok(())
    }

    /// Applies `change` to the registered plan and writes the result through
    /// to the store, both under the registry lock.
    ///
    /// `change` must leave the plan untouched when it returns an error; the
    /// plan transition methods all check before they mutate.
    pub(crate) async fn update_plan<T, F>(&self, plan_id: &str, change: F) -> Result<T>
    where
        F: FnOnce(&mut CollaborationPlan) -> Result<T>,
    {
        let mut plans = self.plans.lock().await;
        let plan = plans
            .get_mut(plan_id)
            .ok_or_else(|| CollabError::plan_not_found(plan_id))?;
        let value = change(plan)?;

        // The guard stays held so writes reach the store in registry order
        self.persist(plan).await;
        Ok(value)
    }

    pub(crate) fn emit(&self, event: PlanEvent) {
        self.observer.on_event(&event);
    }

    async fn reason(&self, prompt: String, options: &ReasoningOptions) -> Result<Value> {
        let request = ReasoningRequest {
            prompt,
            system_role: Some(prompts::SYSTEM_ROLE.to_string()),
            options: options.clone(),
        };
        let reply = self
            .reasoning
            .reason(request)
            .await
            .map_err(reasoning_failure)?;
        log::debug!(
            "Reasoning reply from {} ({} tokens)",
            reply.model_id,
            reply.token_usage.total
        );
        Ok(reply::extract_structured(
            &reply.text,
            self.config.raw_reply_prefix,
        )?)
    }

    async fn persist(&self, plan: &CollaborationPlan) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(plan).await {
                log::warn!("Failed to save plan {} to the store: {e}", plan.id());
            }
        }
    }
}
