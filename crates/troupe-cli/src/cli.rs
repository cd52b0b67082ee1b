//! Command handlers over the plan store.

use anyhow::{anyhow, Context, Result};
use troupe_core::{
    models::{CollaborationPlan, ExecutionOutcome, PlanFilter},
    CreateResult, DeleteResult, EngineConfig, OperationStatus, PlanStore, PlanSummaries,
};

use crate::{
    args::{CreatePlanArgs, DeletePlanArgs, PlanCommands, PlanIdArgs, StatsArgs},
    renderer::TerminalRenderer,
};

pub struct Cli {
    store: PlanStore,
    renderer: TerminalRenderer,
    config: EngineConfig,
}

impl Cli {
    pub fn new(store: PlanStore, renderer: TerminalRenderer) -> Self {
        Self {
            store,
            renderer,
            config: EngineConfig::default(),
        }
    }

    pub async fn handle_plan_command(&self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Create(args) => self.create_plan(args).await,
            PlanCommands::List(args) => self.list_plans(&args.into()).await,
            PlanCommands::Show(args) => self.show_plan(args).await,
            PlanCommands::Result(args) => self.show_result(args).await,
            PlanCommands::Delete(args) => self.delete_plan(args).await,
        }
    }

    async fn create_plan(&self, args: CreatePlanArgs) -> Result<()> {
        let plan = CollaborationPlan::create(
            args.user,
            &args.goal,
            args.project,
            self.config.min_goal_chars,
        )?;
        self.store
            .save(&plan)
            .await
            .context("Failed to save plan")?;

        self.renderer.render(&CreateResult::new(plan).to_string())
    }

    pub async fn list_plans(&self, filter: &PlanFilter) -> Result<()> {
        let plans = self
            .store
            .list(filter)
            .await
            .context("Failed to list plans")?;

        let summaries = PlanSummaries(plans.iter().map(CollaborationPlan::summary).collect());
        self.renderer.render(&summaries.to_string())
    }

    async fn show_plan(&self, args: PlanIdArgs) -> Result<()> {
        let plan = self.find_plan(&args.id).await?;
        self.renderer.render(&plan.to_string())
    }

    async fn show_result(&self, args: PlanIdArgs) -> Result<()> {
        let plan = self.find_plan(&args.id).await?;

        let markdown = match plan.execution() {
            Some(ExecutionOutcome::Completed(result)) => result.to_string(),
            Some(ExecutionOutcome::Failed { error, .. }) => {
                OperationStatus::failure(format!("Execution of {} failed: {error}", plan.id()))
                    .to_string()
            }
            None => format!("Plan {} has not been executed ({}).\n", plan.id(), plan.status()),
        };
        self.renderer.render(&markdown)
    }

    async fn delete_plan(&self, args: DeletePlanArgs) -> Result<()> {
        let plan = self.find_plan(&args.id).await?;

        if !self
            .store
            .delete(&args.id, &args.user)
            .await
            .context("Failed to delete plan")?
        {
            return Err(anyhow!(
                "Plan {} is not owned by user {}",
                args.id,
                args.user
            ));
        }

        self.renderer.render(&DeleteResult::new(plan).to_string())
    }

    pub async fn show_stats(&self, args: StatsArgs) -> Result<()> {
        let markdown = match args.user {
            Some(user) => self.store.user_stats(&user).await?.to_string(),
            None => self.store.stats().await?.to_string(),
        };
        self.renderer.render(&markdown)
    }

    async fn find_plan(&self, id: &str) -> Result<CollaborationPlan> {
        self.store
            .get(id)
            .await
            .context("Failed to load plan")?
            .ok_or_else(|| anyhow!("Plan {id} not found"))
    }
}
