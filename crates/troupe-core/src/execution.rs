//! Sequential execution of a ready plan.
//!
//! A run drives one of the plan's representations unit by unit, one unit in
//! flight at a time, through the external [`TaskExecutor`]. There is no
//! partial success: the first failing unit aborts the run, the plan is moved
//! to FAILED, and only then is the error returned.
//!
//! Two runs on the same plan are excluded by the plan itself: the second
//! caller finds the plan no longer READY when it tries to start.

use std::{collections::HashSet, sync::Arc};

use serde::Serialize;

use crate::{
    error::{CollabError, ExecutionError, Result},
    models::{
        AssignedWorker, CollaborationPlan, ExecutionMode, ExecutionOutcome, ExecutionResult,
        MainTask, PlanStatus, UnitResult, WorkflowStep,
    },
    observer::PlanEvent,
    planning::PlanningService,
    ports::{unit_failure, TaskExecutor},
};

/// Side-channel progress report for a running execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A unit is about to start
    Running {
        unit_id: String,
        worker_name: String,
        /// Step task text, or task title
        label: String,
        /// `floor(current / total * 100)`
        percent: u8,
        current: usize,
        total: usize,
    },
    /// A unit failed and the run is aborting
    Failed { unit_id: String, error: String },
}

/// Snapshot of a plan's execution state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionProgress {
    pub plan_id: String,
    pub status: PlanStatus,
    pub execution: Option<ExecutionOutcome>,
}

/// Drives READY plans to COMPLETED or FAILED.
pub struct ExecutionService {
    planning: Arc<PlanningService>,
    executor: Arc<dyn TaskExecutor>,
}

impl ExecutionService {
    pub fn new(planning: Arc<PlanningService>, executor: Arc<dyn TaskExecutor>) -> Self {
        Self { planning, executor }
    }

    /// Runs the plan in the given mode.
    ///
    /// # Errors
    ///
    /// - `CollabError::PlanNotFound` if the plan is not registered
    /// - `CollabError::Precondition` if the plan is not READY or the chosen
    ///   representation is empty; the plan is unchanged
    /// - `CollabError::Execution` if a unit failed; the plan is FAILED
    pub async fn execute(&self, plan_id: &str, mode: ExecutionMode) -> Result<ExecutionResult> {
        self.execute_with_progress(plan_id, mode, |_| {}).await
    }

    /// Like [`execute`](Self::execute), reporting each unit start and any
    /// failure to `on_progress`.
    pub async fn execute_with_progress<F>(
        &self,
        plan_id: &str,
        mode: ExecutionMode,
        on_progress: F,
    ) -> Result<ExecutionResult>
    where
        F: Fn(ProgressEvent) + Send + Sync,
    {
        let plan = self
            .planning
            .update_plan(plan_id, |plan| {
                plan.start_execution(mode)?;
                Ok(plan.clone())
            })
            .await?;

        let run = match mode {
            ExecutionMode::Workflow => self.run_workflow(&plan, &on_progress).await,
            ExecutionMode::TaskDecomposition => self.run_tasks(&plan, &on_progress).await,
        };

        match run {
            Ok(mut result) => {
                let completed_at = self
                    .planning
                    .update_plan(plan_id, |plan| Ok(plan.complete_execution(result.clone())?))
                    .await?;
                result.completed_at = completed_at;

                self.planning.emit(PlanEvent::ExecutionCompleted {
                    plan_id: plan_id.to_string(),
                    completed_units: result.completed_units,
                });
                Ok(result)
            }
            Err(error) => {
                let message = error.to_string();
                let recorded = self
                    .planning
                    .update_plan(plan_id, |plan| Ok(plan.fail_execution(message.clone())?))
                    .await;
                if let Err(e) = recorded {
                    log::warn!("Could not record failure on plan {plan_id}: {e}");
                }

                self.planning.emit(PlanEvent::ExecutionFailed {
                    plan_id: plan_id.to_string(),
                    error: message,
                });
                Err(CollabError::Execution(error))
            }
        }
    }

    /// Current status and last execution outcome of a plan.
    pub async fn execution_progress(&self, plan_id: &str) -> Result<ExecutionProgress> {
        let plan = self.planning.get_plan(plan_id).await?;
        Ok(ExecutionProgress {
            plan_id: plan.id().to_string(),
            status: plan.status(),
            execution: plan.execution().cloned(),
        })
    }

    /// Runs the workflow steps in listed order. A step whose dependencies
    /// have not completed earlier in this run aborts the run; steps are never
    /// reordered.
    async fn run_workflow<F>(
        &self,
        plan: &CollaborationPlan,
        on_progress: &F,
    ) -> std::result::Result<ExecutionResult, ExecutionError>
    where
        F: Fn(ProgressEvent) + Send + Sync,
    {
        let steps = plan
            .workflow_orchestration()
            .map(|workflow| workflow.steps.clone())
            .unwrap_or_default()
            .into_iter()
            .map(WorkflowStep::from_definition)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let total = steps.len();
        self.started(plan, ExecutionMode::Workflow, total);

        let mut completed_ids = HashSet::new();
        let mut unit_results = Vec::with_capacity(total);

        for (index, step) in steps.into_iter().enumerate() {
            if !step.are_dependencies_met(&completed_ids) {
                return Err(ExecutionError::DependencyUnmet {
                    step_id: step.step_id().to_string(),
                    missing: step.unmet_dependencies(&completed_ids),
                });
            }

            let current = index + 1;
            self.unit_started(plan, step.step_id(), step.worker_name(), current, total);
            on_progress(ProgressEvent::Running {
                unit_id: step.step_id().to_string(),
                worker_name: step.worker_name().to_string(),
                label: step.task().to_string(),
                percent: percent(current, total),
                current,
                total,
            });

            let running = step.mark_as_running();
            let outcome = self
                .assign(plan, running.worker_ref(), running.task(), running.context())
                .await;

            match outcome {
                Ok(output) => {
                    let done = running.mark_as_completed(output.clone());
                    self.planning.emit(PlanEvent::UnitFinished {
                        plan_id: plan.id().to_string(),
                        unit_id: done.step_id().to_string(),
                        duration_secs: done.actual_duration(),
                    });
                    completed_ids.insert(done.step_id().to_string());
                    unit_results.push(UnitResult {
                        unit_id: done.step_id().to_string(),
                        title: None,
                        worker: AssignedWorker {
                            worker_id: done.worker_ref().to_string(),
                            worker_name: done.worker_name().to_string(),
                            worker_type: done.definition().worker_type.clone(),
                        },
                        output,
                        deliverables: Vec::new(),
                    });
                }
                Err(message) => {
                    let failed = running.mark_as_failed(message.clone());
                    self.unit_failed(plan, failed.step_id(), &message, on_progress);
                    return Err(unit_failure(
                        "step",
                        failed.step_id(),
                        failed.worker_name(),
                        message,
                    ));
                }
            }
        }

        Ok(finish(ExecutionMode::Workflow, total, unit_results))
    }

    /// Runs the decomposed tasks independently, in listed order.
    async fn run_tasks<F>(
        &self,
        plan: &CollaborationPlan,
        on_progress: &F,
    ) -> std::result::Result<ExecutionResult, ExecutionError>
    where
        F: Fn(ProgressEvent) + Send + Sync,
    {
        let tasks: Vec<MainTask> = plan
            .task_decomposition()
            .map(|decomposition| decomposition.main_tasks.clone())
            .unwrap_or_default();

        let total = tasks.len();
        self.started(plan, ExecutionMode::TaskDecomposition, total);

        let mut unit_results = Vec::with_capacity(total);

        for (index, task) in tasks.into_iter().enumerate() {
            let current = index + 1;
            let worker_name = display_name(&task.assigned_worker).to_string();

            self.unit_started(plan, &task.task_id, &worker_name, current, total);
            on_progress(ProgressEvent::Running {
                unit_id: task.task_id.clone(),
                worker_name: worker_name.clone(),
                label: task.title.clone(),
                percent: percent(current, total),
                current,
                total,
            });

            let outcome = self
                .assign(plan, &task.assigned_worker.worker_id, &task.instruction(), None)
                .await;

            match outcome {
                Ok(output) => {
                    self.planning.emit(PlanEvent::UnitFinished {
                        plan_id: plan.id().to_string(),
                        unit_id: task.task_id.clone(),
                        duration_secs: None,
                    });
                    unit_results.push(UnitResult {
                        unit_id: task.task_id,
                        title: Some(task.title),
                        worker: task.assigned_worker,
                        output,
                        deliverables: task.deliverables,
                    });
                }
                Err(message) => {
                    self.unit_failed(plan, &task.task_id, &message, on_progress);
                    return Err(unit_failure("task", &task.task_id, &worker_name, message));
                }
            }
        }

        Ok(finish(ExecutionMode::TaskDecomposition, total, unit_results))
    }

    /// Hands one unit to the executor. Transport failures and reported
    /// failures both come back as the error message.
    async fn assign(
        &self,
        plan: &CollaborationPlan,
        worker_ref: &str,
        task: &str,
        context: Option<&str>,
    ) -> std::result::Result<crate::models::TaskOutput, String> {
        match self
            .executor
            .assign_task(plan.user_id(), worker_ref, task, context)
            .await
        {
            Ok(assignment) => assignment.into_result(),
            Err(e) => Err(e.message),
        }
    }

    fn started(&self, plan: &CollaborationPlan, mode: ExecutionMode, total_units: usize) {
        self.planning.emit(PlanEvent::ExecutionStarted {
            plan_id: plan.id().to_string(),
            mode,
            total_units,
        });
    }

    fn unit_started(
        &self,
        plan: &CollaborationPlan,
        unit_id: &str,
        worker: &str,
        current: usize,
        total: usize,
    ) {
        self.planning.emit(PlanEvent::UnitStarted {
            plan_id: plan.id().to_string(),
            unit_id: unit_id.to_string(),
            worker: worker.to_string(),
            current,
            total,
        });
    }

    fn unit_failed<F>(&self, plan: &CollaborationPlan, unit_id: &str, error: &str, on_progress: &F)
    where
        F: Fn(ProgressEvent) + Send + Sync,
    {
        self.planning.emit(PlanEvent::UnitFailed {
            plan_id: plan.id().to_string(),
            unit_id: unit_id.to_string(),
            error: error.to_string(),
        });
        on_progress(ProgressEvent::Failed {
            unit_id: unit_id.to_string(),
            error: error.to_string(),
        });
    }
}

fn display_name(worker: &AssignedWorker) -> &str {
    if worker.worker_name.is_empty() {
        &worker.worker_id
    } else {
        &worker.worker_name
    }
}

fn percent(current: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (current * 100 / total).min(100) as u8
}

fn finish(mode: ExecutionMode, total: usize, unit_results: Vec<UnitResult>) -> ExecutionResult {
    ExecutionResult {
        execution_mode: mode,
        total_units: total,
        completed_units: unit_results.len(),
        summary: summarize(&unit_results),
        unit_results,
        completed_at: jiff::Timestamp::now(),
    }
}

/// Concatenates each unit's output under a heading naming the unit.
pub fn summarize(results: &[UnitResult]) -> String {
    if results.is_empty() {
        return "No execution results".to_string();
    }

    let mut summary = String::from("Collaboration finished. Output from each worker:\n\n");
    for result in results {
        summary.push_str(&format!(
            "## {} ({})\n{}\n\n",
            result.unit_id,
            display_name(&result.worker),
            result.output.content
        ));
    }
    summary
}
