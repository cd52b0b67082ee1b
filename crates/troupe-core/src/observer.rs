//! Plan lifecycle events and the observers that receive them.
//!
//! Services report every state transition as a [`PlanEvent`] to a single
//! injected [`PlanObserver`]. Observers see events after the transition has
//! happened and cannot influence control flow.

use std::sync::Mutex;

use crate::models::{ExecutionMode, PlanStatus};

/// Something that happened to a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEvent {
    Created {
        plan_id: String,
        user_id: String,
    },
    AnalysisAttached {
        plan_id: String,
        sufficient: bool,
        confidence_score: f64,
        status: PlanStatus,
    },
    ModesGenerated {
        plan_id: String,
        workflow_steps: usize,
        recommended_workers: usize,
        main_tasks: usize,
    },
    ExecutionStarted {
        plan_id: String,
        mode: ExecutionMode,
        total_units: usize,
    },
    UnitStarted {
        plan_id: String,
        unit_id: String,
        worker: String,
        current: usize,
        total: usize,
    },
    UnitFinished {
        plan_id: String,
        unit_id: String,
        /// Whole seconds, when the unit's start was recorded
        duration_secs: Option<i64>,
    },
    UnitFailed {
        plan_id: String,
        unit_id: String,
        error: String,
    },
    ExecutionCompleted {
        plan_id: String,
        completed_units: usize,
    },
    ExecutionFailed {
        plan_id: String,
        error: String,
    },
    AdjustmentRecorded {
        plan_id: String,
        version: u32,
        kind: String,
    },
    Deleted {
        plan_id: String,
    },
}

impl PlanEvent {
    pub fn plan_id(&self) -> &str {
        match self {
            PlanEvent::Created { plan_id, .. }
            | PlanEvent::AnalysisAttached { plan_id, .. }
            | PlanEvent::ModesGenerated { plan_id, .. }
            | PlanEvent::ExecutionStarted { plan_id, .. }
            | PlanEvent::UnitStarted { plan_id, .. }
            | PlanEvent::UnitFinished { plan_id, .. }
            | PlanEvent::UnitFailed { plan_id, .. }
            | PlanEvent::ExecutionCompleted { plan_id, .. }
            | PlanEvent::ExecutionFailed { plan_id, .. }
            | PlanEvent::AdjustmentRecorded { plan_id, .. }
            | PlanEvent::Deleted { plan_id } => plan_id,
        }
    }
}

/// Receives plan events.
pub trait PlanObserver: Send + Sync {
    fn on_event(&self, event: &PlanEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl PlanObserver for LogObserver {
    fn on_event(&self, event: &PlanEvent) {
        match event {
            PlanEvent::Created { plan_id, user_id } => {
                log::info!("Created collaboration plan {plan_id} for user {user_id}");
            }
            PlanEvent::AnalysisAttached {
                plan_id,
                sufficient,
                confidence_score,
                status,
            } => {
                let verdict = if *sufficient { "sufficient" } else { "insufficient" };
                log::info!(
                    "Capability analysis for {plan_id}: {verdict} (confidence {confidence_score}), plan is {status}"
                );
            }
            PlanEvent::ModesGenerated {
                plan_id,
                workflow_steps,
                recommended_workers,
                main_tasks,
            } => log::info!(
                "Generated modes for {plan_id}: {workflow_steps} steps, {recommended_workers} recommended workers, {main_tasks} tasks"
            ),
            PlanEvent::ExecutionStarted {
                plan_id,
                mode,
                total_units,
            } => log::info!("Executing {plan_id} in {mode} mode ({total_units} units)"),
            PlanEvent::UnitStarted {
                plan_id,
                unit_id,
                worker,
                current,
                total,
            } => log::debug!("[{plan_id}] {current}/{total}: {unit_id} ({worker})"),
            PlanEvent::UnitFinished {
                plan_id,
                unit_id,
                duration_secs,
            } => match duration_secs {
                Some(secs) => log::debug!("[{plan_id}] {unit_id} completed in {secs}s"),
                None => log::debug!("[{plan_id}] {unit_id} completed"),
            },
            PlanEvent::UnitFailed {
                plan_id,
                unit_id,
                error,
            } => log::warn!("[{plan_id}] {unit_id} failed: {error}"),
            PlanEvent::ExecutionCompleted {
                plan_id,
                completed_units,
            } => log::info!("Execution of {plan_id} completed ({completed_units} units)"),
            PlanEvent::ExecutionFailed { plan_id, error } => {
                log::warn!("Execution of {plan_id} failed: {error}");
            }
            PlanEvent::AdjustmentRecorded {
                plan_id,
                version,
                kind,
            } => log::info!("Recorded {kind} adjustment on {plan_id}, now version {version}"),
            PlanEvent::Deleted { plan_id } => log::info!("Deleted collaboration plan {plan_id}"),
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PlanObserver for NoopObserver {
    fn on_event(&self, _event: &PlanEvent) {}
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PlanEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<PlanEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Events concerning one plan.
    pub fn events_for(&self, plan_id: &str) -> Vec<PlanEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.plan_id() == plan_id)
            .collect()
    }
}

impl PlanObserver for RecordingObserver {
    fn on_event(&self, event: &PlanEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
