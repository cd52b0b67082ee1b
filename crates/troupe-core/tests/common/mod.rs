#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Notify;
use troupe_core::{
    models::{TaskOutput, Worker, WorkerStatus},
    observer::RecordingObserver,
    ports::{
        CollaboratorError, ReasoningClient, ReasoningReply, ReasoningRequest, TaskAssignment,
        TaskExecutor, TokenUsage, WorkerRoster,
    },
    Engine, EngineBuilder, PlanStore,
};

pub const USER: &str = "user_1";
pub const GOAL: &str = "Launch a new SaaS product";

pub fn worker(id: &str, type_id: &str, status: WorkerStatus) -> Worker {
    Worker {
        id: id.to_string(),
        user_id: USER.to_string(),
        nickname: format!("{id} nickname"),
        type_id: type_id.to_string(),
        skills: vec![type_id.to_string()],
        status,
    }
}

pub fn default_roster() -> Vec<Worker> {
    vec![
        worker("worker_pm", "product-manager", WorkerStatus::Idle),
        worker("worker_designer", "designer", WorkerStatus::Idle),
    ]
}

/// Roster returning a fixed set of workers for their owner.
pub struct FakeRoster {
    workers: Vec<Worker>,
}

impl FakeRoster {
    pub fn new(workers: Vec<Worker>) -> Self {
        Self { workers }
    }
}

#[async_trait]
impl WorkerRoster for FakeRoster {
    async fn list_workers(&self, user_id: &str) -> Result<Vec<Worker>, CollaboratorError> {
        Ok(self
            .workers
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn worker(
        &self,
        user_id: &str,
        worker_id: &str,
    ) -> Result<Option<Worker>, CollaboratorError> {
        Ok(self
            .workers
            .iter()
            .find(|w| w.user_id == user_id && w.id == worker_id)
            .cloned())
    }
}

/// Reasoning oracle answering from a queue of canned replies.
#[derive(Default)]
pub struct ScriptedReasoning {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedReasoning {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningClient for ScriptedReasoning {
    async fn reason(&self, request: ReasoningRequest) -> Result<ReasoningReply, CollaboratorError> {
        self.prompts.lock().unwrap().push(request.prompt);
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CollaboratorError::new("no scripted reply left"))?;
        Ok(ReasoningReply {
            text,
            model_id: "scripted".to_string(),
            token_usage: TokenUsage::default(),
        })
    }
}

/// One call the executor received.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub worker_ref: String,
    pub task: String,
    pub context: Option<String>,
}

/// Executor that echoes each task back, optionally failing for one worker
/// or pausing on the first call until released.
#[derive(Default)]
pub struct FakeExecutor {
    calls: Mutex<Vec<Assignment>>,
    fail_for: Option<(String, bool)>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports failure for every task given to `worker_ref`.
    pub fn failing_for(worker_ref: &str) -> Self {
        Self {
            fail_for: Some((worker_ref.to_string(), false)),
            ..Self::default()
        }
    }

    /// Errors at the transport level for every task given to `worker_ref`.
    pub fn unreachable_for(worker_ref: &str) -> Self {
        Self {
            fail_for: Some((worker_ref.to_string(), true)),
            ..Self::default()
        }
    }

    /// Signals `entered` when the first task arrives, then waits for
    /// `release` before answering.
    pub fn gated(entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((entered, release)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Assignment> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskExecutor for FakeExecutor {
    async fn assign_task(
        &self,
        _user_id: &str,
        worker_ref: &str,
        task: &str,
        context: Option<&str>,
    ) -> Result<TaskAssignment, CollaboratorError> {
        let first = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Assignment {
                worker_ref: worker_ref.to_string(),
                task: task.to_string(),
                context: context.map(str::to_string),
            });
            calls.len() == 1
        };

        if let (true, Some((entered, release))) = (first, &self.gate) {
            entered.notify_one();
            release.notified().await;
        }

        match &self.fail_for {
            Some((failing, true)) if failing == worker_ref => {
                Err(CollaboratorError::new(format!("{worker_ref} is unreachable")))
            }
            Some((failing, false)) if failing == worker_ref => {
                Ok(TaskAssignment::failed(format!("{worker_ref} gave up")))
            }
            _ => Ok(TaskAssignment::succeeded(TaskOutput::new(format!(
                "done: {task}"
            )))),
        }
    }
}

pub fn analysis_reply(sufficient: bool) -> String {
    let role_gaps = if sufficient {
        json!([])
    } else {
        json!([{ "roleId": "marketing", "reason": "launch campaign", "cost": 12000, "priority": "high" }])
    };
    let reply = json!({
        "requiredSkills": ["product strategy", "ui design"],
        "requiredRoles": [
            { "roleId": "product-manager", "reason": "owns the roadmap", "priority": "high" }
        ],
        "skillGaps": [],
        "roleGaps": role_gaps,
        "isSufficient": sufficient,
        "confidenceScore": 85,
        "warnings": []
    });
    format!("Here is my assessment:\n```json\n{reply:#}\n```\nGood luck!")
}

pub fn step(step_id: &str, worker_ref: &str, task: &str, dependencies: &[&str]) -> Value {
    json!({
        "stepId": step_id,
        "agentId": worker_ref,
        "agentName": format!("{worker_ref} nickname"),
        "agentType": "product-manager",
        "task": task,
        "dependencies": dependencies,
        "context": format!("context for {step_id}")
    })
}

pub fn main_task(task_id: &str, worker_ref: &str, title: &str) -> Value {
    json!({
        "taskId": task_id,
        "title": title,
        "description": format!("{title} in detail"),
        "assignedAgent": { "agentId": worker_ref, "agentName": worker_ref, "agentType": "designer" },
        "subtasks": ["first pass", "review"],
        "deliverables": [format!("{task_id}.md")]
    })
}

pub fn modes_reply(steps: Vec<Value>, tasks: Vec<Value>) -> String {
    json!({
        "roleRecommendation": {
            "recommended": [
                { "agentId": "worker_pm", "agentName": "Pat", "agentType": "product-manager", "reason": "roadmap" }
            ],
            "optional": []
        },
        "workflowOrchestration": { "steps": steps, "parallelizable": [] },
        "taskDecomposition": { "mainTasks": tasks, "criticalPath": [] },
        "metadata": { "complexity": "medium", "riskFactors": ["tight deadline"] }
    })
    .to_string()
}

/// The default two-step workflow and two-task decomposition.
pub fn default_modes_reply() -> String {
    modes_reply(
        vec![
            step("step_1", "worker_pm", "Outline the core features", &[]),
            step("step_2", "worker_designer", "Design the landing page", &["step_1"]),
        ],
        vec![
            main_task("task_1", "worker_pm", "Write the launch plan"),
            main_task("task_2", "worker_designer", "Produce the mockups"),
        ],
    )
}

pub struct TestEngine {
    pub engine: Engine,
    pub reasoning: Arc<ScriptedReasoning>,
    pub executor: Arc<FakeExecutor>,
    pub observer: Arc<RecordingObserver>,
}

/// Builds an in-memory engine around the given fakes.
pub async fn create_test_engine(
    roster: Vec<Worker>,
    replies: Vec<String>,
    executor: FakeExecutor,
) -> TestEngine {
    build(roster, replies, executor, None).await
}

/// Builds an engine writing through to a database in a fresh temp dir.
pub async fn create_persistent_engine(
    replies: Vec<String>,
) -> (TempDir, PlanStore, TestEngine) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = PlanStore::open(Some(temp_dir.path().join("test.db")))
        .await
        .expect("Failed to open store");
    let engine = build(default_roster(), replies, FakeExecutor::new(), Some(store.clone())).await;
    (temp_dir, store, engine)
}

async fn build(
    roster: Vec<Worker>,
    replies: Vec<String>,
    executor: FakeExecutor,
    store: Option<PlanStore>,
) -> TestEngine {
    let reasoning = Arc::new(ScriptedReasoning::new(replies));
    let executor = Arc::new(executor);
    let observer = Arc::new(RecordingObserver::new());

    let mut builder = EngineBuilder::new().with_observer(observer.clone());
    if let Some(store) = store {
        builder = builder.with_store(store);
    }
    let engine = builder
        .build(
            Arc::new(FakeRoster::new(roster)),
            reasoning.clone(),
            executor.clone(),
        )
        .await
        .expect("Failed to build engine");

    TestEngine {
        engine,
        reasoning,
        executor,
        observer,
    }
}

/// Creates a plan and drives it to READY with generated modes.
pub async fn ready_plan(test: &TestEngine) -> String {
    let plan = test
        .engine
        .planning
        .create_plan(USER, GOAL, None)
        .await
        .expect("Failed to create plan");
    test.engine
        .planning
        .analyze_capability(plan.id(), None)
        .await
        .expect("Failed to analyze");
    test.engine
        .planning
        .generate_collaboration_modes(plan.id())
        .await
        .expect("Failed to generate modes");
    plan.id().to_string()
}
