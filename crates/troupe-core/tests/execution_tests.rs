mod common;

use std::sync::{Arc, Mutex};

use common::{
    analysis_reply, create_test_engine, default_modes_reply, default_roster, main_task,
    modes_reply, ready_plan, step, FakeExecutor,
};
use tokio::sync::Notify;
use troupe_core::{
    error::{ExecutionError, PreconditionFailure},
    execution::ProgressEvent,
    models::{ExecutionMode, ExecutionOutcome, PlanStatus},
    observer::PlanEvent,
    CollabError,
};

fn replies(modes: String) -> Vec<String> {
    vec![analysis_reply(true), modes]
}

#[tokio::test]
async fn test_single_step_workflow_completes() {
    let modes = modes_reply(
        vec![step("step_1", "worker_pm", "Outline the core features", &[])],
        vec![main_task("task_1", "worker_pm", "Write the launch plan")],
    );
    let test = create_test_engine(default_roster(), replies(modes), FakeExecutor::new()).await;
    let plan_id = ready_plan(&test).await;

    let result = test
        .engine
        .execution
        .execute(&plan_id, ExecutionMode::Workflow)
        .await
        .unwrap();
    assert_eq!(result.total_units, 1);
    assert_eq!(result.completed_units, 1);
    assert!(result.is_complete());
    assert_eq!(
        result.result_for("step_1").unwrap().output.content,
        "done: Outline the core features"
    );
    assert!(result.summary.contains("## step_1"));

    let plan = test.engine.planning.get_plan(&plan_id).await.unwrap();
    assert_eq!(plan.status(), PlanStatus::Completed);
    assert_eq!(plan.execution_result(), Some(&result));
    assert_eq!(plan.updated_at(), result.completed_at);

    let calls = test.executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].worker_ref, "worker_pm");
    assert_eq!(calls[0].context.as_deref(), Some("context for step_1"));
}

#[tokio::test]
async fn test_workflow_runs_steps_in_order_and_reports_progress() {
    let test = create_test_engine(
        default_roster(),
        replies(default_modes_reply()),
        FakeExecutor::new(),
    )
    .await;
    let plan_id = ready_plan(&test).await;

    let progress = Mutex::new(Vec::new());
    let result = test
        .engine
        .execution
        .execute_with_progress(&plan_id, ExecutionMode::Workflow, |event| {
            progress.lock().unwrap().push(event);
        })
        .await
        .unwrap();
    assert_eq!(result.completed_units, 2);

    let workers: Vec<String> = test
        .executor
        .calls()
        .into_iter()
        .map(|call| call.worker_ref)
        .collect();
    assert_eq!(workers, vec!["worker_pm", "worker_designer"]);

    let percents: Vec<u8> = progress
        .into_inner()
        .unwrap()
        .into_iter()
        .map(|event| match event {
            ProgressEvent::Running { percent, .. } => percent,
            ProgressEvent::Failed { .. } => panic!("no unit should fail"),
        })
        .collect();
    assert_eq!(percents, vec![50, 100]);

    let events = test.observer.events_for(&plan_id);
    assert!(matches!(
        events.last(),
        Some(PlanEvent::ExecutionCompleted {
            completed_units: 2,
            ..
        })
    ));
}

#[tokio::test]
async fn test_unknown_dependency_fails_without_calling_executor() {
    let modes = modes_reply(
        vec![step("step_1", "worker_pm", "Outline the core features", &["step_0"])],
        vec![main_task("task_1", "worker_pm", "Write the launch plan")],
    );
    let test = create_test_engine(default_roster(), replies(modes), FakeExecutor::new()).await;
    let plan_id = ready_plan(&test).await;

    let err = test
        .engine
        .execution
        .execute(&plan_id, ExecutionMode::Workflow)
        .await
        .unwrap_err();
    match err {
        CollabError::Execution(ExecutionError::DependencyUnmet { step_id, missing }) => {
            assert_eq!(step_id, "step_1");
            assert_eq!(missing, vec!["step_0"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(test.executor.calls().is_empty());

    let plan = test.engine.planning.get_plan(&plan_id).await.unwrap();
    assert_eq!(plan.status(), PlanStatus::Failed);
    assert!(plan.execution().unwrap().error().unwrap().contains("step_0"));
}

#[tokio::test]
async fn test_later_dependency_is_not_reordered() {
    let modes = modes_reply(
        vec![
            step("step_1", "worker_pm", "Review the designs", &["step_2"]),
            step("step_2", "worker_designer", "Draw the designs", &[]),
        ],
        vec![main_task("task_1", "worker_pm", "Write the launch plan")],
    );
    let test = create_test_engine(default_roster(), replies(modes), FakeExecutor::new()).await;
    let plan_id = ready_plan(&test).await;

    let err = test
        .engine
        .execution
        .execute(&plan_id, ExecutionMode::Workflow)
        .await
        .unwrap_err();
    assert!(err.is_execution());
    assert!(test.executor.calls().is_empty());
}

#[tokio::test]
async fn test_failed_step_stops_the_run() {
    let test = create_test_engine(
        default_roster(),
        replies(default_modes_reply()),
        FakeExecutor::failing_for("worker_pm"),
    )
    .await;
    let plan_id = ready_plan(&test).await;

    let progress = Mutex::new(Vec::new());
    let err = test
        .engine
        .execution
        .execute_with_progress(&plan_id, ExecutionMode::Workflow, |event| {
            progress.lock().unwrap().push(event);
        })
        .await
        .unwrap_err();
    match &err {
        CollabError::Execution(ExecutionError::UnitFailed {
            unit,
            unit_id,
            message,
            ..
        }) => {
            assert_eq!(*unit, "step");
            assert_eq!(unit_id, "step_1");
            assert_eq!(message, "worker_pm gave up");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(test.executor.calls().len(), 1);
    assert!(matches!(
        progress.into_inner().unwrap().last(),
        Some(ProgressEvent::Failed { unit_id, .. }) if unit_id == "step_1"
    ));

    let plan = test.engine.planning.get_plan(&plan_id).await.unwrap();
    assert_eq!(plan.status(), PlanStatus::Failed);
    assert!(matches!(
        plan.execution(),
        Some(ExecutionOutcome::Failed { error, .. }) if error.contains("worker_pm gave up")
    ));
}

#[tokio::test]
async fn test_unreachable_executor_fails_the_run() {
    let test = create_test_engine(
        default_roster(),
        replies(default_modes_reply()),
        FakeExecutor::unreachable_for("worker_designer"),
    )
    .await;
    let plan_id = ready_plan(&test).await;

    let err = test
        .engine
        .execution
        .execute(&plan_id, ExecutionMode::Workflow)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("worker_designer is unreachable"));
    assert_eq!(test.executor.calls().len(), 2);

    let events = test.observer.events_for(&plan_id);
    assert!(events
        .iter()
        .any(|e| matches!(e, PlanEvent::UnitFailed { unit_id, .. } if unit_id == "step_2")));
    assert!(matches!(events.last(), Some(PlanEvent::ExecutionFailed { .. })));
}

#[tokio::test]
async fn test_task_decomposition_runs_every_task() {
    let test = create_test_engine(
        default_roster(),
        replies(default_modes_reply()),
        FakeExecutor::new(),
    )
    .await;
    let plan_id = ready_plan(&test).await;

    let result = test
        .engine
        .execution
        .execute(&plan_id, ExecutionMode::TaskDecomposition)
        .await
        .unwrap();
    assert_eq!(result.execution_mode, ExecutionMode::TaskDecomposition);
    assert_eq!(result.completed_units, 2);

    let task = result.result_for("task_2").unwrap();
    assert_eq!(task.title.as_deref(), Some("Produce the mockups"));
    assert_eq!(task.deliverables, vec!["task_2.md"]);

    let calls = test.executor.calls();
    assert!(calls[0].task.starts_with("Write the launch plan"));
    assert!(calls[0].task.contains("- review"));
    assert!(calls[0].context.is_none());
}

#[tokio::test]
async fn test_empty_workflow_cannot_start() {
    let modes = modes_reply(
        vec![],
        vec![main_task("task_1", "worker_pm", "Write the launch plan")],
    );
    let test = create_test_engine(default_roster(), replies(modes), FakeExecutor::new()).await;
    let plan_id = ready_plan(&test).await;

    let err = test
        .engine
        .execution
        .execute(&plan_id, ExecutionMode::Workflow)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CollabError::Precondition(PreconditionFailure::WorkflowEmpty)
    ));
    assert_eq!(
        test.engine.planning.get_plan(&plan_id).await.unwrap().status(),
        PlanStatus::Ready
    );

    test.engine
        .execution
        .execute(&plan_id, ExecutionMode::TaskDecomposition)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_execute_requires_ready_plan() {
    let test = create_test_engine(default_roster(), vec![], FakeExecutor::new()).await;
    let plan = test
        .engine
        .planning
        .create_plan(common::USER, common::GOAL, None)
        .await
        .unwrap();

    let err = test
        .engine
        .execution
        .execute(plan.id(), ExecutionMode::Workflow)
        .await
        .unwrap_err();
    assert!(err.is_precondition());

    let missing = test
        .engine
        .execution
        .execute("collab_missing", ExecutionMode::Workflow)
        .await
        .unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn test_completed_plan_cannot_run_again() {
    let test = create_test_engine(
        default_roster(),
        replies(default_modes_reply()),
        FakeExecutor::new(),
    )
    .await;
    let plan_id = ready_plan(&test).await;

    test.engine
        .execution
        .execute(&plan_id, ExecutionMode::Workflow)
        .await
        .unwrap();
    let err = test
        .engine
        .execution
        .execute(&plan_id, ExecutionMode::Workflow)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CollabError::Precondition(PreconditionFailure::InvalidTransition {
            status: PlanStatus::Completed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_concurrent_execute_is_refused() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let test = create_test_engine(
        default_roster(),
        replies(default_modes_reply()),
        FakeExecutor::gated(entered.clone(), release.clone()),
    )
    .await;
    let plan_id = ready_plan(&test).await;

    let first = test.engine.execution.execute(&plan_id, ExecutionMode::Workflow);
    let second = async {
        entered.notified().await;
        let status = test.engine.execution.execution_progress(&plan_id).await;
        let result = test
            .engine
            .execution
            .execute(&plan_id, ExecutionMode::TaskDecomposition)
            .await;
        release.notify_one();
        (status, result)
    };

    let (first, (status, second)) = tokio::join!(first, second);
    assert_eq!(status.unwrap().status, PlanStatus::Executing);
    assert!(matches!(
        second.unwrap_err(),
        CollabError::Precondition(PreconditionFailure::InvalidTransition {
            status: PlanStatus::Executing,
            ..
        })
    ));
    assert_eq!(first.unwrap().completed_units, 2);
    assert_eq!(test.executor.calls().len(), 2);
}

#[tokio::test]
async fn test_execution_progress_reports_outcome() {
    let test = create_test_engine(
        default_roster(),
        replies(default_modes_reply()),
        FakeExecutor::new(),
    )
    .await;
    let plan_id = ready_plan(&test).await;

    let before = test.engine.execution.execution_progress(&plan_id).await.unwrap();
    assert_eq!(before.status, PlanStatus::Ready);
    assert!(before.execution.is_none());

    test.engine
        .execution
        .execute(&plan_id, ExecutionMode::Workflow)
        .await
        .unwrap();
    let after = test.engine.execution.execution_progress(&plan_id).await.unwrap();
    assert_eq!(after.status, PlanStatus::Completed);
    assert_eq!(after.execution.unwrap().result().unwrap().completed_units, 2);
}
