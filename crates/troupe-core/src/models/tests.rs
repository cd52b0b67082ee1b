#[cfg(test)]
mod model_tests {
    use serde_json::json;

    use crate::{
        error::{PreconditionFailure, ReplyError},
        models::{
            AdjustmentSuggestion, CapabilityAnalysis, CollaborationModes, CollaborationPlan,
            ExecutionMode, ExecutionResult, Level, PlanStatus, PlanSummary, TaskOutput,
            UnitResult, Warning, WorkerSnapshot, MIN_GOAL_CHARS,
        },
    };

    fn create_test_plan() -> CollaborationPlan {
        CollaborationPlan::create("user_1", "Launch a new SaaS product", None, MIN_GOAL_CHARS)
            .unwrap()
    }

    fn roster_snapshot() -> Vec<WorkerSnapshot> {
        vec![WorkerSnapshot {
            id: "worker_pm".to_string(),
            type_id: "product-manager".to_string(),
            name: "Pat".to_string(),
            skills: vec!["requirements".to_string()],
        }]
    }

    fn analysis_reply(sufficient: bool) -> serde_json::Value {
        json!({
            "requiredSkills": ["requirements", "pricing"],
            "requiredRoles": [
                {"typeId": "product-manager", "reason": "scope the product", "priority": "high"}
            ],
            "skillGaps": [
                {"skill": "pricing", "severity": "high", "suggestion": "hire a consultant"},
                {"skill": "copywriting", "severity": "low", "suggestion": "optional"}
            ],
            "roleGaps": [
                {"typeId": "consultant", "reason": "pricing", "cost": 12000, "priority": "high"},
                {"typeId": "marketing", "reason": "launch", "cost": 8000.5, "priority": "medium", "severity": "critical"},
                {"typeId": "sales", "reason": "later", "cost": 5000, "priority": "low"}
            ],
            "isSufficient": sufficient,
            "confidenceScore": 80,
            "hiringAdvice": null,
            "warnings": [
                "market research is thin",
                {"message": "no budget owner", "severity": "high"}
            ]
        })
    }

    fn test_analysis(sufficient: bool) -> CapabilityAnalysis {
        CapabilityAnalysis::from_reply(&analysis_reply(sufficient), roster_snapshot()).unwrap()
    }

    fn modes_reply() -> serde_json::Value {
        json!({
            "roleRecommendation": {
                "recommended": [
                    {"agentId": "worker_pm", "agentName": "Pat", "agentType": "product-manager",
                     "reason": "owns scope", "importance": "critical"}
                ],
                "optional": []
            },
            "workflowOrchestration": {
                "steps": [
                    {"stepId": "step_1", "agentId": "worker_pm", "agentName": "Pat",
                     "agentType": "product-manager", "task": "Outline the core features",
                     "dependencies": [], "estimatedDuration": 300, "priority": "high"}
                ],
                "totalEstimatedDuration": 300,
                "parallelizable": []
            },
            "taskDecomposition": {
                "mainTasks": [
                    {"taskId": "task_1", "title": "Requirements", "description": "Write the PRD",
                     "assignedAgent": {"agentId": "worker_pm", "agentName": "Pat", "agentType": "product-manager"},
                     "subtasks": ["Personas", "Feature list"], "deliverables": ["PRD"]}
                ],
                "totalTasks": 1,
                "criticalPath": ["task_1"]
            },
            "metadata": {"complexity": "medium", "riskFactors": ["scope creep"]}
        })
    }

    fn ready_plan_with_modes() -> CollaborationPlan {
        let mut plan = create_test_plan();
        plan.set_capability_analysis(test_analysis(true)).unwrap();
        let modes = CollaborationModes::from_reply(&modes_reply()).unwrap();
        plan.set_collaboration_modes(
            modes.role_recommendation,
            modes.workflow_orchestration,
            modes.task_decomposition,
        )
        .unwrap();
        plan
    }

    fn test_result() -> ExecutionResult {
        let plan = ready_plan_with_modes();
        let step = &plan.workflow_orchestration().unwrap().steps[0];
        ExecutionResult {
            execution_mode: ExecutionMode::Workflow,
            total_units: 1,
            completed_units: 1,
            unit_results: vec![UnitResult {
                unit_id: step.step_id.clone(),
                title: None,
                worker: crate::models::AssignedWorker {
                    worker_id: step.worker_ref.clone(),
                    worker_name: step.worker_name.clone(),
                    worker_type: step.worker_type.clone(),
                },
                output: TaskOutput::new("feature list"),
                deliverables: vec![],
            }],
            summary: "done".to_string(),
            completed_at: jiff::Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_create_trims_goal_and_starts_as_draft() {
        let plan = CollaborationPlan::create(
            "user_1",
            "   Launch a new SaaS product   ",
            Some("project_9".to_string()),
            MIN_GOAL_CHARS,
        )
        .unwrap();

        assert!(plan.id().starts_with("collab_"));
        assert_eq!(plan.goal(), "Launch a new SaaS product");
        assert_eq!(plan.project_id(), Some("project_9"));
        assert_eq!(plan.status(), PlanStatus::Draft);
        assert_eq!(plan.version(), 1);
        assert!(plan.adjustment_history().is_empty());
        assert!(plan.validate(MIN_GOAL_CHARS).is_empty());
    }

    #[test]
    fn test_create_rejects_short_goals() {
        for goal in ["", "short", "  nine char  ", "123456789"] {
            let err = CollaborationPlan::create("user_1", goal, None, MIN_GOAL_CHARS).unwrap_err();
            assert!(err.is_validation(), "goal {goal:?} should be rejected");
        }
        // Exactly ten characters once trimmed
        assert!(CollaborationPlan::create("user_1", "  0123456789  ", None, MIN_GOAL_CHARS).is_ok());
    }

    #[test]
    fn test_create_counts_characters_not_bytes() {
        // Ten multi-byte characters
        let goal = "协同规划目标测试一二";
        assert!(CollaborationPlan::create("user_1", goal, None, MIN_GOAL_CHARS).is_ok());
        assert!(CollaborationPlan::create("user_1", "协同规划", None, MIN_GOAL_CHARS).is_err());
    }

    #[test]
    fn test_sufficient_analysis_makes_plan_ready() {
        let mut plan = create_test_plan();
        plan.set_capability_analysis(test_analysis(true)).unwrap();
        assert_eq!(plan.status(), PlanStatus::Ready);
        assert!(plan.capability_analysis().is_some());
    }

    #[test]
    fn test_insufficient_analysis_keeps_plan_draft() {
        let mut plan = create_test_plan();
        plan.set_capability_analysis(test_analysis(false)).unwrap();
        assert_eq!(plan.status(), PlanStatus::Draft);

        // A later sufficient analysis replaces the earlier one
        plan.set_capability_analysis(test_analysis(true)).unwrap();
        assert_eq!(plan.status(), PlanStatus::Ready);
        assert!(plan.capability_analysis().unwrap().is_sufficient);
    }

    #[test]
    fn test_analysis_refused_once_ready() {
        let mut plan = create_test_plan();
        plan.set_capability_analysis(test_analysis(true)).unwrap();
        let err = plan.set_capability_analysis(test_analysis(false)).unwrap_err();
        assert_eq!(
            err,
            PreconditionFailure::InvalidTransition {
                operation: "attach a capability analysis",
                status: PlanStatus::Ready,
            }
        );
        assert_eq!(plan.status(), PlanStatus::Ready);
    }

    #[test]
    fn test_mode_generation_preconditions_are_distinct() {
        let mut plan = create_test_plan();
        assert_eq!(
            plan.ensure_can_generate_modes(),
            Err(PreconditionFailure::AnalysisMissing)
        );

        plan.set_capability_analysis(test_analysis(false)).unwrap();
        assert_eq!(
            plan.ensure_can_generate_modes(),
            Err(PreconditionFailure::CapabilityInsufficient)
        );

        plan.set_capability_analysis(test_analysis(true)).unwrap();
        assert_eq!(plan.ensure_can_generate_modes(), Ok(()));
    }

    #[test]
    fn test_modes_only_set_from_ready() {
        let mut plan = create_test_plan();
        let modes = CollaborationModes::from_reply(&modes_reply()).unwrap();
        let err = plan
            .set_collaboration_modes(
                modes.role_recommendation,
                modes.workflow_orchestration,
                modes.task_decomposition,
            )
            .unwrap_err();
        assert!(matches!(err, PreconditionFailure::InvalidTransition { .. }));
        assert!(plan.workflow_orchestration().is_none());
    }

    #[test]
    fn test_set_modes_keeps_status() {
        let plan = ready_plan_with_modes();
        assert_eq!(plan.status(), PlanStatus::Ready);
        assert!(plan.can_execute());
        assert_eq!(plan.summary().workflow_steps, 1);
        assert_eq!(plan.summary().decomposed_tasks, 1);
    }

    #[test]
    fn test_start_execution_requires_non_empty_workflow() {
        let mut plan = create_test_plan();
        plan.set_capability_analysis(test_analysis(true)).unwrap();
        let mut reply = modes_reply();
        reply["workflowOrchestration"]["steps"] = json!([]);
        let modes = CollaborationModes::from_reply(&reply).unwrap();
        plan.set_collaboration_modes(
            modes.role_recommendation,
            modes.workflow_orchestration,
            modes.task_decomposition,
        )
        .unwrap();

        assert!(!plan.can_execute());
        assert_eq!(
            plan.start_execution(ExecutionMode::Workflow),
            Err(PreconditionFailure::WorkflowEmpty)
        );
        assert_eq!(plan.status(), PlanStatus::Ready);

        // The task list is still usable
        plan.start_execution(ExecutionMode::TaskDecomposition).unwrap();
        assert_eq!(plan.status(), PlanStatus::Executing);
    }

    #[test]
    fn test_start_execution_requires_ready() {
        let mut plan = create_test_plan();
        assert!(matches!(
            plan.start_execution(ExecutionMode::Workflow),
            Err(PreconditionFailure::InvalidTransition { status: PlanStatus::Draft, .. })
        ));

        let mut plan = ready_plan_with_modes();
        plan.start_execution(ExecutionMode::Workflow).unwrap();
        assert!(matches!(
            plan.start_execution(ExecutionMode::Workflow),
            Err(PreconditionFailure::InvalidTransition { status: PlanStatus::Executing, .. })
        ));
    }

    #[test]
    fn test_complete_execution_stores_result() {
        let mut plan = ready_plan_with_modes();
        assert!(plan.complete_execution(test_result()).is_err());

        plan.start_execution(ExecutionMode::Workflow).unwrap();
        plan.complete_execution(test_result()).unwrap();

        assert!(plan.is_completed());
        let result = plan.execution_result().unwrap();
        assert_eq!(result.completed_units, 1);
        assert!(result.completed_at > jiff::Timestamp::UNIX_EPOCH);
        assert_eq!(
            result.result_for("step_1").map(|r| r.output.content.as_str()),
            Some("feature list")
        );
    }

    #[test]
    fn test_fail_execution_only_from_non_terminal() {
        let mut plan = ready_plan_with_modes();
        plan.start_execution(ExecutionMode::Workflow).unwrap();
        plan.fail_execution("step step_1 (Pat) failed - boom").unwrap();

        assert!(plan.is_failed());
        assert_eq!(
            plan.execution().and_then(|outcome| outcome.error()),
            Some("step step_1 (Pat) failed - boom")
        );
        assert!(plan.execution_result().is_none());
        assert!(plan.fail_execution("again").is_err());
    }

    #[test]
    fn test_record_adjustment_bumps_version_only() {
        let mut plan = ready_plan_with_modes();
        let version = plan.record_adjustment("user_request", json!({"request": "add QA"}), None);
        let version2 = plan.record_adjustment(
            "user_request",
            json!({"request": "drop QA"}),
            Some(json!({"feasibility": "high"})),
        );

        assert_eq!(version, 2);
        assert_eq!(version2, 3);
        assert_eq!(plan.status(), PlanStatus::Ready);
        assert_eq!(plan.adjustment_history().len(), 2);
        assert_eq!(plan.adjustment_history()[0].version, 2);
        assert_eq!(plan.adjustment_history()[1].kind, "user_request");
        assert!(plan.adjustment_history()[1].ai_suggestion.is_some());
    }

    #[test]
    fn test_detail_round_trip_preserves_plan() {
        let mut plan = ready_plan_with_modes();
        plan.record_adjustment("user_request", json!({"request": "faster"}), None);

        let json = plan.to_detail_json().unwrap();
        let restored = CollaborationPlan::from_detail_json(&json).unwrap();

        assert_eq!(restored.id(), plan.id());
        assert_eq!(restored.goal(), plan.goal());
        assert_eq!(restored.status(), plan.status());
        assert_eq!(restored.capability_analysis(), plan.capability_analysis());
        assert_eq!(restored.role_recommendation(), plan.role_recommendation());
        assert_eq!(restored.workflow_orchestration(), plan.workflow_orchestration());
        assert_eq!(restored.task_decomposition(), plan.task_decomposition());
        assert_eq!(restored, plan);
    }

    #[test]
    fn test_detail_uses_camel_case_keys() {
        let mut plan = ready_plan_with_modes();
        plan.start_execution(ExecutionMode::Workflow).unwrap();
        plan.complete_execution(test_result()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&plan.to_detail_json().unwrap()).unwrap();
        assert_eq!(value["status"], "completed");
        assert_eq!(value["executionResult"]["outcome"], "completed");
        assert_eq!(value["executionResult"]["executionMode"], "workflow");
        assert_eq!(value["executionResult"]["totalSteps"], 1);
        assert_eq!(value["executionResult"]["completedSteps"], 1);
        assert_eq!(value["executionResult"]["stepResults"][0]["unitId"], "step_1");
        assert!(value["capabilityAnalysis"]["isSufficient"].as_bool().unwrap());
        assert_eq!(value["workflowOrchestration"]["steps"][0]["workerRef"], "worker_pm");
    }

    #[test]
    fn test_task_result_uses_task_keys() {
        let mut result = test_result();
        result.execution_mode = ExecutionMode::TaskDecomposition;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["totalTasks"], 1);
        assert_eq!(value["completedTasks"], 1);
        assert_eq!(value["taskResults"][0]["output"]["content"], "feature list");
        assert!(value.get("totalSteps").is_none());

        let restored: ExecutionResult = serde_json::from_value(value).unwrap();
        assert_eq!(restored, result);
    }

    #[test]
    fn test_analysis_projections() {
        let analysis = test_analysis(false);

        assert!((analysis.total_hiring_cost() - 25000.5).abs() < f64::EPSILON);
        let high: Vec<_> = analysis
            .high_priority_role_gaps()
            .iter()
            .map(|gap| gap.role_id.as_str())
            .collect();
        assert_eq!(high, vec!["consultant", "marketing"]);
        assert_eq!(analysis.critical_skill_gaps().len(), 1);
        assert!(analysis.has_critical_warnings());
        assert_eq!(analysis.warnings[0].message(), "market research is thin");
        assert_eq!(analysis.current_workers, roster_snapshot());
    }

    #[test]
    fn test_plain_warnings_are_never_critical() {
        let warning = Warning::Note("watch the budget".to_string());
        assert!(!warning.is_critical());
        let warning = Warning::Detailed {
            message: "legal exposure".to_string(),
            severity: Level::Low,
        };
        assert!(!warning.is_critical());
    }

    #[test]
    fn test_analysis_validation_lists_every_violation() {
        let reply = json!({
            "requiredSkills": "not a list",
            "requiredRoles": {},
            "isSufficient": "yes",
            "confidenceScore": 140
        });
        let err = CapabilityAnalysis::from_reply(&reply, vec![]).unwrap_err();
        match err {
            ReplyError::InvalidAnalysis { violations } => assert_eq!(violations.len(), 4),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = CapabilityAnalysis::from_reply(&json!([1, 2]), vec![]).unwrap_err();
        assert!(matches!(err, ReplyError::InvalidAnalysis { violations } if violations.len() == 1));
    }

    #[test]
    fn test_analysis_accepts_boundary_scores() {
        for score in [0, 100] {
            let mut reply = analysis_reply(true);
            reply["confidenceScore"] = json!(score);
            assert!(CapabilityAnalysis::from_reply(&reply, vec![]).is_ok());
        }
    }

    #[test]
    fn test_modes_require_all_three_representations() {
        let mut reply = modes_reply();
        reply.as_object_mut().unwrap().remove("taskDecomposition");
        reply["roleRecommendation"] = serde_json::Value::Null;

        let err = CollaborationModes::from_reply(&reply).unwrap_err();
        assert_eq!(
            err,
            ReplyError::MissingModes {
                missing: vec!["roleRecommendation", "taskDecomposition"]
            }
        );
    }

    #[test]
    fn test_modes_reject_steps_without_task() {
        let mut reply = modes_reply();
        reply["workflowOrchestration"]["steps"][0]["task"] = json!("");
        let err = CollaborationModes::from_reply(&reply).unwrap_err();
        assert!(matches!(
            err,
            ReplyError::MalformedMode { mode: "workflowOrchestration", .. }
        ));
    }

    #[test]
    fn test_modes_parse_agent_aliases_and_metadata() {
        let modes = CollaborationModes::from_reply(&modes_reply()).unwrap();
        let step = &modes.workflow_orchestration.steps[0];
        assert_eq!(step.worker_ref, "worker_pm");
        assert_eq!(step.priority, Level::High);
        assert_eq!(modes.role_recommendation.recommended[0].importance, Some(Level::High));

        let task = &modes.task_decomposition.main_tasks[0];
        assert_eq!(task.assigned_worker.worker_id, "worker_pm");
        assert_eq!(
            task.instruction(),
            "Requirements\n\nWrite the PRD\n\nSubtasks:\n- Personas\n- Feature list"
        );
        assert_eq!(modes.metadata.risk_factors, vec!["scope creep"]);
    }

    #[test]
    fn test_malformed_metadata_is_ignored() {
        let mut reply = modes_reply();
        reply["metadata"] = json!("not an object");
        let modes = CollaborationModes::from_reply(&reply).unwrap();
        assert!(modes.metadata.risk_factors.is_empty());
    }

    #[test]
    fn test_mode_durations_accept_decimal_numbers() {
        let mut reply = modes_reply();
        reply["workflowOrchestration"]["steps"][0]["estimatedDuration"] = json!(300.0);
        reply["workflowOrchestration"]["totalEstimatedDuration"] = json!(450.7);
        reply["taskDecomposition"]["mainTasks"][0]["estimatedDuration"] = json!("120");
        reply["taskDecomposition"]["totalTasks"] = json!("several");

        let modes = CollaborationModes::from_reply(&reply).unwrap();
        assert_eq!(modes.workflow_orchestration.steps[0].estimated_duration, Some(300));
        assert_eq!(modes.workflow_orchestration.total_estimated_duration, Some(450));
        assert_eq!(modes.task_decomposition.main_tasks[0].estimated_duration, Some(120));
        assert_eq!(modes.task_decomposition.total_tasks, None);
    }

    #[test]
    fn test_adjustment_suggestion_parsing() {
        let reply = json!({
            "understood": "run design before requirements",
            "feasibility": "low",
            "reasoning": "design depends on requirements",
            "suggestion": {"type": "alternative", "description": "keep the order"},
            "warnings": ["rework risk"]
        });
        let suggestion = AdjustmentSuggestion::from_reply(&reply).unwrap();
        assert_eq!(suggestion.feasibility, Level::Low);
        assert!(!suggestion.is_feasible());
        assert_eq!(suggestion.suggestion.kind, "alternative");

        let err = AdjustmentSuggestion::from_reply(&json!({"feasibility": "high"})).unwrap_err();
        assert!(matches!(err, ReplyError::MalformedSuggestion { .. }));
    }

    #[test]
    fn test_plan_summary_from_plan() {
        let plan = create_test_plan();
        let summary = PlanSummary::from(&plan);
        assert_eq!(summary.id, plan.id());
        assert_eq!(summary.user_id, "user_1");
        assert_eq!(summary.status, PlanStatus::Draft);
        assert_eq!(summary.workflow_steps, 0);
    }
}
