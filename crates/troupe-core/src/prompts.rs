//! Prompt templates for the three reasoning calls.
//!
//! Each template embeds the exact reply shape the matching parser expects,
//! so a change to a reply type must be mirrored here.

use serde_json::{json, Value};

use crate::models::{CapabilityAnalysis, CollaborationPlan, Worker};

/// System role shared by every reasoning call.
pub const SYSTEM_ROLE: &str =
    "You are a collaboration planner. Reply with strict JSON only, without commentary.";

pub const CAPABILITY_ANALYSIS_PROMPT: &str = r#"You are a collaboration planning expert. Decide whether the user's goal can be delivered by their current team of workers.

# Goal
{GOAL}

# Current workers
{CURRENT_WORKERS}

# Task
1. Analyse the goal and identify the skills and roles it needs.
2. Compare those needs with the current workers.
3. Judge whether the team is sufficient, considering skill coverage, head count and quality.

# Output format (strict JSON)
```json
{
  "requiredSkills": ["skill 1", "skill 2"],
  "requiredRoles": [
    {"typeId": "product-manager", "reason": "scope requirements and plan features", "priority": "high"}
  ],
  "skillGaps": [
    {"skill": "React development", "severity": "high", "suggestion": "hire a frontend engineer"}
  ],
  "roleGaps": [
    {"typeId": "frontend-dev", "role": "Frontend engineer", "reason": "nobody on the team builds UI", "cost": 18000, "priority": "high"}
  ],
  "isSufficient": false,
  "confidenceScore": 85,
  "hiringAdvice": {
    "summary": "hire two engineers to cover the technical work",
    "priorityRoles": ["frontend-dev", "backend-dev"],
    "estimatedCost": 38000,
    "reasoning": "the goal is mostly implementation work"
  },
  "warnings": ["the product manager has little market research experience"]
}
```

# Rules
- isSufficient is true when at least 70% of the key skills are covered and every core role is present.
- confidenceScore is a number from 0 to 100.
- warnings may be present even when the team is sufficient.

# Worker types
product-manager, designer, frontend-dev, backend-dev, marketing, operations, sales,
customer-service, accountant, legal, consultant, data-analyst

Reply with the JSON only."#;

pub const COLLABORATION_MODE_PROMPT: &str = r#"You are a collaboration design expert. Produce a collaboration plan for the goal below.

# Goal
{GOAL}

# Capability analysis
{CAPABILITY_ANALYSIS}

# Available workers
{AVAILABLE_WORKERS}

# Task
Produce three complementary collaboration modes:
1. roleRecommendation: which workers to involve, and why.
2. workflowOrchestration: the order workers run in and the dependencies between steps.
3. taskDecomposition: the goal broken into tasks, each assigned to one worker.

# Output format (strict JSON)
```json
{
  "roleRecommendation": {
    "recommended": [
      {"agentId": "worker id", "agentName": "display name", "agentType": "product-manager", "reason": "owns requirements", "importance": "high"}
    ],
    "optional": [
      {"agentId": "worker id", "agentName": "display name", "agentType": "data-analyst", "reason": "nice to have", "benefit": "validates market assumptions"}
    ]
  },
  "workflowOrchestration": {
    "steps": [
      {"stepId": "step_1", "agentId": "worker id", "agentName": "display name", "agentType": "product-manager", "task": "List the core features and user stories", "dependencies": [], "estimatedDuration": 300, "priority": "high"},
      {"stepId": "step_2", "agentId": "worker id", "agentName": "display name", "agentType": "designer", "task": "Prototype the main screens", "dependencies": ["step_1"], "estimatedDuration": 400, "priority": "high", "context": "builds on the feature list"}
    ],
    "totalEstimatedDuration": 700,
    "parallelizable": []
  },
  "taskDecomposition": {
    "mainTasks": [
      {
        "taskId": "task_1",
        "title": "Requirements analysis",
        "description": "Describe the core features",
        "assignedAgent": {"agentId": "worker id", "agentName": "display name", "agentType": "product-manager"},
        "subtasks": ["Define personas", "List core features", "Set the MVP scope"],
        "deliverables": ["PRD", "feature list"],
        "estimatedDuration": 300
      }
    ],
    "totalTasks": 1,
    "criticalPath": ["task_1"]
  },
  "metadata": {
    "complexity": "medium",
    "estimatedTotalTime": 700,
    "riskFactors": ["technology choices may affect the schedule"],
    "successMetrics": ["a complete requirements document"]
  }
}
```

# Principles
- Steps must follow a professional order: product, then design, then development.
- Steps only depend on steps listed before them.
- Use only the worker ids listed above.
- estimatedDuration is in seconds.

Reply with the JSON only."#;

pub const ADJUSTMENT_PROMPT: &str = r#"You are a collaboration optimisation assistant. Judge the user's requested change to the plan below.

# Current plan
{CURRENT_PLAN}

# Requested change
{REQUEST}

# Task
1. Restate what the user wants.
2. Judge whether the change is sound given the dependencies and professional practice.
3. Offer the change, an alternative, or a warning.

# Output format (strict JSON)
```json
{
  "understood": "the user wants design to run before requirements",
  "feasibility": "low",
  "reasoning": "design depends on the requirements",
  "suggestion": {
    "type": "alternative",
    "description": "keep the order but invite the designer to the requirements review",
    "adjustedPlan": {"workflowOrchestration": {"steps": []}}
  },
  "warnings": ["skipping requirements risks rework"]
}
```

# Feasibility
- high: can be applied directly with no risk.
- medium: a trade-off with acceptable risk.
- low: not recommended.

Reply with the JSON only."#;

/// Builds the capability-analysis prompt from the goal and roster.
pub fn capability_analysis(goal: &str, workers: &[Worker]) -> String {
    let snapshot: Vec<_> = workers.iter().map(Worker::snapshot).collect();
    CAPABILITY_ANALYSIS_PROMPT
        .replace("{GOAL}", goal)
        .replace("{CURRENT_WORKERS}", &pretty(&json!(snapshot)))
}

/// Builds the mode-generation prompt from the goal, the analysis and the
/// workers available for new work.
pub fn collaboration_modes(goal: &str, analysis: &CapabilityAnalysis, available: &[Worker]) -> String {
    let workers: Vec<Value> = available
        .iter()
        .map(|worker| {
            json!({
                "agentId": worker.id,
                "agentName": worker.nickname,
                "agentType": worker.type_id,
                "skills": worker.skills,
            })
        })
        .collect();

    COLLABORATION_MODE_PROMPT
        .replace("{GOAL}", goal)
        .replace("{CAPABILITY_ANALYSIS}", &pretty(&json!(analysis)))
        .replace("{AVAILABLE_WORKERS}", &pretty(&Value::Array(workers)))
}

/// Builds the adjustment prompt from the plan detail and the request text.
pub fn adjustment(plan: &CollaborationPlan, request: &str) -> String {
    ADJUSTMENT_PROMPT
        .replace("{CURRENT_PLAN}", &pretty(&json!(plan)))
        .replace("{REQUEST}", request)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
