//! Markdown renderings of plans, analyses and run results.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::models::{
    CapabilityAnalysis, CollaborationPlan, ExecutionOutcome, ExecutionResult, PlanSummary,
    StoreStats, TaskDecomposition, UserPlanStats, WorkflowOrchestration,
};

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {} (ID: {})", self.goal, self.id)?;
        writeln!(f)?;
        writeln!(f, "- **Status**: {}", self.status)?;
        if let Some(project) = &self.project_id {
            writeln!(f, "- **Project**: {project}")?;
        }
        if self.workflow_steps > 0 || self.decomposed_tasks > 0 {
            writeln!(
                f,
                "- **Modes**: {} steps, {} tasks",
                self.workflow_steps, self.decomposed_tasks
            )?;
        }
        writeln!(f, "- **Created**: {}", LocalDateTime(&self.created_at))?;
        writeln!(f)
    }
}

impl fmt::Display for CollaborationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.goal())?;
        writeln!(f)?;
        writeln!(f, "- ID: {}", self.id())?;
        writeln!(f, "- Owner: {}", self.user_id())?;
        if let Some(project) = self.project_id() {
            writeln!(f, "- Project: {project}")?;
        }
        writeln!(f, "- Status: {}", self.status())?;
        writeln!(f, "- Version: {}", self.version())?;
        writeln!(f, "- Created: {}", LocalDateTime(&self.created_at()))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at()))?;

        match self.capability_analysis() {
            Some(analysis) => write!(f, "\n{analysis}")?,
            None => writeln!(f, "\nNo capability analysis yet.")?,
        }

        if let Some(recommendation) = self.role_recommendation() {
            writeln!(f, "\n## Recommended Workers")?;
            writeln!(f)?;
            for pick in &recommendation.recommended {
                writeln!(f, "- {} ({}): {}", pick.worker_name, pick.worker_type, pick.reason)?;
            }
            for pick in &recommendation.optional {
                writeln!(
                    f,
                    "- {} ({}, optional): {}",
                    pick.worker_name, pick.worker_type, pick.reason
                )?;
            }
        }

        if let Some(workflow) = self.workflow_orchestration() {
            fmt_workflow(workflow, f)?;
        }
        if let Some(decomposition) = self.task_decomposition() {
            fmt_tasks(decomposition, f)?;
        }

        if let Some(outcome) = self.execution() {
            writeln!(f)?;
            match outcome {
                ExecutionOutcome::Completed(result) => write!(f, "{result}")?,
                ExecutionOutcome::Failed { error, failed_at } => {
                    writeln!(f, "## Execution Failed")?;
                    writeln!(f)?;
                    writeln!(f, "- At: {}", LocalDateTime(failed_at))?;
                    writeln!(f, "- Error: {error}")?;
                }
            }
        }

        if !self.adjustment_history().is_empty() {
            writeln!(f, "\n## Adjustments")?;
            writeln!(f)?;
            for record in self.adjustment_history() {
                writeln!(
                    f,
                    "- v{} {} at {}",
                    record.version,
                    record.kind,
                    LocalDateTime(&record.timestamp)
                )?;
            }
        }

        Ok(())
    }
}

fn fmt_workflow(workflow: &WorkflowOrchestration, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "\n## Workflow")?;
    writeln!(f)?;
    if workflow.is_empty() {
        return writeln!(f, "No steps in this workflow.");
    }
    for (index, step) in workflow.steps.iter().enumerate() {
        let worker = if step.worker_name.is_empty() {
            &step.worker_ref
        } else {
            &step.worker_name
        };
        writeln!(f, "{}. **{}** ({worker}): {}", index + 1, step.step_id, step.task)?;
        if !step.dependencies.is_empty() {
            writeln!(f, "   - after: {}", step.dependencies.join(", "))?;
        }
    }
    Ok(())
}

fn fmt_tasks(decomposition: &TaskDecomposition, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "\n## Tasks")?;
    writeln!(f)?;
    if decomposition.is_empty() {
        return writeln!(f, "No tasks in this decomposition.");
    }
    for task in &decomposition.main_tasks {
        writeln!(
            f,
            "- **{}** {} ({})",
            task.task_id, task.title, task.assigned_worker.worker_id
        )?;
    }
    Ok(())
}

impl fmt::Display for CapabilityAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Capability Analysis")?;
        writeln!(f)?;
        let verdict = if self.is_sufficient {
            "sufficient"
        } else {
            "insufficient"
        };
        writeln!(
            f,
            "- Roster: {verdict} (confidence {:.0})",
            self.confidence_score
        )?;
        if !self.required_skills.is_empty() {
            writeln!(f, "- Required skills: {}", self.required_skills.join(", "))?;
        }

        let critical = self.critical_skill_gaps();
        if !critical.is_empty() {
            let skills: Vec<&str> = critical.iter().map(|gap| gap.skill.as_str()).collect();
            writeln!(f, "- Critical skill gaps: {}", skills.join(", "))?;
        }

        let urgent = self.high_priority_role_gaps();
        if !urgent.is_empty() {
            let roles: Vec<&str> = urgent.iter().map(|gap| gap.role_id.as_str()).collect();
            writeln!(f, "- Roles to hire first: {}", roles.join(", "))?;
        }
        if !self.role_gaps.is_empty() {
            writeln!(f, "- Total hiring cost: {:.2}", self.total_hiring_cost())?;
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            for warning in &self.warnings {
                let marker = if warning.is_critical() { "!" } else { "-" };
                writeln!(f, "{marker} {}", warning.message())?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Execution Result")?;
        writeln!(f)?;
        writeln!(f, "- Mode: {}", self.execution_mode)?;
        writeln!(
            f,
            "- Completed: {}/{} {}s",
            self.completed_units,
            self.total_units,
            self.execution_mode.unit_label()
        )?;
        writeln!(f, "- Finished: {}", LocalDateTime(&self.completed_at))?;
        writeln!(f)?;
        writeln!(f, "{}", self.summary.trim_end())
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Plan Statistics")?;
        writeln!(f)?;
        writeln!(f, "- Total plans: {}", self.total_plans)?;
        writeln!(f, "- Users: {}", self.distinct_users)?;
        for (status, count) in &self.by_status {
            writeln!(f, "- {status}: {count}")?;
        }
        Ok(())
    }
}

impl fmt::Display for UserPlanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Plans for {}", self.user_id)?;
        writeln!(f)?;
        writeln!(f, "- Total: {}", self.total)?;
        writeln!(f, "- Active: {}", self.active)?;
        writeln!(f, "- Completed: {}", self.completed)?;
        writeln!(f, "- Failed: {}", self.failed)?;
        writeln!(f, "- Draft: {}", self.draft)
    }
}
