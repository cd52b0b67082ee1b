//! Wrappers for reporting the outcome of create and delete operations.

use std::fmt;

use crate::models::CollaborationPlan;

/// A freshly created resource, announced with its id.
pub struct CreateResult<T> {
    pub resource: T,
}

impl<T> CreateResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for CreateResult<CollaborationPlan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Created plan with ID: {}", self.resource.id())?;
        writeln!(f)?;
        write!(f, "{}", self.resource)
    }
}

/// Confirmation that a resource is gone.
pub struct DeleteResult<T> {
    pub resource: T,
}

impl<T> DeleteResult<T> {
    pub fn new(resource: T) -> Self {
        Self { resource }
    }
}

impl fmt::Display for DeleteResult<CollaborationPlan> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Deleted plan '{}' (ID: {})",
            self.resource.goal(),
            self.resource.id()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MIN_GOAL_CHARS;

    #[test]
    fn test_create_and_delete_results() {
        let plan = CollaborationPlan::create("user_1", "Launch a new SaaS product", None, MIN_GOAL_CHARS)
            .unwrap();

        let created = format!("{}", CreateResult::new(plan.clone()));
        assert!(created.starts_with(&format!("Created plan with ID: {}", plan.id())));
        assert!(created.contains("Launch a new SaaS product"));

        let deleted = format!("{}", DeleteResult::new(plan.clone()));
        assert_eq!(
            deleted,
            format!("Deleted plan 'Launch a new SaaS product' (ID: {})\n", plan.id())
        );
    }
}
