//! Newtype wrappers for displaying groups of plans.

use std::fmt;

use crate::models::PlanSummary;

/// A list of plan summaries, or a note that there are none.
///
/// ```rust
/// use troupe_core::{display::PlanSummaries, models::CollaborationPlan};
///
/// let plan = CollaborationPlan::create("user_1", "Launch a new SaaS product", None, 10).unwrap();
/// let output = PlanSummaries(vec![plan.summary()]).to_string();
/// assert!(output.contains("Launch a new SaaS product"));
///
/// assert_eq!(PlanSummaries(vec![]).to_string(), "No plans found.\n");
/// ```
pub struct PlanSummaries(pub Vec<PlanSummary>);

impl PlanSummaries {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanSummary> {
        self.0.iter()
    }
}

impl IntoIterator for PlanSummaries {
    type Item = PlanSummary;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PlanSummaries {
    type Item = &'a PlanSummary;
    type IntoIter = std::slice::Iter<'a, PlanSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PlanSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No plans found.");
        }
        for plan in &self.0 {
            write!(f, "{plan}")?;
        }
        Ok(())
    }
}
