//! Aggregate counts over stored plans.

use serde::{Deserialize, Serialize};

use super::PlanStatus;

/// Counts over every stored plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_plans: u64,
    /// Plan count per status, in lifecycle order, including zero counts
    pub by_status: Vec<(PlanStatus, u64)>,
    pub distinct_users: u64,
}

impl StoreStats {
    pub fn count(&self, status: PlanStatus) -> u64 {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, count)| *count)
    }
}

/// Counts over one user's plans.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserPlanStats {
    pub user_id: String,
    pub total: u64,
    /// Analyzing, ready or executing
    pub active: u64,
    pub completed: u64,
    pub failed: u64,
    pub draft: u64,
}
