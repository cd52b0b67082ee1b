//! Filter types for querying stored plans.

use super::PlanStatus;

/// Filter options for listing stored plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanFilter {
    /// Only plans owned by this user
    pub user_id: Option<String>,

    /// Only plans in this status
    pub status: Option<PlanStatus>,

    /// Maximum number of plans to return
    pub limit: Option<u32>,

    /// Number of plans to skip, newest first
    pub offset: Option<u32>,
}

impl PlanFilter {
    /// Create a filter for one user's plans.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use troupe_core::models::PlanFilter;
    ///
    /// let filter = PlanFilter::for_user("user_1");
    /// assert_eq!(filter.user_id.as_deref(), Some("user_1"));
    /// assert!(filter.status.is_none());
    /// ```
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: PlanStatus) -> Self {
        self.status = Some(status);
        self
    }
}
