//! Read-only view of the external worker roster.

use serde::{Deserialize, Serialize};

/// Availability of a worker as reported by the roster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    #[default]
    Idle,
    Working,
    Fired,
}

/// A task-performing worker owned by the roster collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    pub id: String,
    pub user_id: String,
    pub nickname: String,
    /// Role type, e.g. `product-manager`
    pub type_id: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub status: WorkerStatus,
}

impl Worker {
    /// Idle workers that are still employed can take on new work.
    pub fn can_accept_task(&self) -> bool {
        self.status == WorkerStatus::Idle
    }

    pub fn snapshot(&self) -> WorkerSnapshot {
        WorkerSnapshot {
            id: self.id.clone(),
            type_id: self.type_id.clone(),
            name: self.nickname.clone(),
            skills: self.skills.clone(),
        }
    }
}

/// The part of a worker a capability judgment was based on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerSnapshot {
    pub id: String,
    #[serde(rename = "type")]
    pub type_id: String,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
}
