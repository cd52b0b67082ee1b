//! Async plan repository backed by SQLite.
//!
//! Every call opens its own [`Database`] connection on the blocking thread
//! pool, so a [`PlanStore`] is cheap to clone and safe to share.

use std::path::{Path, PathBuf};

use tokio::task;

use crate::{
    db::Database,
    error::{CollabError, Result, ResultExt},
    models::{CollaborationPlan, PlanFilter, StoreStats, UserPlanStats},
};

/// Handle to the plan database.
#[derive(Debug, Clone)]
pub struct PlanStore {
    db_path: PathBuf,
}

impl PlanStore {
    /// Opens (creating if needed) the plan database.
    ///
    /// If no path is given, uses the XDG Base Directory specification:
    /// `$XDG_DATA_HOME/troupe/troupe.db` or `~/.local/share/troupe/troupe.db`
    ///
    /// # Errors
    ///
    /// Returns `CollabError::FileSystem` if the parent directory cannot be
    /// created, `CollabError::XdgDirectory` if no data directory can be
    /// determined, and `CollabError::Database` if schema setup fails.
    pub async fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let db_path = match path {
            Some(path) => path.as_ref().to_path_buf(),
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CollabError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let store = Self { db_path };
        store.with_database(|_db| Ok(())).await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Inserts or replaces the stored copy of a plan.
    pub async fn save(&self, plan: &CollaborationPlan) -> Result<()> {
        let plan = plan.clone();
        self.with_database(move |db| db.upsert_plan(&plan)).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<CollaborationPlan>> {
        let id = id.to_string();
        self.with_database(move |db| db.get_plan(&id)).await
    }

    /// Plans matching the filter, newest first.
    pub async fn list(&self, filter: &PlanFilter) -> Result<Vec<CollaborationPlan>> {
        let filter = filter.clone();
        self.with_database(move |db| db.list_plans(&filter)).await
    }

    /// Every stored plan paired with its id, decoded row by row.
    pub async fn load_all(&self) -> Result<Vec<(String, Result<CollaborationPlan>)>> {
        self.with_database(|db| db.load_plans()).await
    }

    /// Deletes a plan owned by `user_id`. Returns false when no such plan
    /// exists for that user.
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let id = id.to_string();
        let user_id = user_id.to_string();
        self.with_database(move |db| db.delete_plan(&id, &user_id)).await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.with_database(|db| db.stats()).await
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserPlanStats> {
        let user_id = user_id.to_string();
        self.with_database(move |db| db.user_stats(&user_id)).await
    }

    async fn with_database<T, F>(&self, operation: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            operation(&mut db)
        })
        .await
        .with_context("Task join error")?
    }

    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("troupe")
            .place_data_file("troupe.db")
            .map_err(|e| CollabError::XdgDirectory(e.to_string()))
    }
}
