//! Plan persistence queries.

use rusqlite::{params, types::Type, OptionalExtension, Row};

use crate::{
    error::{DatabaseResultExt, Result},
    models::{CollaborationPlan, PlanFilter, PlanStatus, StoreStats, UserPlanStats},
};

const UPSERT_PLAN_SQL: &str = "INSERT INTO collaboration_plans \
     (id, user_id, project_id, goal, status, version, detail, created_at, updated_at, created_ms) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
     ON CONFLICT(id) DO UPDATE SET \
         status = excluded.status, \
         version = excluded.version, \
         detail = excluded.detail, \
         updated_at = excluded.updated_at";
const SELECT_PLAN_SQL: &str = "SELECT detail FROM collaboration_plans WHERE id = ?1";
const DELETE_PLAN_SQL: &str = "DELETE FROM collaboration_plans WHERE id = ?1 AND user_id = ?2";
const COUNT_BY_STATUS_SQL: &str =
    "SELECT status, COUNT(*) FROM collaboration_plans GROUP BY status";
const COUNT_USERS_SQL: &str = "SELECT COUNT(DISTINCT user_id) FROM collaboration_plans";
const USER_STATS_SQL: &str = "SELECT \
         COUNT(*), \
         COALESCE(SUM(status IN ('analyzing', 'ready', 'executing')), 0), \
         COALESCE(SUM(status = 'completed'), 0), \
         COALESCE(SUM(status = 'failed'), 0), \
         COALESCE(SUM(status = 'draft'), 0) \
     FROM collaboration_plans WHERE user_id = ?1";

impl super::Database {
    /// Inserts the plan or replaces the stored copy.
    ///
    /// Identity columns (owner, project, goal, creation time) never change
    /// after the first insert.
    pub fn upsert_plan(&mut self, plan: &CollaborationPlan) -> Result<()> {
        let detail = plan.to_detail_json()?;

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(
            UPSERT_PLAN_SQL,
            params![
                plan.id(),
                plan.user_id(),
                plan.project_id(),
                plan.goal(),
                plan.status().as_str(),
                plan.version(),
                detail,
                plan.created_at().to_string(),
                plan.updated_at().to_string(),
                plan.created_at().as_millisecond(),
            ],
        )
        .db_context("Failed to save plan")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Retrieves a plan by its ID.
    pub fn get_plan(&self, id: &str) -> Result<Option<CollaborationPlan>> {
        let detail: Option<String> = self
            .connection
            .query_row(SELECT_PLAN_SQL, params![id], |row| row.get(0))
            .optional()
            .db_context("Failed to query plan")?;

        detail
            .map(|json| CollaborationPlan::from_detail_json(&json))
            .transpose()
    }

    /// Lists plans matching the filter, newest first.
    pub fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<CollaborationPlan>> {
        self.query_plans(filter, "SELECT detail FROM collaboration_plans", plan_from_row)
    }

    /// Every stored plan, newest first, each decoded on its own so one
    /// unreadable row does not hide the rest. Failures carry the row id.
    pub fn load_plans(&self) -> Result<Vec<(String, Result<CollaborationPlan>)>> {
        self.query_plans(
            &PlanFilter::default(),
            "SELECT id, detail FROM collaboration_plans",
            |row| {
                let id: String = row.get(0)?;
                let detail: String = row.get(1)?;
                Ok((id, CollaborationPlan::from_detail_json(&detail)))
            },
        )
    }

    fn query_plans<T, F>(&self, filter: &PlanFilter, select: &str, map_row: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut query = String::from(select);

        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref user_id) = filter.user_id {
            conditions.push("user_id = ?");
            params_vec.push(Box::new(user_id.clone()));
        }

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params_vec.push(Box::new(status.as_str()));
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(" ORDER BY created_ms DESC, rowid DESC");

        // SQLite only accepts OFFSET after LIMIT; -1 means no limit
        if filter.limit.is_some() || filter.offset.is_some() {
            query.push_str(" LIMIT ? OFFSET ?");
            params_vec.push(Box::new(filter.limit.map_or(-1, i64::from)));
            params_vec.push(Box::new(i64::from(filter.offset.unwrap_or(0))));
        }

        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| &**b).collect();

        let rows = stmt
            .query_map(&params_refs[..], map_row)
            .db_context("Failed to query plans")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to read plan rows")?;

        Ok(rows)
    }

    /// Deletes a plan if it belongs to the user. Returns whether a row was
    /// removed.
    pub fn delete_plan(&mut self, id: &str, user_id: &str) -> Result<bool> {
        let removed = self
            .connection
            .execute(DELETE_PLAN_SQL, params![id, user_id])
            .db_context("Failed to delete plan")?;
        Ok(removed > 0)
    }

    /// Counts plans per status and distinct owners.
    pub fn stats(&self) -> Result<StoreStats> {
        let mut stmt = self
            .connection
            .prepare(COUNT_BY_STATUS_SQL)
            .db_context("Failed to prepare query")?;

        let counts = stmt
            .query_map([], |row| {
                let status_str: String = row.get(0)?;
                let status = status_str.parse::<PlanStatus>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        Type::Text,
                        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
                    )
                })?;
                Ok((status, row.get::<_, i64>(1)? as u64))
            })
            .db_context("Failed to count plans")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .db_context("Failed to read plan counts")?;

        let by_status: Vec<(PlanStatus, u64)> = PlanStatus::ALL
            .iter()
            .map(|status| {
                let count = counts
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, count)| *count);
                (*status, count)
            })
            .collect();

        let distinct_users: i64 = self
            .connection
            .query_row(COUNT_USERS_SQL, [], |row| row.get(0))
            .db_context("Failed to count users")?;

        Ok(StoreStats {
            total_plans: by_status.iter().map(|(_, count)| count).sum(),
            by_status,
            distinct_users: distinct_users as u64,
        })
    }

    /// Counts one user's plans by lifecycle group.
    pub fn user_stats(&self, user_id: &str) -> Result<UserPlanStats> {
        self.connection
            .query_row(USER_STATS_SQL, params![user_id], |row| {
                Ok(UserPlanStats {
                    user_id: user_id.to_string(),
                    total: row.get::<_, i64>(0)? as u64,
                    active: row.get::<_, i64>(1)? as u64,
                    completed: row.get::<_, i64>(2)? as u64,
                    failed: row.get::<_, i64>(3)? as u64,
                    draft: row.get::<_, i64>(4)? as u64,
                })
            })
            .db_context("Failed to compute user statistics")
    }
}

fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<CollaborationPlan> {
    let detail: String = row.get(0)?;
    CollaborationPlan::from_detail_json(&detail)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}
