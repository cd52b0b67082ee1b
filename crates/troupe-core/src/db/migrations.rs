//! Database schema initialization and migrations.

use crate::error::{DatabaseResultExt, Result};

/// Columns added after the first schema, with their definitions.
const ADDED_COLUMNS: [(&str, &str); 2] = [
    ("project_id", "TEXT"),
    ("created_ms", "INTEGER NOT NULL DEFAULT 0"),
];

impl super::Database {
    /// Initializes the database schema using the embedded SQL file.
    pub(super) fn initialize_schema(&self) -> Result<()> {
        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;

        self.apply_migrations()
    }

    /// Brings databases created by older versions up to date.
    fn apply_migrations(&self) -> Result<()> {
        for (column, definition) in ADDED_COLUMNS {
            if !self.has_column(column)? {
                self.connection
                    .execute(
                        &format!("ALTER TABLE collaboration_plans ADD COLUMN {column} {definition}"),
                        [],
                    )
                    .db_context("Failed to add column to collaboration_plans")?;
            }
        }

        self.connection
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_collaboration_plans_created \
                 ON collaboration_plans(created_ms DESC)",
                [],
            )
            .db_context("Failed to create creation-order index")?;

        Ok(())
    }

    fn has_column(&self, column: &str) -> Result<bool> {
        self.connection
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('collaboration_plans') WHERE name = ?1",
                [column],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
            .db_context("Failed to inspect collaboration_plans columns")
    }
}
