use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geopost_core::error::{Backend, GeopostError, Result};
use geopost_core::models::{IngestStep, IngestionRecord, Post, PostId};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Postgres, Row};

use super::PostgresStore;
use crate::ports::IngestionLog;

fn log_error(action: &str, e: sqlx::Error) -> GeopostError {
    GeopostError::backend(Backend::IngestionLog, format!("failed to {}: {}", action, e))
}

fn step_column(step: IngestStep) -> &'static str {
    match step {
        IngestStep::Image => "image_stored",
        IngestStep::Index => "indexed",
        IngestStep::Columns => "columns_written",
    }
}

/// Whether the record is complete once `step` is acknowledged, over the row's old values
fn completed_by(step: IngestStep) -> &'static str {
    match step {
        IngestStep::Image => "indexed AND columns_written",
        IngestStep::Index => "columns_written AND (image_stored OR NOT has_image)",
        IngestStep::Columns => "indexed AND (image_stored OR NOT has_image)",
    }
}

fn record_from_row(row: &PgRow) -> IngestionRecord {
    let Json(post): Json<Post> = row.get("post");
    let attempts: i32 = row.get("attempts");
    IngestionRecord {
        post,
        has_image: row.get("has_image"),
        image_stored: row.get("image_stored"),
        indexed: row.get("indexed"),
        columns_written: row.get("columns_written"),
        attempts: attempts.max(0) as u32,
        last_error: row.get("last_error"),
        abandoned: row.get("abandoned"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl PostgresStore {
    /// Run an UPDATE against one ingestion, failing with NotFound when no row matched
    async fn update_ingestion(
        &self,
        id: PostId,
        query: Query<'_, Postgres, PgArguments>,
        action: &str,
    ) -> Result<()> {
        let result = query.execute(self.pool()).await.map_err(|e| log_error(action, e))?;
        if result.rows_affected() == 0 {
            return Err(GeopostError::NotFound { what: format!("ingestion {}", id) });
        }
        Ok(())
    }
}

#[async_trait]
impl IngestionLog for PostgresStore {
    async fn begin(&self, record: &IngestionRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ingestions
                (post_id, post, has_image, image_stored, indexed, columns_written,
                 attempts, last_error, abandoned, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.post_id().0)
        .bind(Json(&record.post))
        .bind(record.has_image)
        .bind(record.image_stored)
        .bind(record.indexed)
        .bind(record.columns_written)
        .bind(record.attempts as i32)
        .bind(&record.last_error)
        .bind(record.abandoned)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| log_error("record ingestion", e))?;
        Ok(())
    }

    async fn acknowledge(&self, id: PostId, step: IngestStep, post: &Post) -> Result<()> {
        // Column names come from a closed set, never from input.
        // A write that completes the record outranks an earlier abandon.
        let sql = format!(
            "UPDATE ingestions SET {} = TRUE, abandoned = abandoned AND NOT ({}), \
             post = $2, updated_at = $3 WHERE post_id = $1",
            step_column(step),
            completed_by(step)
        );
        let query = sqlx::query(&sql).bind(id.0).bind(Json(post)).bind(Utc::now());
        self.update_ingestion(id, query, "acknowledge step").await
    }

    async fn record_failure(&self, id: PostId, step: IngestStep, error: &str) -> Result<()> {
        let query = sqlx::query(
            "UPDATE ingestions SET last_error = $2, updated_at = $3 WHERE post_id = $1",
        )
        .bind(id.0)
        .bind(format!("{}: {}", step, error))
        .bind(Utc::now());
        self.update_ingestion(id, query, "record failure").await
    }

    async fn start_attempt(&self, id: PostId) -> Result<()> {
        let query = sqlx::query(
            "UPDATE ingestions SET attempts = attempts + 1, updated_at = $2 WHERE post_id = $1",
        )
        .bind(id.0)
        .bind(Utc::now());
        self.update_ingestion(id, query, "count attempt").await
    }

    async fn abandon(&self, id: PostId, reason: &str) -> Result<()> {
        let query = sqlx::query(
            "UPDATE ingestions SET abandoned = TRUE, last_error = $2, updated_at = $3 WHERE post_id = $1",
        )
        .bind(id.0)
        .bind(reason)
        .bind(Utc::now());
        self.update_ingestion(id, query, "abandon ingestion").await
    }

    async fn get(&self, id: PostId) -> Result<Option<IngestionRecord>> {
        let row = sqlx::query("SELECT * FROM ingestions WHERE post_id = $1")
            .bind(id.0)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| log_error("load ingestion", e))?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn unfinished(
        &self,
        limit: usize,
        idle_before: DateTime<Utc>,
    ) -> Result<Vec<IngestionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM ingestions
            WHERE NOT abandoned
              AND NOT (indexed AND columns_written AND (image_stored OR NOT has_image))
              AND updated_at <= $2
            ORDER BY created_at
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .bind(idle_before)
        .fetch_all(self.pool())
        .await
        .map_err(|e| log_error("list unfinished ingestions", e))?;

        Ok(rows.iter().map(record_from_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_columns_are_distinct() {
        let columns = [
            step_column(IngestStep::Image),
            step_column(IngestStep::Index),
            step_column(IngestStep::Columns),
        ];
        assert_eq!(columns, ["image_stored", "indexed", "columns_written"]);
    }

    #[test]
    fn test_completion_never_depends_on_the_step_itself() {
        for step in [IngestStep::Image, IngestStep::Index, IngestStep::Columns] {
            assert!(!completed_by(step).contains(step_column(step)));
        }
        assert!(completed_by(IngestStep::Index).contains("has_image"));
    }
}
