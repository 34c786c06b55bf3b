use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geopost_core::error::{Backend, GeopostError, Result};
use geopost_core::models::{Cell, CellVersion};
use sqlx::Row;

use super::PostgresStore;
use crate::ports::ColumnStore;

fn column_error(action: &str, e: sqlx::Error) -> GeopostError {
    GeopostError::backend(Backend::ColumnStore, format!("failed to {}: {}", action, e))
}

#[async_trait]
impl ColumnStore for PostgresStore {
    async fn put_row(
        &self,
        row_key: &str,
        cells: &[Cell],
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        // One transaction so a row never lands half-written
        let mut tx = self.pool().begin().await.map_err(|e| column_error("begin row write", e))?;

        for cell in cells {
            sqlx::query(
                r#"
                INSERT INTO cells (table_name, row_key, family, qualifier, ts, value)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (table_name, row_key, family, qualifier, ts) DO UPDATE
                SET value = EXCLUDED.value
                "#,
            )
            .bind(self.column_table())
            .bind(row_key)
            .bind(&cell.family)
            .bind(&cell.qualifier)
            .bind(timestamp)
            .bind(&cell.value)
            .execute(&mut *tx)
            .await
            .map_err(|e| column_error("write cell", e))?;
        }

        tx.commit().await.map_err(|e| column_error("commit row", e))?;
        Ok(())
    }

    async fn read_row(&self, row_key: &str) -> Result<Vec<CellVersion>> {
        let rows = sqlx::query(
            r#"
            SELECT family, qualifier, ts, value
            FROM cells
            WHERE table_name = $1 AND row_key = $2
            ORDER BY family, qualifier, ts DESC
            "#,
        )
        .bind(self.column_table())
        .bind(row_key)
        .fetch_all(self.pool())
        .await
        .map_err(|e| column_error("read row", e))?;

        Ok(rows
            .into_iter()
            .map(|row| CellVersion {
                cell: Cell {
                    family: row.get("family"),
                    qualifier: row.get("qualifier"),
                    value: row.get("value"),
                },
                timestamp: row.get("ts"),
            })
            .collect())
    }
}
