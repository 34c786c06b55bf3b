//! PostgreSQL adapter for the column store and the ingestion log

pub mod column;
pub mod config;
pub mod ingestion;
pub mod migrations;

pub use config::{ConfigError, PoolConfig, PostgresConfig};
pub use migrations::{MigrationError, MigrationManager};

use geopost_core::error::{Backend, GeopostError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// PostgreSQL-backed store
///
/// Cells live in one `cells` table keyed by the configured logical table
/// name, so several column tables can share a database.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresStore {
    /// Connect, verify the connection and run migrations when configured
    pub async fn connect(config: PostgresConfig) -> Result<Self> {
        config.validate().map_err(|e| GeopostError::ConfigInvalid {
            key: "database_url".to_string(),
            reason: e.to_string(),
        })?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .max_lifetime(config.pool.max_lifetime)
            .connect(&config.database_url)
            .await
            .map_err(|e| {
                GeopostError::backend(Backend::ColumnStore, format!("failed to connect: {}", e))
            })?;

        let store = Self { pool, config };
        store.health_check().await?;

        if store.config.run_migrations {
            store.run_migrations().await?;
        }

        Ok(store)
    }

    pub async fn run_migrations(&self) -> Result<()> {
        MigrationManager::new(self.pool.clone())
            .run_migrations()
            .await
            .map_err(|e| GeopostError::backend(Backend::ColumnStore, e))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                GeopostError::backend(Backend::ColumnStore, format!("health check failed: {}", e))
            })?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    fn column_table(&self) -> &str {
        &self.config.column_table
    }
}
