//! PostgreSQL configuration

use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Connection settings for the column store and ingestion log
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    /// Logical table name every cell row is written under
    pub column_table: String,
    pub pool: PoolConfig,
    /// Apply pending migrations when the store connects
    pub run_migrations: bool,
}

impl PostgresConfig {
    /// Settings for `database_url` with the `post` column table; migrations run on connect
    pub fn new(database_url: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            database_url: database_url.into(),
            column_table: "post".to_string(),
            pool: PoolConfig::default(),
            run_migrations: true,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_column_table(mut self, table: impl Into<String>) -> Self {
        self.column_table = table.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self.column_table.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "column_table".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        self.pool.validate()
    }
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "pool.max_connections".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                key: "pool.min_connections".to_string(),
                reason: format!(
                    "min_connections ({}) exceeds max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }
}
