//! Backend selection and startup wiring for the server binary.

use std::sync::Arc;

use anyhow::Context;
use geopost_core::config::LayeredConfig;
use geopost_core::models::IndexSchema;
use geopost_pipeline::{Backends, Reconciler, SearchSettings};
use geopost_store::elasticsearch::ElasticsearchGeoIndex;
use geopost_store::memory::{
    MemoryColumnStore, MemoryGeoIndex, MemoryIngestionLog, MemoryObjectStore,
};
use geopost_store::ports::{ensure_index, ColumnStore, GeoIndexStore, IngestionLog, ObjectStore};
use geopost_store::postgres::{PostgresConfig, PostgresStore};
use geopost_store::s3::{S3Config, S3ObjectStore};
use tokio::task::JoinHandle;

use crate::auth::JwtService;
use crate::config::ApiConfig;
use crate::state::AppState;

/// Records examined per periodic reconciliation sweep
const RECONCILE_BATCH: usize = 100;

/// Load layered settings: defaults, then `GEOPOST_CONFIG`, then environment
pub fn load_settings(api: &ApiConfig) -> anyhow::Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = &api.config_path {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load config file {}", path))?;
    }
    let config = config.load_from_env();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Connect every backend, falling back to memory where nothing is configured
pub async fn connect_backends(
    api: &ApiConfig,
    config: &LayeredConfig,
) -> anyhow::Result<Backends> {
    let geo_index: Arc<dyn GeoIndexStore> = match &api.elasticsearch_url {
        Some(url) => {
            tracing::info!(
                url = %url,
                index = %config.index_name.value,
                "Using Elasticsearch geo-index"
            );
            Arc::new(ElasticsearchGeoIndex::new(url, config.index_name.value.clone())?)
        }
        None => {
            tracing::info!("Using in-memory geo-index (set ELASTICSEARCH_URL for Elasticsearch)");
            Arc::new(MemoryGeoIndex::new())
        }
    };

    let objects: Arc<dyn ObjectStore> = match &api.s3_bucket {
        Some(bucket) => {
            tracing::info!(bucket = %bucket, "Using S3 object store");
            Arc::new(S3ObjectStore::connect(S3Config::from_env(bucket.clone())).await)
        }
        None => {
            tracing::info!("Using in-memory object store (set GEOPOST_S3_BUCKET for S3)");
            Arc::new(MemoryObjectStore::new(config.bucket.value.clone()))
        }
    };

    let (columns, log): (Arc<dyn ColumnStore>, Arc<dyn IngestionLog>) = match &api.database_url {
        Some(url) => {
            tracing::info!("DATABASE_URL found, connecting to PostgreSQL...");
            let pg_config = PostgresConfig::new(url.clone())
                .context("Invalid DATABASE_URL")?
                .with_column_table(config.column_table.value.clone());
            let store = Arc::new(
                PostgresStore::connect(pg_config)
                    .await
                    .context("Failed to connect to PostgreSQL")?,
            );
            tracing::info!("Connected to PostgreSQL");
            (store.clone(), store)
        }
        None => {
            tracing::info!(
                "Using in-memory column store and ingestion log (set DATABASE_URL for PostgreSQL)"
            );
            (Arc::new(MemoryColumnStore::new()), Arc::new(MemoryIngestionLog::new()))
        }
    };

    Ok(Backends::new(geo_index, objects, columns, log))
}

/// Create the post index when it is missing; runs before the listener binds
pub async fn prepare_index(backends: &Backends) -> anyhow::Result<()> {
    let created = ensure_index(backends.geo_index.as_ref(), &IndexSchema::posts())
        .await
        .context("Failed to prepare geo-index")?;
    if created {
        tracing::info!("Created geo-index with geo-point mapping");
    }
    Ok(())
}

pub fn build_state(api: &ApiConfig, config: &LayeredConfig, backends: Backends) -> AppState {
    AppState::new(backends, SearchSettings::from_config(config), JwtService::new(&api.jwt_secret))
}

/// Start the periodic reconciler when an interval is configured
pub fn spawn_reconciler(
    api: &ApiConfig,
    config: &LayeredConfig,
    backends: &Backends,
) -> Option<JoinHandle<()>> {
    let every = api.reconcile_interval?;
    tracing::info!(interval_secs = every.as_secs(), "Periodic reconciliation enabled");
    let reconciler = Arc::new(Reconciler::new(backends.clone(), config.backend_timeout()));
    Some(reconciler.spawn_periodic(every, RECONCILE_BATCH))
}
