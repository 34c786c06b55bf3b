use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geopost_core::error::Result;
use geopost_core::models::{
    Cell, CellVersion, IndexSchema, IngestStep, IngestionRecord, Post, PostId, SearchQuery,
};

/// Port for the searchable geo-index
#[async_trait]
pub trait GeoIndexStore: Send + Sync {
    /// Whether the post index exists
    async fn index_exists(&self) -> Result<bool>;

    /// Create the post index with the given field mapping
    async fn create_index(&self, schema: &IndexSchema) -> Result<()>;

    /// Index a post under `id`; the document is searchable once this returns
    async fn put(&self, id: PostId, post: &Post) -> Result<()>;

    /// Posts within `query.radius` of `query.center`, nearest first, windowed by `query.page`
    async fn query_radius(&self, query: &SearchQuery) -> Result<Vec<Post>>;
}

/// Create the index with `schema` unless it already exists
///
/// Returns `true` when the index was created by this call.
pub async fn ensure_index(store: &dyn GeoIndexStore, schema: &IndexSchema) -> Result<bool> {
    if store.index_exists().await? {
        return Ok(false);
    }
    store.create_index(schema).await?;
    Ok(true)
}

/// Port for durable blob storage with public retrieval URLs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether the configured bucket exists
    async fn bucket_exists(&self) -> Result<bool>;

    /// Store `data` under `key`, make it publicly readable and return its URL
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String>;
}

/// Port for the wide-column audit store
#[async_trait]
pub trait ColumnStore: Send + Sync {
    /// Write every cell under `row_key` with the same `timestamp`
    async fn put_row(&self, row_key: &str, cells: &[Cell], timestamp: DateTime<Utc>)
        -> Result<()>;

    /// All cell versions stored under `row_key`
    async fn read_row(&self, row_key: &str) -> Result<Vec<CellVersion>>;
}

/// Port for the per-ingestion outbox
#[async_trait]
pub trait IngestionLog: Send + Sync {
    /// Persist a new record before any store is written
    async fn begin(&self, record: &IngestionRecord) -> Result<()>;

    /// Mark `step` as written; `post` replaces the stored snapshot
    async fn acknowledge(&self, id: PostId, step: IngestStep, post: &Post) -> Result<()>;

    /// Keep the error text of a failed step
    async fn record_failure(&self, id: PostId, step: IngestStep, error: &str) -> Result<()>;

    /// Count another delivery attempt
    async fn start_attempt(&self, id: PostId) -> Result<()>;

    /// Give up on a record that can never complete
    async fn abandon(&self, id: PostId, reason: &str) -> Result<()>;

    async fn get(&self, id: PostId) -> Result<Option<IngestionRecord>>;

    /// Records neither complete nor abandoned and untouched since `idle_before`, oldest first
    ///
    /// Records updated after the cutoff may belong to an ingestion still in flight.
    async fn unfinished(
        &self,
        limit: usize,
        idle_before: DateTime<Utc>,
    ) -> Result<Vec<IngestionRecord>>;
}
