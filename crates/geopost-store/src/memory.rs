//! In-memory storage implementations for development and testing.
//!
//! These implementations use `RwLock::unwrap()` intentionally. Lock poisoning
//! only occurs when another thread panicked while holding the lock, which is
//! an unrecoverable state. For production workloads, use the Elasticsearch,
//! S3 and PostgreSQL backends.
//!
//! Every adapter can be switched offline with `set_available(false)`, after
//! which each call fails with a backend error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geopost_core::error::{Backend, GeopostError, Result};
use geopost_core::geo;
use geopost_core::models::{
    Cell, CellVersion, IndexSchema, IngestStep, IngestionRecord, IngestionStatus, Post, PostId,
    SearchQuery,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::ports::{ColumnStore, GeoIndexStore, IngestionLog, ObjectStore};

/// Online/offline switch shared by clones of an adapter
#[derive(Debug, Clone)]
struct Availability {
    backend: Backend,
    online: Arc<AtomicBool>,
}

impl Availability {
    fn new(backend: Backend) -> Self {
        Self { backend, online: Arc::new(AtomicBool::new(true)) }
    }

    fn set(&self, available: bool) {
        self.online.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GeopostError::backend(self.backend, "backend unavailable"))
        }
    }
}

/// In-memory implementation of GeoIndexStore
#[derive(Debug, Clone)]
pub struct MemoryGeoIndex {
    schema: Arc<RwLock<Option<IndexSchema>>>,
    documents: Arc<RwLock<HashMap<PostId, (u64, Post)>>>,
    next_seq: Arc<RwLock<u64>>,
    availability: Availability,
}

impl Default for MemoryGeoIndex {
    fn default() -> Self {
        Self {
            schema: Arc::default(),
            documents: Arc::default(),
            next_seq: Arc::default(),
            availability: Availability::new(Backend::GeoIndex),
        }
    }
}

impl MemoryGeoIndex {
    /// Create a new in-memory geo-index with no index created yet
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.availability.set(available);
    }

    /// Current mapping, if the index exists
    pub fn schema(&self) -> Option<IndexSchema> {
        self.schema.read().unwrap().clone()
    }

    /// Stored document for `id`, bypassing radius search
    pub fn document(&self, id: PostId) -> Option<Post> {
        self.documents.read().unwrap().get(&id).map(|(_, p)| p.clone())
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GeoIndexStore for MemoryGeoIndex {
    async fn index_exists(&self) -> Result<bool> {
        self.availability.check()?;
        Ok(self.schema.read().unwrap().is_some())
    }

    async fn create_index(&self, schema: &IndexSchema) -> Result<()> {
        self.availability.check()?;
        let mut current = self.schema.write().unwrap();
        if current.is_some() {
            return Err(GeopostError::backend(Backend::GeoIndex, "index already exists"));
        }
        *current = Some(schema.clone());
        Ok(())
    }

    async fn put(&self, id: PostId, post: &Post) -> Result<()> {
        self.availability.check()?;

        // Writing into a missing index creates it with a dynamic mapping
        self.schema.write().unwrap().get_or_insert_with(IndexSchema::dynamic);

        let mut documents = self.documents.write().unwrap();
        let mut next_seq = self.next_seq.write().unwrap();

        let seq = match documents.get(&id) {
            Some((seq, _)) => *seq,
            None => {
                let seq = *next_seq;
                *next_seq += 1;
                seq
            }
        };
        documents.insert(id, (seq, post.clone()));
        Ok(())
    }

    async fn query_radius(&self, query: &SearchQuery) -> Result<Vec<Post>> {
        self.availability.check()?;

        match self.schema.read().unwrap().as_ref() {
            None => {
                return Err(GeopostError::backend(Backend::GeoIndex, "index does not exist"))
            }
            Some(schema) if !schema.supports_radius_queries() => {
                return Err(GeopostError::IndexSchema {
                    reason: "field 'location' is not mapped as a geo-point".to_string(),
                })
            }
            Some(_) => {}
        }

        let documents = self.documents.read().unwrap();

        let mut hits: Vec<(f64, u64, &Post)> = documents
            .values()
            .filter(|(_, post)| geo::within_radius(&post.location, &query.center, &query.radius))
            .map(|(seq, post)| (geo::distance_meters(&post.location, &query.center), *seq, post))
            .collect();

        hits.sort_by(|a, b| {
            a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1))
        });

        Ok(hits
            .into_iter()
            .skip(query.page.offset)
            .take(query.page.limit)
            .map(|(_, _, post)| post.clone())
            .collect())
    }
}

/// Blob held by [`MemoryObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub public: bool,
}

/// In-memory implementation of ObjectStore
#[derive(Debug, Clone)]
pub struct MemoryObjectStore {
    bucket: String,
    bucket_present: Arc<AtomicBool>,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    availability: Availability,
}

impl MemoryObjectStore {
    /// Create a store whose bucket exists
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            bucket_present: Arc::new(AtomicBool::new(true)),
            objects: Arc::default(),
            availability: Availability::new(Backend::ObjectStore),
        }
    }

    /// Create a store whose bucket has not been provisioned
    pub fn without_bucket(bucket: impl Into<String>) -> Self {
        let store = Self::new(bucket);
        store.bucket_present.store(false, Ordering::SeqCst);
        store
    }

    pub fn set_available(&self, available: bool) {
        self.availability.set(available);
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().unwrap().get(key).cloned()
    }

    fn url_for(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn bucket_exists(&self) -> Result<bool> {
        self.availability.check()?;
        Ok(self.bucket_present.load(Ordering::SeqCst))
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String> {
        if !self.bucket_exists().await? {
            return Err(GeopostError::backend(
                Backend::ObjectStore,
                format!("bucket '{}' does not exist", self.bucket),
            ));
        }

        let object = StoredObject {
            data,
            content_type: content_type.map(String::from),
            public: true,
        };
        self.objects.write().unwrap().insert(key.to_string(), object);
        Ok(self.url_for(key))
    }
}

/// In-memory implementation of ColumnStore
#[derive(Debug, Clone)]
pub struct MemoryColumnStore {
    rows: Arc<RwLock<HashMap<String, Vec<CellVersion>>>>,
    availability: Availability,
}

impl Default for MemoryColumnStore {
    fn default() -> Self {
        Self {
            rows: Arc::default(),
            availability: Availability::new(Backend::ColumnStore),
        }
    }
}

impl MemoryColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.availability.set(available);
    }

    pub fn row_count(&self) -> usize {
        self.rows.read().unwrap().len()
    }
}

#[async_trait]
impl ColumnStore for MemoryColumnStore {
    async fn put_row(
        &self,
        row_key: &str,
        cells: &[Cell],
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.availability.check()?;
        let mut rows = self.rows.write().unwrap();
        let row = rows.entry(row_key.to_string()).or_default();

        for cell in cells {
            // Same cell at the same timestamp overwrites, as a re-applied mutation would
            row.retain(|v| {
                !(v.timestamp == timestamp
                    && v.cell.family == cell.family
                    && v.cell.qualifier == cell.qualifier)
            });
            row.push(CellVersion { cell: cell.clone(), timestamp });
        }
        Ok(())
    }

    async fn read_row(&self, row_key: &str) -> Result<Vec<CellVersion>> {
        self.availability.check()?;
        let rows = self.rows.read().unwrap();
        Ok(rows.get(row_key).cloned().unwrap_or_default())
    }
}

/// In-memory implementation of IngestionLog
#[derive(Debug, Clone)]
pub struct MemoryIngestionLog {
    records: Arc<RwLock<HashMap<PostId, IngestionRecord>>>,
    availability: Availability,
}

impl Default for MemoryIngestionLog {
    fn default() -> Self {
        Self {
            records: Arc::default(),
            availability: Availability::new(Backend::IngestionLog),
        }
    }
}

impl MemoryIngestionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.availability.set(available);
    }

    fn update<F>(&self, id: PostId, f: F) -> Result<()>
    where
        F: FnOnce(&mut IngestionRecord),
    {
        self.availability.check()?;
        let mut records = self.records.write().unwrap();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| GeopostError::NotFound { what: format!("ingestion {}", id) })?;
        f(record);
        Ok(())
    }
}

#[async_trait]
impl IngestionLog for MemoryIngestionLog {
    async fn begin(&self, record: &IngestionRecord) -> Result<()> {
        self.availability.check()?;
        self.records.write().unwrap().insert(record.post_id(), record.clone());
        Ok(())
    }

    async fn acknowledge(&self, id: PostId, step: IngestStep, post: &Post) -> Result<()> {
        self.update(id, |r| r.acknowledge(step, post))
    }

    async fn record_failure(&self, id: PostId, step: IngestStep, error: &str) -> Result<()> {
        self.update(id, |r| r.record_failure(step, error))
    }

    async fn start_attempt(&self, id: PostId) -> Result<()> {
        self.update(id, |r| {
            r.attempts += 1;
            r.updated_at = Utc::now();
        })
    }

    async fn abandon(&self, id: PostId, reason: &str) -> Result<()> {
        self.update(id, |r| r.abandon(reason))
    }

    async fn get(&self, id: PostId) -> Result<Option<IngestionRecord>> {
        self.availability.check()?;
        Ok(self.records.read().unwrap().get(&id).cloned())
    }

    async fn unfinished(
        &self,
        limit: usize,
        idle_before: DateTime<Utc>,
    ) -> Result<Vec<IngestionRecord>> {
        self.availability.check()?;
        let records = self.records.read().unwrap();

        let mut open: Vec<IngestionRecord> = records
            .values()
            .filter(|r| r.updated_at <= idle_before)
            .filter(|r| {
                !matches!(r.status(), IngestionStatus::Complete | IngestionStatus::Abandoned)
            })
            .cloned()
            .collect();

        open.sort_by_key(|r| r.created_at);
        open.truncate(limit);
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopost_core::models::{Distance, Location, Page};

    fn post_at(lat: f64, lon: f64, message: &str) -> Post {
        Post::new(PostId::new(), "alice", message, Location::new(lat, lon).unwrap())
    }

    #[tokio::test]
    async fn test_put_without_index_creates_dynamic_mapping() {
        let index = MemoryGeoIndex::new();
        let post = post_at(10.0, 10.0, "hi");

        index.put(post.id, &post).await.unwrap();
        assert!(index.index_exists().await.unwrap());

        let result = index.query_radius(&SearchQuery::new(post.location)).await;
        assert!(matches!(result, Err(GeopostError::IndexSchema { .. })));
    }

    #[tokio::test]
    async fn test_query_requires_index() {
        let index = MemoryGeoIndex::new();
        let center = Location::new(0.0, 0.0).unwrap();
        assert!(index.query_radius(&SearchQuery::new(center)).await.is_err());
    }

    #[tokio::test]
    async fn test_create_index_twice_fails() {
        let index = MemoryGeoIndex::new();
        index.create_index(&IndexSchema::posts()).await.unwrap();
        assert!(index.create_index(&IndexSchema::posts()).await.is_err());
    }

    #[tokio::test]
    async fn test_query_orders_by_distance_and_pages() {
        let index = MemoryGeoIndex::new();
        index.create_index(&IndexSchema::posts()).await.unwrap();

        let center = Location::new(0.0, 0.0).unwrap();
        let far = post_at(0.0, 1.0, "far");
        let near = post_at(0.0, 0.1, "near");
        let mid = post_at(0.0, 0.5, "mid");
        for p in [&far, &near, &mid] {
            index.put(p.id, p).await.unwrap();
        }

        let query = SearchQuery::new(center).with_radius(Distance::kilometers(500.0));
        let all = index.query_radius(&query).await.unwrap();
        let messages: Vec<_> = all.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(messages, vec!["near", "mid", "far"]);

        let second_page = index.query_radius(&query.with_page(Page::new(1, 1, 10))).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].message, "mid");
    }

    #[tokio::test]
    async fn test_put_same_id_replaces_document() {
        let index = MemoryGeoIndex::new();
        index.create_index(&IndexSchema::posts()).await.unwrap();

        let post = post_at(1.0, 1.0, "once");
        index.put(post.id, &post).await.unwrap();
        index.put(post.id, &post.clone().with_url("memory://b/k")).await.unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.document(post.id).unwrap().has_url());
    }

    #[tokio::test]
    async fn test_object_store_requires_bucket() {
        let store = MemoryObjectStore::without_bucket("images");
        let result = store.put_object("k", vec![1, 2, 3], None).await;
        assert!(matches!(
            result,
            Err(GeopostError::Backend { backend: Backend::ObjectStore, .. })
        ));
        assert!(store.object("k").is_none());
    }

    #[tokio::test]
    async fn test_object_store_marks_public() {
        let store = MemoryObjectStore::new("images");
        let url = store.put_object("abc", vec![9], Some("image/png")).await.unwrap();

        assert_eq!(url, "memory://images/abc");
        let object = store.object("abc").unwrap();
        assert!(object.public);
        assert_eq!(object.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_column_store_roundtrip() {
        let store = MemoryColumnStore::new();
        let ts = Utc::now();
        let cells = vec![Cell::new("post", "user", "alice"), Cell::new("location", "lat", "1.5")];

        store.put_row("row-1", &cells, ts).await.unwrap();
        store.put_row("row-1", &cells, ts).await.unwrap();

        let row = store.read_row("row-1").await.unwrap();
        assert_eq!(row.len(), 2);
        assert!(row.iter().all(|v| v.timestamp == ts));
        assert!(store.read_row("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = MemoryColumnStore::new();
        store.set_available(false);
        let err = store.put_row("r", &[], Utc::now()).await.unwrap_err();
        assert_eq!(err.failed_backend(), Some(Backend::ColumnStore));

        store.set_available(true);
        assert!(store.put_row("r", &[], Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_ingestion_log_lifecycle() {
        let log = MemoryIngestionLog::new();
        let post = post_at(1.0, 1.0, "hi");
        log.begin(&IngestionRecord::begin(post.clone(), false)).await.unwrap();

        assert_eq!(log.unfinished(10, Utc::now()).await.unwrap().len(), 1);

        log.acknowledge(post.id, IngestStep::Index, &post).await.unwrap();
        log.record_failure(post.id, IngestStep::Columns, "timeout").await.unwrap();
        log.start_attempt(post.id).await.unwrap();

        let record = log.get(post.id).await.unwrap().unwrap();
        assert_eq!(record.status(), IngestionStatus::PartiallyWritten);
        assert_eq!(record.attempts, 2);
        assert_eq!(record.last_error.as_deref(), Some("column-store: timeout"));

        log.acknowledge(post.id, IngestStep::Columns, &post).await.unwrap();
        assert!(log.unfinished(10, Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unfinished_skips_recently_updated() {
        let log = MemoryIngestionLog::new();
        let post = post_at(1.0, 1.0, "in flight");
        log.begin(&IngestionRecord::begin(post.clone(), true)).await.unwrap();

        let a_minute_ago = Utc::now() - chrono::Duration::seconds(60);
        assert!(log.unfinished(10, a_minute_ago).await.unwrap().is_empty());
        assert_eq!(log.unfinished(10, Utc::now()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ingestion_log_unknown_id() {
        let log = MemoryIngestionLog::new();
        let result = log.abandon(PostId::new(), "gone").await;
        assert!(matches!(result, Err(GeopostError::NotFound { .. })));
    }
}
