use geopost_store::memory::{
    MemoryColumnStore, MemoryGeoIndex, MemoryIngestionLog, MemoryObjectStore,
};
use geopost_store::ports::{ColumnStore, GeoIndexStore, IngestionLog, ObjectStore};
use std::sync::Arc;

/// Shared handles to every store an ingestion touches
#[derive(Clone)]
pub struct Backends {
    pub geo_index: Arc<dyn GeoIndexStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub columns: Arc<dyn ColumnStore>,
    pub log: Arc<dyn IngestionLog>,
}

impl Backends {
    pub fn new(
        geo_index: Arc<dyn GeoIndexStore>,
        objects: Arc<dyn ObjectStore>,
        columns: Arc<dyn ColumnStore>,
        log: Arc<dyn IngestionLog>,
    ) -> Self {
        Self { geo_index, objects, columns, log }
    }

    /// All-memory backends with `bucket` provisioned
    pub fn in_memory(bucket: &str) -> Self {
        Self::new(
            Arc::new(MemoryGeoIndex::new()),
            Arc::new(MemoryObjectStore::new(bucket)),
            Arc::new(MemoryColumnStore::new()),
            Arc::new(MemoryIngestionLog::new()),
        )
    }
}
