use std::sync::Arc;

use geopost_pipeline::{Backends, IngestionPipeline, SearchPipeline, SearchSettings};
use geopost_store::ports::IngestionLog;

use crate::auth::JwtService;

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestionPipeline,
    pub search: SearchPipeline,
    pub log: Arc<dyn IngestionLog>,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(backends: Backends, settings: SearchSettings, jwt: JwtService) -> Self {
        Self {
            ingest: IngestionPipeline::new(backends.clone(), settings.timeout),
            search: SearchPipeline::new(backends.geo_index.clone(), settings),
            log: backends.log,
            jwt,
        }
    }
}
