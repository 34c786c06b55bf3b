use chrono::{DateTime, Utc};
use geopost_core::models::{IngestionRecord, IngestionStatus, Post, PostId};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok", service: "geopost-api" }
    }
}

/// Plain-text acknowledgement of an accepted post
#[derive(Debug)]
pub struct PostReceived {
    pub post_id: PostId,
    pub message: String,
}

impl PostReceived {
    pub fn body(&self) -> String {
        format!("Post received: {}\n", self.message)
    }
}

/// Ingestion log entry as served by `GET /ingestions/{id}`
#[derive(Debug, Serialize)]
pub struct IngestionResponse {
    pub post_id: PostId,
    pub status: IngestionStatus,
    pub has_image: bool,
    pub image_stored: bool,
    pub indexed: bool,
    pub columns_written: bool,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub post: Post,
}

impl From<IngestionRecord> for IngestionResponse {
    fn from(record: IngestionRecord) -> Self {
        Self {
            post_id: record.post_id(),
            status: record.status(),
            has_image: record.has_image,
            image_stored: record.image_stored,
            indexed: record.indexed,
            columns_written: record.columns_written,
            attempts: record.attempts,
            last_error: record.last_error,
            created_at: record.created_at,
            updated_at: record.updated_at,
            post: record.post,
        }
    }
}
