//! Error types for geopost

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::models::{IngestStep, PostId};

/// Remote backend a failure originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    ObjectStore,
    GeoIndex,
    ColumnStore,
    IngestionLog,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::ObjectStore => "object-store",
            Backend::GeoIndex => "geo-index",
            Backend::ColumnStore => "column-store",
            Backend::IngestionLog => "ingestion-log",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum GeopostError {
    // Input errors
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    // Backend errors
    #[error("{backend} failure: {reason}")]
    Backend { backend: Backend, reason: String },

    #[error("{backend} did not answer within {after:?}")]
    Timeout { backend: Backend, after: Duration },

    #[error("Ingestion of post {post_id} failed at {step}: {source}")]
    IngestFailed {
        post_id: PostId,
        step: IngestStep,
        #[source]
        source: Box<GeopostError>,
    },

    // Index errors
    #[error("Index schema does not support radius queries: {reason}")]
    IndexSchema { reason: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Config file not found at {path}")]
    ConfigFileNotFound { path: PathBuf },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeopostError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput { field: field.into(), reason: reason.into() }
    }

    pub fn backend(backend: Backend, reason: impl ToString) -> Self {
        Self::Backend { backend, reason: reason.to_string() }
    }

    /// True when the caller sent something unusable, as opposed to a server-side failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Backend responsible for this failure, if any
    pub fn failed_backend(&self) -> Option<Backend> {
        match self {
            Self::Backend { backend, .. } | Self::Timeout { backend, .. } => Some(*backend),
            Self::IngestFailed { source, .. } => source.failed_backend(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GeopostError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeopostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::ObjectStore.to_string(), "object-store");
        assert_eq!(Backend::GeoIndex.to_string(), "geo-index");
        assert_eq!(Backend::ColumnStore.to_string(), "column-store");
    }

    #[test]
    fn test_ingest_failed_names_step_and_backend() {
        let post_id = PostId::new();
        let err = GeopostError::IngestFailed {
            post_id,
            step: IngestStep::Index,
            source: Box::new(GeopostError::backend(Backend::GeoIndex, "connection refused")),
        };

        let message = err.to_string();
        assert!(message.contains(&post_id.to_string()));
        assert!(message.contains("geo-index"));
        assert_eq!(err.failed_backend(), Some(Backend::GeoIndex));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_invalid_input_is_client_error() {
        let err = GeopostError::invalid("lat", "not a number");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Invalid lat: not a number");
    }
}
