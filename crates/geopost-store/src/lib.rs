//! Geopost Store - Storage ports and adapters
//!
//! This crate defines the ports the ingestion and search pipelines write
//! through (geo-index, object store, column store, ingestion log) and the
//! adapters behind them: in-memory, Elasticsearch, S3 and PostgreSQL.

pub mod elasticsearch;
pub mod memory;
pub mod ports;
pub mod postgres;
pub mod s3;

pub use ports::{ensure_index, ColumnStore, GeoIndexStore, IngestionLog, ObjectStore};
