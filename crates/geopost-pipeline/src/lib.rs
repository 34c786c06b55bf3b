//! Geopost Pipeline - ingestion, search and reconciliation orchestrators
//!
//! The orchestrators only see the storage ports, injected once as
//! [`Backends`], so the same code runs against memory, Elasticsearch, S3 and
//! PostgreSQL adapters.

pub mod backends;
pub mod ingest;
pub mod models;
pub mod reconcile;
pub mod search;
mod steps;

pub use backends::Backends;
pub use ingest::IngestionPipeline;
pub use models::{ImageUpload, ReconcileReport, SearchPage, SearchRequest, Submission};
pub use reconcile::Reconciler;
pub use search::{SearchPipeline, SearchSettings};
