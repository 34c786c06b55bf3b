//! geopost core - domain models, configuration, content filter and geodesy
//!
//! This crate holds the types shared by the store adapters, the ingestion and
//! search pipelines, and the HTTP and CLI front ends.

pub mod config;
pub mod error;
pub mod filter;
pub mod geo;
pub mod models;

pub use error::{Backend, GeopostError, Result};
pub use filter::ContentFilter;
