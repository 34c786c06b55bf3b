pub mod cells;
pub mod ingestion;
pub mod post;
pub mod query;
pub mod schema;

pub use cells::{Cell, CellVersion, LOCATION_FAMILY, POST_FAMILY};
pub use ingestion::{IngestStep, IngestionRecord, IngestionStatus};
pub use post::{Location, Post, PostId};
pub use query::{
    Distance, DistanceUnit, Page, SearchQuery, DEFAULT_PAGE_SIZE, DEFAULT_RADIUS_KM,
    MAX_PAGE_SIZE, MAX_RESULT_WINDOW,
};
pub use schema::{FieldType, IndexSchema};
