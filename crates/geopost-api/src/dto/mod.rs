mod request;
mod response;

pub use request::SearchParams;
pub use response::{HealthResponse, IngestionResponse, PostReceived};
