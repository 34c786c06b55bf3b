use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geopost_core::error::GeopostError;
use serde::Serialize;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.message, details: self.details };
        (self.status, Json(body)).into_response()
    }
}

impl From<GeopostError> for ApiError {
    fn from(err: GeopostError) -> Self {
        match &err {
            GeopostError::InvalidInput { .. } => Self::bad_request(err.to_string()),
            GeopostError::NotFound { .. } => Self::not_found(err.to_string()),
            GeopostError::IngestFailed { .. } => {
                Self::internal("Failed to ingest post").with_details(err.to_string())
            }
            GeopostError::IndexSchema { .. } => {
                Self::internal("Geo-index is misconfigured").with_details(err.to_string())
            }
            GeopostError::Timeout { .. } | GeopostError::Backend { .. } => {
                Self::internal("Backend unavailable").with_details(err.to_string())
            }
            _ => Self::internal("Internal error").with_details(err.to_string()),
        }
    }
}
