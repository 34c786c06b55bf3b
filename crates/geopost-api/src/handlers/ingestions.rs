use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use geopost_core::models::PostId;

use crate::dto::IngestionResponse;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_ingestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<IngestionResponse>, ApiError> {
    let post_id: PostId = id.parse()?;

    let record = state
        .log
        .get(post_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No ingestion for post {}", post_id)))?;

    Ok(Json(record.into()))
}
