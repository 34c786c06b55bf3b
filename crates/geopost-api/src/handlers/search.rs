use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue},
    response::IntoResponse,
    Extension, Json,
};

use crate::auth::AuthUser;
use crate::dto::SearchParams;
use crate::error::ApiError;
use crate::state::AppState;

pub const NEXT_OFFSET_HEADER: &str = "x-next-offset";

pub async fn search_posts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let request = params.into_request()?;

    tracing::info!(
        user = %user.username,
        lat = request.center.lat,
        lon = request.center.lon,
        range_km = ?request.radius_km,
        "Processing search request"
    );

    let page = state.search.search(&request).await.map_err(|e| {
        tracing::error!(error = %e, "Search failed");
        ApiError::from(e)
    })?;

    let mut headers = HeaderMap::new();
    if let Some(next) = page.next_offset {
        headers.insert(NEXT_OFFSET_HEADER, HeaderValue::from(next));
    }

    Ok((headers, Json(page.posts)))
}
