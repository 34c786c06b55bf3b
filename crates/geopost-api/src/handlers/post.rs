use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Extension,
};
use geopost_core::models::Location;
use geopost_pipeline::{ImageUpload, Submission};

use crate::auth::AuthUser;
use crate::dto::PostReceived;
use crate::error::ApiError;
use crate::state::AppState;

pub const POST_ID_HEADER: &str = "x-post-id";

/// Fields of the `POST /post` multipart form
#[derive(Debug, Default)]
struct PostForm {
    message: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    image: Option<ImageUpload>,
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(&mut multipart).await?;

    let message = form.message.ok_or_else(|| {
        ApiError::bad_request("Invalid message: value is required")
            .with_details("Expected a 'message' field in the multipart form")
    })?;
    let location = Location::parse(form.lat.as_deref(), form.lon.as_deref())?;

    tracing::info!(
        user = %user.username,
        lat = location.lat,
        lon = location.lon,
        has_image = form.image.is_some(),
        "Received post"
    );

    let mut submission = Submission::new(user.username, message.clone(), location);
    if let Some(image) = form.image {
        submission = submission.with_image(image);
    }

    let post_id = state.ingest.ingest(submission).await?;
    let received = PostReceived { post_id, message };

    let mut response = received.body().into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    if let Ok(value) = HeaderValue::from_str(&received.post_id.to_string()) {
        headers.insert(POST_ID_HEADER, value);
    }
    Ok(response)
}

async fn read_form(multipart: &mut Multipart) -> Result<PostForm, ApiError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::bad_request("Failed to parse multipart form").with_details(e.to_string())
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "image" => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    ApiError::bad_request("Failed to read image data").with_details(e.to_string())
                })?;
                if !data.is_empty() {
                    let mut image = ImageUpload::new(data.to_vec());
                    image.content_type = content_type;
                    form.image = Some(image);
                }
            }
            "message" | "lat" | "lon" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{}'", name))
                        .with_details(e.to_string())
                })?;
                match name.as_str() {
                    "message" => form.message = Some(text),
                    "lat" => form.lat = Some(text),
                    _ => form.lon = Some(text),
                }
            }
            _ => {}
        }
    }

    Ok(form)
}
