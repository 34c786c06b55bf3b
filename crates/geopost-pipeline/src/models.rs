use geopost_core::models::{Location, Post, PostId};
use serde::{Deserialize, Serialize};

/// Image bytes attached to a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl ImageUpload {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into(), content_type: None }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A validated post submission, before an id is assigned
#[derive(Debug, Clone)]
pub struct Submission {
    pub user: String,
    pub message: String,
    pub location: Location,
    pub image: Option<ImageUpload>,
}

impl Submission {
    pub fn new(user: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
        Self { user: user.into(), message: message.into(), location, image: None }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }
}

/// Raw search parameters; unset values take the configured defaults
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRequest {
    pub center: Location,
    pub radius_km: Option<f64>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(center: Location) -> Self {
        Self { center, radius_km: None, offset: None, limit: None }
    }

    pub fn with_radius_km(mut self, km: f64) -> Self {
        self.radius_km = Some(km);
        self
    }

    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }
}

/// One page of filtered search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage {
    pub posts: Vec<Post>,
    /// Offset of the following page, set when the store returned a full page
    pub next_offset: Option<usize>,
}

/// Outcome of one reconciliation sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub examined: usize,
    pub completed: usize,
    pub abandoned: usize,
    pub still_failing: usize,
    pub failed_ids: Vec<PostId>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.still_failing == 0
    }
}
