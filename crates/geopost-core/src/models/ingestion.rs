use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Post, PostId};

/// One remote write in the ingestion sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngestStep {
    Image,
    Index,
    Columns,
}

impl fmt::Display for IngestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStep::Image => "image-store",
            IngestStep::Index => "geo-index",
            IngestStep::Columns => "column-store",
        };
        f.write_str(name)
    }
}

/// Consistency state of a post across the backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IngestionStatus {
    /// Logged, nothing acknowledged yet
    Pending,
    /// Some but not all required writes acknowledged
    PartiallyWritten,
    /// Every required write acknowledged
    Complete,
    /// Can never complete (image bytes were lost)
    Abandoned,
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestionStatus::Pending => "pending",
            IngestionStatus::PartiallyWritten => "partially-written",
            IngestionStatus::Complete => "complete",
            IngestionStatus::Abandoned => "abandoned",
        };
        f.write_str(name)
    }
}

/// Outbox entry tracking one ingestion across the three stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRecord {
    pub post: Post,
    pub has_image: bool,
    pub image_stored: bool,
    pub indexed: bool,
    pub columns_written: bool,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub abandoned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IngestionRecord {
    /// Fresh record for a post about to be written
    pub fn begin(post: Post, has_image: bool) -> Self {
        let now = Utc::now();
        Self {
            post,
            has_image,
            image_stored: false,
            indexed: false,
            columns_written: false,
            attempts: 1,
            last_error: None,
            abandoned: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn post_id(&self) -> PostId {
        self.post.id
    }

    pub fn status(&self) -> IngestionStatus {
        if self.abandoned {
            return IngestionStatus::Abandoned;
        }

        let image_done = !self.has_image || self.image_stored;
        if image_done && self.indexed && self.columns_written {
            return IngestionStatus::Complete;
        }

        if self.image_stored || self.indexed || self.columns_written {
            IngestionStatus::PartiallyWritten
        } else {
            IngestionStatus::Pending
        }
    }

    pub fn is_acknowledged(&self, step: IngestStep) -> bool {
        match step {
            IngestStep::Image => self.image_stored,
            IngestStep::Index => self.indexed,
            IngestStep::Columns => self.columns_written,
        }
    }

    /// Record a successful write; `post` carries any field the step filled in (the image URL)
    ///
    /// A write that completes the record clears an earlier abandon.
    pub fn acknowledge(&mut self, step: IngestStep, post: &Post) {
        match step {
            IngestStep::Image => self.image_stored = true,
            IngestStep::Index => self.indexed = true,
            IngestStep::Columns => self.columns_written = true,
        }
        if self.missing_steps().is_empty() {
            self.abandoned = false;
        }
        self.post = post.clone();
        self.updated_at = Utc::now();
    }

    pub fn record_failure(&mut self, step: IngestStep, error: &str) {
        self.last_error = Some(format!("{}: {}", step, error));
        self.updated_at = Utc::now();
    }

    pub fn abandon(&mut self, reason: &str) {
        self.abandoned = true;
        self.last_error = Some(reason.to_string());
        self.updated_at = Utc::now();
    }

    /// Steps still owed, in write order
    pub fn missing_steps(&self) -> Vec<IngestStep> {
        let mut steps = Vec::new();
        if self.has_image && !self.image_stored {
            steps.push(IngestStep::Image);
        }
        if !self.indexed {
            steps.push(IngestStep::Index);
        }
        if !self.columns_written {
            steps.push(IngestStep::Columns);
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Location;

    fn record(has_image: bool) -> IngestionRecord {
        let post = Post::new(PostId::new(), "alice", "hi", Location::new(1.0, 2.0).unwrap());
        IngestionRecord::begin(post, has_image)
    }

    #[test]
    fn test_status_transitions_without_image() {
        let mut rec = record(false);
        assert_eq!(rec.status(), IngestionStatus::Pending);

        let post = rec.post.clone();
        rec.acknowledge(IngestStep::Index, &post);
        assert_eq!(rec.status(), IngestionStatus::PartiallyWritten);

        rec.acknowledge(IngestStep::Columns, &post);
        assert_eq!(rec.status(), IngestionStatus::Complete);
        assert!(rec.missing_steps().is_empty());
    }

    #[test]
    fn test_image_required_for_completion() {
        let mut rec = record(true);
        let post = rec.post.clone();
        rec.acknowledge(IngestStep::Index, &post);
        rec.acknowledge(IngestStep::Columns, &post);

        assert_eq!(rec.status(), IngestionStatus::PartiallyWritten);
        assert_eq!(rec.missing_steps(), vec![IngestStep::Image]);
    }

    #[test]
    fn test_acknowledge_keeps_url() {
        let mut rec = record(true);
        let with_url = rec.post.clone().with_url("https://cdn/x");
        rec.acknowledge(IngestStep::Image, &with_url);

        assert!(rec.post.has_url());
        assert_eq!(rec.missing_steps(), vec![IngestStep::Index, IngestStep::Columns]);
    }

    #[test]
    fn test_abandon_wins() {
        let mut rec = record(true);
        rec.record_failure(IngestStep::Image, "bucket missing");
        assert_eq!(rec.last_error.as_deref(), Some("image-store: bucket missing"));

        rec.abandon("image bytes lost");
        assert_eq!(rec.status(), IngestionStatus::Abandoned);
        assert_eq!(rec.status().to_string(), "abandoned");

        // Partial progress keeps it abandoned
        let post = rec.post.clone();
        rec.acknowledge(IngestStep::Index, &post);
        assert_eq!(rec.status(), IngestionStatus::Abandoned);
    }

    #[test]
    fn test_completing_write_clears_abandon() {
        let mut rec = record(true);
        rec.abandon("image bytes lost");

        let post = rec.post.clone().with_url("https://cdn/x");
        rec.acknowledge(IngestStep::Image, &post);
        rec.acknowledge(IngestStep::Index, &post);
        assert_eq!(rec.status(), IngestionStatus::Abandoned);

        rec.acknowledge(IngestStep::Columns, &post);
        assert_eq!(rec.status(), IngestionStatus::Complete);
    }
}
