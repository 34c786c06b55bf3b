use geopost_core::error::{Backend, GeopostError, Result};
use geopost_core::models::{IngestStep, IngestionRecord, Post, PostId};
use std::time::Duration;

use crate::backends::Backends;
use crate::models::Submission;
use crate::steps;

/// Drives one post through the object store, geo-index and column store
///
/// Writes are sequential and each success gates the next. Nothing is rolled
/// back on failure; the ingestion log keeps enough state for the
/// [`Reconciler`](crate::Reconciler) to finish the job later.
#[derive(Clone)]
pub struct IngestionPipeline {
    backends: Backends,
    timeout: Duration,
}

impl IngestionPipeline {
    pub fn new(backends: Backends, timeout: Duration) -> Self {
        Self { backends, timeout }
    }

    pub fn backends(&self) -> &Backends {
        &self.backends
    }

    /// Ingest a submission and return the id assigned to it
    pub async fn ingest(&self, submission: Submission) -> Result<PostId> {
        submission.location.validate()?;

        let id = PostId::new();
        let Submission { user, message, location, image } = submission;
        let mut post = Post::new(id, user, message, location);

        let record = IngestionRecord::begin(post.clone(), image.is_some());
        steps::bounded(Backend::IngestionLog, self.timeout, self.backends.log.begin(&record))
            .await?;

        tracing::debug!(post_id = %id, has_image = record.has_image, "Ingestion started");

        if let Some(image) = image {
            let size = image.data.len();
            let upload = steps::store_image(&self.backends, self.timeout, &post, image);
            post = self.run(&post, IngestStep::Image, upload).await?;
            tracing::debug!(post_id = %id, size, url = ?post.url, "Image stored");
        }

        self.run(&post, IngestStep::Index, async {
            steps::index_post(&self.backends, self.timeout, &post).await.map(|_| post.clone())
        })
        .await?;

        self.run(&post, IngestStep::Columns, async {
            steps::write_columns(&self.backends, self.timeout, &post).await.map(|_| post.clone())
        })
        .await?;

        tracing::info!(
            post_id = %id,
            user = %post.user,
            lat = post.location.lat,
            lon = post.location.lon,
            "Post ingested"
        );

        Ok(id)
    }

    /// Await one step, acknowledging it on success and recording it on failure
    async fn run<F>(&self, post: &Post, step: IngestStep, write: F) -> Result<Post>
    where
        F: std::future::Future<Output = Result<Post>>,
    {
        match write.await {
            Ok(written) => {
                steps::acknowledge(&self.backends, self.timeout, step, &written).await;
                Ok(written)
            }
            Err(e) => {
                tracing::error!(post_id = %post.id, step = %step, error = %e, "Ingestion step failed");
                steps::note_failure(&self.backends, self.timeout, post.id, step, &e).await;
                Err(GeopostError::IngestFailed { post_id: post.id, step, source: Box::new(e) })
            }
        }
    }
}
