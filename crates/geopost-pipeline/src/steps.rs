//! Individual store writes shared by ingestion and reconciliation.

use chrono::Utc;
use geopost_core::error::{Backend, GeopostError, Result};
use geopost_core::models::cells::post_to_cells;
use geopost_core::models::{IngestStep, Post, PostId};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::backends::Backends;
use crate::models::ImageUpload;

/// Run a backend call, failing with `Timeout` once `limit` elapses
pub(crate) async fn bounded<T, F>(backend: Backend, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GeopostError::Timeout { backend, after: limit }),
    }
}

/// Store the image under the post id and return the post with its URL set
pub(crate) async fn store_image(
    backends: &Backends,
    limit: Duration,
    post: &Post,
    image: ImageUpload,
) -> Result<Post> {
    let key = post.id.to_string();
    let url = bounded(
        Backend::ObjectStore,
        limit,
        backends.objects.put_object(&key, image.data, image.content_type.as_deref()),
    )
    .await?;

    Ok(post.clone().with_url(url))
}

pub(crate) async fn index_post(backends: &Backends, limit: Duration, post: &Post) -> Result<()> {
    bounded(Backend::GeoIndex, limit, backends.geo_index.put(post.id, post)).await
}

/// Write the post's cells, stamped with the time of this write
pub(crate) async fn write_columns(backends: &Backends, limit: Duration, post: &Post) -> Result<()> {
    let row_key = post.id.to_string();
    let cells = post_to_cells(post);
    bounded(
        Backend::ColumnStore,
        limit,
        backends.columns.put_row(&row_key, &cells, Utc::now()),
    )
    .await
}

/// Mark a step as written; log failures only warn, the store write already happened
pub(crate) async fn acknowledge(
    backends: &Backends,
    limit: Duration,
    step: IngestStep,
    post: &Post,
) {
    let ack = backends.log.acknowledge(post.id, step, post);
    if let Err(e) = bounded(Backend::IngestionLog, limit, ack).await {
        tracing::warn!(
            post_id = %post.id,
            step = %step,
            error = %e,
            "Failed to acknowledge ingestion step"
        );
    }
}

pub(crate) async fn note_failure(
    backends: &Backends,
    limit: Duration,
    id: PostId,
    step: IngestStep,
    error: &GeopostError,
) {
    let text = error.to_string();
    let record = backends.log.record_failure(id, step, &text);
    if let Err(e) = bounded(Backend::IngestionLog, limit, record).await {
        tracing::warn!(post_id = %id, step = %step, error = %e, "Failed to record ingestion failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, GeopostError>(())
        };
        let result = bounded(Backend::GeoIndex, Duration::from_millis(10), slow).await;

        match result {
            Err(GeopostError::Timeout { backend, after }) => {
                assert_eq!(backend, Backend::GeoIndex);
                assert_eq!(after, Duration::from_millis(10));
            }
            other => panic!("Expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bounded_passes_result_through() {
        let value = bounded(Backend::ColumnStore, Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(value.unwrap(), 7);
    }
}
