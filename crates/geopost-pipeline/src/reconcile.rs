use chrono::{DateTime, Utc};
use geopost_core::error::{Backend, GeopostError, Result};
use geopost_core::models::{IngestStep, IngestionRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::backends::Backends;
use crate::models::ReconcileReport;
use crate::steps;

const LOST_IMAGE_REASON: &str = "image was never stored and its bytes are gone";

/// Idle time before a record is presumed orphaned, in multiples of the backend timeout
const GRACE_TIMEOUTS: u32 = 3;

/// Sweeps the ingestion log and re-drives writes that never landed
///
/// Only records idle for longer than the grace period are touched; a live
/// ingestion refreshes its record after every write, well within that window.
#[derive(Clone)]
pub struct Reconciler {
    backends: Backends,
    timeout: Duration,
    grace: Duration,
}

impl Reconciler {
    pub fn new(backends: Backends, timeout: Duration) -> Self {
        Self { backends, timeout, grace: timeout * GRACE_TIMEOUTS }
    }

    /// Override how long a record must sit untouched before a sweep picks it up
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    fn idle_cutoff(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.grace)
            .ok()
            .and_then(|grace| Utc::now().checked_sub_signed(grace))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Examine up to `limit` idle unfinished ingestions, oldest first
    pub async fn reconcile(&self, limit: usize) -> Result<ReconcileReport> {
        let records = steps::bounded(
            Backend::IngestionLog,
            self.timeout,
            self.backends.log.unfinished(limit, self.idle_cutoff()),
        )
        .await?;

        let mut report = ReconcileReport::default();

        for record in records {
            report.examined += 1;
            let id = record.post_id();

            if record.has_image && !record.image_stored {
                steps::bounded(
                    Backend::IngestionLog,
                    self.timeout,
                    self.backends.log.abandon(id, LOST_IMAGE_REASON),
                )
                .await?;
                tracing::warn!(post_id = %id, "Abandoned ingestion with lost image");
                report.abandoned += 1;
                continue;
            }

            match self.redrive(&record).await {
                Ok(()) => {
                    tracing::info!(post_id = %id, attempts = record.attempts + 1, "Ingestion reconciled");
                    report.completed += 1;
                }
                Err(e) => {
                    tracing::warn!(post_id = %id, error = %e, "Ingestion still failing");
                    report.still_failing += 1;
                    report.failed_ids.push(id);
                }
            }
        }

        if report.examined > 0 {
            tracing::info!(
                examined = report.examined,
                completed = report.completed,
                abandoned = report.abandoned,
                still_failing = report.still_failing,
                "Reconciliation sweep finished"
            );
        }

        Ok(report)
    }

    /// Re-issue each missing write; the same key and content make repeats harmless
    async fn redrive(&self, record: &IngestionRecord) -> Result<()> {
        let post = &record.post;

        let attempt = self.backends.log.start_attempt(post.id);
        if let Err(e) = steps::bounded(Backend::IngestionLog, self.timeout, attempt).await {
            tracing::warn!(post_id = %post.id, error = %e, "Failed to count reconcile attempt");
        }

        for step in record.missing_steps() {
            let result = match step {
                IngestStep::Index => steps::index_post(&self.backends, self.timeout, post).await,
                IngestStep::Columns => {
                    steps::write_columns(&self.backends, self.timeout, post).await
                }
                IngestStep::Image => Err(GeopostError::invalid("image", LOST_IMAGE_REASON)),
            };

            match result {
                Ok(()) => steps::acknowledge(&self.backends, self.timeout, step, post).await,
                Err(e) => {
                    steps::note_failure(&self.backends, self.timeout, post.id, step, &e).await;
                    return Err(GeopostError::IngestFailed {
                        post_id: post.id,
                        step,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(())
    }

    /// Run a sweep every `every` on a background task
    pub fn spawn_periodic(self: Arc<Self>, every: Duration, batch: usize) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // First tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.reconcile(batch).await {
                    tracing::error!(error = %e, "Reconciliation sweep failed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestionPipeline;
    use crate::models::{ImageUpload, Submission};
    use geopost_core::models::{IndexSchema, IngestionStatus, Location};
    use geopost_store::memory::{
        MemoryColumnStore, MemoryGeoIndex, MemoryIngestionLog, MemoryObjectStore,
    };
    use geopost_store::ports::{ColumnStore, GeoIndexStore, IngestionLog, ObjectStore};

    struct Fixture {
        index: MemoryGeoIndex,
        objects: MemoryObjectStore,
        columns: MemoryColumnStore,
        log: MemoryIngestionLog,
        pipeline: IngestionPipeline,
        reconciler: Reconciler,
    }

    async fn fixture() -> Fixture {
        let index = MemoryGeoIndex::new();
        index.create_index(&IndexSchema::posts()).await.unwrap();
        let objects = MemoryObjectStore::new("post-images");
        let columns = MemoryColumnStore::new();
        let log = MemoryIngestionLog::new();
        let backends = Backends::new(
            Arc::new(index.clone()),
            Arc::new(objects.clone()),
            Arc::new(columns.clone()),
            Arc::new(log.clone()),
        );

        Fixture {
            pipeline: IngestionPipeline::new(backends.clone(), Duration::from_secs(1)),
            reconciler: Reconciler::new(backends, Duration::from_secs(1))
                .with_grace(Duration::ZERO),
            index,
            objects,
            columns,
            log,
        }
    }

    fn submission() -> Submission {
        Submission::new("bob", "sunset", Location::new(40.7, -74.0).unwrap())
    }

    #[tokio::test]
    async fn test_nothing_to_do() {
        let f = fixture().await;
        f.pipeline.ingest(submission()).await.unwrap();

        let report = f.reconciler.reconcile(10).await.unwrap();
        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn test_completes_after_column_store_recovers() {
        let f = fixture().await;
        f.columns.set_available(false);
        let err = f.pipeline.ingest(submission()).await.unwrap_err();
        let GeopostError::IngestFailed { post_id, .. } = err else {
            panic!("Expected IngestFailed");
        };

        let still_down = f.reconciler.reconcile(10).await.unwrap();
        assert_eq!(still_down.still_failing, 1);
        assert_eq!(still_down.failed_ids, vec![post_id]);

        f.columns.set_available(true);
        let report = f.reconciler.reconcile(10).await.unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.completed, 1);
        assert!(report.is_clean());

        let record = f.log.get(post_id).await.unwrap().unwrap();
        assert_eq!(record.status(), IngestionStatus::Complete);
        assert_eq!(record.attempts, 3);
        assert!(!f.columns.read_row(&post_id.to_string()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redrives_index_and_columns() {
        let f = fixture().await;
        f.index.set_available(false);
        let _ = f.pipeline.ingest(submission()).await.unwrap_err();

        f.index.set_available(true);
        let report = f.reconciler.reconcile(10).await.unwrap();
        assert_eq!(report.completed, 1);
        assert_eq!(f.index.len(), 1);
        assert_eq!(f.columns.row_count(), 1);
    }

    #[tokio::test]
    async fn test_lost_image_is_abandoned() {
        let f = fixture().await;
        f.objects.set_available(false);
        let err = f
            .pipeline
            .ingest(submission().with_image(ImageUpload::new(vec![1, 2])))
            .await
            .unwrap_err();
        let GeopostError::IngestFailed { post_id, .. } = err else {
            panic!("Expected IngestFailed");
        };

        f.objects.set_available(true);
        let report = f.reconciler.reconcile(10).await.unwrap();
        assert_eq!(report.abandoned, 1);
        assert!(f.index.is_empty());

        let record = f.log.get(post_id).await.unwrap().unwrap();
        assert_eq!(record.status(), IngestionStatus::Abandoned);
        assert!(f.log.unfinished(10, Utc::now()).await.unwrap().is_empty());
    }

    /// Object store that holds every upload for a fixed delay
    struct SlowObjectStore {
        inner: MemoryObjectStore,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl ObjectStore for SlowObjectStore {
        async fn bucket_exists(&self) -> Result<bool> {
            self.inner.bucket_exists().await
        }

        async fn put_object(
            &self,
            key: &str,
            data: Vec<u8>,
            content_type: Option<&str>,
        ) -> Result<String> {
            tokio::time::sleep(self.delay).await;
            self.inner.put_object(key, data, content_type).await
        }
    }

    async fn slow_backends(log: &MemoryIngestionLog) -> Backends {
        let index = MemoryGeoIndex::new();
        index.create_index(&IndexSchema::posts()).await.unwrap();
        let objects = SlowObjectStore {
            inner: MemoryObjectStore::new("post-images"),
            delay: Duration::from_millis(300),
        };
        Backends::new(
            Arc::new(index),
            Arc::new(objects),
            Arc::new(MemoryColumnStore::new()),
            Arc::new(log.clone()),
        )
    }

    #[tokio::test]
    async fn test_sweep_skips_ingestion_in_flight() {
        let log = MemoryIngestionLog::new();
        let backends = slow_backends(&log).await;
        let pipeline = IngestionPipeline::new(backends.clone(), Duration::from_secs(1));
        let reconciler = Reconciler::new(backends, Duration::from_secs(1));
        assert_eq!(reconciler.grace(), Duration::from_secs(3));

        let upload = submission().with_image(ImageUpload::new(vec![1, 2, 3]));
        let in_flight = tokio::spawn(async move { pipeline.ingest(upload).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let report = reconciler.reconcile(10).await.unwrap();
        assert_eq!(report.examined, 0);
        assert_eq!(report.abandoned, 0);

        let post_id = in_flight.await.unwrap().unwrap();
        let record = log.get(post_id).await.unwrap().unwrap();
        assert_eq!(record.status(), IngestionStatus::Complete);
    }

    #[tokio::test]
    async fn test_ingestion_completing_after_early_abandon_ends_complete() {
        let log = MemoryIngestionLog::new();
        let backends = slow_backends(&log).await;
        let pipeline = IngestionPipeline::new(backends.clone(), Duration::from_secs(1));
        let reconciler =
            Reconciler::new(backends, Duration::from_secs(1)).with_grace(Duration::ZERO);

        let upload = submission().with_image(ImageUpload::new(vec![1, 2, 3]));
        let in_flight = tokio::spawn(async move { pipeline.ingest(upload).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Without a grace period the sweep mistakes the live upload for a lost image
        let report = reconciler.reconcile(10).await.unwrap();
        assert_eq!(report.abandoned, 1);

        let post_id = in_flight.await.unwrap().unwrap();
        let record = log.get(post_id).await.unwrap().unwrap();
        assert_eq!(record.status(), IngestionStatus::Complete);
        assert!(log.unfinished(10, Utc::now()).await.unwrap().is_empty());
    }
}
