//! S3 adapter for the object store

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use geopost_core::error::{Backend, GeopostError, Result};

use crate::ports::ObjectStore;

fn object_error(e: impl ToString) -> GeopostError {
    GeopostError::backend(Backend::ObjectStore, e)
}

/// Bucket and addressing settings for [`S3ObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub bucket: String,
    /// Custom endpoint for S3-compatible storage such as MinIO
    pub endpoint: Option<String>,
    /// Prefix for public object URLs; defaults to the virtual-hosted bucket URL
    pub public_base_url: Option<String>,
}

impl S3Config {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self { bucket: bucket.into(), endpoint: None, public_base_url: None }
    }

    /// Read `GEOPOST_S3_ENDPOINT` and `GEOPOST_S3_PUBLIC_BASE_URL` on top of `bucket`
    pub fn from_env(bucket: impl Into<String>) -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            bucket: bucket.into(),
            endpoint: non_empty("GEOPOST_S3_ENDPOINT"),
            public_base_url: non_empty("GEOPOST_S3_PUBLIC_BASE_URL"),
        }
    }

    /// Public URL of `key` in this bucket
    pub fn object_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, key),
        }
    }
}

/// Object store backed by an S3 bucket; uploads are public-read
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    config: S3Config,
}

impl S3ObjectStore {
    /// Build a client from the default AWS credential chain
    pub async fn connect(config: S3Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        // Path-style addressing for custom endpoints
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self { client: Client::from_conf(s3_config), config }
    }

    pub fn config(&self) -> &S3Config {
        &self.config
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn bucket_exists(&self) -> Result<bool> {
        match self.client.head_bucket().bucket(&self.config.bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().map(|e| e.is_not_found()).unwrap_or(false) {
                    Ok(false)
                } else {
                    Err(object_error(format!("bucket check failed: {}", err)))
                }
            }
        }
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String> {
        if !self.bucket_exists().await? {
            return Err(object_error(format!("bucket '{}' does not exist", self.config.bucket)));
        }

        let size = data.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(data));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request.send().await.map_err(|e| object_error(format!("upload failed: {}", e)))?;

        tracing::debug!(bucket = %self.config.bucket, key = %key, size, "Uploaded object");
        Ok(self.config.object_url(key))
    }
}
