use std::env;
use std::time::Duration;

/// Secret used when `GEOPOST_JWT_SECRET` is unset; only fit for local development
pub const DEV_JWT_SECRET: &str = "geopost-dev-secret";

/// Multipart bodies above this size are rejected
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;

/// API server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub jwt_secret: String,
    pub elasticsearch_url: Option<String>,
    pub database_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub config_path: Option<String>,
    pub reconcile_interval: Option<Duration>,
    pub max_upload_bytes: usize,
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("GEOPOST_PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(8080);

        let cors_origin =
            env::var("GEOPOST_CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let jwt_secret =
            non_empty("GEOPOST_JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let reconcile_interval = env::var("GEOPOST_RECONCILE_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let max_upload_bytes = env::var("GEOPOST_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        Self {
            port,
            cors_origin,
            jwt_secret,
            elasticsearch_url: non_empty("ELASTICSEARCH_URL"),
            database_url: non_empty("DATABASE_URL"),
            s3_bucket: non_empty("GEOPOST_S3_BUCKET"),
            config_path: non_empty("GEOPOST_CONFIG"),
            reconcile_interval,
            max_upload_bytes,
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn uses_postgres(&self) -> bool {
        self.database_url.is_some()
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn uses_elasticsearch(&self) -> bool {
        self.elasticsearch_url.is_some()
    }
}
