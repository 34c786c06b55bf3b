use clap::{Args, Parser, Subcommand};
use geopost_core::config::CliConfigOverrides;
use std::path::PathBuf;

/// geopost - geotagged post ingestion and radius search
#[derive(Parser, Debug)]
#[command(name = "geopost")]
#[command(about = "Administer the geopost backends", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML configuration file
    #[arg(long, global = true, env = "GEOPOST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(flatten)]
    pub backends: BackendArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that take precedence over file and environment
#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// Geo-index name
    #[arg(long, global = true)]
    pub index: Option<String>,

    /// Image bucket name
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Radius used when a search gives none, in kilometres
    #[arg(long, global = true)]
    pub default_radius_km: Option<f64>,

    /// Per-call backend timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

impl OverrideArgs {
    pub fn to_overrides(&self) -> CliConfigOverrides {
        CliConfigOverrides {
            index_name: self.index.clone(),
            bucket: self.bucket.clone(),
            default_radius_km: self.default_radius_km,
            backend_timeout_secs: self.timeout_secs,
        }
    }
}

/// Backend endpoints; unset backends run in memory for this invocation only
#[derive(Args, Debug, Default)]
pub struct BackendArgs {
    #[arg(long, global = true, env = "ELASTICSEARCH_URL", hide_env_values = true)]
    pub elasticsearch_url: Option<String>,

    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, global = true, env = "GEOPOST_S3_BUCKET")]
    pub s3_bucket: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the geo-index with its geo-point mapping if missing
    Init,

    /// Ingest a post
    Post(PostArgs),

    /// Search posts around a point
    Search(SearchArgs),

    /// Re-drive unfinished ingestions
    Reconcile(ReconcileArgs),

    /// Show the ingestion record of a post
    Status(StatusArgs),

    /// Issue a bearer token for the API
    Token(TokenArgs),

    /// Show effective configuration and where each value came from
    Config,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub message: String,

    #[arg(long, allow_hyphen_values = true)]
    pub lat: String,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: String,

    /// Image file to attach
    #[arg(long)]
    pub image: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: String,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: String,

    /// Radius in kilometres
    #[arg(long)]
    pub range: Option<f64>,

    #[arg(long)]
    pub offset: Option<usize>,

    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Maximum ingestions to examine
    #[arg(long, default_value = "100")]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Post id
    pub id: String,
}

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long)]
    pub user: String,

    /// Signing secret shared with the API server
    #[arg(long, env = "GEOPOST_JWT_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Validity in hours
    #[arg(long, default_value = "24")]
    pub ttl_hours: i64,
}
