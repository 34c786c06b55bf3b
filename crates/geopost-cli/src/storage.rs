//! Backend wiring for CLI commands.

use anyhow::Result;
use geopost_api::bootstrap;
use geopost_api::config::ApiConfig;
use geopost_core::config::LayeredConfig;
use geopost_pipeline::Backends;

use crate::cli::Cli;
use crate::output::OutputWriter;

/// Resolve layered settings: defaults < file < environment < flags
pub fn load_settings(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = &cli.config {
        config = config.load_from_file(path)?;
    }
    let mut config = config.load_from_env();
    config.update_from_cli(cli.overrides.to_overrides());
    config.validate()?;
    Ok(config)
}

fn api_config(cli: &Cli) -> ApiConfig {
    let mut api = ApiConfig::from_env();
    api.elasticsearch_url = cli.backends.elasticsearch_url.clone();
    api.database_url = cli.backends.database_url.clone();
    api.s3_bucket = cli.backends.s3_bucket.clone();
    api
}

/// Connect the configured backends, warning when any of them is ephemeral
pub async fn connect(cli: &Cli, config: &LayeredConfig, output: &OutputWriter) -> Result<Backends> {
    let api = api_config(cli);

    if !api.uses_elasticsearch() || !api.uses_postgres() {
        output.warning(
            "Some backends are in memory; their state is lost when this command exits",
        );
    }

    bootstrap::connect_backends(&api, config).await
}
