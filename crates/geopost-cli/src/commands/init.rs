use anyhow::Result;
use geopost_api::bootstrap;
use geopost_core::config::LayeredConfig;
use geopost_pipeline::Backends;
use serde::Serialize;

use crate::output::OutputWriter;

#[derive(Serialize)]
struct InitOutput {
    index: String,
    ready: bool,
}

pub async fn execute(
    backends: &Backends,
    settings: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let index = settings.index_name.value.clone();
    let existed = backends.geo_index.index_exists().await?;
    bootstrap::prepare_index(backends).await?;

    if output.is_json() {
        return output.result(InitOutput { index, ready: true });
    }

    if existed {
        output.info(format!("Index '{}' already exists", index));
    } else {
        output.success(format!("Created index '{}' with a geo-point location mapping", index));
    }
    Ok(())
}
