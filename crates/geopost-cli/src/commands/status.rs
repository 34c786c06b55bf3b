use anyhow::{Context, Result};
use geopost_core::models::PostId;
use geopost_pipeline::Backends;
use serde_json::json;

use crate::cli::StatusArgs;
use crate::output::OutputWriter;

pub async fn execute(args: &StatusArgs, backends: &Backends, output: &OutputWriter) -> Result<()> {
    let id: PostId = args.id.parse()?;
    let record = backends
        .log
        .get(id)
        .await?
        .with_context(|| format!("No ingestion recorded for post {}", id))?;

    if output.is_json() {
        return output.result(json!({
            "status": record.status(),
            "record": record,
        }));
    }

    output.section(format!("Ingestion {}", id));
    output.kv("Status", record.status());
    output.kv("User", &record.post.user);
    output.kv("Message", &record.post.message);
    let image = if record.has_image { record.image_stored.to_string() } else { "n/a".into() };
    output.kv("Image stored", image);
    output.kv("Indexed", record.indexed);
    output.kv("Columns written", record.columns_written);
    output.kv("Attempts", record.attempts);
    if let Some(error) = &record.last_error {
        output.kv("Last error", error);
    }
    Ok(())
}
