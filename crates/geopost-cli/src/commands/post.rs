use anyhow::{Context, Result};
use geopost_core::config::LayeredConfig;
use geopost_core::models::Location;
use geopost_pipeline::{Backends, ImageUpload, IngestionPipeline, Submission};
use serde::Serialize;

use crate::cli::PostArgs;
use crate::output::OutputWriter;

#[derive(Serialize)]
struct PostOutput {
    id: String,
    message: String,
}

fn content_type_for(path: &std::path::Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

pub async fn execute(
    args: &PostArgs,
    backends: &Backends,
    settings: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let location = Location::parse(Some(args.lat.as_str()), Some(args.lon.as_str()))?;

    let mut submission = Submission::new(args.user.clone(), args.message.clone(), location);
    if let Some(path) = &args.image {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let mut image = ImageUpload::new(data);
        image.content_type = content_type_for(path).map(String::from);
        submission = submission.with_image(image);
    }

    let pipeline = IngestionPipeline::new(backends.clone(), settings.backend_timeout());
    let id = pipeline.ingest(submission).await?;

    if output.is_json() {
        return output.result(PostOutput { id: id.to_string(), message: args.message.clone() });
    }

    output.success(format!("Post received: {}", args.message));
    output.kv("Post id", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(content_type_for(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(content_type_for(Path::new("a.bin")), None);
        assert_eq!(content_type_for(Path::new("noext")), None);
    }
}
