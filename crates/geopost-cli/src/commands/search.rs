use anyhow::Result;
use geopost_core::config::LayeredConfig;
use geopost_core::geo::distance_meters;
use geopost_core::models::Location;
use geopost_pipeline::{Backends, SearchPipeline, SearchRequest, SearchSettings};
use tabled::Tabled;

use crate::cli::SearchArgs;
use crate::output::OutputWriter;

#[derive(Tabled)]
struct PostRow {
    #[tabled(rename = "Distance (km)")]
    distance_km: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Image")]
    url: String,
    #[tabled(rename = "ID")]
    id: String,
}

pub async fn execute(
    args: &SearchArgs,
    backends: &Backends,
    settings: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let center = Location::parse(Some(args.lat.as_str()), Some(args.lon.as_str()))?;
    let request = SearchRequest {
        center,
        radius_km: args.range,
        offset: args.offset,
        limit: args.limit,
    };

    let pipeline =
        SearchPipeline::new(backends.geo_index.clone(), SearchSettings::from_config(settings));
    let page = pipeline.search(&request).await?;

    if output.is_json() {
        return output.result(&page);
    }

    let rows: Vec<PostRow> = page
        .posts
        .iter()
        .map(|post| PostRow {
            distance_km: format!("{:.2}", distance_meters(&post.location, &center) / 1000.0),
            user: post.user.clone(),
            message: post.message.clone(),
            url: post.url.clone().unwrap_or_default(),
            id: post.id.to_string(),
        })
        .collect();

    output.section(format!("Posts near {}, {}", center.lat, center.lon));
    output.table(rows);
    if let Some(next) = page.next_offset {
        output.info(format!("More results may exist: --offset {}", next));
    }
    Ok(())
}
