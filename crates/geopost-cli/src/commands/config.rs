use anyhow::Result;
use geopost_core::config::LayeredConfig;
use serde::Serialize;
use tabled::Tabled;

use crate::output::OutputWriter;

#[derive(Serialize, Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

pub fn execute(settings: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let mut rows: Vec<ConfigRow> = settings
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        return output.result(rows);
    }

    output.section("Effective Configuration");
    output.table(rows);
    Ok(())
}
