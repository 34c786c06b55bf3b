use anyhow::Result;
use geopost_core::config::LayeredConfig;
use geopost_pipeline::{Backends, Reconciler};

use crate::cli::ReconcileArgs;
use crate::output::OutputWriter;

pub async fn execute(
    args: &ReconcileArgs,
    backends: &Backends,
    settings: &LayeredConfig,
    output: &OutputWriter,
) -> Result<()> {
    let reconciler = Reconciler::new(backends.clone(), settings.backend_timeout());
    let report = reconciler.reconcile(args.limit).await?;

    if output.is_json() {
        output.result(&report)?;
    } else {
        output.section("Reconciliation");
        output.kv("Examined", report.examined);
        output.kv("Completed", report.completed);
        output.kv("Abandoned", report.abandoned);
        output.kv("Still failing", report.still_failing);
        for id in &report.failed_ids {
            output.warning(format!("Still failing: {}", id));
        }
    }

    if !report.is_clean() {
        anyhow::bail!("{} ingestion(s) could not be completed", report.still_failing);
    }
    Ok(())
}
