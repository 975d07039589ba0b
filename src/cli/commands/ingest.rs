//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{Components, Output};
use crate::config::Settings;
use crate::ingest::IngestReport;
use anyhow::Result;

/// Run the ingest command.
pub async fn run_ingest(path: Option<&str>, force: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let components = Components::new(settings)?;
    let report = ingest(&components, path, force).await?;

    if report.skipped {
        Output::info("Vector index already exists. Use --force to rebuild it.");
    } else {
        Output::success(&format!(
            "Indexed {} chunks from {} documents",
            report.chunks_indexed, report.documents
        ));
    }

    Ok(())
}

/// Run the ingest pipeline with a spinner, reporting failures.
pub(super) async fn ingest(
    components: &Components,
    path: Option<&str>,
    force: bool,
) -> Result<IngestReport> {
    let embedder = components.embedder()?;
    let mut pipeline = components.ingest_pipeline(path, embedder)?;

    let spinner = Output::spinner("Building vector index...");
    match pipeline.run(force).await {
        Ok(report) => {
            spinner.finish_and_clear();
            Ok(report)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Ingestion failed while {}: {}", pipeline.state(), e));
            Err(e.into())
        }
    }
}
