//! Ask command implementation.

use super::argument_or_prompt;
use super::ingest::ingest;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Components, Output};
use crate::config::{RetrievalSettings, Settings};
use crate::rag::QueryPipeline;
use anyhow::Result;

/// Run the ask command.
///
/// The index is built from `source` first when it does not exist yet.
pub async fn run_ask(
    query: Option<&str>,
    source: Option<&str>,
    k: Option<usize>,
    min_score: Option<f32>,
    model: Option<&str>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let retrieval = RetrievalSettings {
        k: k.unwrap_or(settings.retrieval.k),
        score_threshold: min_score.unwrap_or(settings.retrieval.score_threshold),
    };
    let components = Components::new(settings)?;

    let report = ingest(&components, source, false).await?;
    if !report.skipped {
        Output::success(&format!("Indexed {} chunks", report.chunks_indexed));
    }

    let query = argument_or_prompt(query, "Ask a question:")?;

    let embedder = components.embedder()?;
    let generator = components.generator(model)?;
    let pipeline = QueryPipeline::new(components.index.clone(), embedder, generator, &retrieval)
        .with_prompts(components.prompts.clone());

    let spinner = Output::spinner("Searching knowledge base...");

    match pipeline.ask(&query).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    Output::search_result(
                        &source.record.metadata.label(),
                        source.score,
                        &source.record.passage,
                    );
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
