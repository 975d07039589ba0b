//! Search command implementation.

use super::argument_or_prompt;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Components, Output};
use crate::config::Settings;
use crate::rag::ContextBuilder;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: Option<&str>,
    k: Option<usize>,
    min_score: Option<f32>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let k = k.unwrap_or(settings.retrieval.k);
    let min_score = min_score.unwrap_or(settings.retrieval.score_threshold);
    let components = Components::new(settings)?;

    if !components.index.exists().await? {
        Output::info("No documents indexed yet. Use 'ragbook ingest <path>' to add content.");
        return Ok(());
    }

    let query = argument_or_prompt(query, "Search for:")?;

    let builder = ContextBuilder::new(components.index.clone(), components.embedder()?)
        .with_k(k)
        .with_score_threshold(min_score);

    let spinner = Output::spinner("Searching...");
    let results = builder.retrieve(&query).await;
    spinner.finish_and_clear();

    let results = match results {
        Ok(results) => results,
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    };

    if results.is_empty() {
        Output::info(&format!("No passages scored at least {:.2}.", min_score));
        return Ok(());
    }

    Output::header(&format!("Results for \"{}\" ({})", query, results.len()));
    for result in &results {
        Output::search_result(
            &result.record.metadata.label(),
            result.score,
            &result.record.passage,
        );
    }

    Ok(())
}
