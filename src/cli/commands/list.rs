//! List command implementation.

use crate::cli::{Components, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let components = Components::new(settings)?;

    match components.index.list_sources().await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("No documents indexed yet. Use 'ragbook ingest <path>' to add content.");
            } else {
                Output::header(&format!("Indexed Documents ({})", sources.len()));
                println!();

                for item in &sources {
                    Output::source_info(&item.source, item.pages, item.chunk_count);
                }

                let total_chunks: u32 = sources.iter().map(|s| s.chunk_count).sum();
                println!();
                Output::kv("Total documents", &sources.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list documents: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
