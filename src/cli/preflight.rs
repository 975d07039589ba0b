//! Pre-flight checks before operations that call the hosted models.
//!
//! Reports missing configuration up front instead of failing midway through
//! an ingest run.

use crate::config::Settings;
use crate::error::{RagbookError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingesting embeds every chunk.
    Ingest,
    /// Asking embeds the query and calls the chat model.
    Ask,
    /// Search embeds the query.
    Search,
    /// Chat and critique call the chat model.
    Generate,
    /// Listing only reads the index.
    List,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Ask | Operation::Search | Operation::Generate => {
            check_api_key(settings)?;
        }
        Operation::List => {}
    }
    Ok(())
}

/// Check that an API key is configured.
///
/// A custom `api.base_url` may point at a server that needs no key.
fn check_api_key(settings: &Settings) -> Result<()> {
    if settings.api.base_url.is_some() {
        return Ok(());
    }
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(RagbookError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(RagbookError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
