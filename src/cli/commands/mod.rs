//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod critique;
mod ingest;
mod list;
mod search;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use critique::run_critique;
pub use ingest::run_ingest;
pub use list::run_list;
pub use search::run_search;

use crate::cli::Output;
use anyhow::Result;

/// Use the argument if given, otherwise read it from stdin.
fn argument_or_prompt(value: Option<&str>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v.to_string()),
        None => Ok(Output::prompt(label)?),
    }
}
