//! CLI module for Ragbook.

pub mod commands;
mod components;
mod output;
pub mod preflight;

pub use components::Components;
pub use output::Output;

use clap::{Parser, Subcommand};

/// Ragbook - question answering over your documents
///
/// Index a PDF or text corpus once, then ask questions answered from the most
/// relevant passages.
#[derive(Parser, Debug)]
#[command(name = "ragbook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the vector index from a document or directory
    Ingest {
        /// PDF, text file, or directory (defaults to source.path from config)
        path: Option<String>,

        /// Rebuild even if the index already exists
        #[arg(short, long)]
        force: bool,
    },

    /// Ask a question answered from the indexed documents
    Ask {
        /// The question to ask (prompted for if omitted)
        query: Option<String>,

        /// Document to ingest first if the index does not exist yet
        #[arg(short, long)]
        source: Option<String>,

        /// Maximum number of passages to use as context
        #[arg(short)]
        k: Option<usize>,

        /// Minimum similarity score (0.0-1.0)
        #[arg(long)]
        min_score: Option<f32>,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the passages most similar to a query
    Search {
        /// Search query (prompted for if omitted)
        query: Option<String>,

        /// Maximum number of results
        #[arg(short)]
        k: Option<usize>,

        /// Minimum similarity score (0.0-1.0)
        #[arg(long)]
        min_score: Option<f32>,
    },

    /// List indexed documents
    List,

    /// Start an interactive chat session with persisted history
    Chat {
        /// Session id (history is kept per session)
        #[arg(short, long)]
        session: Option<String>,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Summarize, analyze and rate a movie through a prompt chain
    Critique {
        /// Movie title (prompted for if omitted)
        movie: Option<String>,

        /// Also print the intermediate summary and analyses
        #[arg(long)]
        full: bool,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show configuration file path
    Path,
}
