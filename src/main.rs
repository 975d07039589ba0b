//! Ragbook CLI entry point.

use anyhow::Result;
use clap::Parser;
use ragbook::cli::{commands, Cli, Commands};
use ragbook::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("ragbook={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Ingest { path, force } => {
            commands::run_ingest(path.as_deref(), *force, settings).await?;
        }

        Commands::Ask {
            query,
            source,
            k,
            min_score,
            model,
        } => {
            commands::run_ask(
                query.as_deref(),
                source.as_deref(),
                *k,
                *min_score,
                model.as_deref(),
                settings,
            )
            .await?;
        }

        Commands::Search { query, k, min_score } => {
            commands::run_search(query.as_deref(), *k, *min_score, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Chat { session, model } => {
            commands::run_chat(session.as_deref(), model.as_deref(), settings).await?;
        }

        Commands::Critique { movie, full, model } => {
            commands::run_critique(movie.as_deref(), *full, model.as_deref(), settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
