//! Critique command implementation.

use super::argument_or_prompt;
use crate::chain::CritiqueChain;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Components, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the critique command.
pub async fn run_critique(
    movie: Option<&str>,
    full: bool,
    model: Option<&str>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let components = Components::new(settings)?;
    let movie = argument_or_prompt(movie, "Movie title:")?;

    let chain = CritiqueChain::new(components.generator(model)?)
        .with_prompts(components.prompts.clone());

    let spinner = Output::spinner(&format!("Critiquing {}...", movie.trim()));
    let critique = chain.run(&movie).await;
    spinner.finish_and_clear();

    let critique = match critique {
        Ok(critique) => critique,
        Err(e) => {
            Output::error(&format!("Critique failed: {}", e));
            return Err(e.into());
        }
    };

    if full {
        Output::header("Summary");
        println!("{}", critique.summary);
        Output::header("Plot");
        println!("{}", critique.plot_analysis);
        Output::header("Characters");
        println!("{}", critique.character_analysis);
        Output::header("Rating");
    }
    println!("\n{}\n", critique.rating);

    Ok(())
}
