//! Movie critique prompt chain.
//!
//! summary → (plot analysis ‖ character analysis) → rating. The two analyses
//! only depend on the summary and run concurrently.

use crate::config::Prompts;
use crate::error::{RagbookError, Result};
use crate::generation::Generator;
use std::sync::Arc;
use tracing::{info, instrument};

/// Output of every stage of the chain.
#[derive(Debug, Clone)]
pub struct Critique {
    pub summary: String,
    pub plot_analysis: String,
    pub character_analysis: String,
    pub rating: String,
}

/// Runs the critique chain against a generator.
pub struct CritiqueChain {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
}

impl CritiqueChain {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    async fn stage(&self, template: &str, vars: &[(&str, &str)]) -> Result<String> {
        let user = self.prompts.fill(template, vars);
        self.generator
            .generate(&self.prompts.critique.system, &user)
            .await
    }

    /// Critique a movie by title.
    #[instrument(skip(self))]
    pub async fn run(&self, movie: &str) -> Result<Critique> {
        let movie = movie.trim();
        if movie.is_empty() {
            return Err(RagbookError::InvalidParameter(
                "movie title must not be empty".to_string(),
            ));
        }

        let templates = &self.prompts.critique;

        info!("Summarizing {}", movie);
        let summary = self.stage(&templates.summary, &[("movie", movie)]).await?;

        info!("Analyzing plot and characters");
        let vars = [("summary", summary.as_str())];
        let (plot_analysis, character_analysis) = futures::try_join!(
            self.stage(&templates.plot, &vars),
            self.stage(&templates.characters, &vars),
        )?;

        info!("Rating");
        let rating = self
            .stage(
                &templates.rating,
                &[
                    ("plot_analysis", plot_analysis.as_str()),
                    ("character_analysis", character_analysis.as_str()),
                ],
            )
            .await?;

        Ok(Critique {
            summary,
            plot_analysis,
            character_analysis,
            rating,
        })
    }
}
