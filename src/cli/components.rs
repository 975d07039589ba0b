//! Collaborators built once per command from settings.

use crate::chunking::ChunkingConfig;
use crate::config::{Prompts, Settings};
use crate::document::FileSource;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::generation::{Generator, OpenAIGenerator};
use crate::ingest::IngestPipeline;
use crate::vector_store::{open_index, VectorIndex};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared handles for the command being run.
pub struct Components {
    pub settings: Settings,
    pub prompts: Prompts,
    pub index: Arc<dyn VectorIndex>,
}

impl Components {
    /// Load prompts and open the configured index.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let index = open_index(&settings)?;

        Ok(Self {
            settings,
            prompts,
            index,
        })
    }

    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        Ok(Arc::new(OpenAIEmbedder::from_settings(
            &self.settings.api,
            &self.settings.embedding,
        )?))
    }

    pub fn generator(&self, model: Option<&str>) -> Result<Arc<dyn Generator>> {
        Ok(Arc::new(OpenAIGenerator::from_settings(
            &self.settings.api,
            &self.settings.rag,
            model,
        )?))
    }

    /// Ingest pipeline over `path`, or the configured source path.
    pub fn ingest_pipeline(
        &self,
        path: Option<&str>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<IngestPipeline> {
        let path: PathBuf = match path {
            Some(p) => Settings::expand_path(p),
            None => self.settings.source_path(),
        };
        IngestPipeline::new(
            Arc::new(FileSource::new(path)),
            embedder,
            self.index.clone(),
            ChunkingConfig {
                chunk_size: self.settings.chunking.chunk_size,
                overlap: self.settings.chunking.overlap,
            },
        )
    }
}
