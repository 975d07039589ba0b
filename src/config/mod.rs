//! Configuration module for Ragbook.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, CritiquePrompts, Prompts, RagPrompts};
pub use settings::{
    ApiSettings, ChatSettings, ChunkingSettings, EmbeddingSettings, GeneralSettings,
    PromptSettings, RagSettings, RetrievalSettings, Settings, SourceSettings,
    VectorStoreProvider, VectorStoreSettings,
};
