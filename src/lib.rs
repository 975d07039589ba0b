//! Ragbook - Retrieval-augmented question answering
//!
//! A CLI tool that indexes a document corpus once and answers questions from
//! the passages most similar to them.
//!
//! # Overview
//!
//! Ragbook allows you to:
//! - Ingest PDF and text documents into a persistent vector index
//! - Ask questions answered by an LLM from the retrieved passages
//! - Search the index semantically without generating an answer
//! - Keep multi-turn chat sessions and run a small critique prompt chain
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `document` - Document sources (PDF pages, text files, directories)
//! - `chunking` - Fixed-size overlapping text chunker
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector index abstraction (SQLite, in-memory)
//! - `ingest` - Load, chunk, embed and index pipeline
//! - `generation` - Chat completion abstraction
//! - `rag` - Retrieval and answer generation
//! - `chat` - Persisted chat sessions
//! - `chain` - Movie critique prompt chain
//!
//! # Example
//!
//! ```rust,no_run
//! use ragbook::chunking::ChunkingConfig;
//! use ragbook::config::Settings;
//! use ragbook::document::FileSource;
//! use ragbook::embedding::OpenAIEmbedder;
//! use ragbook::generation::OpenAIGenerator;
//! use ragbook::ingest::IngestPipeline;
//! use ragbook::rag::QueryPipeline;
//! use ragbook::vector_store::open_index;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let index = open_index(&settings)?;
//!     let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.api, &settings.embedding)?);
//!
//!     let mut ingest = IngestPipeline::new(
//!         Arc::new(FileSource::new("cp_guide.pdf")),
//!         embedder.clone(),
//!         index.clone(),
//!         ChunkingConfig::default(),
//!     )?;
//!     ingest.run(false).await?;
//!
//!     let generator = Arc::new(OpenAIGenerator::from_settings(&settings.api, &settings.rag, None)?);
//!     let pipeline = QueryPipeline::new(index, embedder, generator, &settings.retrieval);
//!     let answer = pipeline.ask("How does binary lifting work?").await?;
//!     println!("{}", answer.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod chat;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod ingest;
pub mod openai;
pub mod rag;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{RagbookError, Result};
