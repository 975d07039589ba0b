//! Fixed-size overlapping text chunking.
//!
//! Text is walked in windows of `chunk_size` characters, each window starting
//! `chunk_size - overlap` characters after the previous one. Lengths are counted
//! in `char`s so a window never splits a UTF-8 sequence.

use crate::document::{Document, SourceMetadata};
use crate::error::{RagbookError, Result};
use serde::{Deserialize, Serialize};

/// A contiguous window of source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Window text.
    pub text: String,
    /// Position of this chunk within its text.
    pub index: usize,
    /// Start offset in characters.
    pub offset: usize,
}

/// A chunk tagged with the document it came from.
#[derive(Debug, Clone)]
pub struct SourcedChunk {
    pub metadata: SourceMetadata,
    pub chunk: Chunk,
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Window length in characters.
    pub chunk_size: usize,
    /// Characters shared with the previous window.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
        }
    }
}

impl ChunkingConfig {
    /// Check `chunk_size > 0` and `overlap < chunk_size`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagbookError::InvalidParameter(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(RagbookError::InvalidParameter(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Splits text into overlapping fixed-size chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    /// Create a chunker, rejecting invalid parameters.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Split raw text.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        // Byte offset of every char boundary, plus the end of the string.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = bounds.len() - 1;

        let mut chunks = Vec::new();
        if len == 0 {
            return chunks;
        }

        let step = self.config.chunk_size - self.config.overlap;
        let mut start = 0;

        loop {
            let end = (start + self.config.chunk_size).min(len);
            chunks.push(Chunk {
                text: text[bounds[start]..bounds[end]].to_string(),
                index: chunks.len(),
                offset: start,
            });
            if end == len {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Split a document, tagging every chunk with its metadata.
    pub fn chunk_document(&self, document: &Document) -> Vec<SourcedChunk> {
        self.split(&document.text)
            .into_iter()
            .map(|chunk| SourcedChunk {
                metadata: document.metadata.clone(),
                chunk,
            })
            .collect()
    }
}

/// Split `text` into windows of `chunk_size` characters sharing `overlap` characters.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    let chunker = TextChunker::new(ChunkingConfig { chunk_size, overlap })?;
    Ok(chunker.split(text))
}
