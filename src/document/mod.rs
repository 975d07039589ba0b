//! Document sources for the ingest pipeline.
//!
//! A source yields raw text plus metadata describing where it came from.

mod file;

pub use file::FileSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a piece of text came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Origin of the text (usually a file path).
    pub source: String,
    /// 1-based page number, for paginated formats.
    pub page: Option<u32>,
}

impl SourceMetadata {
    pub fn new(source: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            source: source.into(),
            page,
        }
    }

    /// Short human-readable label, e.g. `guide.pdf p.12`.
    pub fn label(&self) -> String {
        let name = std::path::Path::new(&self.source)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.source);
        match self.page {
            Some(page) => format!("{} p.{}", name, page),
            None => name.to_string(),
        }
    }
}

/// Loaded source text.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub metadata: SourceMetadata,
}

impl Document {
    pub fn new(text: impl Into<String>, metadata: SourceMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// Trait for document sources.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable description of the source.
    fn describe(&self) -> String;

    /// Load every document from the source.
    async fn load(&self) -> Result<Vec<Document>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_label() {
        let paged = SourceMetadata::new("/books/cp_guide.pdf", Some(12));
        assert_eq!(paged.label(), "cp_guide.pdf p.12");

        let plain = SourceMetadata::new("notes.txt", None);
        assert_eq!(plain.label(), "notes.txt");
    }
}
