//! Context retrieval and assembly for RAG prompts.

use crate::embedding::Embedder;
use crate::error::{RagbookError, Result};
use crate::vector_store::{SearchResult, VectorIndex};
use std::sync::Arc;
use tracing::debug;

/// Separator placed between passages in the assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Retrieves passages relevant to a query.
pub struct ContextBuilder {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    k: usize,
    score_threshold: f32,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index,
            embedder,
            k: 10,
            score_threshold: 0.5,
        }
    }

    /// Set the maximum number of passages.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    /// Embed the query and search the index.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(RagbookError::InvalidParameter("query must not be empty".to_string()));
        }

        let query_embedding = self.embedder.embed(query).await?;
        let results = self
            .index
            .search(&query_embedding, self.k, self.score_threshold)
            .await?;

        debug!("Retrieved {} passages", results.len());
        Ok(results)
    }
}

/// Join passages in ranked order.
pub fn assemble_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.record.passage.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SourceMetadata;
    use crate::testing::LetterEmbedder;
    use crate::vector_store::{MemoryVectorIndex, VectorRecord};

    fn result(passage: &str, score: f32) -> SearchResult {
        SearchResult {
            record: VectorRecord::new(vec![], passage.to_string(), SourceMetadata::new("s", None), 0),
            score,
        }
    }

    #[tokio::test]
    async fn test_retrieve_rejects_blank_query_before_embedding() {
        let embedder = Arc::new(LetterEmbedder::new());
        let builder = ContextBuilder::new(Arc::new(MemoryVectorIndex::new()), embedder.clone());

        let err = builder.retrieve(" \t").await.unwrap_err();
        assert!(matches!(err, RagbookError::InvalidParameter(_)));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_retrieve_applies_k_and_threshold() {
        let index = Arc::new(MemoryVectorIndex::new());
        let records: Vec<VectorRecord> = ["abc", "abd", "xyz"]
            .iter()
            .enumerate()
            .map(|(i, text)| {
                VectorRecord::new(
                    LetterEmbedder::vector(text),
                    text.to_string(),
                    SourceMetadata::new("s", None),
                    i,
                )
            })
            .collect();
        index.insert(&records).await.unwrap();

        let builder = ContextBuilder::new(index.clone(), Arc::new(LetterEmbedder::new()))
            .with_k(1)
            .with_score_threshold(0.5);
        let results = builder.retrieve("abc").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.passage, "abc");

        let wide = ContextBuilder::new(index, Arc::new(LetterEmbedder::new()))
            .with_k(10)
            .with_score_threshold(0.5);
        let passages: Vec<String> = wide
            .retrieve("abc")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.record.passage)
            .collect();
        assert_eq!(passages, vec!["abc", "abd"]);
    }

    #[tokio::test]
    async fn test_retrieve_rejects_zero_k() {
        let builder = ContextBuilder::new(Arc::new(MemoryVectorIndex::new()), Arc::new(LetterEmbedder::new()))
            .with_k(0);
        assert!(matches!(
            builder.retrieve("graphs").await,
            Err(RagbookError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_assemble_context() {
        let results = vec![result("first", 0.9), result("second", 0.7)];
        assert_eq!(assemble_context(&results), "first\n\nsecond");
        assert_eq!(assemble_context(&[]), "");
    }
}
