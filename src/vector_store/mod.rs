//! Vector index abstraction for Ragbook.
//!
//! Provides a trait-based interface for different vector storage backends.

mod memory;
mod sqlite;

pub use memory::MemoryVectorIndex;
pub use sqlite::SqliteVectorIndex;

use crate::config::{Settings, VectorStoreProvider};
use crate::document::SourceMetadata;
use crate::error::{RagbookError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A passage stored in the index with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Stable record ID.
    pub id: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Passage text.
    pub passage: String,
    /// Where the passage came from.
    pub metadata: SourceMetadata,
    /// Order of the passage within its document.
    pub chunk_index: usize,
    /// When this record was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl VectorRecord {
    /// Create a record whose ID is derived from its source position, so
    /// re-indexing the same passage overwrites it.
    pub fn new(
        embedding: Vec<f32>,
        passage: String,
        metadata: SourceMetadata,
        chunk_index: usize,
    ) -> Self {
        let key = format!(
            "{}#{}#{}",
            metadata.source,
            metadata.page.unwrap_or(0),
            chunk_index
        );
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()).to_string(),
            embedding,
            passage,
            metadata,
            chunk_index,
            indexed_at: Utc::now(),
        }
    }

    /// Replace the derived ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched record.
    pub record: VectorRecord,
    /// Cosine similarity (higher is better).
    pub score: f32,
}

/// Summary information about an indexed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    pub source: String,
    /// Number of distinct pages (0 for unpaginated sources).
    pub pages: u32,
    pub chunk_count: u32,
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Store records; an existing record with the same ID is overwritten in place.
    async fn insert(&self, records: &[VectorRecord]) -> Result<usize>;

    /// Atomically swap the whole contents for `records`. On error the
    /// previous contents are kept.
    async fn replace(&self, records: &[VectorRecord]) -> Result<usize>;

    /// Top `k` records scoring at least `score_threshold`, best first.
    /// Equal scores keep insertion order.
    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Whether the index has been populated.
    async fn exists(&self) -> Result<bool>;

    /// Number of stored records.
    async fn len(&self) -> Result<usize>;

    /// Per-source summaries in first-indexed order.
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;

    /// Remove every record.
    async fn clear(&self) -> Result<usize>;
}

/// Open the index configured in settings.
pub fn open_index(settings: &Settings) -> Result<Arc<dyn VectorIndex>> {
    match settings.vector_store.provider {
        VectorStoreProvider::Sqlite => Ok(Arc::new(SqliteVectorIndex::open(&settings.sqlite_path())?)),
        VectorStoreProvider::Memory => Ok(Arc::new(MemoryVectorIndex::new())),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Reject `k == 0` and thresholds outside `[0, 1]`.
pub(crate) fn validate_search(k: usize, score_threshold: f32) -> Result<()> {
    if k == 0 {
        return Err(RagbookError::InvalidParameter(
            "k must be greater than zero".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&score_threshold) {
        return Err(RagbookError::InvalidParameter(format!(
            "score_threshold must be within [0, 1], got {}",
            score_threshold
        )));
    }
    Ok(())
}

/// Score records given in insertion order, keep those at or above the
/// threshold, and return the best `k`.
pub(crate) fn rank<I>(records: I, query_embedding: &[f32], k: usize, score_threshold: f32) -> Vec<SearchResult>
where
    I: IntoIterator<Item = VectorRecord>,
{
    let mut results: Vec<SearchResult> = records
        .into_iter()
        .map(|record| {
            let score = cosine_similarity(query_embedding, &record.embedding);
            SearchResult { record, score }
        })
        .filter(|r| r.score >= score_threshold)
        .collect();

    // Stable sort, so ties stay in insertion order.
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(k);
    results
}
