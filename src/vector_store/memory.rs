//! In-memory vector index implementation.
//!
//! Useful for testing and small, throwaway corpora.

use super::{rank, validate_search, IndexedSource, SearchResult, VectorIndex, VectorRecord};
use crate::error::{RagbookError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct State {
    /// Records in insertion order.
    records: Vec<VectorRecord>,
    /// Record ID to position in `records`.
    positions: HashMap<String, usize>,
}

impl State {
    fn upsert(&mut self, records: &[VectorRecord]) {
        for record in records {
            match self.positions.get(&record.id).copied() {
                Some(pos) => self.records[pos] = record.clone(),
                None => {
                    self.positions.insert(record.id.clone(), self.records.len());
                    self.records.push(record.clone());
                }
            }
        }
    }
}

/// In-memory vector index.
#[derive(Default)]
pub struct MemoryVectorIndex {
    state: RwLock<State>,
}

impl MemoryVectorIndex {
    /// Create a new in-memory vector index.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| RagbookError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| RagbookError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn insert(&self, records: &[VectorRecord]) -> Result<usize> {
        let mut state = self.write()?;
        state.upsert(records);
        Ok(records.len())
    }

    async fn replace(&self, records: &[VectorRecord]) -> Result<usize> {
        let mut state = self.write()?;
        *state = State::default();
        state.upsert(records);
        Ok(records.len())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        validate_search(k, score_threshold)?;
        let state = self.read()?;
        Ok(rank(
            state.records.iter().cloned(),
            query_embedding,
            k,
            score_threshold,
        ))
    }

    async fn exists(&self) -> Result<bool> {
        Ok(!self.read()?.records.is_empty())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let state = self.read()?;

        let mut order: Vec<String> = Vec::new();
        let mut summaries: HashMap<String, (IndexedSource, Vec<Option<u32>>)> = HashMap::new();

        for record in &state.records {
            let source = &record.metadata.source;
            let (summary, pages) = summaries.entry(source.clone()).or_insert_with(|| {
                order.push(source.clone());
                (
                    IndexedSource {
                        source: source.clone(),
                        pages: 0,
                        chunk_count: 0,
                        indexed_at: record.indexed_at,
                    },
                    Vec::new(),
                )
            });

            summary.chunk_count += 1;
            if record.indexed_at > summary.indexed_at {
                summary.indexed_at = record.indexed_at;
            }
            if record.metadata.page.is_some() && !pages.contains(&record.metadata.page) {
                pages.push(record.metadata.page);
                summary.pages += 1;
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|source| summaries.remove(&source).map(|(summary, _)| summary))
            .collect())
    }

    async fn clear(&self) -> Result<usize> {
        let mut state = self.write()?;
        let removed = state.records.len();
        state.records.clear();
        state.positions.clear();
        Ok(removed)
    }
}
