//! Ingest pipeline.
//!
//! Coordinates loading, chunking, embedding and indexing of a document corpus.
//! A populated index short-circuits the run, so ingesting twice is a no-op.

use crate::chunking::{ChunkingConfig, SourcedChunk, TextChunker};
use crate::document::{Document, DocumentSource};
use crate::embedding::Embedder;
use crate::error::{RagbookError, Result};
use crate::vector_store::{VectorIndex, VectorRecord};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Stage of an ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    NotStarted,
    Loading,
    Chunking,
    Embedding,
    Indexing,
    Done,
    Failed,
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestState::NotStarted => "not started",
            IngestState::Loading => "loading",
            IngestState::Chunking => "chunking",
            IngestState::Embedding => "embedding",
            IngestState::Indexing => "indexing",
            IngestState::Done => "done",
            IngestState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of an ingest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents loaded from the source.
    pub documents: usize,
    /// Records written to the index.
    pub chunks_indexed: usize,
    /// Whether the run was skipped because the index was already populated.
    pub skipped: bool,
}

/// Populates a vector index from a document source.
pub struct IngestPipeline {
    source: Arc<dyn DocumentSource>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chunker: TextChunker,
    state: IngestState,
}

impl IngestPipeline {
    /// Create a pipeline, rejecting invalid chunking parameters.
    pub fn new(
        source: Arc<dyn DocumentSource>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chunking: ChunkingConfig,
    ) -> Result<Self> {
        Ok(Self {
            source,
            embedder,
            index,
            chunker: TextChunker::new(chunking)?,
            state: IngestState::NotStarted,
        })
    }

    /// Current stage.
    pub fn state(&self) -> IngestState {
        self.state
    }

    fn transition(&mut self, next: IngestState) {
        debug!("Ingest state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Run the pipeline. With `force`, an existing index is rebuilt.
    ///
    /// Nothing is written unless every chunk was embedded, so a failed rebuild
    /// leaves the previous index intact.
    #[instrument(skip(self), fields(source = %self.source.describe()))]
    pub async fn run(&mut self, force: bool) -> Result<IngestReport> {
        self.state = IngestState::NotStarted;

        match self.execute(force).await {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!("Ingest failed while {}: {}", self.state, e);
                self.transition(IngestState::Failed);
                Err(e)
            }
        }
    }

    async fn execute(&mut self, force: bool) -> Result<IngestReport> {
        let rebuild = self.index.exists().await?;
        if rebuild && !force {
            info!("Vector index already exists, skipping ingestion");
            self.transition(IngestState::Done);
            return Ok(IngestReport {
                documents: 0,
                chunks_indexed: 0,
                skipped: true,
            });
        }

        self.transition(IngestState::Loading);
        let documents = self.source.load().await?;
        info!("Loaded {} documents", documents.len());

        self.transition(IngestState::Chunking);
        let chunks = self.chunk(&documents);
        info!("Created {} chunks", chunks.len());

        self.transition(IngestState::Embedding);
        let texts: Vec<String> = chunks.iter().map(|c| c.chunk.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagbookError::Embedding(format!(
                "Expected {} embeddings, received {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        self.transition(IngestState::Indexing);
        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(sourced, embedding)| {
                VectorRecord::new(
                    embedding,
                    sourced.chunk.text,
                    sourced.metadata,
                    sourced.chunk.index,
                )
            })
            .collect();

        // A forced rebuild swaps the old records out only once the new set is complete.
        let indexed = if rebuild {
            self.index.replace(&records).await?
        } else if records.is_empty() {
            0
        } else {
            self.index.insert(&records).await?
        };
        info!("Indexed {} chunks", indexed);

        self.transition(IngestState::Done);
        Ok(IngestReport {
            documents: documents.len(),
            chunks_indexed: indexed,
            skipped: false,
        })
    }

    fn chunk(&self, documents: &[Document]) -> Vec<SourcedChunk> {
        documents
            .iter()
            .filter(|doc| !doc.text.trim().is_empty())
            .flat_map(|doc| self.chunker.chunk_document(doc))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FileSource;
    use crate::testing::{LetterEmbedder, StaticSource};
    use crate::vector_store::MemoryVectorIndex;

    fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig { chunk_size, overlap }
    }

    #[tokio::test]
    async fn test_ingest_builds_expected_chunks() {
        let index = Arc::new(MemoryVectorIndex::new());
        let mut pipeline = IngestPipeline::new(
            Arc::new(StaticSource::new(&["ABCDEFGHIJ"])),
            Arc::new(LetterEmbedder::new()),
            index.clone(),
            config(4, 2),
        )
        .unwrap();

        let report = pipeline.run(false).await.unwrap();
        assert_eq!(pipeline.state(), IngestState::Done);
        assert_eq!(report, IngestReport { documents: 1, chunks_indexed: 4, skipped: false });

        let results = index.search(&LetterEmbedder::vector("ABCDEFGHIJ"), 10, 0.0).await.unwrap();
        let mut passages: Vec<String> = results.into_iter().map(|r| r.record.passage).collect();
        passages.sort();
        assert_eq!(passages, vec!["ABCD", "CDEF", "EFGH", "GHIJ"]);
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let source = Arc::new(StaticSource::new(&["graphs and trees", "dynamic programming"]));
        let embedder = Arc::new(LetterEmbedder::new());
        let index = Arc::new(MemoryVectorIndex::new());

        let mut pipeline =
            IngestPipeline::new(source.clone(), embedder.clone(), index.clone(), config(8, 2)).unwrap();

        let first = pipeline.run(false).await.unwrap();
        let ids_before: Vec<String> = index
            .search(&LetterEmbedder::vector("graph"), 100, 0.0)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.record.id)
            .collect();

        let second = pipeline.run(false).await.unwrap();
        let ids_after: Vec<String> = index
            .search(&LetterEmbedder::vector("graph"), 100, 0.0)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.record.id)
            .collect();

        assert!(!first.skipped);
        assert!(second.skipped);
        assert_eq!(second.chunks_indexed, 0);
        assert_eq!(ids_before, ids_after);
        assert_eq!(index.len().await.unwrap(), first.chunks_indexed);
        assert_eq!(source.loads(), 1);
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_force_rebuilds() {
        let source = Arc::new(StaticSource::new(&["binary search"]));
        let index = Arc::new(MemoryVectorIndex::new());
        let mut pipeline = IngestPipeline::new(
            source.clone(),
            Arc::new(LetterEmbedder::new()),
            index.clone(),
            config(6, 1),
        )
        .unwrap();

        let first = pipeline.run(false).await.unwrap();
        let forced = pipeline.run(true).await.unwrap();

        assert!(!forced.skipped);
        assert_eq!(forced.chunks_indexed, first.chunks_indexed);
        assert_eq!(index.len().await.unwrap(), first.chunks_indexed);
        assert_eq!(source.loads(), 2);
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_without_writing() {
        let index = Arc::new(MemoryVectorIndex::new());
        let mut pipeline = IngestPipeline::new(
            Arc::new(StaticSource::new(&["segment trees"])),
            Arc::new(LetterEmbedder::failing()),
            index.clone(),
            config(5, 1),
        )
        .unwrap();

        let err = pipeline.run(false).await.unwrap_err();
        assert!(matches!(err, RagbookError::Embedding(_)));
        assert_eq!(pipeline.state(), IngestState::Failed);
        assert!(!index.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_forced_rebuild_keeps_existing_index() {
        let source = Arc::new(StaticSource::new(&["union find", "sparse tables"]));
        let index = Arc::new(MemoryVectorIndex::new());
        let mut pipeline = IngestPipeline::new(
            source.clone(),
            Arc::new(LetterEmbedder::new()),
            index.clone(),
            config(6, 2),
        )
        .unwrap();
        let first = pipeline.run(false).await.unwrap();

        let mut rebuild = IngestPipeline::new(
            source,
            Arc::new(LetterEmbedder::failing()),
            index.clone(),
            config(6, 2),
        )
        .unwrap();
        let err = rebuild.run(true).await.unwrap_err();

        assert!(matches!(err, RagbookError::Embedding(_)));
        assert_eq!(rebuild.state(), IngestState::Failed);
        assert_eq!(index.len().await.unwrap(), first.chunks_indexed);
    }

    #[tokio::test]
    async fn test_forced_rebuild_with_missing_source_keeps_sqlite_index() {
        use crate::vector_store::SqliteVectorIndex;

        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(SqliteVectorIndex::open(&dir.path().join("index.db")).unwrap());
        let mut pipeline = IngestPipeline::new(
            Arc::new(StaticSource::new(&["heavy light decomposition"])),
            Arc::new(LetterEmbedder::new()),
            index.clone(),
            config(8, 2),
        )
        .unwrap();
        let first = pipeline.run(false).await.unwrap();

        let mut rebuild = IngestPipeline::new(
            Arc::new(FileSource::new(dir.path().join("gone.pdf"))),
            Arc::new(LetterEmbedder::new()),
            index.clone(),
            config(8, 2),
        )
        .unwrap();
        let err = rebuild.run(true).await.unwrap_err();

        assert!(matches!(err, RagbookError::SourceNotFound(_)));
        assert_eq!(index.len().await.unwrap(), first.chunks_indexed);
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(LetterEmbedder::new());
        let mut pipeline = IngestPipeline::new(
            Arc::new(FileSource::new(dir.path().join("cp_guide.pdf"))),
            embedder.clone(),
            Arc::new(MemoryVectorIndex::new()),
            config(10, 2),
        )
        .unwrap();

        let err = pipeline.run(false).await.unwrap_err();
        assert!(matches!(err, RagbookError::SourceNotFound(_)));
        assert_eq!(pipeline.state(), IngestState::Failed);
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn test_invalid_chunking_rejected() {
        let result = IngestPipeline::new(
            Arc::new(StaticSource::new(&["x"])),
            Arc::new(LetterEmbedder::new()),
            Arc::new(MemoryVectorIndex::new()),
            config(4, 4),
        );
        assert!(matches!(result, Err(RagbookError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_text_file_ingest_into_sqlite() {
        use crate::vector_store::SqliteVectorIndex;

        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("notes.txt");
        std::fs::write(&doc_path, "Dijkstra finds shortest paths.\nKruskal builds spanning trees.").unwrap();

        let index = Arc::new(SqliteVectorIndex::open(&dir.path().join("index.db")).unwrap());
        let mut pipeline = IngestPipeline::new(
            Arc::new(FileSource::new(&doc_path)),
            Arc::new(LetterEmbedder::new()),
            index.clone(),
            config(20, 5),
        )
        .unwrap();

        let report = pipeline.run(false).await.unwrap();
        assert_eq!(report.documents, 1);
        assert!(report.chunks_indexed > 1);
        assert!(pipeline.run(false).await.unwrap().skipped);
    }
}
