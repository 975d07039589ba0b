//! SQLite-based vector index implementation.
//!
//! Embeddings are stored as little-endian `f32` blobs and similarity is
//! computed in Rust. A populated database file is what marks a corpus as
//! already ingested.

use super::{rank, validate_search, IndexedSource, SearchResult, VectorIndex, VectorRecord};
use crate::document::SourceMetadata;
use crate::error::{RagbookError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    source TEXT NOT NULL,
    page INTEGER,
    chunk_index INTEGER NOT NULL,
    passage TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_source ON records(source);
"#;

/// SQLite-based vector index.
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
}

impl SqliteVectorIndex {
    /// Open (or create) an index database at `path`.
    #[instrument(skip_all)]
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite vector index at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or overwrite records inside an open transaction.
    fn upsert(tx: &Transaction<'_>, records: &[VectorRecord]) -> Result<()> {
        for record in records {
            // Upsert keeps `seq`, so an overwritten record keeps its rank among ties.
            tx.execute(
                r#"
                INSERT INTO records (id, source, page, chunk_index, passage, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    source = excluded.source,
                    page = excluded.page,
                    chunk_index = excluded.chunk_index,
                    passage = excluded.passage,
                    embedding = excluded.embedding,
                    indexed_at = excluded.indexed_at
                "#,
                params![
                    record.id,
                    record.metadata.source,
                    record.metadata.page,
                    record.chunk_index as i64,
                    record.passage,
                    Self::embedding_to_bytes(&record.embedding),
                    record.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        Ok(())
    }

    /// Create an in-memory SQLite index (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RagbookError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<VectorRecord> {
        let chunk_index: i64 = row.get(3)?;
        let embedding_bytes: Vec<u8> = row.get(5)?;
        let indexed_at: String = row.get(6)?;

        Ok(VectorRecord {
            id: row.get(0)?,
            metadata: SourceMetadata::new(row.get::<_, String>(1)?, row.get(2)?),
            chunk_index: chunk_index as usize,
            passage: row.get(4)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: Self::parse_timestamp(&indexed_at),
        })
    }
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn insert(&self, records: &[VectorRecord]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        Self::upsert(&tx, records)?;
        tx.commit()?;
        info!("Inserted {} records", records.len());
        Ok(records.len())
    }

    async fn replace(&self, records: &[VectorRecord]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let deleted = tx.execute("DELETE FROM records", [])?;
        Self::upsert(&tx, records)?;
        tx.commit()?;
        info!("Replaced {} records with {}", deleted, records.len());
        Ok(records.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
        score_threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        validate_search(k, score_threshold)?;
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, source, page, chunk_index, passage, embedding, indexed_at
            FROM records
            ORDER BY seq
            "#,
        )?;

        let records = stmt
            .query_map([], Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let results = rank(records, query_embedding, k, score_threshold);
        debug!("Found {} matching records", results.len());
        Ok(results)
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.len().await? > 0)
    }

    async fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source, COUNT(DISTINCT page) AS pages, COUNT(*) AS chunk_count,
                   MAX(indexed_at) AS indexed_at
            FROM records
            GROUP BY source
            ORDER BY MIN(seq)
            "#,
        )?;

        let sources = stmt
            .query_map([], |row| {
                let indexed_at: String = row.get(3)?;
                Ok(IndexedSource {
                    source: row.get(0)?,
                    pages: row.get(1)?,
                    chunk_count: row.get(2)?,
                    indexed_at: Self::parse_timestamp(&indexed_at),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(sources)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM records", [])?;
        info!("Cleared {} records", deleted);
        Ok(deleted)
    }
}
