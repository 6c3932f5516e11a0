//! In-memory table, useful for testing and ephemeral sessions.

use std::sync::Arc;

use async_trait::async_trait;
use docqa_core::embedding::Embedder;
use docqa_core::error::{EmbeddingError, StoreError};
use docqa_core::store::{ChunkRecord, NewRecord, SearchResult, VectorTable};
use tokio::sync::RwLock;

use crate::vector::rank_by_similarity;

/// A vector table that keeps its rows in a Vec.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryTable {
    name: String,
    embedder: Arc<dyn Embedder>,
    rows: RwLock<Vec<ChunkRecord>>,
}

impl InMemoryTable {
    pub fn new(name: impl Into<String>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            name: name.into(),
            embedder,
            rows: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of all stored rows in insertion order.
    pub async fn rows(&self) -> Vec<ChunkRecord> {
        self.rows.read().await.clone()
    }
}

/// Embed `records` and pair each with its vector, checking the dimension.
pub(crate) async fn embed_records(
    embedder: &dyn Embedder,
    records: Vec<NewRecord>,
) -> Result<Vec<ChunkRecord>, StoreError> {
    let texts: Vec<String> = records.iter().map(|r| r.text.clone()).collect();
    let vectors = embedder.embed(&texts).await?;

    if vectors.len() != records.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: records.len(),
            actual: vectors.len(),
        }
        .into());
    }

    records
        .into_iter()
        .zip(vectors)
        .map(|(record, vector)| {
            if vector.len() != embedder.ndims() {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: embedder.ndims(),
                    actual: vector.len(),
                }
                .into());
            }
            Ok(ChunkRecord {
                text: record.text,
                vector,
                metadata: record.metadata,
            })
        })
        .collect()
}

#[async_trait]
impl VectorTable for InMemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn ndims(&self) -> usize {
        self.embedder.ndims()
    }

    async fn add(&self, records: Vec<NewRecord>) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let embedded = embed_records(self.embedder.as_ref(), records).await?;
        let written = embedded.len();
        self.rows.write().await.extend(embedded);
        Ok(written)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, StoreError> {
        let query_vector = self.embedder.embed_one(query).await?;
        let rows = self.rows.read().await;
        Ok(rank_by_similarity(rows.iter().cloned(), &query_vector, limit))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.rows.read().await.len())
    }
}
