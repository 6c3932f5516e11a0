//! Vector table trait and the record types it stores.
//!
//! A table stores `(text, vector, metadata)` rows. The text is the source
//! field: the table embeds it with its own [`crate::Embedder`] on insert, and
//! embeds the query the same way on search, so the vector dimension is fixed
//! for the table's lifetime.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Citation metadata attached to every stored chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: Option<String>,
    /// Sorted ascending, no duplicates; `None` instead of an empty list
    pub page_numbers: Option<Vec<u32>>,
    pub title: Option<String>,
}

impl ChunkMetadata {
    /// Build metadata, normalizing the page set.
    pub fn new(
        filename: Option<String>,
        pages: impl IntoIterator<Item = u32>,
        title: Option<String>,
    ) -> Self {
        Self {
            filename,
            page_numbers: normalize_pages(pages),
            title,
        }
    }
}

/// Sort and deduplicate page numbers; an empty set becomes `None`.
pub fn normalize_pages(pages: impl IntoIterator<Item = u32>) -> Option<Vec<u32>> {
    let set: BTreeSet<u32> = pages.into_iter().collect();
    if set.is_empty() {
        None
    } else {
        Some(set.into_iter().collect())
    }
}

/// A row to be appended; the table computes the vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A stored row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
    #[serde(skip)]
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A stored row plus its similarity to the query (higher is closer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub record: ChunkRecord,
    pub score: f32,
}

/// The core VectorTable trait.
///
/// Implementations: SQLite (persisted) and in-memory (for testing).
#[async_trait]
pub trait VectorTable: Send + Sync {
    /// The table name (e.g., "docling").
    fn name(&self) -> &str;

    /// Vector dimension fixed at table creation.
    fn ndims(&self) -> usize;

    /// Embed and append all records as one batch. Returns the number written.
    async fn add(&self, records: Vec<NewRecord>) -> Result<usize, StoreError>;

    /// Nearest-neighbour search, most similar first, at most `limit` rows.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, StoreError>;

    /// Number of stored rows.
    async fn count(&self) -> Result<usize, StoreError>;
}
