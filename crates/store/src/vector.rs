//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity, ranking, and the little-endian blob
//! encoding used by the SQLite backend.

use docqa_core::store::{ChunkRecord, SearchResult};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ or either vector is empty or all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Score every record against the query and keep the `limit` closest.
///
/// Sorting is stable: records with equal scores keep their insertion order.
pub fn rank_by_similarity(
    records: impl IntoIterator<Item = ChunkRecord>,
    query: &[f32],
    limit: usize,
) -> Vec<SearchResult> {
    let mut scored: Vec<SearchResult> = records
        .into_iter()
        .map(|record| SearchResult {
            score: cosine_similarity(&record.vector, query),
            record,
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

/// Encode a vector as a little-endian `f32` blob.
pub fn to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a little-endian `f32` blob. Trailing partial values are ignored.
pub fn from_blob(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
