//! Deterministic embedders for tests that need a vector table without a
//! network provider.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_core::embedding::Embedder;
use docqa_core::error::EmbeddingError;

/// Bag-of-words embedder: every lowercase word is hashed into one of
/// `ndims` buckets. Texts sharing words score higher under cosine.
pub struct HashEmbedder {
    ndims: usize,
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(ndims: usize) -> Self {
        Self {
            ndims,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.ndims];
        for word in text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
        {
            vector[bucket(&word.to_lowercase(), self.ndims)] += 1.0;
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

// FNV-1a
fn bucket(word: &str, ndims: usize) -> usize {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in word.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    (hash % ndims as u64) as usize
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn model(&self) -> &str {
        "hash-bow"
    }

    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Embedder whose every call fails, for error-propagation tests.
pub struct FailingEmbedder {
    pub ndims: usize,
}

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model(&self) -> &str {
        "failing"
    }

    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Provider(
            docqa_core::error::ProviderError::Network("connection refused".into()),
        ))
    }
}
