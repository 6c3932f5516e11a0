//! Embedder trait — text to fixed-dimension vectors.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// An embedding function with a declared output dimension.
///
/// Implementations must be deterministic for a given model version, and every
/// returned vector must have exactly `ndims()` components.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The model identifier (e.g., "text-embedding-3-small").
    fn model(&self) -> &str;

    /// Output dimension of every vector this embedder returns.
    fn ndims(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}
