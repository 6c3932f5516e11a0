//! Embedding function backed by a provider's `/embeddings` endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use docqa_config::EmbeddingConfig;
use docqa_core::embedding::Embedder;
use docqa_core::error::EmbeddingError;
use docqa_core::provider::{EmbeddingRequest, Provider};
use tracing::debug;

/// Adapts any [`Provider`] into an [`Embedder`] with a fixed dimension.
///
/// Inputs are sent in batches of `batch_size`; every returned vector is
/// checked against the declared dimension.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    ndims: usize,
    batch_size: usize,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, ndims: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            ndims,
            batch_size: 64,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &EmbeddingConfig) -> Self {
        Self::new(provider, &config.model, config.dimensions).with_batch_size(config.batch_size)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            debug!(model = %self.model, count = batch.len(), "Embedding batch");
            let response = self
                .provider
                .embed(EmbeddingRequest {
                    model: self.model.clone(),
                    inputs: batch.to_vec(),
                    dimensions: Some(self.ndims),
                })
                .await?;

            if response.embeddings.len() != batch.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: batch.len(),
                    actual: response.embeddings.len(),
                });
            }

            for vector in response.embeddings {
                if vector.len() != self.ndims {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: self.ndims,
                        actual: vector.len(),
                    });
                }
                vectors.push(vector);
            }
        }

        Ok(vectors)
    }
}
