//! LLM provider implementations for docqa.
//!
//! All providers implement the `docqa_core::Provider` trait;
//! [`ProviderEmbedder`] turns any of them into an `Embedder`.

pub mod embedder;
pub mod openai_compat;

pub use embedder::ProviderEmbedder;
pub use openai_compat::OpenAiCompatProvider;
