//! # docqa Core
//!
//! Domain types, traits, and error definitions for the docqa document
//! question-answering pipeline. This crate has **no I/O of its own** — it
//! defines the domain model that the other crates implement against.
//!
//! ## Collaborator seams
//!
//! Every external collaborator is a trait here:
//! - [`DocumentConverter`] — file → structured [`Document`]
//! - [`Chunker`] — [`Document`] → ordered [`Chunk`]s
//! - [`Embedder`] — text → fixed-dimension vectors
//! - [`VectorTable`] — batch append + nearest-neighbour search
//! - [`Provider`] — chat completions (complete or streamed)
//!
//! Implementations live in `docqa-ingest`, `docqa-providers`, and
//! `docqa-store`, which keeps the retrieval core testable with in-memory
//! stand-ins.

pub mod document;
pub mod embedding;
pub mod error;
pub mod message;
pub mod provider;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use document::{
    Chunk, ChunkItem, Chunker, DocItem, DocItemKind, Document, DocumentConverter, DocumentOrigin,
    Provenance,
};
pub use embedding::Embedder;
pub use error::{
    CompletionError, ConversionError, EmbeddingError, Error, ProviderError, Result, StoreError,
};
pub use message::{Conversation, ConversationId, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk};
pub use store::{ChunkMetadata, ChunkRecord, NewRecord, SearchResult, VectorTable};
