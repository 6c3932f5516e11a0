//! Ingestion for docqa: convert documents, cut them into chunks, and
//! append the chunks to a vector table.

pub mod chunker;
pub mod converter;
pub mod pipeline;
pub mod writer;

pub use chunker::{HybridChunker, estimate_tokens};
pub use converter::{Converters, MarkdownConverter, PdfConverter};
pub use pipeline::{IngestPipeline, IngestReport, discover};
pub use writer::ChunkStoreWriter;
