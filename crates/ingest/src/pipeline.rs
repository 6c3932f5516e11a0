//! Directory ingestion: discover → convert → chunk → write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_core::document::Chunker;
use docqa_core::embedding::Embedder;
use docqa_core::error::Result;
use docqa_core::store::VectorTable;
use docqa_store::{Database, SqliteTable};
use tracing::{info, warn};

use crate::chunker::HybridChunker;
use crate::converter::Converters;
use crate::writer::ChunkStoreWriter;

/// Extensions picked up by [`discover`], in processing order.
const EXTENSIONS: [&str; 2] = ["pdf", "md"];

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Files converted and written
    pub files: usize,
    /// Chunks stored across all files
    pub chunks: usize,
    /// Files that could not be converted
    pub skipped: Vec<PathBuf>,
}

/// Files to ingest directly inside `dir`: every `*.pdf`, then every `*.md`,
/// each group sorted by path. Not recursive.
pub fn discover(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    Ok(EXTENSIONS
        .iter()
        .flat_map(|ext| {
            entries
                .iter()
                .filter(move |path| path.extension().and_then(|e| e.to_str()) == Some(*ext))
                .cloned()
        })
        .collect())
}

pub struct IngestPipeline {
    converters: Converters,
    chunker: Box<dyn Chunker>,
}

impl IngestPipeline {
    pub fn new(converters: Converters, chunker: Box<dyn Chunker>) -> Self {
        Self { converters, chunker }
    }

    /// Standard converters with a [`HybridChunker`].
    pub fn with_chunker(chunker: HybridChunker) -> Self {
        Self::new(Converters::standard(), Box::new(chunker))
    }

    /// Recreate `table_name` in `db` (dropping existing rows) and ingest `dir`
    /// into it. A directory with no matching files leaves an empty table.
    pub async fn run_into(
        &self,
        dir: &Path,
        db: &Database,
        table_name: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<(SqliteTable, IngestReport)> {
        let files = discover(dir)?;
        let table = db.create_table(table_name, embedder).await?;
        let report = self.ingest_files(&files, &table).await?;
        Ok((table, report))
    }

    /// Ingest `dir` into an existing table.
    pub async fn run(&self, dir: &Path, table: &dyn VectorTable) -> Result<IngestReport> {
        let files = discover(dir)?;
        self.ingest_files(&files, table).await
    }

    async fn ingest_files(&self, files: &[PathBuf], table: &dyn VectorTable) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        if files.is_empty() {
            warn!("No PDF or Markdown files found");
        }

        for path in files {
            info!(file = %path.display(), "Processing");

            let document = match self.converters.convert(path).await {
                Ok(document) => document,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Skipping document");
                    report.skipped.push(path.clone());
                    continue;
                }
            };

            let chunks = self.chunker.chunk(&document);
            let written = ChunkStoreWriter::write(&chunks, table).await?;
            report.files += 1;
            report.chunks += written;
        }

        info!(
            files = report.files,
            chunks = report.chunks,
            skipped = report.skipped.len(),
            "Ingestion complete"
        );
        Ok(report)
    }
}

impl Default for IngestPipeline {
    fn default() -> Self {
        Self::with_chunker(HybridChunker::default())
    }
}
