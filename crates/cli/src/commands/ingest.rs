//! `docqa ingest` — Build the chunk table from a documents directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_config::AppConfig;
use docqa_core::embedding::Embedder;
use docqa_ingest::{HybridChunker, IngestPipeline, IngestReport};
use docqa_store::{Database, SqliteTable, connection};

use super::{CmdResult, build_embedder, build_provider, require_api_key};

pub async fn run(config: &AppConfig, dir: Option<PathBuf>) -> CmdResult {
    require_api_key(config)?;
    let dir = dir.unwrap_or_else(|| config.ingest.docs_dir.clone());
    let embedder = build_embedder(config, build_provider(config));

    println!("📄 Ingesting {} into '{}'", dir.display(), config.store.table);

    let db = connection::init(&config.store.path).await?;
    let result = ingest_dir(config, &dir, &db, embedder).await;
    connection::close().await;

    let (_, report) = result?;
    print_report(&report);
    Ok(())
}

/// Recreate the configured table from `dir`.
pub(crate) async fn ingest_dir(
    config: &AppConfig,
    dir: &Path,
    db: &Database,
    embedder: Arc<dyn Embedder>,
) -> docqa_core::Result<(SqliteTable, IngestReport)> {
    let chunker = HybridChunker::new(config.ingest.max_tokens).with_merge_peers(config.ingest.merge_peers);
    IngestPipeline::with_chunker(chunker)
        .run_into(dir, db, &config.store.table, embedder)
        .await
}

pub(crate) fn print_report(report: &IngestReport) {
    println!("   ✅ {} files, {} chunks stored", report.files, report.chunks);
    if report.files == 0 && report.skipped.is_empty() {
        println!("   ⚠️  No PDF or Markdown files found");
    }
    for path in &report.skipped {
        println!("   ⚠️  Skipped {}", path.display());
    }
}
