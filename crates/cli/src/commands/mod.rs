//! CLI command implementations and the wiring they share.

pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod convert;
pub mod ingest;
pub mod search;

use std::io::Write;
use std::sync::Arc;

use docqa_config::AppConfig;
use docqa_core::embedding::Embedder;
use docqa_core::provider::Provider;
use docqa_core::store::VectorTable;
use docqa_providers::{OpenAiCompatProvider, ProviderEmbedder};
use docqa_rag::{AnswerComposer, ChatSession, ContextEntry, ContextRetriever};
use docqa_store::Database;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Fail early, with setup instructions, when no API key is configured.
pub(crate) fn require_api_key(config: &AppConfig) -> CmdResult {
    if config.has_api_key() || config.provider == "ollama" {
        return Ok(());
    }

    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    OPENAI_API_KEY=sk-...");
    eprintln!("    DOCQA_API_KEY=sk-...     (any OpenAI-compatible endpoint)");
    eprintln!();
    eprintln!("  Or add `api_key` to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

pub(crate) fn build_provider(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::from_config(config))
}

pub(crate) fn build_embedder(config: &AppConfig, provider: Arc<dyn Provider>) -> Arc<dyn Embedder> {
    Arc::new(ProviderEmbedder::from_config(provider, &config.embedding))
}

pub(crate) fn build_session(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    table: Arc<dyn VectorTable>,
) -> ChatSession {
    ChatSession::new(
        ContextRetriever::from_config(&config.retrieval),
        AnswerComposer::from_config(provider, &config.chat),
        table,
    )
}

/// Open the configured table; a missing table points the user at `ingest`.
pub(crate) async fn open_table(
    config: &AppConfig,
    db: &Database,
    embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn VectorTable>, Box<dyn std::error::Error>> {
    if !db.table_exists(&config.store.table).await? {
        return Err(format!(
            "Table '{}' does not exist yet. Run `docqa ingest` first.",
            config.store.table
        )
        .into());
    }
    let table = db.open_table(&config.store.table, embedder).await?;
    Ok(Arc::new(table))
}

/// Print a streamed token immediately.
pub(crate) fn print_token(token: &str) {
    print!("{token}");
    let _ = std::io::stdout().flush();
}

/// Render the entries behind an answer, one collapsible-style block each.
pub(crate) fn print_sources(entries: &[ContextEntry]) {
    if entries.is_empty() {
        println!("  (no relevant sections found)");
        return;
    }
    println!("  Found relevant sections:");
    for entry in entries {
        println!();
        println!("  ▸ {}", entry.source_label());
        println!("    Section: {}", entry.section_label());
        for line in entry.text.lines() {
            println!("    {line}");
        }
    }
}
