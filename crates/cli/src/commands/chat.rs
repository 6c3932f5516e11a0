//! `docqa chat` — Interactive question answering.

use std::io::Write;
use std::sync::Arc;

use docqa_config::AppConfig;
use docqa_core::store::VectorTable;
use docqa_store::{Database, connection};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use super::ingest::{ingest_dir, print_report};
use super::{
    CmdResult, build_embedder, build_provider, build_session, print_sources, print_token,
    require_api_key,
};

pub async fn run(config: &AppConfig) -> CmdResult {
    require_api_key(config)?;
    let db = connection::init(&config.store.path).await?;
    let result = chat(config, &db).await;
    connection::close().await;
    result
}

async fn chat(config: &AppConfig, db: &Database) -> CmdResult {
    let provider = build_provider(config);
    let embedder = build_embedder(config, provider.clone());

    // First run: build the table from the documents directory
    let table: Arc<dyn VectorTable> = if db.table_exists(&config.store.table).await? {
        Arc::new(db.open_table(&config.store.table, embedder).await?)
    } else {
        info!(table = %config.store.table, "Table missing, ingesting documents first");
        println!("📄 Processing documents in {}...", config.ingest.docs_dir.display());
        let (table, report) = ingest_dir(config, &config.ingest.docs_dir, db, embedder).await?;
        print_report(&report);
        Arc::new(table)
    };

    let rows = table.count().await?;
    let mut session = build_session(config, provider, table);

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║             docqa — Document Q&A             ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {}", config.chat.model);
    println!("  Table:     {} ({rows} chunks)", config.store.table);
    println!();
    println!("  Ask a question about the documents.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        println!();
        print!("  Assistant > ");
        match session.ask(question, &mut print_token).await {
            Ok(outcome) => {
                println!();
                println!();
                print_sources(&outcome.entries);
                println!();
            }
            Err(e) => {
                println!();
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}
