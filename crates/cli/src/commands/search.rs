//! `docqa search` — Show the prioritized context for a query.

use docqa_config::AppConfig;
use docqa_rag::ContextRetriever;
use docqa_store::connection;

use super::{CmdResult, build_embedder, build_provider, open_table, require_api_key};

pub async fn run(config: &AppConfig, query: &str, limit: Option<usize>, json: bool) -> CmdResult {
    require_api_key(config)?;
    let embedder = build_embedder(config, build_provider(config));
    let retriever = ContextRetriever::from_config(&config.retrieval);
    let limit = limit.unwrap_or(retriever.limit());

    let db = connection::init(&config.store.path).await?;
    let result = async {
        let table = open_table(config, &db, embedder).await?;
        Ok::<_, Box<dyn std::error::Error>>(retriever.retrieve(query, table.as_ref(), limit).await?)
    }
    .await;
    connection::close().await;
    let context = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context)?);
        return Ok(());
    }

    println!("🔍 {} results for: \"{query}\"", context.len());
    for (i, entry) in context.entries.iter().enumerate() {
        let marker = if entry.is_complete() { "★" } else { " " };
        println!();
        println!(
            "  {:>2}. {marker} [score: {:.3}] {} — {}",
            i + 1,
            entry.score,
            entry.source_label(),
            entry.section_label()
        );
        for line in entry.text.lines() {
            println!("      {line}");
        }
    }
    Ok(())
}
