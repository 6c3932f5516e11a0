//! `docqa ask` — Answer one question from the ingested documents.

use docqa_config::AppConfig;
use docqa_store::connection;

use super::{
    CmdResult, build_embedder, build_provider, build_session, open_table, print_sources, print_token,
    require_api_key,
};

pub async fn run(config: &AppConfig, question: &str, show_sources: bool) -> CmdResult {
    require_api_key(config)?;
    let provider = build_provider(config);
    let embedder = build_embedder(config, provider.clone());

    let db = connection::init(&config.store.path).await?;
    let result = async {
        let table = open_table(config, &db, embedder).await?;
        let mut session = build_session(config, provider, table);
        Ok::<_, Box<dyn std::error::Error>>(session.ask(question, &mut print_token).await?)
    }
    .await;
    connection::close().await;

    let outcome = result?;
    println!();
    if show_sources {
        println!();
        print_sources(&outcome.entries);
    }
    Ok(())
}
