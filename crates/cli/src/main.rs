//! docqa CLI — the main entry point.
//!
//! Commands:
//! - `ingest`   — Convert, chunk, embed, and store a documents directory
//! - `search`   — Show the prioritized context for a query
//! - `ask`      — Answer one question
//! - `chat`     — Interactive question answering
//! - `convert`  — Export documents to Markdown
//! - `config`   — Show, locate, or initialize the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use docqa_config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa — question answering over your PDF and Markdown documents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.docqa/config.toml)
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every PDF and Markdown file in a directory (replaces the table)
    Ingest {
        /// Documents directory (default: ingest.docs_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Print the context retrieved for a query
    Search {
        query: String,

        /// Number of results (default: retrieval.limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer a single question
    Ask {
        question: String,

        /// Do not list the retrieved sources after the answer
        #[arg(long)]
        no_sources: bool,
    },

    /// Interactive chat; ingests the documents directory first if needed
    Chat,

    /// Convert documents to Markdown files
    Convert {
        /// Files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "converted")]
        out: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (API key redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    match cli.command {
        Commands::Ingest { dir } => commands::ingest::run(&load_config(&config_path)?, dir).await?,
        Commands::Search { query, limit, json } => {
            commands::search::run(&load_config(&config_path)?, &query, limit, json).await?
        }
        Commands::Ask {
            question,
            no_sources,
        } => commands::ask::run(&load_config(&config_path)?, &question, !no_sources).await?,
        Commands::Chat => commands::chat::run(&load_config(&config_path)?).await?,
        Commands::Convert { files, out } => commands::convert::run(&files, &out).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(&config_path).await?,
            ConfigAction::Init => commands::config_cmd::init(&config_path).await?,
        },
    }

    Ok(())
}

fn load_config(path: &std::path::Path) -> Result<AppConfig, String> {
    AppConfig::load_at(path).map_err(|e| format!("Failed to load config: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_with_options() {
        let cli = Cli::try_parse_from(["docqa", "-v", "search", "tcp buffers", "--limit", "5", "--json"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Search { query, limit, json } => {
                assert_eq!(query, "tcp buffers");
                assert_eq!(limit, Some(5));
                assert!(json);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn convert_requires_files() {
        assert!(Cli::try_parse_from(["docqa", "convert"]).is_err());
        let cli = Cli::try_parse_from(["docqa", "convert", "a.pdf", "b.md"]).unwrap();
        match cli.command {
            Commands::Convert { files, out } => {
                assert_eq!(files.len(), 2);
                assert_eq!(out, PathBuf::from("converted"));
            }
            _ => panic!("expected convert"),
        }
    }
}
