//! `docqa config` — Configuration management commands.

use std::path::Path;

use docqa_config::AppConfig;

use super::CmdResult;

pub async fn show(config_path: &Path) -> CmdResult {
    let mut config =
        AppConfig::load_at(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    if config.api_key.is_some() {
        config.api_key = Some("***".into());
    }
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub async fn path(config_path: &Path) -> CmdResult {
    println!("{}", config_path.display());
    Ok(())
}

pub async fn init(config_path: &Path) -> CmdResult {
    if config_path.exists() {
        println!("   Config already exists at {}", config_path.display());
        return Ok(());
    }
    if let Some(parent) = config_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(config_path, AppConfig::default_toml()).await?;
    println!("   ✅ Wrote default config to {}", config_path.display());
    Ok(())
}
