//! `docqa convert` — Export documents to Markdown.

use std::path::{Path, PathBuf};

use docqa_ingest::Converters;
use tracing::warn;

use super::CmdResult;

pub async fn run(files: &[PathBuf], out: &Path) -> CmdResult {
    let converters = Converters::standard();
    tokio::fs::create_dir_all(out).await?;

    let mut failed = 0usize;
    for file in files {
        match converters.convert(file).await {
            Ok(document) => {
                let target = output_path(file, out);
                tokio::fs::write(&target, document.to_markdown()).await?;
                println!("   ✅ {} → {}", file.display(), target.display());
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "Conversion failed");
                println!("   ❌ {}: {e}", file.display());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} file(s) could not be converted", files.len()).into());
    }
    Ok(())
}

/// `<out>/<stem>.md`
fn output_path(file: &Path, out: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    out.join(format!("{stem}.md"))
}
