//! PDF → [`Document`] via lopdf.
//!
//! Text is extracted page by page. Blank-line separated blocks become
//! paragraphs tagged with their page; short single-line blocks that look
//! like section titles become headings.

use std::path::Path;

use async_trait::async_trait;
use docqa_core::document::{DocItem, DocItemKind, Document, DocumentConverter, DocumentOrigin};
use docqa_core::error::ConversionError;
use lopdf::Document as PdfDoc;
use tracing::{debug, warn};

use super::has_extension;

const MAX_HEADING_CHARS: usize = 80;

pub struct PdfConverter;

#[async_trait]
impl DocumentConverter for PdfConverter {
    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, "pdf")
    }

    async fn convert(&self, path: &Path) -> Result<Document, ConversionError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ConversionError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let decode_path = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || extract_pages(&bytes, &decode_path))
            .await
            .map_err(|e| ConversionError::Decode {
                path: path.to_path_buf(),
                reason: format!("extraction task failed: {e}"),
            })??;

        let mut doc = Document::new(DocumentOrigin::from_path(path, "application/pdf"));
        for (page_no, text) in pages {
            for item in page_items(page_no, &text) {
                doc.push(item);
            }
        }
        debug!(path = %path.display(), items = doc.items.len(), "Converted PDF");
        Ok(doc)
    }
}

/// Load a PDF from memory and extract the text of every page.
fn extract_pages(bytes: &[u8], path: &Path) -> Result<Vec<(u32, String)>, ConversionError> {
    let pdf = PdfDoc::load_mem(bytes).map_err(|e| ConversionError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut pages = Vec::new();
    for page_no in pdf.get_pages().into_keys() {
        match pdf.extract_text(&[page_no]) {
            Ok(text) => pages.push((page_no, text)),
            Err(e) => warn!(path = %path.display(), page = page_no, error = %e, "Skipping unreadable page"),
        }
    }
    Ok(pages)
}

/// Split one page of extracted text into document items.
pub fn page_items(page_no: u32, text: &str) -> Vec<DocItem> {
    let mut items = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    let mut finish = |block: &mut Vec<&str>| {
        if block.is_empty() {
            return;
        }
        let item = if block.len() == 1 {
            match heading_level(block[0]) {
                Some(level) => DocItem::new(DocItemKind::Heading { level }, block[0]),
                None => DocItem::new(DocItemKind::Paragraph, block[0]),
            }
        } else {
            DocItem::new(DocItemKind::Paragraph, block.join("\n"))
        };
        items.push(item.on_page(page_no));
        block.clear();
    };

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            finish(&mut block);
        } else {
            block.push(line);
        }
    }
    finish(&mut block);
    items
}

/// Heading level for a line that looks like a section title.
///
/// `2.1 Receive buffers` → 2, `TUNING GUIDE` → 1, anything else → `None`.
pub fn heading_level(line: &str) -> Option<u8> {
    let line = line.trim();
    if line.is_empty() || line.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    if line.ends_with(['.', ',', ':', ';']) || line.contains(" = ") {
        return None;
    }

    // Numbered: "3 Title", "3. Title", "3.1 Title"
    if let Some((number, rest)) = line.split_once(' ') {
        let number = number.trim_end_matches('.');
        let numbered = !number.is_empty()
            && number.split('.').all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
        if numbered && rest.trim_start().starts_with(|c: char| c.is_uppercase()) {
            let depth = number.split('.').count().min(6);
            return Some(depth as u8);
        }
    }

    // Upper-case title line
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase()) {
        return Some(1);
    }

    None
}
