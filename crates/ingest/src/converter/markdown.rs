//! Markdown → [`Document`] via pulldown-cmark.
//!
//! Headings, paragraphs, list items, and code blocks become document items.
//! Markdown has no pages, so items carry no provenance.

use std::path::Path;

use async_trait::async_trait;
use docqa_core::document::{DocItem, DocItemKind, Document, DocumentConverter, DocumentOrigin};
use docqa_core::error::ConversionError;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use super::has_extension;

pub struct MarkdownConverter;

#[async_trait]
impl DocumentConverter for MarkdownConverter {
    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, "md") || has_extension(path, "markdown")
    }

    async fn convert(&self, path: &Path) -> Result<Document, ConversionError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConversionError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let origin = DocumentOrigin::from_path(path, "text/markdown");
        Ok(parse_markdown(&source, origin))
    }
}

/// Parse Markdown text into a document with the given origin.
pub fn parse_markdown(source: &str, origin: DocumentOrigin) -> Document {
    let mut doc = Document::new(origin);
    let mut current: Option<(DocItemKind, String)> = None;

    fn flush(doc: &mut Document, current: &mut Option<(DocItemKind, String)>) {
        if let Some((kind, text)) = current.take() {
            doc.push(DocItem::new(kind, text.trim()));
        }
    }

    for event in Parser::new(source) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                flush(&mut doc, &mut current);
                current = Some((DocItemKind::Heading { level: level as u8 }, String::new()));
            }
            Event::Start(Tag::Item) => {
                flush(&mut doc, &mut current);
                current = Some((DocItemKind::ListItem, String::new()));
            }
            Event::Start(Tag::CodeBlock(_)) => {
                flush(&mut doc, &mut current);
                current = Some((DocItemKind::Code, String::new()));
            }
            Event::Start(Tag::Paragraph) => {
                // Paragraphs inside list items belong to the item
                if !matches!(current, Some((DocItemKind::ListItem, _))) {
                    flush(&mut doc, &mut current);
                    current = Some((DocItemKind::Paragraph, String::new()));
                } else if let Some((_, text)) = current.as_mut() {
                    if !text.trim().is_empty() {
                        text.push(' ');
                    }
                }
            }
            Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::CodeBlock)
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::TableRow)
            | Event::End(TagEnd::TableHead) => flush(&mut doc, &mut current),
            Event::End(TagEnd::Paragraph) => {
                if matches!(current, Some((DocItemKind::Paragraph, _))) {
                    flush(&mut doc, &mut current);
                }
            }
            Event::Text(text) | Event::Code(text) => {
                let (_, buf) = current.get_or_insert_with(|| (DocItemKind::Paragraph, String::new()));
                buf.push_str(&text);
            }
            Event::Start(Tag::TableCell) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push(' ');
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push('\n');
                }
            }
            _ => {}
        }
    }
    flush(&mut doc, &mut current);
    doc
}
