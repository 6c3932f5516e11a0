//! Converted documents and the chunks cut from them.
//!
//! A [`Document`] is what a [`DocumentConverter`] produces: a flat sequence of
//! text items, each carrying the pages it came from. A [`Chunker`] groups those
//! items into [`Chunk`]s that keep enough provenance to cite them later.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

/// Where a document came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOrigin {
    /// File name without directories (e.g., "net-tuning.pdf")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// MIME type reported by the converter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

impl DocumentOrigin {
    pub fn from_path(path: &Path, mimetype: &str) -> Self {
        Self {
            filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            mimetype: Some(mimetype.to_string()),
        }
    }
}

/// A page reference. Page numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub page_no: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocItemKind {
    Heading { level: u8 },
    Paragraph,
    ListItem,
    Code,
}

/// One text block of a converted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocItem {
    pub kind: DocItemKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provenance: Vec<Provenance>,
}

impl DocItem {
    pub fn new(kind: DocItemKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            provenance: Vec::new(),
        }
    }

    /// Tag this item as appearing on `page_no`.
    pub fn on_page(mut self, page_no: u32) -> Self {
        self.provenance.push(Provenance { page_no });
        self
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.kind, DocItemKind::Heading { .. })
    }
}

/// A structured, converted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub origin: DocumentOrigin,
    pub items: Vec<DocItem>,
}

impl Document {
    pub fn new(origin: DocumentOrigin) -> Self {
        Self {
            origin,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: DocItem) {
        if !item.text.trim().is_empty() {
            self.items.push(item);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Render the document back to Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let mut previous: Option<DocItemKind> = None;
        for item in &self.items {
            if let Some(prev) = previous {
                // Consecutive list items stay in one list
                let tight = prev == DocItemKind::ListItem && item.kind == DocItemKind::ListItem;
                out.push_str(if tight { "\n" } else { "\n\n" });
            }
            match item.kind {
                DocItemKind::Heading { level } => {
                    out.push_str(&"#".repeat(level.clamp(1, 6) as usize));
                    out.push(' ');
                    out.push_str(&item.text);
                }
                DocItemKind::Paragraph => out.push_str(&item.text),
                DocItemKind::ListItem => {
                    out.push_str("- ");
                    out.push_str(&item.text);
                }
                DocItemKind::Code => {
                    out.push_str("```\n");
                    out.push_str(item.text.trim_end_matches('\n'));
                    out.push_str("\n```");
                }
            }
            previous = Some(item.kind);
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// A chunk's view of one document item: only what provenance needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkItem {
    pub provenance: Vec<Provenance>,
}

impl ChunkItem {
    pub fn from_pages(pages: impl IntoIterator<Item = u32>) -> Self {
        Self {
            provenance: pages.into_iter().map(|page_no| Provenance { page_no }).collect(),
        }
    }
}

impl From<&DocItem> for ChunkItem {
    fn from(item: &DocItem) -> Self {
        Self {
            provenance: item.provenance.clone(),
        }
    }
}

/// A bounded-size segment of a document with provenance metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub filename: Option<String>,
    /// Every document item that contributed text, in document order
    pub doc_items: Vec<ChunkItem>,
    /// Enclosing section headings, outermost first
    pub headings: Vec<String>,
}

/// File → structured document.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Whether this converter handles the file (by extension).
    fn accepts(&self, path: &Path) -> bool;

    async fn convert(&self, path: &Path) -> Result<Document, ConversionError>;
}

/// Structured document → ordered chunks.
pub trait Chunker: Send + Sync {
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}
