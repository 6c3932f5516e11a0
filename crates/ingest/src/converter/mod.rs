//! Document converters, selected by file extension.

pub mod markdown;
pub mod pdf;

use std::path::Path;

use docqa_core::document::{Document, DocumentConverter};
use docqa_core::error::ConversionError;

pub use markdown::MarkdownConverter;
pub use pdf::PdfConverter;

/// An ordered set of converters; the first one accepting a path wins.
pub struct Converters {
    converters: Vec<Box<dyn DocumentConverter>>,
}

impl Converters {
    pub fn new(converters: Vec<Box<dyn DocumentConverter>>) -> Self {
        Self { converters }
    }

    /// PDF and Markdown.
    pub fn standard() -> Self {
        Self::new(vec![Box::new(PdfConverter), Box::new(MarkdownConverter)])
    }

    pub fn accepts(&self, path: &Path) -> bool {
        self.converters.iter().any(|c| c.accepts(path))
    }

    pub async fn convert(&self, path: &Path) -> Result<Document, ConversionError> {
        let converter = self
            .converters
            .iter()
            .find(|c| c.accepts(path))
            .ok_or_else(|| ConversionError::Unsupported {
                path: path.to_path_buf(),
            })?;
        converter.convert(path).await
    }
}

impl Default for Converters {
    fn default() -> Self {
        Self::standard()
    }
}

/// Case-insensitive extension check.
pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
