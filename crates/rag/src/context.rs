//! Context entries: one search result with its citation and priority class.

use docqa_config::ClassifierConfig;
use docqa_core::store::SearchResult;
use serde::{Deserialize, Serialize};

/// Shown when an entry has neither a filename nor page numbers.
pub const UNKNOWN_SOURCE: &str = "Unknown source";
/// Shown when an entry has no section title.
pub const UNTITLED_SECTION: &str = "Untitled section";

/// Priority class of a retrieved passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryClass {
    /// Contains a full `parameter = value` line worth surfacing first
    Complete,
    Other,
}

/// Decides which passages are promoted ahead of the rest.
pub trait EntryClassifier: Send + Sync {
    fn classify(&self, text: &str) -> EntryClass;
}

/// A line is a parameter line when it contains the separator and at least
/// one marker. Case-sensitive markers must match exactly; the others are
/// compared against the lower-cased line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterLineClassifier {
    pub separator: String,
    pub markers: Vec<String>,
    pub case_insensitive_markers: Vec<String>,
}

impl Default for ParameterLineClassifier {
    fn default() -> Self {
        Self {
            separator: " = ".into(),
            markers: vec!["tcp_rmem".into(), "tcp_wmem".into()],
            case_insensitive_markers: vec!["kernel".into()],
        }
    }
}

impl From<&ClassifierConfig> for ParameterLineClassifier {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            separator: config.separator.clone(),
            markers: config.markers.clone(),
            case_insensitive_markers: config
                .case_insensitive_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }
}

impl ParameterLineClassifier {
    fn is_parameter_line(&self, line: &str) -> bool {
        if !line.contains(self.separator.as_str()) {
            return false;
        }
        if self.markers.iter().any(|m| line.contains(m.as_str())) {
            return true;
        }
        let lower = line.to_lowercase();
        self.case_insensitive_markers
            .iter()
            .any(|m| lower.contains(m.as_str()))
    }
}

impl EntryClassifier for ParameterLineClassifier {
    fn classify(&self, text: &str) -> EntryClass {
        if text.split('\n').any(|line| self.is_parameter_line(line)) {
            EntryClass::Complete
        } else {
            EntryClass::Other
        }
    }
}

/// A retrieved passage, kept structured until the model boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub text: String,
    pub filename: Option<String>,
    pub page_numbers: Option<Vec<u32>>,
    pub title: Option<String>,
    pub score: f32,
    pub class: EntryClass,
}

impl ContextEntry {
    pub fn from_result(result: SearchResult, classifier: &dyn EntryClassifier) -> Self {
        let class = classifier.classify(&result.record.text);
        let metadata = result.record.metadata;
        Self {
            text: result.record.text,
            filename: metadata.filename,
            page_numbers: metadata.page_numbers,
            title: metadata.title,
            score: result.score,
            class,
        }
    }

    /// `<filename> - p. 7, 12`, either half omitted when absent.
    /// `None` when both are absent.
    pub fn source(&self) -> Option<String> {
        let mut parts = Vec::with_capacity(2);
        if let Some(filename) = self.filename.as_deref().filter(|f| !f.is_empty()) {
            parts.push(filename.to_string());
        }
        if let Some(pages) = self.page_numbers.as_ref().filter(|p| !p.is_empty()) {
            let pages: Vec<String> = pages.iter().map(u32::to_string).collect();
            parts.push(format!("p. {}", pages.join(", ")));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" - "))
        }
    }

    /// The `Source:` / `Title:` lines, joined by newlines. Empty when the
    /// entry carries no citation metadata at all.
    pub fn citation(&self) -> String {
        let mut lines = Vec::with_capacity(2);
        if let Some(source) = self.source() {
            lines.push(format!("Source: {source}"));
        }
        if let Some(title) = &self.title {
            lines.push(format!("Title: {title}"));
        }
        lines.join("\n")
    }

    /// Raw text followed by the citation on its own lines.
    pub fn render(&self) -> String {
        let citation = self.citation();
        if citation.is_empty() {
            self.text.clone()
        } else {
            format!("{}\n{}", self.text, citation)
        }
    }

    /// Display label for the source, with a default.
    pub fn source_label(&self) -> String {
        self.source().unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
    }

    /// Display label for the section, with a default.
    pub fn section_label(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED_SECTION)
    }

    pub fn is_complete(&self) -> bool {
        self.class == EntryClass::Complete
    }
}
