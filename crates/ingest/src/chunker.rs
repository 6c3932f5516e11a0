//! Structure-aware chunking.
//!
//! [`HybridChunker`] walks a document's items while tracking the enclosing
//! section headings. Every body item becomes at least one chunk; items over
//! the token budget are split between lines (and between words only inside
//! an overlong line), and with `merge_peers` small neighbours under the same
//! headings are merged back together.

use docqa_core::document::{Chunk, ChunkItem, Chunker, DocItemKind, Document};

/// Rough token count: about four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[derive(Debug, Clone)]
pub struct HybridChunker {
    pub max_tokens: usize,
    pub merge_peers: bool,
}

impl HybridChunker {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens: max_tokens.max(1),
            merge_peers: false,
        }
    }

    pub fn with_merge_peers(mut self, merge_peers: bool) -> Self {
        self.merge_peers = merge_peers;
        self
    }

    /// Split `text` into pieces of at most `max_tokens`.
    ///
    /// Whole lines are packed together and keep their `\n` separators; only
    /// a single line over the budget is broken between words. A single word
    /// longer than the budget is kept whole.
    fn split(&self, text: &str) -> Vec<String> {
        if estimate_tokens(text) <= self.max_tokens {
            return vec![text.to_string()];
        }

        let budget = self.max_tokens * 4;
        let mut pieces = Vec::new();
        let mut current = String::new();
        for segment in text.lines().flat_map(|line| split_words(line, budget)) {
            if current.is_empty() && segment.trim().is_empty() {
                continue;
            }
            let needed = current.chars().count() + 1 + segment.chars().count();
            if needed > budget && !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                if segment.trim().is_empty() {
                    continue;
                }
            }
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(&segment);
        }
        if !current.trim().is_empty() {
            pieces.push(current);
        }
        pieces
    }

    fn merge(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        let mut merged: Vec<Chunk> = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if let Some(last) = merged.last_mut() {
                let combined = estimate_tokens(&last.text) + 1 + estimate_tokens(&chunk.text);
                if last.headings == chunk.headings && combined <= self.max_tokens {
                    last.text.push('\n');
                    last.text.push_str(&chunk.text);
                    last.doc_items.extend(chunk.doc_items);
                    continue;
                }
            }
            merged.push(chunk);
        }
        merged
    }
}

impl Default for HybridChunker {
    fn default() -> Self {
        Self::new(128)
    }
}

/// Break one line into pieces of at most `budget` characters between words.
fn split_words(line: &str, budget: usize) -> Vec<String> {
    if line.chars().count() <= budget {
        return vec![line.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > budget && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

impl Chunker for HybridChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let mut stack: Vec<(u8, String)> = Vec::new();
        let mut chunks = Vec::new();

        for item in &document.items {
            if let DocItemKind::Heading { level } = item.kind {
                while stack.last().is_some_and(|(l, _)| *l >= level) {
                    stack.pop();
                }
                stack.push((level, item.text.clone()));
                continue;
            }

            let headings: Vec<String> = stack.iter().map(|(_, h)| h.clone()).collect();
            for piece in self.split(&item.text) {
                chunks.push(Chunk {
                    text: piece,
                    filename: document.origin.filename.clone(),
                    doc_items: vec![ChunkItem::from(item)],
                    headings: headings.clone(),
                });
            }
        }

        if self.merge_peers {
            self.merge(chunks)
        } else {
            chunks
        }
    }
}
