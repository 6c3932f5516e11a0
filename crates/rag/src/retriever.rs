//! Context retrieval: similarity search → classify → stable partition.

use std::sync::Arc;

use docqa_config::RetrievalConfig;
use docqa_core::error::StoreError;
use docqa_core::store::VectorTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{ContextEntry, EntryClass, EntryClassifier, ParameterLineClassifier};

/// Default number of search results.
pub const DEFAULT_LIMIT: usize = 20;

/// Retrieved entries in priority order: complete entries first, then the
/// rest, each group in similarity order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub entries: Vec<ContextEntry>,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The flat context string handed to the model: rendered entries
    /// separated by blank lines. Empty when nothing was retrieved.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(ContextEntry::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

pub struct ContextRetriever {
    classifier: Arc<dyn EntryClassifier>,
    limit: usize,
}

impl ContextRetriever {
    pub fn new(classifier: Arc<dyn EntryClassifier>) -> Self {
        Self {
            classifier,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(Arc::new(ParameterLineClassifier::from(&config.classifier))).with_limit(config.limit)
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Search `table` for `query` and order the hits.
    ///
    /// The query goes to the store unmodified, even when empty. Nothing is
    /// dropped, truncated, or deduplicated after the search.
    pub async fn retrieve(
        &self,
        query: &str,
        table: &dyn VectorTable,
        limit: usize,
    ) -> Result<RetrievedContext, StoreError> {
        let results = table.search(query, limit).await?;
        let total = results.len();

        let (complete, other): (Vec<ContextEntry>, Vec<ContextEntry>) = results
            .into_iter()
            .map(|result| ContextEntry::from_result(result, self.classifier.as_ref()))
            .partition(|entry| entry.class == EntryClass::Complete);

        debug!(
            table = table.name(),
            total,
            complete = complete.len(),
            "Retrieved context"
        );

        let mut entries = complete;
        entries.extend(other);
        Ok(RetrievedContext { entries })
    }

    /// [`Self::retrieve`] with the configured limit.
    pub async fn retrieve_default(
        &self,
        query: &str,
        table: &dyn VectorTable,
    ) -> Result<RetrievedContext, StoreError> {
        self.retrieve(query, table, self.limit).await
    }

    /// The context string for `query`: `""` when nothing matches.
    pub async fn get_context(
        &self,
        query: &str,
        table: &dyn VectorTable,
        limit: usize,
    ) -> Result<String, StoreError> {
        Ok(self.retrieve(query, table, limit).await?.render())
    }
}

impl Default for ContextRetriever {
    fn default() -> Self {
        Self::new(Arc::new(ParameterLineClassifier::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FixedTable, hit};
    use docqa_core::error::EmbeddingError;

    #[tokio::test]
    async fn complete_entries_move_first_keeping_order() {
        let table = FixedTable::new(vec![
            hit("intro text", Some("a.md"), None, None, 0.9),
            hit("net.ipv4.tcp_rmem = 1 2 3", Some("b.pdf"), Some(vec![2]), None, 0.8),
            hit("more prose", None, None, None, 0.7),
            hit("kernel.panic = 10", Some("b.pdf"), Some(vec![5]), None, 0.6),
        ]);

        let context = ContextRetriever::default().retrieve("q", &table, 20).await.unwrap();
        let texts: Vec<_> = context.entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["net.ipv4.tcp_rmem = 1 2 3", "kernel.panic = 10", "intro text", "more prose"]
        );
    }

    #[tokio::test]
    async fn partition_is_stable_and_lossless() {
        let hits: Vec<_> = (0..12)
            .map(|i| {
                let text = if i % 3 == 0 {
                    format!("kernel.param{i} = {i}")
                } else {
                    format!("prose {i}")
                };
                hit(&text, None, None, None, 1.0 - i as f32 / 20.0)
            })
            .collect();
        let table = FixedTable::new(hits.clone());

        let context = ContextRetriever::default().retrieve("q", &table, 20).await.unwrap();
        assert_eq!(context.len(), hits.len());

        let complete: Vec<_> = context.entries.iter().take_while(|e| e.is_complete()).collect();
        assert_eq!(complete.len(), 4);
        assert!(context.entries[4..].iter().all(|e| !e.is_complete()));

        for group in [&context.entries[..4], &context.entries[4..]] {
            assert!(group.windows(2).all(|w| w[0].score > w[1].score));
        }
    }

    #[tokio::test]
    async fn empty_table_renders_empty_string() {
        let table = FixedTable::new(Vec::new());
        let context = ContextRetriever::default()
            .get_context("anything", &table, DEFAULT_LIMIT)
            .await
            .unwrap();
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn rendered_entries_are_separated_by_blank_lines() {
        let table = FixedTable::new(vec![
            hit("first", Some("a.md"), None, Some("Intro"), 0.9),
            hit("second", None, None, None, 0.8),
        ]);
        let context = ContextRetriever::default().get_context("q", &table, 20).await.unwrap();
        assert_eq!(context, "first\nSource: a.md\nTitle: Intro\n\nsecond");
    }

    #[tokio::test]
    async fn query_and_limit_reach_the_store_unmodified() {
        let table = FixedTable::new(vec![hit("a", None, None, None, 0.5)]);
        ContextRetriever::default().with_limit(7).retrieve_default("", &table).await.unwrap();
        assert_eq!(table.last_query(), Some((String::new(), 7)));
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let table = FixedTable::failing(StoreError::Embedding(EmbeddingError::CountMismatch {
            expected: 1,
            actual: 0,
        }));
        let err = ContextRetriever::default().retrieve("q", &table, 20).await.unwrap_err();
        assert!(matches!(err, StoreError::Embedding(_)));
    }
}
