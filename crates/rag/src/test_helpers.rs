//! Shared test doubles: a scripted streaming provider and a fixed table.

use std::sync::Mutex;

use async_trait::async_trait;
use docqa_core::error::{ProviderError, StoreError};
use docqa_core::provider::{
    Provider, ProviderRequest, ProviderResponse, StreamChunk, StreamReceiver,
};
use docqa_core::store::{ChunkMetadata, ChunkRecord, NewRecord, SearchResult, VectorTable};
use tokio::sync::mpsc;

/// One step of a scripted stream.
#[derive(Debug, Clone)]
pub enum StreamStep {
    Token(String),
    Fail(ProviderError),
    Done,
}

/// A provider whose `stream` replays a script.
///
/// Each call to `stream` records the request and replays the same steps.
pub struct ScriptedStream {
    steps: Vec<StreamStep>,
    refuse: Option<ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedStream {
    pub fn new(steps: Vec<StreamStep>) -> Self {
        Self {
            steps,
            refuse: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Stream the given tokens, then finish.
    pub fn tokens(tokens: &[&str]) -> Self {
        let mut steps: Vec<StreamStep> = tokens.iter().map(|t| StreamStep::Token(t.to_string())).collect();
        steps.push(StreamStep::Done);
        Self::new(steps)
    }

    /// Fail to open the stream at all.
    pub fn refusing(error: ProviderError) -> Self {
        Self {
            refuse: Some(error),
            ..Self::new(Vec::new())
        }
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedStream {
    fn name(&self) -> &str {
        "scripted_stream"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured("scripted_stream only streams".into()))
    }

    async fn stream(&self, request: ProviderRequest) -> Result<StreamReceiver, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(error) = &self.refuse {
            return Err(error.clone());
        }

        let (tx, rx) = mpsc::channel(self.steps.len().max(1));
        for step in &self.steps {
            let item = match step {
                StreamStep::Token(t) => Ok(StreamChunk {
                    content: Some(t.clone()),
                    ..Default::default()
                }),
                StreamStep::Fail(e) => Err(e.clone()),
                StreamStep::Done => Ok(StreamChunk::finished(None)),
            };
            tx.send(item).await.unwrap();
        }
        Ok(rx)
    }
}

/// A table that returns canned search results, most similar first.
pub struct FixedTable {
    results: Vec<SearchResult>,
    failure: Mutex<Option<StoreError>>,
    last_query: Mutex<Option<(String, usize)>>,
}

impl FixedTable {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            failure: Mutex::new(None),
            last_query: Mutex::new(None),
        }
    }

    /// The next search fails with `error`.
    pub fn failing(error: StoreError) -> Self {
        let table = Self::new(Vec::new());
        *table.failure.lock().unwrap() = Some(error);
        table
    }

    pub fn last_query(&self) -> Option<(String, usize)> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorTable for FixedTable {
    fn name(&self) -> &str {
        "fixed"
    }

    fn ndims(&self) -> usize {
        0
    }

    async fn add(&self, _records: Vec<NewRecord>) -> Result<usize, StoreError> {
        Err(StoreError::Write("fixed table is read-only".into()))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, StoreError> {
        *self.last_query.lock().unwrap() = Some((query.to_string(), limit));
        if let Some(error) = self.failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.results.iter().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.results.len())
    }
}

/// A search hit with the given metadata.
pub fn hit(
    text: &str,
    filename: Option<&str>,
    pages: Option<Vec<u32>>,
    title: Option<&str>,
    score: f32,
) -> SearchResult {
    SearchResult {
        record: ChunkRecord {
            text: text.into(),
            vector: Vec::new(),
            metadata: ChunkMetadata {
                filename: filename.map(String::from),
                page_numbers: pages,
                title: title.map(String::from),
            },
        },
        score,
    }
}
