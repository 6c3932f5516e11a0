//! End-to-end integration tests for the docqa pipeline.
//!
//! These tests exercise the full flow from a documents directory to a
//! streamed, grounded answer: conversion, chunking, storage, retrieval,
//! prioritization, and composition.

use std::path::Path;
use std::sync::{Arc, Mutex};

use docqa_core::embedding::Embedder;
use docqa_core::error::{CompletionError, Error, ProviderError, StoreError};
use docqa_core::message::Role;
use docqa_core::provider::{
    Provider, ProviderRequest, ProviderResponse, StreamChunk, StreamReceiver,
};
use docqa_core::store::VectorTable;
use docqa_ingest::{HybridChunker, IngestPipeline};
use docqa_providers::{OpenAiCompatProvider, ProviderEmbedder};
use docqa_rag::{AnswerComposer, ChatSession, ComposerState, ContextRetriever};
use docqa_store::testing::HashEmbedder;
use docqa_store::{Database, InMemoryTable};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that streams a scripted answer token by token.
struct StreamingProvider {
    tokens: Vec<&'static str>,
    fail_after: Option<usize>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl StreamingProvider {
    fn answering(tokens: Vec<&'static str>) -> Self {
        Self {
            tokens,
            fail_after: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing_after(tokens: Vec<&'static str>, n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::answering(tokens)
        }
    }

    fn system_prompt(&self) -> String {
        self.requests.lock().unwrap().last().unwrap().messages[0].content.clone()
    }
}

#[async_trait::async_trait]
impl Provider for StreamingProvider {
    fn name(&self) -> &str {
        "e2e_stream"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured("stream only".into()))
    }

    async fn stream(&self, request: ProviderRequest) -> Result<StreamReceiver, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let (tx, rx) = mpsc::channel(self.tokens.len() + 2);
        for (i, token) in self.tokens.iter().enumerate() {
            if self.fail_after == Some(i) {
                tx.send(Err(ProviderError::StreamInterrupted("connection reset".into())))
                    .await
                    .unwrap();
                return Ok(rx);
            }
            tx.send(Ok(StreamChunk {
                content: Some(token.to_string()),
                ..Default::default()
            }))
            .await
            .unwrap();
        }
        tx.send(Ok(StreamChunk::finished(None))).await.unwrap();
        Ok(rx)
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const TUNING_GUIDE: &str = "\
# Linux Tuning

## Kernel

The kernel panic setting controls whether the machine reboots after a kernel panic.

```
kernel.panic = 10
```

## Network

Raise the TCP buffers for high-bandwidth links.

- net.ipv4.tcp_rmem = 4194304 8388608 25165824
- net.ipv4.tcp_wmem = 4194304 8388608 25165824
";

const NOTES: &str = "\
# Notes

Bananas are yellow and unrelated to tuning.
";

fn docs_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tuning.md"), TUNING_GUIDE).unwrap();
    std::fs::write(dir.path().join("notes.md"), NOTES).unwrap();
    dir
}

async fn database(dir: &Path) -> Database {
    Database::connect(dir.join("docqa.sqlite").to_str().unwrap())
        .await
        .unwrap()
}

// ── Pipeline tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_ingest_then_answer_with_prioritized_context() {
    let docs = docs_dir();
    let data = tempfile::tempdir().unwrap();
    let db = database(data.path()).await;
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());

    let (table, report) = IngestPipeline::default()
        .run_into(docs.path(), &db, "docling", embedder)
        .await
        .unwrap();
    assert_eq!(report.files, 2);
    assert!(report.skipped.is_empty());
    assert_eq!(table.count().await.unwrap(), report.chunks);

    let provider = Arc::new(StreamingProvider::answering(vec![
        "Set ",
        "kernel.panic = 10 ",
        "(tuning.md, Kernel).",
    ]));
    let mut session = ChatSession::new(
        ContextRetriever::default(),
        AnswerComposer::new(provider.clone(), "gpt-4o-mini"),
        Arc::new(table),
    );

    let mut streamed = Vec::new();
    let mut sink = |t: &str| streamed.push(t.to_string());
    let outcome = session
        .ask("what is the kernel panic setting?", &mut sink)
        .await
        .unwrap();

    assert_eq!(outcome.answer, "Set kernel.panic = 10 (tuning.md, Kernel).");
    assert_eq!(streamed.len(), 3);

    // Every stored chunk comes back, parameter lines first
    assert_eq!(outcome.entries.len(), report.chunks);
    let complete = outcome.entries.iter().take_while(|e| e.is_complete()).count();
    assert_eq!(complete, 3);
    assert!(outcome.entries[complete..].iter().all(|e| !e.is_complete()));

    let kernel = outcome
        .entries
        .iter()
        .find(|e| e.text == "kernel.panic = 10")
        .unwrap();
    assert_eq!(kernel.filename.as_deref(), Some("tuning.md"));
    assert_eq!(kernel.title.as_deref(), Some("Linux Tuning"));
    assert_eq!(kernel.page_numbers, None);

    let prompt = provider.system_prompt();
    assert!(prompt.contains("kernel.panic = 10\nSource: tuning.md\nTitle: Linux Tuning"));
    assert!(prompt.contains("Bananas are yellow"));
    assert_eq!(session.composer_state(), ComposerState::Complete);
}

#[tokio::test]
async fn e2e_table_survives_reopen_and_enforces_dimension() {
    let docs = docs_dir();
    let data = tempfile::tempdir().unwrap();

    let db = database(data.path()).await;
    let (_, report) = IngestPipeline::with_chunker(HybridChunker::new(32))
        .run_into(docs.path(), &db, "docling", Arc::new(HashEmbedder::new(32)))
        .await
        .unwrap();
    db.close().await;

    let db = database(data.path()).await;
    let table = db
        .open_table("docling", Arc::new(HashEmbedder::new(32)))
        .await
        .unwrap();
    assert_eq!(table.count().await.unwrap(), report.chunks);

    let err = db
        .open_table("docling", Arc::new(HashEmbedder::new(64)))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::SchemaMismatch { expected: 32, actual: 64, .. }));
}

#[tokio::test]
async fn e2e_reingest_replaces_instead_of_duplicating() {
    let docs = docs_dir();
    let data = tempfile::tempdir().unwrap();
    let db = database(data.path()).await;
    let pipeline = IngestPipeline::default();

    let (_, first) = pipeline
        .run_into(docs.path(), &db, "docling", Arc::new(HashEmbedder::default()))
        .await
        .unwrap();
    let (table, _) = pipeline
        .run_into(docs.path(), &db, "docling", Arc::new(HashEmbedder::default()))
        .await
        .unwrap();

    assert_eq!(table.count().await.unwrap(), first.chunks);
}

#[tokio::test]
async fn e2e_failed_turn_can_be_retried() {
    let table = InMemoryTable::new("docling", Arc::new(HashEmbedder::default()));
    let docs = docs_dir();
    IngestPipeline::default().run(docs.path(), &table).await.unwrap();

    let provider = Arc::new(StreamingProvider::failing_after(vec!["par", "tial"], 1));
    let mut session = ChatSession::new(
        ContextRetriever::default(),
        AnswerComposer::new(provider, "m"),
        Arc::new(table),
    );

    let err = session.ask("tcp buffers?", &mut |_: &str| {}).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Completion(CompletionError::Interrupted { received: 3, .. })
    ));
    assert_eq!(session.composer_state(), ComposerState::Failed);

    let roles: Vec<_> = session.conversation().messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User]);
}

#[tokio::test]
async fn e2e_empty_table_gives_empty_context() {
    let empty = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let db = database(data.path()).await;

    let (table, report) = IngestPipeline::default()
        .run_into(empty.path(), &db, "docling", Arc::new(HashEmbedder::default()))
        .await
        .unwrap();
    assert_eq!(report.chunks, 0);

    let context = ContextRetriever::default()
        .get_context("anything", &table, 20)
        .await
        .unwrap();
    assert_eq!(context, "");
}

// ── OpenAI-compatible wire tests ─────────────────────────────────────────

/// Serve `/embeddings` (bag-of-words vectors) and a streamed
/// `/chat/completions` from a raw TCP listener.
async fn mock_openai(answer: Vec<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let answer = Arc::new(answer);

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let answer = answer.clone();
            tokio::spawn(async move {
                handle(socket, &answer).await;
            });
        }
    });

    format!("http://{addr}/v1")
}

async fn handle(mut socket: TcpStream, answer: &[&str]) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body: serde_json::Value =
        serde_json::from_slice(&buf[header_end..header_end + content_length]).unwrap_or_default();
    let path = head.split_whitespace().nth(1).unwrap_or_default().to_string();

    let (content_type, payload) = if path.ends_with("/embeddings") {
        let embedder = HashEmbedder::new(body["dimensions"].as_u64().unwrap_or(64) as usize);
        let data: Vec<serde_json::Value> = body["input"]
            .as_array()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(index, text)| {
                serde_json::json!({
                    "object": "embedding",
                    "index": index,
                    "embedding": embedder.vector_for(text.as_str().unwrap()),
                })
            })
            .collect();
        let payload = serde_json::json!({
            "object": "list",
            "data": data,
            "model": body["model"],
            "usage": { "prompt_tokens": 1, "total_tokens": 1 },
        });
        ("application/json", payload.to_string())
    } else {
        let mut sse = String::new();
        for token in answer {
            let event = serde_json::json!({
                "choices": [{ "delta": { "content": token }, "finish_reason": null }]
            });
            sse.push_str(&format!("data: {event}\n\n"));
        }
        sse.push_str("data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n");
        sse.push_str(
            "data: {\"choices\":[],\"usage\":{\"prompt_tokens\":50,\"completion_tokens\":4,\"total_tokens\":54}}\n\n",
        );
        sse.push_str("data: [DONE]\n\n");
        ("text/event-stream", sse)
    };

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

#[tokio::test]
async fn e2e_openai_compatible_wire_round_trip() {
    let base_url = mock_openai(vec!["Use ", "net.ipv4.tcp_rmem = 4194304 8388608 25165824", "."]).await;
    let provider: Arc<dyn Provider> = Arc::new(OpenAiCompatProvider::new("mock", base_url, "test-key"));
    let embedder: Arc<dyn Embedder> =
        Arc::new(ProviderEmbedder::new(provider.clone(), "text-embedding-3-small", 64).with_batch_size(2));

    let table = InMemoryTable::new("docling", embedder);
    let docs = docs_dir();
    let report = IngestPipeline::default().run(docs.path(), &table).await.unwrap();
    assert!(report.chunks > 2);

    let mut session = ChatSession::new(
        ContextRetriever::default().with_limit(3),
        AnswerComposer::new(provider, "gpt-4o-mini"),
        Arc::new(table),
    );
    let mut streamed = String::new();
    let mut sink = |t: &str| streamed.push_str(t);
    let outcome = session.ask("tcp receive buffer", &mut sink).await.unwrap();

    assert_eq!(outcome.answer, "Use net.ipv4.tcp_rmem = 4194304 8388608 25165824.");
    assert_eq!(streamed, outcome.answer);
    assert_eq!(outcome.usage.map(|u| u.total_tokens), Some(54));
    assert_eq!(outcome.entries.len(), 3);
}
