//! Answer composition: system prompt + conversation → streamed answer.
//!
//! Each turn runs a small state machine:
//!
//! ```text
//! Idle ──open──▶ AwaitingFirstToken ──token──▶ Streaming ──end──▶ Complete
//!  │                   │     └──────────────end──────────────────▶ Complete
//!  └──open failed──────┴──stream error──▶ Failed ◀──stream error── Streaming
//! ```

use std::sync::{Arc, Mutex};

use docqa_config::ChatConfig;
use docqa_core::error::CompletionError;
use docqa_core::message::{Conversation, Message};
use docqa_core::provider::{Provider, ProviderRequest, Usage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Instruction sent ahead of the conversation; `{context}` is replaced by
/// the rendered context string.
pub const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a helpful assistant that answers questions based on the provided context.

IMPORTANT: Always extract and list specific technical parameters, settings, and values from the context.
When asked about configuration parameters (like kernel parameters, system settings, etc.), you MUST:
1. Identify ALL relevant parameters in the context
2. List them clearly with their exact values
3. Include the source information (file name and page numbers)

If the context contains kernel parameters like "net.ipv4.tcp_rmem = 4194304 8388608 25165824", you MUST include this exact parameter in your answer.

Use only the information from the context to answer questions. If you're unsure or the context
doesn't contain the relevant information, say that you don't know.

Context:
{context}
"#;

pub fn system_prompt(context: &str) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{context}", context)
}

/// Receives answer text as it streams in.
pub trait TokenSink: Send {
    fn on_token(&mut self, token: &str);
}

impl<F> TokenSink for F
where
    F: FnMut(&str) + Send,
{
    fn on_token(&mut self, token: &str) {
        self(token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerState {
    Idle,
    AwaitingFirstToken,
    Streaming,
    Complete,
    Failed,
}

impl ComposerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// A finished turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeOutcome {
    pub answer: String,
    pub usage: Option<Usage>,
    /// Number of content deltas received
    pub deltas: usize,
}

pub struct AnswerComposer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    state: Mutex<ComposerState>,
}

impl AnswerComposer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.5,
            max_tokens: None,
            state: Mutex::new(ComposerState::Idle),
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &ChatConfig) -> Self {
        let mut composer = Self::new(provider, &config.model).with_temperature(config.temperature);
        composer.max_tokens = config.max_tokens;
        composer
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// State of the current (or most recent) turn.
    pub fn state(&self) -> ComposerState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn transition(&self, next: ComposerState) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        debug!(from = ?*state, to = ?next, "Composer state");
        *state = next;
    }

    /// The request sent for one turn: system prompt, then the whole
    /// conversation, streamed.
    pub fn build_request(&self, conversation: &Conversation, context: &str) -> ProviderRequest {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(Message::system(system_prompt(context)));
        messages.extend(conversation.messages().iter().cloned());

        ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        }
    }

    /// Stream an answer grounded in `context`, pushing every delta to `sink`.
    ///
    /// Returns the full answer once the stream ends. On failure the partial
    /// text already pushed to `sink` is not retracted.
    pub async fn compose(
        &self,
        conversation: &Conversation,
        context: &str,
        sink: &mut dyn TokenSink,
    ) -> Result<ComposeOutcome, CompletionError> {
        self.transition(ComposerState::Idle);
        let request = self.build_request(conversation, context);
        info!(model = %self.model, messages = request.messages.len(), "Composing answer");

        let mut rx = match self.provider.stream(request).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!(error = %e, "Failed to open answer stream");
                self.transition(ComposerState::Failed);
                return Err(CompletionError::Provider(e));
            }
        };
        self.transition(ComposerState::AwaitingFirstToken);

        let mut answer = String::new();
        let mut usage = None;
        let mut deltas = 0;

        while let Some(item) = rx.recv().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(error = %e, received = answer.len(), "Answer stream failed");
                    let streaming = self.state() == ComposerState::Streaming;
                    self.transition(ComposerState::Failed);
                    return Err(if streaming {
                        CompletionError::Interrupted {
                            received: answer.len(),
                            reason: e.to_string(),
                        }
                    } else {
                        CompletionError::Provider(e)
                    });
                }
            };

            if let Some(content) = chunk.content.as_deref().filter(|c| !c.is_empty()) {
                if deltas == 0 {
                    self.transition(ComposerState::Streaming);
                }
                deltas += 1;
                sink.on_token(content);
                answer.push_str(content);
            }
            if chunk.usage.is_some() {
                usage = chunk.usage;
            }
            if chunk.done {
                break;
            }
        }

        self.transition(ComposerState::Complete);
        debug!(chars = answer.len(), deltas, "Answer complete");
        Ok(ComposeOutcome {
            answer,
            usage,
            deltas,
        })
    }
}
