//! One chat session: a conversation plus the retriever and composer that
//! answer it.

use std::sync::Arc;

use docqa_core::error::Result;
use docqa_core::message::{Conversation, Message};
use docqa_core::provider::Usage;
use docqa_core::store::VectorTable;
use tracing::{info, warn};

use crate::composer::{AnswerComposer, ComposerState, TokenSink};
use crate::context::ContextEntry;
use crate::retriever::ContextRetriever;

/// What a successful turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    /// Entries the answer was grounded in, in the order the model saw them
    pub entries: Vec<ContextEntry>,
    pub usage: Option<Usage>,
}

pub struct ChatSession {
    conversation: Conversation,
    retriever: ContextRetriever,
    composer: AnswerComposer,
    table: Arc<dyn VectorTable>,
}

impl ChatSession {
    pub fn new(retriever: ContextRetriever, composer: AnswerComposer, table: Arc<dyn VectorTable>) -> Self {
        Self {
            conversation: Conversation::new(),
            retriever,
            composer,
            table,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// State of the most recent turn's answer stream.
    pub fn composer_state(&self) -> ComposerState {
        self.composer.state()
    }

    /// Answer `question`, streaming the answer into `sink`.
    ///
    /// The question is kept in the conversation even when retrieval or
    /// composition fails, so the caller can simply ask again.
    pub async fn ask(&mut self, question: &str, sink: &mut dyn TokenSink) -> Result<TurnOutcome> {
        self.conversation.push(Message::user(question));

        let context = self
            .retriever
            .retrieve_default(question, self.table.as_ref())
            .await?;
        info!(entries = context.len(), "Context retrieved");

        let rendered = context.render();
        let outcome = match self.composer.compose(&self.conversation, &rendered, sink).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, turns = self.conversation.len(), "Turn failed");
                return Err(e.into());
            }
        };

        self.conversation.push(Message::assistant(&outcome.answer));
        Ok(TurnOutcome {
            answer: outcome.answer,
            entries: context.entries,
            usage: outcome.usage,
        })
    }
}
