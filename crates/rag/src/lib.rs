//! Retrieval-augmented answering for docqa.
//!
//! - [`ContextRetriever`] turns a similarity search into prioritized,
//!   citation-annotated [`ContextEntry`] values.
//! - [`AnswerComposer`] streams a grounded answer from a chat model.
//! - [`ChatSession`] ties both to one conversation.

pub mod composer;
pub mod context;
pub mod retriever;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use composer::{AnswerComposer, ComposeOutcome, ComposerState, SYSTEM_PROMPT_TEMPLATE, TokenSink};
pub use context::{ContextEntry, EntryClass, EntryClassifier, ParameterLineClassifier};
pub use retriever::{ContextRetriever, DEFAULT_LIMIT, RetrievedContext};
pub use session::{ChatSession, TurnOutcome};
