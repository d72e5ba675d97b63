//! Generation capability contract
//!
//! The language model is a black box to this crate: anything that can turn a
//! system prompt, conversation history, and user input into text. Streaming
//! is optional; providers that cannot stream keep the default method and the
//! pipeline falls back to one-shot completion.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::history::ConversationTurn;

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Capability is missing or misconfigured; fatal, no retry
    #[error("Generation capability unavailable: {0}")]
    Unavailable(String),

    /// The provider call itself failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider has no incremental channel
    #[error("Streaming not supported by this provider")]
    StreamingUnsupported,
}

/// Lazy, finite, non-restartable sequence of answer fragments
pub type TokenStream = mpsc::Receiver<Result<String, GenerationError>>;

/// Text-completion capability consumed by the pipeline
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// One-shot completion
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[ConversationTurn],
        input: &str,
    ) -> Result<String, GenerationError>;

    /// Incremental completion; fragments arrive in generation order
    async fn complete_streaming(
        &self,
        system_prompt: &str,
        history: &[ConversationTurn],
        input: &str,
    ) -> Result<TokenStream, GenerationError> {
        let _ = (system_prompt, history, input);
        Err(GenerationError::StreamingUnsupported)
    }
}
