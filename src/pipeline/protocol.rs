//! Request, response, and streamed event shapes at the pipeline boundary

use serde::{Deserialize, Serialize};

/// One chat invocation against a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation id scoping the session (combined with the user id)
    pub conversation_id: String,

    /// The user's message, verbatim
    pub message: String,
}

/// A cited source shown alongside the answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub page: Option<u32>,

    /// First 160 characters of the chunk, newline-free
    pub preview: String,
}

/// One-shot response shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// Streamed delivery events, emitted in order: zero or more `token`, one
/// `sources`, one terminal `done` - or a terminal `error` after which
/// nothing follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ChatEvent {
    Token { t: String },
    Sources { sources: Vec<Source> },
    Done,
    Error { detail: String },
}
