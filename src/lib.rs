//! Docchat - conversational question answering over a document corpus
//!
//! Answers natural-language questions grounded in page-tagged text chunks by
//! fusing lexical (BM25) and vector (embedding) retrieval with Reciprocal
//! Rank Fusion, assembling a cited context, and driving a pluggable
//! generation capability with session-scoped conversation history.

pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod history;
pub mod index;
pub mod pipeline;
pub mod retrieval;
pub mod store;

pub use error::{DocchatError, Result};
