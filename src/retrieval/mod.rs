//! Hybrid retrieval
//!
//! Two heterogeneous channels (keyword BM25 and vector cosine) are run over
//! the same chunk store and merged with Reciprocal Rank Fusion. Channel
//! failures collapse to empty result lists at the hybrid boundary, so a
//! missing or broken channel degrades ranking instead of failing the query.

mod fusion;
mod hybrid;
mod lexical;
mod vector;

pub use fusion::reciprocal_rank_fusion;
pub use hybrid::HybridRetriever;
pub use lexical::LexicalRetriever;
pub use vector::VectorRetriever;

use thiserror::Error;

use crate::index::{EmbeddingError, KeywordIndexError, VectorIndexError};
use crate::store::Chunk;

/// A single channel failure; never escapes the hybrid retriever
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Keyword channel failed: {0}")]
    Keyword(#[from] KeywordIndexError),

    #[error("Vector channel failed: {0}")]
    Vector(#[from] VectorIndexError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// A chunk at its 1-based position within one channel's output
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub chunk: Chunk,
    pub rank: usize,
}

/// A chunk with its accumulated reciprocal-rank score
#[derive(Debug, Clone)]
pub struct FusedResult {
    pub chunk: Chunk,
    pub score: f64,
}
