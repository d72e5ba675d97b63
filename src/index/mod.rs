//! Embedding and index backends
//!
//! Building blocks for the two retrieval channels:
//! - `EmbeddingProvider` trait with a local fastembed implementation
//! - Tantivy keyword index (BM25) for the lexical channel
//! - HNSW vector index (cosine) for the semantic channel
//!
//! Indexes are built in memory from the chunk store and replaced wholesale
//! on corpus rebuild; persistence is out of scope here.

mod embedder;
mod keyword;
mod vector;

pub use embedder::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use keyword::{KeywordHit, KeywordIndex, KeywordIndexError};
pub use vector::{VectorHit, VectorIndex, VectorIndexError};
