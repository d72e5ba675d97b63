//! Lexical retrieval channel (keyword/BM25)

use std::sync::Arc;

use crate::index::KeywordIndex;
use crate::retrieval::ChannelError;
use crate::store::{Chunk, ChunkStore};

/// Keyword-ranked retrieval over the chunk store
pub struct LexicalRetriever {
    index: KeywordIndex,
    store: Arc<ChunkStore>,
}

impl LexicalRetriever {
    /// Build the keyword index over every chunk in the store
    ///
    /// Fails on an empty corpus; the hybrid retriever treats that as
    /// "channel unavailable" and degrades to pure vector ranking.
    pub fn build(store: Arc<ChunkStore>) -> Result<Self, ChannelError> {
        let index = KeywordIndex::build(store.iter().map(|(id, c)| (id, c.text.as_str())))?;
        Ok(Self { index, store })
    }

    /// Retrieve the top-k chunks for a query, best-first
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>, ChannelError> {
        let hits = self.index.search(query, k)?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| self.store.get(hit.id).cloned())
            .collect())
    }
}
