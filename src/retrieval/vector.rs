//! Vector retrieval channel (embedding nearest-neighbor)

use std::sync::Arc;

use crate::config::IndexConfig;
use crate::index::{EmbeddingProvider, VectorIndex};
use crate::retrieval::ChannelError;
use crate::store::{Chunk, ChunkStore};

/// Nearest-neighbor retrieval over chunk embeddings
pub struct VectorRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: VectorIndex,
    store: Arc<ChunkStore>,
    ef_search: usize,
}

impl VectorRetriever {
    /// Embed every chunk in the store and build the HNSW index
    ///
    /// Chunks are embedded in batches of `batch_size`.
    pub fn build(
        store: Arc<ChunkStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: &IndexConfig,
        batch_size: usize,
    ) -> Result<Self, ChannelError> {
        let mut index = VectorIndex::new(
            embedder.dimension(),
            store.len(),
            config.hnsw_m,
            config.hnsw_ef_construction,
        );

        let ids: Vec<u64> = store.iter().map(|(id, _)| id).collect();
        let texts: Vec<String> = store.iter().map(|(_, c)| c.text.clone()).collect();

        let mut offset = 0;
        for batch in texts.chunks(batch_size.max(1)) {
            let embeddings = embedder.embed_batch(batch)?;
            for (i, embedding) in embeddings.iter().enumerate() {
                index.insert(ids[offset + i], embedding)?;
            }
            offset += batch.len();
        }

        tracing::debug!(
            "Vector index built: {} chunks, {}D ({})",
            index.len(),
            embedder.dimension(),
            embedder.model_name()
        );

        Ok(Self {
            embedder,
            index,
            store,
            ef_search: config.hnsw_ef_search,
        })
    }

    /// Retrieve the top-k chunks for a query, best-first
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>, ChannelError> {
        let query_embedding = self.embedder.embed(query)?;
        let hits = self.index.search(&query_embedding, k, self.ef_search)?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| self.store.get(hit.id).cloned())
            .collect())
    }
}
