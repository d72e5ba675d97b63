//! Hybrid retriever: dual-channel search plus rank fusion

use std::sync::Arc;

use crate::config::{IndexConfig, RetrievalConfig};
use crate::index::EmbeddingProvider;
use crate::retrieval::{
    reciprocal_rank_fusion, ChannelError, FusedResult, LexicalRetriever, VectorRetriever,
};
use crate::store::{Chunk, ChunkStore};

/// Combines the lexical and vector channels with Reciprocal Rank Fusion
///
/// An immutable snapshot over one corpus build; a rebuild constructs a new
/// instance which the pipeline swaps in atomically.
pub struct HybridRetriever {
    lexical: Option<LexicalRetriever>,
    vector: VectorRetriever,
    config: RetrievalConfig,
}

impl HybridRetriever {
    /// Build both channels over the given store
    ///
    /// A lexical build failure (e.g. empty corpus) disables that channel
    /// rather than failing; fusion then degrades to pure vector ranking.
    /// A vector build failure is fatal, since without embeddings there is
    /// no semantic channel to fall back on.
    pub fn build(
        store: Arc<ChunkStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
        index_config: &IndexConfig,
        batch_size: usize,
    ) -> Result<Self, ChannelError> {
        let lexical = match LexicalRetriever::build(Arc::clone(&store)) {
            Ok(retriever) => Some(retriever),
            Err(e) => {
                tracing::warn!("Lexical channel unavailable, degrading to vector-only: {}", e);
                None
            }
        };

        let vector = VectorRetriever::build(store, embedder, index_config, batch_size)?;

        Ok(Self {
            lexical,
            vector,
            config,
        })
    }

    /// Construct from prebuilt channels (used by tests and custom setups)
    pub fn from_channels(
        lexical: Option<LexicalRetriever>,
        vector: VectorRetriever,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            lexical,
            vector,
            config,
        }
    }

    /// Run both channels and fuse their rankings
    ///
    /// Channel errors are collapsed to empty lists here, logged but never
    /// propagated; retrieval failure must not fail the pipeline.
    pub fn retrieve(&self, query: &str) -> Vec<FusedResult> {
        let lexical_results = match &self.lexical {
            Some(retriever) => match retriever.retrieve(query, self.config.lexical_k) {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::warn!("Lexical retrieval failed, treating as empty: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let vector_results = match self.vector.retrieve(query, self.config.vector_k) {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::warn!("Vector retrieval failed, treating as empty: {}", e);
                Vec::new()
            }
        };

        reciprocal_rank_fusion(
            lexical_results,
            vector_results,
            self.config.fusion_k,
            self.config.fused_top_k,
        )
    }

    /// Fused chunks without scores, in fusion order
    pub fn retrieve_chunks(&self, query: &str) -> Vec<Chunk> {
        self.retrieve(query).into_iter().map(|f| f.chunk).collect()
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn has_lexical_channel(&self) -> bool {
        self.lexical.is_some()
    }
}
