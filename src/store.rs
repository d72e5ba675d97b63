//! Chunk store
//!
//! Holds the page-tagged text chunks produced by ingestion. The store is
//! read-only during query processing and replaced wholesale on corpus rebuild.

use serde::{Deserialize, Serialize};

/// Number of leading characters used to derive a chunk's `source_key`.
///
/// The key is the fusion join identity, not a unique id: two chunks sharing
/// an identical prefix fuse into one. Known and accepted limitation.
pub const SOURCE_KEY_PREFIX_LEN: usize = 50;

/// A page-tagged slice of source text, the unit of retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text content
    pub text: String,

    /// 1-based page number in the source document
    pub page_number: u32,

    /// Content-derived identity used as the fusion join key
    pub source_key: String,
}

impl Chunk {
    /// Create a chunk, deriving its source key from the text prefix
    pub fn new(text: impl Into<String>, page_number: u32) -> Self {
        let text = text.into();
        let source_key = derive_source_key(&text);
        Self {
            text,
            page_number,
            source_key,
        }
    }
}

/// Derive the fusion join key from chunk content
pub fn derive_source_key(text: &str) -> String {
    text.chars().take(SOURCE_KEY_PREFIX_LEN).collect()
}

/// Wire shape handed over by ingestion (one entry per chunk)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,

    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

/// Immutable collection of chunks backing both retrieval channels
///
/// Chunk ids are positions in the backing vector; both indexes store these
/// ids and resolve them back to chunks at query time.
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: Vec<Chunk>,
}

impl ChunkStore {
    /// Build a store from ingestion records, skipping empty texts
    pub fn from_records(records: Vec<ChunkRecord>) -> Self {
        let chunks = records
            .into_iter()
            .filter(|r| !r.text.trim().is_empty())
            .map(|r| Chunk::new(r.text, r.page.max(1)))
            .collect();
        Self { chunks }
    }

    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    /// Resolve a chunk id (vector/keyword index document id) to its chunk
    pub fn get(&self, id: u64) -> Option<&Chunk> {
        self.chunks.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &Chunk)> {
        self.chunks.iter().enumerate().map(|(i, c)| (i as u64, c))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_key_is_prefix() {
        let chunk = Chunk::new("apples are red", 1);
        assert_eq!(chunk.source_key, "apples are red");

        let long = "x".repeat(200);
        let chunk = Chunk::new(long, 2);
        assert_eq!(chunk.source_key.chars().count(), SOURCE_KEY_PREFIX_LEN);
    }

    #[test]
    fn test_source_key_counts_chars_not_bytes() {
        let text = "é".repeat(80);
        let chunk = Chunk::new(text, 1);
        assert_eq!(chunk.source_key.chars().count(), SOURCE_KEY_PREFIX_LEN);
    }

    #[test]
    fn test_from_records_skips_empty_and_clamps_page() {
        let store = ChunkStore::from_records(vec![
            ChunkRecord {
                text: "first".to_string(),
                page: 0,
            },
            ChunkRecord {
                text: "   ".to_string(),
                page: 3,
            },
            ChunkRecord {
                text: "second".to_string(),
                page: 2,
            },
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().page_number, 1);
        assert_eq!(store.get(1).unwrap().text, "second");
    }
}
