//! HNSW vector index backing the semantic channel

use hnsw_rs::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Insert failed: {0}")]
    InsertError(String),

    #[error("Search failed: {0}")]
    SearchError(String),

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}

/// Vector search hit: chunk id plus cosine similarity score
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: u64,
    pub score: f32,
}

/// In-memory HNSW index over chunk embeddings
///
/// Uses cosine distance; built once per corpus and replaced wholesale on
/// rebuild, so searches never observe a partially built graph.
pub struct VectorIndex {
    index: Hnsw<'static, f32, DistCosine>,
    dimension: usize,
    count: u64,
}

impl VectorIndex {
    /// Create an empty index
    ///
    /// # Arguments
    /// * `dimension` - vector dimension, must match the embedding provider
    /// * `capacity` - expected number of vectors
    /// * `m` - HNSW connections per layer
    /// * `ef_construction` - construction beam width (higher = better recall)
    pub fn new(dimension: usize, capacity: usize, m: usize, ef_construction: usize) -> Self {
        let index = Hnsw::<f32, DistCosine>::new(
            m,
            capacity.max(1),
            16, // max layer
            ef_construction,
            DistCosine,
        );

        Self {
            index,
            dimension,
            count: 0,
        }
    }

    /// Insert a vector under the given chunk id
    pub fn insert(&mut self, id: u64, vector: &[f32]) -> Result<(), VectorIndexError> {
        if vector.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        let data = vector.to_vec();
        self.index.insert((&data, id as usize));
        self.count += 1;

        Ok(())
    }

    /// Insert multiple vectors in batch
    pub fn insert_batch(&mut self, items: &[(u64, Vec<f32>)]) -> Result<(), VectorIndexError> {
        for (id, vector) in items {
            self.insert(*id, vector)?;
        }
        Ok(())
    }

    /// Search for the k nearest neighbors, best-first
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<VectorHit>, VectorIndexError> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        if self.count == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let neighbours = self.index.search(query, k, ef_search);

        Ok(neighbours
            .into_iter()
            .map(|n| VectorHit {
                id: n.d_id as u64,
                // Convert cosine distance to similarity
                score: 1.0 - n.distance,
            })
            .collect())
    }

    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_search() {
        let mut index = VectorIndex::new(4, 16, 16, 200);

        index.insert(0, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        index.insert(1, &[0.0, 1.0, 0.0, 0.0]).unwrap();
        index.insert(2, &[0.9, 0.1, 0.0, 0.0]).unwrap();

        assert_eq!(index.len(), 3);

        let hits = index.search(&[1.0, 0.0, 0.0, 0.0], 2, 50).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].id == 0 || hits[0].id == 2);
        assert!(hits[0].score > 0.8);
    }

    #[test]
    fn test_dimension_validation() {
        let mut index = VectorIndex::new(4, 16, 16, 200);

        assert!(index.insert(0, &[1.0, 0.0]).is_err());
        index.insert(0, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(index.search(&[1.0], 1, 50).is_err());
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = VectorIndex::new(4, 16, 16, 200);
        let hits = index.search(&[1.0, 0.0, 0.0, 0.0], 3, 50).unwrap();
        assert!(hits.is_empty());
    }
}
