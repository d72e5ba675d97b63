//! Reciprocal Rank Fusion over the two retrieval channels

use std::collections::{HashMap, HashSet};

use crate::retrieval::{FusedResult, RankedResult};
use crate::store::Chunk;

/// Merge two ranked chunk lists with Reciprocal Rank Fusion
///
/// Each chunk contributes `1 / (k + rank)` per channel it appears in, where
/// rank is its 1-based position in that channel's list; contributions are
/// accumulated per `source_key`. The fused list is the union of both
/// channels, sorted by score descending, ties broken by first-encounter
/// order (lexical list scanned before vector list), truncated to `top_k`.
///
/// A duplicate `source_key` within one channel only counts its first
/// occurrence, and the first-seen chunk object is the one kept.
pub fn reciprocal_rank_fusion(
    lexical: Vec<Chunk>,
    vector: Vec<Chunk>,
    k: f64,
    top_k: usize,
) -> Vec<FusedResult> {
    // Entries stay in first-encounter order; the stable sort below turns
    // that order into the tie-break rule.
    let mut entries: Vec<FusedResult> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for channel in [lexical, vector] {
        let mut seen_in_channel: HashSet<String> = HashSet::new();

        let ranked = channel
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| RankedResult { chunk, rank: i + 1 });

        for result in ranked {
            let key = result.chunk.source_key.clone();
            if !seen_in_channel.insert(key.clone()) {
                continue;
            }

            let contribution = 1.0 / (k + result.rank as f64);
            match by_key.get(&key) {
                Some(&idx) => entries[idx].score += contribution,
                None => {
                    by_key.insert(key, entries.len());
                    entries.push(FusedResult {
                        chunk: result.chunk,
                        score: contribution,
                    });
                }
            }
        }
    }

    entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    entries.truncate(top_k);
    entries
}
