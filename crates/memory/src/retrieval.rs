//! Memory ranking for prompt assembly and negotiation recall.
//!
//! Ranking is by weight descending with a stable tie-break: memories with
//! equal weight keep their original insertion order.

use crate::schema::Memory;

/// Rank memories by weight, highest first.  Stable: ties preserve the
/// caller's ordering.  Returns references — nothing is cloned.
pub fn rank_by_weight(memories: &[Memory]) -> Vec<&Memory> {
    let mut ranked: Vec<&Memory> = memories.iter().collect();
    ranked.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    ranked
}

/// The top `limit` memories by descending weight.
pub fn top_memories(memories: &[Memory], limit: usize) -> Vec<&Memory> {
    let mut ranked = rank_by_weight(memories);
    ranked.truncate(limit);
    ranked
}

/// The single strongest memory, if any — surfaced as the "referenced memory"
/// in a negotiation's first log entry.
pub fn recall_strongest(memories: &[Memory]) -> Option<&Memory> {
    rank_by_weight(memories).into_iter().next()
}

// ── Tests ────────────────────────────────────────────────────────────────────
