//! Similarity result ranking — threshold filtering, ordering, truncation.
//!
//! Storage returns candidates already scored; this module applies the
//! orchestrator-side shaping rules that must stay identical across every
//! front-end.

use crate::memory::types::MemoryQueryResult;

/// Filter, order, and truncate scored candidates.
///
/// - Candidates with a score below `threshold` are dropped; candidates with
///   no score are never threshold-filtered.
/// - Ordering is descending by score with a stable sort, so equal-score
///   items keep their storage order.
/// - The result is truncated to `top_k` after filtering.
pub fn rank(
    mut candidates: Vec<MemoryQueryResult>,
    top_k: usize,
    threshold: Option<f64>,
) -> Vec<MemoryQueryResult> {
    if let Some(min) = threshold {
        candidates.retain(|r| r.relevance_score.map_or(true, |s| s >= min));
    }

    // Vec::sort_by is stable. Unscored items order after scored ones.
    candidates.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    candidates.truncate(top_k);
    candidates
}

/// Remove the result whose memory carries `content_hash` — used by
/// similar-to queries so the seed memory never appears in its own results.
pub fn exclude_hash(
    candidates: Vec<MemoryQueryResult>,
    content_hash: &str,
) -> Vec<MemoryQueryResult> {
    candidates
        .into_iter()
        .filter(|r| r.memory.content_hash != content_hash)
        .collect()
}
