//! Embedding similarity ranking

use shelfmate_core::Embedding;

/// Cosine similarity of `query` against every candidate, in candidate order
pub fn cosine_scores(query: &Embedding, candidates: &[Embedding]) -> Vec<f32> {
    candidates
        .iter()
        .map(|candidate| query.cosine_similarity(candidate))
        .collect()
}

/// Candidate indices by descending score.
///
/// The sort is stable, so equal scores keep their original (pool) order.
/// NaN scores sort last.
pub fn rank_by_score(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| sort_key(scores[b]).total_cmp(&sort_key(scores[a])));
    order
}

#[inline]
fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}
