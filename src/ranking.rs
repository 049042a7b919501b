//! Summing per-token evidence, applying boosts, and selecting the top documents.

use crate::types::{DocId, RankedHit, ScoreVector};
use std::cmp::Ordering;

/// Accumulates one query's per-token scores into a final ranking.
///
/// Boosts are additive constants. They are only added to documents the
/// boost's match vector marks with a positive score; every other document
/// keeps its score, so a boost never creates a floor for non-matching
/// documents.
#[derive(Debug, Clone)]
pub struct RankedListBuilder {
  total: ScoreVector,
}

impl RankedListBuilder {
  /// Starts an all-zero ranking over `num_docs` documents.
  pub fn new(num_docs: usize) -> Self {
    Self {
      total: ScoreVector::zeros(num_docs),
    }
  }

  /// Adds one token's aggregated contribution.
  ///
  /// # Panics
  ///
  /// Panics if `scores` is aligned to a different corpus size.
  pub fn add(&mut self, scores: &ScoreVector) -> &mut Self {
    self.total.add_assign(scores);
    self
  }

  /// Adds `amount` to every document with a positive entry in `matched`.
  ///
  /// # Panics
  ///
  /// Panics if `matched` is aligned to a different corpus size.
  pub fn boost(&mut self, matched: &ScoreVector, amount: f32) -> &mut Self {
    assert_eq!(
      matched.len(),
      self.total.len(),
      "boost match vector is aligned to a different corpus size"
    );
    for doc_id in matched.support() {
      self.total.set(doc_id, self.total[doc_id] + amount);
    }
    self
  }

  /// Multiplies the scores of `docs` by `factor`.
  pub fn penalize(&mut self, docs: &[DocId], factor: f32) -> &mut Self {
    for &doc_id in docs {
      self.total.set(doc_id, self.total[doc_id] * factor);
    }
    self
  }

  /// The accumulated scores.
  pub fn scores(&self) -> &ScoreVector {
    &self.total
  }

  /// Mutable access to the accumulated scores.
  pub fn scores_mut(&mut self) -> &mut ScoreVector {
    &mut self.total
  }

  /// Consumes the builder and returns the accumulated scores.
  pub fn finish(self) -> ScoreVector {
    self.total
  }

  /// The `k` best documents of the accumulated scores.
  pub fn top_k(&self, k: usize) -> Vec<RankedHit> {
    top_k(&self.total, k)
  }
}

/// Selects the `k` highest-scoring documents.
///
/// Results are ordered by descending score; equal scores keep ascending
/// document-id order. Documents whose score is not strictly positive (or not
/// finite) are never returned.
pub fn top_k(scores: &[f32], k: usize) -> Vec<RankedHit> {
  if k == 0 {
    return Vec::new();
  }

  let mut hits: Vec<(DocId, f32)> = scores
    .iter()
    .copied()
    .enumerate()
    .filter(|(_, s)| s.is_finite() && *s > 0.0)
    .collect();

  // Stable sort: ties stay in document-id order.
  hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
  hits.truncate(k);

  hits
    .into_iter()
    .map(|(doc_id, score)| RankedHit::new(doc_id, score))
    .collect()
}
