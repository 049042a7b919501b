//! Core data types shared by every stage of the scoring pipeline.

use serde::{Deserialize, Serialize};
use std::ops::{Deref, Index};

/// Type alias for document identifiers.
///
/// Documents are addressed by their position in the corpus snapshot, so a
/// `DocId` is also the index of that document's slot in every [`ScoreVector`]
/// computed against the snapshot.
pub type DocId = usize;

/// One relevance contribution per document of a corpus snapshot.
///
/// A `ScoreVector` always has exactly `num_docs` entries and is aligned with
/// the document-id ordering of the snapshot it was computed against. Documents
/// without a contribution hold `0.0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreVector(Vec<f32>);

impl ScoreVector {
  /// Creates an all-zero vector for a corpus of `num_docs` documents.
  pub fn zeros(num_docs: usize) -> Self {
    Self(vec![0.0; num_docs])
  }

  /// Number of documents this vector is aligned to.
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Returns `true` when the vector covers an empty corpus.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Returns the underlying scores.
  pub fn as_slice(&self) -> &[f32] {
    &self.0
  }

  /// Consumes the vector and returns the underlying scores.
  pub fn into_inner(self) -> Vec<f32> {
    self.0
  }

  /// Sets the score of a single document.
  pub fn set(&mut self, doc_id: DocId, score: f32) {
    self.0[doc_id] = score;
  }

  /// Adds `other` element-wise into `self`.
  ///
  /// # Panics
  ///
  /// Panics if the two vectors are aligned to different corpus sizes.
  pub fn add_assign(&mut self, other: &ScoreVector) {
    self.assert_aligned(other);
    for (a, b) in self.0.iter_mut().zip(&other.0) {
      *a += *b;
    }
  }

  /// Keeps the element-wise maximum of `self` and `other`.
  ///
  /// # Panics
  ///
  /// Panics if the two vectors are aligned to different corpus sizes.
  pub fn max_assign(&mut self, other: &ScoreVector) {
    self.assert_aligned(other);
    for (a, b) in self.0.iter_mut().zip(&other.0) {
      *a = a.max(*b);
    }
  }

  /// Multiplies every score by `factor`.
  pub fn scale(&mut self, factor: f32) {
    for s in &mut self.0 {
      *s *= factor;
    }
  }

  /// Returns `true` if the document has a strictly positive score.
  pub fn matches(&self, doc_id: DocId) -> bool {
    self.0.get(doc_id).is_some_and(|s| *s > 0.0)
  }

  /// The ids of all documents with a strictly positive score, ascending.
  pub fn support(&self) -> Vec<DocId> {
    self
      .0
      .iter()
      .enumerate()
      .filter(|(_, s)| **s > 0.0)
      .map(|(id, _)| id)
      .collect()
  }

  fn assert_aligned(&self, other: &ScoreVector) {
    assert_eq!(
      self.len(),
      other.len(),
      "score vectors are aligned to different corpus sizes"
    );
  }
}

impl From<Vec<f32>> for ScoreVector {
  fn from(scores: Vec<f32>) -> Self {
    Self(scores)
  }
}

impl Deref for ScoreVector {
  type Target = [f32];

  fn deref(&self) -> &[f32] {
    &self.0
  }
}

impl Index<DocId> for ScoreVector {
  type Output = f32;

  fn index(&self, doc_id: DocId) -> &f32 {
    &self.0[doc_id]
  }
}

/// A single entry of a ranked result list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
  /// The document's position in the corpus snapshot.
  pub doc_id: DocId,
  /// The final relevance score, boosts included.
  pub score: f32,
}

impl RankedHit {
  /// Creates a new hit.
  pub fn new(doc_id: DocId, score: f32) -> Self {
    Self { doc_id, score }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_support_lists_positive_scores_only() {
    let v = ScoreVector::from(vec![0.0, 1.5, 0.0, 0.2]);
    assert_eq!(v.support(), vec![1, 3]);
    assert!(v.matches(1));
    assert!(!v.matches(2));
    assert!(!v.matches(10));
  }

  #[test]
  fn test_add_and_max() {
    let mut a = ScoreVector::from(vec![1.0, 0.0, 2.0]);
    let b = ScoreVector::from(vec![0.5, 3.0, 1.0]);
    let mut m = a.clone();
    a.add_assign(&b);
    m.max_assign(&b);
    assert_eq!(a.as_slice(), &[1.5, 3.0, 3.0]);
    assert_eq!(m.as_slice(), &[1.0, 3.0, 2.0]);
  }

  #[test]
  #[should_panic(expected = "different corpus sizes")]
  fn test_misaligned_add_panics() {
    let mut a = ScoreVector::zeros(2);
    a.add_assign(&ScoreVector::zeros(3));
  }
}
