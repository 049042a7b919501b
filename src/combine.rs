//! Boolean combination of per-token score vectors.

use crate::error::{Error, Result};
use crate::query::BoolOp;
use crate::types::{DocId, ScoreVector};
use serde::{Deserialize, Serialize};

/// Combines score vectors computed against the same corpus snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCombinator {
  op: BoolOp,
}

impl BooleanCombinator {
  /// Creates a combinator for `op`.
  pub fn new(op: BoolOp) -> Self {
    Self { op }
  }

  /// The operator this combinator applies.
  pub fn op(&self) -> BoolOp {
    self.op
  }

  /// Combines `vectors` into one vector of length `num_docs`.
  ///
  /// Both operators add the matching scores. `And` additionally zeroes every
  /// document that is missing from any input, so its support is the
  /// intersection of the inputs' supports while `Or` keeps the union. No input
  /// gives an all-zero vector.
  ///
  /// # Panics
  ///
  /// Panics if any vector is not `num_docs` long.
  pub fn combine(&self, vectors: &[ScoreVector], num_docs: usize) -> ScoreVector {
    let mut combined = ScoreVector::zeros(num_docs);
    for v in vectors {
      combined.add_assign(v);
    }

    if self.op == BoolOp::And && !vectors.is_empty() {
      for doc_id in 0..num_docs {
        if vectors.iter().any(|v| !v.matches(doc_id)) {
          combined.set(doc_id, 0.0);
        }
      }
    }
    combined
  }
}

/// A soft minimum-should-match.
///
/// Documents matching fewer than `max(fraction * n_tokens, 1)` of the query's
/// tokens are not dropped, their score is multiplied by `penalty` instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMatch {
  /// Share of the query tokens a document should match.
  #[serde(default = "default_fraction")]
  pub fraction: f32,
  /// Multiplier for documents below the requirement.
  #[serde(default = "default_penalty")]
  pub penalty: f32,
}

fn default_fraction() -> f32 {
  0.5
}

fn default_penalty() -> f32 {
  0.8
}

impl Default for MinMatch {
  fn default() -> Self {
    Self {
      fraction: default_fraction(),
      penalty: default_penalty(),
    }
  }
}

impl MinMatch {
  /// Creates a requirement of `fraction` of the tokens, scaling misses by `penalty`.
  pub fn new(fraction: f32, penalty: f32) -> Self {
    Self { fraction, penalty }
  }

  /// Number of tokens a document must match, never below one.
  pub fn required(&self, num_tokens: usize) -> f32 {
    (num_tokens as f32 * self.fraction).max(1.0)
  }

  /// Documents that matched too few of the per-token vectors.
  pub fn short_docs(&self, per_token: &[ScoreVector], num_docs: usize) -> Vec<DocId> {
    if per_token.is_empty() {
      return Vec::new();
    }
    let required = self.required(per_token.len());
    (0..num_docs)
      .filter(|&doc_id| (per_token.iter().filter(|v| v.matches(doc_id)).count() as f32) < required)
      .collect()
  }

  /// Checks that `fraction` is within `[0, 1]` and `penalty` is finite and non-negative.
  pub fn validate(&self) -> Result<()> {
    if !(0.0..=1.0).contains(&self.fraction) {
      return Err(Error::InvalidParameter {
        name: "fraction",
        value: self.fraction,
        reason: "must be within [0, 1]",
      });
    }
    if !self.penalty.is_finite() || self.penalty < 0.0 {
      return Err(Error::InvalidParameter {
        name: "penalty",
        value: self.penalty,
        reason: "must be finite and non-negative",
      });
    }
    Ok(())
  }
}
