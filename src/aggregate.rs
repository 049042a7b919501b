//! Merging one token's evidence across several fields.
//!
//! Three strategies are available:
//!
//! - **Field-centric**: score every field independently and add the results.
//!   Fields act as corroborating evidence, so a token found in both the name
//!   and the description counts twice.
//! - **Term-centric** (dismax): score every field independently and keep the
//!   strongest one, so each token contributes at most one field's signal. A
//!   `tie` between 0 and 1 mixes back in a share of the other fields.
//! - **BM25F**: blend the raw, length-normalized term frequencies of all fields
//!   first, then apply saturation and one IDF computed from a shared document
//!   frequency. A token that happens to be rare in one short field is no longer
//!   rewarded as if it were rare in the whole corpus.

use crate::combine::BooleanCombinator;
use crate::error::{Error, Result};
use crate::index::provider::{PhraseMode, TermMatches, TermStatsProvider};
use crate::query::Query;
use crate::scorer::FieldScorer;
use crate::similarity::{bm25_idf, length_norm, validate_k1_b, Similarity};
use crate::types::ScoreVector;
use serde::{Deserialize, Serialize};

/// Strategy for merging per-field evidence of the same token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Aggregation {
  /// Sum of the per-field scores.
  FieldCentric,
  /// `max + tie * (sum - max)` of the per-field scores.
  TermCentric {
    /// Share of the non-winning fields added back; `0.0` is pure dismax.
    #[serde(default)]
    tie: f32,
  },
  /// Blended term frequency with a shared document frequency.
  ///
  /// The shared document frequency is the maximum of the per-field document
  /// frequencies. The configured similarity is not used.
  Bm25f {
    /// Saturation applied once to the blended frequency.
    k1: f32,
    /// Default length normalization for fields without their own `b`.
    b: f32,
  },
}

impl Default for Aggregation {
  fn default() -> Self {
    Self::TermCentric { tie: 0.0 }
  }
}

impl Aggregation {
  /// BM25F with the usual `k1 = 1.2`, `b = 0.75`.
  pub fn bm25f() -> Self {
    Self::Bm25f { k1: 1.2, b: 0.75 }
  }

  /// Checks the strategy's parameters.
  pub fn validate(&self) -> Result<()> {
    match *self {
      Self::FieldCentric => Ok(()),
      Self::TermCentric { tie } if (0.0..=1.0).contains(&tie) => Ok(()),
      Self::TermCentric { tie } => Err(Error::InvalidParameter {
        name: "tie",
        value: tie,
        reason: "must be within [0, 1]",
      }),
      Self::Bm25f { k1, b } => validate_k1_b(k1, b),
    }
  }
}

/// One field taking part in aggregation.
#[derive(Clone, Copy)]
pub struct WeightedField<'a> {
  /// The field's term statistics.
  pub stats: &'a dyn TermStatsProvider,
  /// Multiplier for this field's contribution.
  pub boost: f32,
  /// BM25F length normalization override for this field.
  pub b: Option<f32>,
}

impl<'a> WeightedField<'a> {
  /// A field with boost `1.0` and no `b` override.
  pub fn new(stats: &'a dyn TermStatsProvider) -> Self {
    Self {
      stats,
      boost: 1.0,
      b: None,
    }
  }

  /// Sets the boost.
  pub fn boost(mut self, boost: f32) -> Self {
    self.boost = boost;
    self
  }

  /// Sets the BM25F `b` override.
  pub fn b(mut self, b: f32) -> Self {
    self.b = Some(b);
    self
  }
}

/// Element-wise sum of per-field vectors.
pub fn field_centric(per_field: &[ScoreVector], num_docs: usize) -> ScoreVector {
  let mut total = ScoreVector::zeros(num_docs);
  for v in per_field {
    total.add_assign(v);
  }
  total
}

/// Element-wise `max + tie * (sum - max)` of per-field vectors.
pub fn term_centric(per_field: &[ScoreVector], num_docs: usize, tie: f32) -> ScoreVector {
  let mut best = ScoreVector::zeros(num_docs);
  for v in per_field {
    best.max_assign(v);
  }
  if tie > 0.0 {
    let sum = field_centric(per_field, num_docs);
    let blended: Vec<f32> = best
      .iter()
      .zip(sum.iter())
      .map(|(&max, &sum)| max + tie * (sum - max))
      .collect();
    return ScoreVector::from(blended);
  }
  best
}

/// Scores one query across several fields of the same corpus snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAggregator {
  aggregation: Aggregation,
  phrase_mode: PhraseMode,
}

impl FieldAggregator {
  /// Creates an aggregator for `aggregation`.
  pub fn new(aggregation: Aggregation) -> Self {
    Self {
      aggregation,
      phrase_mode: PhraseMode::default(),
    }
  }

  /// Sets how phrases match.
  pub fn phrase_mode(mut self, mode: PhraseMode) -> Self {
    self.phrase_mode = mode;
    self
  }

  /// The configured strategy.
  pub fn aggregation(&self) -> Aggregation {
    self.aggregation
  }

  /// Scores `query` in every field and merges the evidence.
  ///
  /// `similarity` is used by the field-centric and term-centric strategies;
  /// BM25F applies its own blended formula.
  ///
  /// # Panics
  ///
  /// Panics if the fields report different corpus sizes.
  pub fn score(
    &self,
    query: &Query,
    fields: &[WeightedField<'_>],
    similarity: &dyn Similarity,
  ) -> ScoreVector {
    let num_docs = fields.first().map_or(0, |f| f.stats.num_docs());

    match self.aggregation {
      Aggregation::Bm25f { k1, b } => self.bm25f(query, fields, num_docs, k1, b),
      Aggregation::FieldCentric => field_centric(&self.per_field(query, fields, similarity), num_docs),
      Aggregation::TermCentric { tie } => {
        term_centric(&self.per_field(query, fields, similarity), num_docs, tie)
      }
    }
  }

  /// Each field's boosted score for `query`, in field order.
  pub fn per_field(
    &self,
    query: &Query,
    fields: &[WeightedField<'_>],
    similarity: &dyn Similarity,
  ) -> Vec<ScoreVector> {
    fields
      .iter()
      .map(|f| {
        let mut v = FieldScorer::new(f.stats, similarity)
          .phrase_mode(self.phrase_mode)
          .score(query);
        v.scale(f.boost);
        v
      })
      .collect()
  }

  fn bm25f(
    &self,
    query: &Query,
    fields: &[WeightedField<'_>],
    num_docs: usize,
    k1: f32,
    b: f32,
  ) -> ScoreVector {
    match query {
      Query::Token(token) => blend(fields, num_docs, k1, b, |stats| stats.term_matches(token)),
      Query::Phrase(tokens) => blend(fields, num_docs, k1, b, |stats| {
        stats.phrase_matches(tokens, self.phrase_mode)
      }),
      Query::Boolean(children, op) => {
        let vectors: Vec<ScoreVector> = children
          .iter()
          .map(|c| self.bm25f(c, fields, num_docs, k1, b))
          .collect();
        BooleanCombinator::new(*op).combine(&vectors, num_docs)
      }
    }
  }
}

fn blend<F>(fields: &[WeightedField<'_>], num_docs: usize, k1: f32, b: f32, matches: F) -> ScoreVector
where
  F: Fn(&dyn TermStatsProvider) -> TermMatches,
{
  let mut blended = vec![0.0f32; num_docs];
  let mut doc_freq = 0usize;

  for field in fields {
    assert_eq!(
      field.stats.num_docs(),
      num_docs,
      "fields are aligned to different corpus sizes"
    );
    let m = matches(field.stats);
    doc_freq = doc_freq.max(m.doc_freq);

    let avg_doc_len = field.stats.avg_doc_len();
    if avg_doc_len <= 0.0 {
      continue;
    }
    let b = field.b.unwrap_or(b);
    for ((&doc_id, &tf), &len) in m.doc_ids.iter().zip(&m.term_freqs).zip(&m.doc_lens) {
      let norm = length_norm(len, avg_doc_len, b);
      if norm > 0.0 {
        blended[doc_id] += field.boost * tf / norm;
      }
    }
  }

  let idf = bm25_idf(doc_freq as f32, num_docs as f32);
  let scores: Vec<f32> = blended
    .into_iter()
    .map(|tf| {
      let s = if tf > 0.0 { tf / (tf + k1) * idf } else { 0.0 };
      if s.is_finite() {
        s
      } else {
        0.0
      }
    })
    .collect();
  ScoreVector::from(scores)
}
