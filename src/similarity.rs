//! Pluggable similarity functions: from raw term counts to BM25.
//!
//! A similarity maps the statistics of one term (or phrase) over the documents
//! that contain it to one relevance contribution per document. Every
//! implementation here is pure and total: zero frequencies score zero, and
//! degenerate statistics (zero document frequency, zero average length) map to
//! finite values instead of dividing by zero.
//!
//! The policies form a progression, each fixing a weakness of the previous one:
//!
//! | Policy | Score |
//! |---|---|
//! | [`RawTermCount`] | `tf` |
//! | [`IdfWeighted`] | `tf / df` (or `tf / (df + 1)` when smoothed) |
//! | [`SaturatedTfIdf`] | `ln(1 + tf) / (df + 1)` |
//! | [`LengthNormalized`] | `ln(1 + tf) / (df + 1) / (len + 1)` |
//! | [`Bm25`] | saturation and length normalization tuned by `k1` and `b` |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Statistics of one term over the documents that contain it.
///
/// `term_freqs` and `doc_lens` are aligned positionally: entry `i` of each
/// describes the same matching document.
#[derive(Debug, Clone, Copy)]
pub struct TermStats<'a> {
  /// Term frequency per matching document.
  pub term_freqs: &'a [f32],
  /// Number of documents containing the term (or satisfying the phrase).
  pub doc_freq: f32,
  /// Field length per matching document.
  pub doc_lens: &'a [f32],
  /// Mean field length over the whole corpus.
  pub avg_doc_len: f32,
  /// Corpus size.
  pub num_docs: usize,
}

/// A relevance policy, selected by the caller at scoring time.
///
/// `score` must return exactly one value per entry of `stats.term_freqs`.
/// Closures with the matching signature are similarities too, so ad hoc
/// policies can be passed without declaring a type.
pub trait Similarity: Send + Sync {
  /// Scores every matching document.
  fn score(&self, stats: &TermStats<'_>) -> Vec<f32>;
}

impl<F> Similarity for F
where
  F: Fn(&TermStats<'_>) -> Vec<f32> + Send + Sync,
{
  fn score(&self, stats: &TermStats<'_>) -> Vec<f32> {
    self(stats)
  }
}

fn finite_or_zero(v: f32) -> f32 {
  if v.is_finite() {
    v
  } else {
    0.0
  }
}

fn map_tfs(stats: &TermStats<'_>, f: impl Fn(f32, f32) -> f32) -> Vec<f32> {
  stats
    .term_freqs
    .iter()
    .zip(stats.doc_lens)
    .map(|(&tf, &len)| if tf > 0.0 { finite_or_zero(f(tf, len)) } else { 0.0 })
    .collect()
}

/// Scores by repetition alone: `tf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTermCount;

impl Similarity for RawTermCount {
  fn score(&self, stats: &TermStats<'_>) -> Vec<f32> {
    map_tfs(stats, |tf, _| tf)
  }
}

/// Down-weights common terms: `tf / df`.
///
/// Unsmoothed, a document frequency below one is treated as one. Smoothed,
/// the denominator is `df + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdfWeighted {
  /// Use `tf / (df + 1)`.
  pub smoothed: bool,
}

impl Similarity for IdfWeighted {
  fn score(&self, stats: &TermStats<'_>) -> Vec<f32> {
    let denom = if self.smoothed {
      stats.doc_freq.max(0.0) + 1.0
    } else {
      stats.doc_freq.max(1.0)
    };
    map_tfs(stats, |tf, _| tf / denom)
  }
}

/// Repeated occurrences give diminishing returns: `ln(1 + tf) / (df + 1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaturatedTfIdf;

impl Similarity for SaturatedTfIdf {
  fn score(&self, stats: &TermStats<'_>) -> Vec<f32> {
    let denom = stats.doc_freq.max(0.0) + 1.0;
    map_tfs(stats, |tf, _| tf.ln_1p() / denom)
  }
}

/// Saturated TF-IDF that favors short fields: divided by `len + 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthNormalized;

impl Similarity for LengthNormalized {
  fn score(&self, stats: &TermStats<'_>) -> Vec<f32> {
    let denom = stats.doc_freq.max(0.0) + 1.0;
    map_tfs(stats, |tf, len| tf.ln_1p() / denom / (len.max(0.0) + 1.0))
  }
}

/// BM25 inverse document frequency: `ln((N - df + 0.5) / (df + 0.5) + 1)`.
///
/// Always positive and finite. `df = 0` gives the largest value; a `df`
/// larger than `N` is clamped to `N`.
pub fn bm25_idf(doc_freq: f32, num_docs: f32) -> f32 {
  let n = num_docs.max(0.0);
  let df = doc_freq.clamp(0.0, n);
  ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// BM25 length normalization: `1 - b + b * len / avg_len`.
///
/// Callers must ensure `avg_doc_len > 0`.
pub fn length_norm(doc_len: f32, avg_doc_len: f32, b: f32) -> f32 {
  1.0 - b + b * doc_len / avg_doc_len
}

/// Okapi BM25.
///
/// `tf * (k1 + 1) / (tf + k1 * (1 - b + b * len / avg_len)) * idf`, with
/// [`bm25_idf`]. A field whose average length is zero contributes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25 {
  /// Term-frequency saturation. Higher values saturate more slowly.
  pub k1: f32,
  /// Length normalization strength, from 0 (none) to 1 (full).
  pub b: f32,
}

impl Default for Bm25 {
  fn default() -> Self {
    Self { k1: 1.2, b: 0.75 }
  }
}

impl Bm25 {
  /// Creates BM25 parameters, rejecting a negative `k1` or a `b` outside `[0, 1]`.
  pub fn new(k1: f32, b: f32) -> Result<Self> {
    validate_k1_b(k1, b)?;
    Ok(Self { k1, b })
  }
}

pub(crate) fn validate_k1_b(k1: f32, b: f32) -> Result<()> {
  if !(k1.is_finite() && k1 >= 0.0) {
    return Err(Error::InvalidParameter {
      name: "k1",
      value: k1,
      reason: "must be finite and non-negative",
    });
  }
  if !(0.0..=1.0).contains(&b) {
    return Err(Error::InvalidParameter {
      name: "b",
      value: b,
      reason: "must be within [0, 1]",
    });
  }
  Ok(())
}

impl Similarity for Bm25 {
  fn score(&self, stats: &TermStats<'_>) -> Vec<f32> {
    if stats.avg_doc_len <= 0.0 {
      return vec![0.0; stats.term_freqs.len()];
    }
    let idf = bm25_idf(stats.doc_freq, stats.num_docs as f32);
    let Self { k1, b } = *self;
    map_tfs(stats, |tf, len| {
      let norm = length_norm(len, stats.avg_doc_len, b);
      tf * (k1 + 1.0) / (tf + k1 * norm) * idf
    })
  }
}

/// Serializable choice of similarity, used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimilarityKind {
  /// [`RawTermCount`].
  RawTermCount,
  /// [`IdfWeighted`].
  IdfWeighted {
    /// Use `df + 1` as the denominator.
    #[serde(default)]
    smoothed: bool,
  },
  /// [`SaturatedTfIdf`].
  SaturatedTfIdf,
  /// [`LengthNormalized`].
  LengthNormalized,
  /// [`Bm25`].
  Bm25 {
    /// Saturation.
    k1: f32,
    /// Length normalization.
    b: f32,
  },
}

impl Default for SimilarityKind {
  fn default() -> Self {
    let Bm25 { k1, b } = Bm25::default();
    Self::Bm25 { k1, b }
  }
}

impl SimilarityKind {
  /// Instantiates the chosen policy, validating its parameters.
  pub fn build(&self) -> Result<Box<dyn Similarity>> {
    Ok(match *self {
      Self::RawTermCount => Box::new(RawTermCount),
      Self::IdfWeighted { smoothed } => Box::new(IdfWeighted { smoothed }),
      Self::SaturatedTfIdf => Box::new(SaturatedTfIdf),
      Self::LengthNormalized => Box::new(LengthNormalized),
      Self::Bm25 { k1, b } => Box::new(Bm25::new(k1, b)?),
    })
  }
}
