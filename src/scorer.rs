//! Scoring one query against one field.

use crate::combine::BooleanCombinator;
use crate::index::provider::{PhraseMode, TermMatches, TermStatsProvider};
use crate::query::Query;
use crate::similarity::{Bm25, Similarity, TermStats};
use crate::types::ScoreVector;
use tracing::trace;

/// Evaluates queries against one field's term statistics with a chosen similarity.
///
/// The similarity only ever sees documents that match; every other document
/// scores exactly `0.0`.
pub struct FieldScorer<'a> {
  field: &'a dyn TermStatsProvider,
  similarity: &'a dyn Similarity,
  phrase_mode: PhraseMode,
}

impl<'a> FieldScorer<'a> {
  /// Creates a scorer over `field` using `similarity`.
  pub fn new(field: &'a dyn TermStatsProvider, similarity: &'a dyn Similarity) -> Self {
    Self {
      field,
      similarity,
      phrase_mode: PhraseMode::default(),
    }
  }

  /// Sets how phrases match. Defaults to [`PhraseMode::Adjacent`].
  pub fn phrase_mode(mut self, mode: PhraseMode) -> Self {
    self.phrase_mode = mode;
    self
  }

  /// Corpus size of the underlying field.
  pub fn num_docs(&self) -> usize {
    self.field.num_docs()
  }

  /// Scores `query` over every document of the field.
  pub fn score(&self, query: &Query) -> ScoreVector {
    match query {
      Query::Token(token) => self.score_matches(&self.field.term_matches(token)),
      Query::Phrase(tokens) => {
        self.score_matches(&self.field.phrase_matches(tokens, self.phrase_mode))
      }
      Query::Boolean(children, op) => {
        let vectors: Vec<ScoreVector> = children.iter().map(|c| self.score(c)).collect();
        BooleanCombinator::new(*op).combine(&vectors, self.num_docs())
      }
    }
  }

  /// Runs the similarity over precomputed matches and scatters the result.
  ///
  /// # Panics
  ///
  /// Panics if the similarity returns a different number of scores than there
  /// are matching documents.
  pub fn score_matches(&self, matches: &TermMatches) -> ScoreVector {
    let mut scores = ScoreVector::zeros(self.num_docs());
    if matches.is_empty() {
      return scores;
    }

    let stats = TermStats {
      term_freqs: &matches.term_freqs,
      doc_freq: matches.doc_freq as f32,
      doc_lens: &matches.doc_lens,
      avg_doc_len: self.field.avg_doc_len(),
      num_docs: self.num_docs(),
    };
    let values = self.similarity.score(&stats);
    assert_eq!(
      values.len(),
      matches.len(),
      "similarity returned {} scores for {} matching documents",
      values.len(),
      matches.len()
    );

    for (&doc_id, value) in matches.doc_ids.iter().zip(values) {
      scores.set(doc_id, if value.is_finite() { value } else { 0.0 });
    }
    trace!(doc_freq = matches.doc_freq, "scored matches");
    scores
  }
}

/// Scores a token, phrase or boolean query against `field` with default BM25.
pub fn score(query: impl Into<Query>, field: &dyn TermStatsProvider) -> ScoreVector {
  score_with(query, field, &Bm25::default())
}

/// Scores a token, phrase or boolean query against `field` with `similarity`.
pub fn score_with(
  query: impl Into<Query>,
  field: &dyn TermStatsProvider,
  similarity: &dyn Similarity,
) -> ScoreVector {
  FieldScorer::new(field, similarity).score(&query.into())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::index::memory::FieldIndex;
  use crate::query::BoolOp;
  use crate::similarity::{RawTermCount, TermStats};
  use crate::tokenizer::punctuation_tokenize;

  fn field() -> FieldIndex {
    FieldIndex::build(
      &[
        "ski conditions in west virginia",
        "conditions were bad for ski",
        "sunny weather",
      ],
      &punctuation_tokenize,
    )
  }

  #[test]
  fn test_absent_token_is_zero_vector() {
    let ix = field();
    assert_eq!(score("snowboard", &ix), ScoreVector::zeros(3));
  }

  #[test]
  fn test_non_matching_docs_are_exactly_zero() {
    let ix = field();
    let v = score("ski", &ix);
    assert!(v[0] > 0.0 && v[1] > 0.0);
    assert_eq!(v[2], 0.0);
  }

  #[test]
  fn test_phrase_modes() {
    let ix = field();
    let phrase = Query::phrase(["ski", "conditions"]);

    let adjacent = FieldScorer::new(&ix, &RawTermCount).score(&phrase);
    assert_eq!(adjacent.support(), vec![0]);

    let anywhere = FieldScorer::new(&ix, &RawTermCount)
      .phrase_mode(PhraseMode::CoOccurrence)
      .score(&phrase);
    assert_eq!(anywhere.support(), vec![0, 1]);
  }

  #[test]
  fn test_phrase_without_matches_is_empty_result() {
    let ix = field();
    let v = score(Query::phrase(["virginia", "ski"]), &ix);
    assert!(v.support().is_empty());
  }

  #[test]
  fn test_multi_word_string_is_literal() {
    let ix = field();
    assert!(score("ski conditions", &ix).support().is_empty());
  }

  #[test]
  fn test_boolean_in_field() {
    let ix = field();
    let and = score(Query::tokens(["ski", "west"], BoolOp::And), &ix);
    let or = score(Query::tokens(["ski", "west"], BoolOp::Or), &ix);
    assert_eq!(and.support(), vec![0]);
    assert_eq!(or.support(), vec![0, 1]);
  }

  #[test]
  fn test_empty_query_is_zero() {
    let ix = field();
    assert_eq!(score(Query::Boolean(vec![], BoolOp::Or), &ix), ScoreVector::zeros(3));
    assert_eq!(score(Query::Phrase(vec![]), &ix), ScoreVector::zeros(3));
  }

  fn too_short(_: &TermStats<'_>) -> Vec<f32> {
    Vec::new()
  }

  #[test]
  #[should_panic(expected = "similarity returned 0 scores")]
  fn test_wrong_length_similarity_panics() {
    let ix = field();
    score_with("ski", &ix, &too_short);
  }

  fn not_a_number(s: &TermStats<'_>) -> Vec<f32> {
    vec![f32::NAN; s.term_freqs.len()]
  }

  #[test]
  fn test_non_finite_scores_are_dropped() {
    let ix = field();
    let v = score_with("ski", &ix, &not_a_number);
    assert!(v.iter().all(|s| s.is_finite()));
  }
}
