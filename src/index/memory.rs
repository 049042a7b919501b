//! In-memory term statistics for one field.

use crate::index::provider::{Posting, TermStatsProvider};
use crate::tokenizer::Tokenizer;
use crate::types::DocId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Positional postings and length statistics for one field of a corpus.
///
/// A `FieldIndex` is computed once from the field's text and never mutated by
/// scoring. Rebuilding a field means building a new `FieldIndex` and attaching
/// it in place of the old one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldIndex {
  postings: HashMap<String, Vec<Posting>>,
  doc_lens: Vec<u32>,
  avg_doc_len: f32,
}

impl FieldIndex {
  /// Tokenizes and indexes one text per document, in document-id order.
  pub fn build<S, T>(texts: &[S], tokenizer: &T) -> Self
  where
    S: AsRef<str>,
    T: Tokenizer + ?Sized,
  {
    Self::from_tokens(texts.iter().map(|text| tokenizer.tokenize(text.as_ref())))
  }

  /// Indexes pre-tokenized documents, in document-id order.
  pub fn from_tokens<I, D, S>(docs: I) -> Self
  where
    I: IntoIterator<Item = D>,
    D: AsRef<[S]>,
    S: AsRef<str>,
  {
    let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
    let mut doc_lens = Vec::new();

    for (doc_id, tokens) in docs.into_iter().enumerate() {
      let tokens = tokens.as_ref();
      doc_lens.push(tokens.len() as u32);

      for (position, token) in tokens.iter().enumerate() {
        let list = postings.entry(token.as_ref().to_string()).or_default();
        match list.last_mut() {
          Some(last) if last.doc_id == doc_id => last.positions.push(position as u32),
          _ => list.push(Posting {
            doc_id,
            positions: vec![position as u32],
          }),
        }
      }
    }

    let total: u64 = doc_lens.iter().map(|&l| l as u64).sum();
    let avg_doc_len = if doc_lens.is_empty() {
      0.0
    } else {
      total as f32 / doc_lens.len() as f32
    };

    debug!(
      num_docs = doc_lens.len(),
      vocabulary = postings.len(),
      avg_doc_len,
      "built field index"
    );

    Self {
      postings,
      doc_lens,
      avg_doc_len,
    }
  }

  /// Per-document field lengths, in document-id order.
  pub fn doc_lens(&self) -> &[u32] {
    &self.doc_lens
  }

  /// Iterate all distinct tokens of the field.
  pub fn vocabulary(&self) -> impl Iterator<Item = &str> + '_ {
    self.postings.keys().map(String::as_str)
  }

  /// Occurrences of `token` in one document (0 if absent).
  pub fn term_freq(&self, doc_id: DocId, token: &str) -> u32 {
    let list = self.postings(token);
    list
      .binary_search_by_key(&doc_id, |p| p.doc_id)
      .map(|i| list[i].term_freq())
      .unwrap_or(0)
  }
}

impl TermStatsProvider for FieldIndex {
  fn num_docs(&self) -> usize {
    self.doc_lens.len()
  }

  fn avg_doc_len(&self) -> f32 {
    self.avg_doc_len
  }

  fn doc_len(&self, doc_id: DocId) -> u32 {
    self.doc_lens.get(doc_id).copied().unwrap_or(0)
  }

  fn postings(&self, token: &str) -> &[Posting] {
    self.postings.get(token).map(Vec::as_slice).unwrap_or(&[])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::index::provider::PhraseMode;
  use crate::tokenizer::punctuation_tokenize;

  fn ski_field() -> FieldIndex {
    FieldIndex::build(
      &[
        "I'd like to complain about the ski conditions",
        "conditions for ski jumping",
        "ski ski ski",
        "",
      ],
      &punctuation_tokenize,
    )
  }

  #[test]
  fn test_statistics() {
    let ix = ski_field();
    assert_eq!(ix.num_docs(), 4);
    assert_eq!(ix.doc_lens(), &[8, 4, 3, 0]);
    assert!((ix.avg_doc_len() - 15.0 / 4.0).abs() < 1e-6);
    assert_eq!(ix.doc_freq("ski"), 3);
    assert_eq!(ix.term_freq(2, "ski"), 3);
    assert_eq!(ix.term_freq(3, "ski"), 0);
    assert_eq!(ix.doc_freq("missing"), 0);
  }

  #[test]
  fn test_term_matches_are_aligned() {
    let ix = ski_field();
    let m = ix.term_matches("ski");
    assert_eq!(m.doc_ids, vec![0, 1, 2]);
    assert_eq!(m.term_freqs, vec![1.0, 1.0, 3.0]);
    assert_eq!(m.doc_lens, vec![8.0, 4.0, 3.0]);
    assert_eq!(m.doc_freq, 3);
  }

  #[test]
  fn test_phrase_document_frequency() {
    let ix = ski_field();
    let phrase = vec!["ski".to_string(), "conditions".to_string()];

    let adjacent = ix.phrase_matches(&phrase, PhraseMode::Adjacent);
    assert_eq!(adjacent.doc_ids, vec![0]);
    assert_eq!(adjacent.doc_freq, 1);

    let anywhere = ix.phrase_matches(&phrase, PhraseMode::CoOccurrence);
    assert_eq!(anywhere.doc_ids, vec![0, 1]);
    assert_eq!(anywhere.doc_freq, 2);
  }

  #[test]
  fn test_empty_field() {
    let ix = FieldIndex::from_tokens(Vec::<Vec<String>>::new());
    assert_eq!(ix.num_docs(), 0);
    assert_eq!(ix.avg_doc_len(), 0.0);
    assert!(ix.term_matches("x").is_empty());
  }
}
