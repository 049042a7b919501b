//! Defines the `TermStatsProvider` trait consumed by field scoring.

use crate::types::DocId;
use serde::{Deserialize, Serialize};

/// The occurrences of one term in one document's field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
  /// The document containing the term.
  pub doc_id: DocId,
  /// Token offsets of every occurrence, ascending.
  pub positions: Vec<u32>,
}

impl Posting {
  /// Number of occurrences of the term in this document.
  pub fn term_freq(&self) -> u32 {
    self.positions.len() as u32
  }
}

/// How a phrase (an ordered token list) matches a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseMode {
  /// Tokens must appear at consecutive positions, in order. The phrase
  /// frequency is the number of places the full sequence starts.
  #[default]
  Adjacent,
  /// Tokens must all appear somewhere in the field, in any order. The phrase
  /// frequency is the smallest frequency among the tokens.
  CoOccurrence,
}

/// Term statistics restricted to the documents that match a term or phrase.
///
/// `doc_ids`, `term_freqs` and `doc_lens` are aligned positionally. `doc_freq`
/// is the number of matching documents, which for a phrase is the number of
/// documents satisfying the whole phrase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermMatches {
  /// Matching documents, ascending.
  pub doc_ids: Vec<DocId>,
  /// Term (or phrase) frequency per matching document.
  pub term_freqs: Vec<f32>,
  /// Field length per matching document.
  pub doc_lens: Vec<f32>,
  /// Documents matching the term or phrase.
  pub doc_freq: usize,
}

impl TermMatches {
  fn with_capacity(capacity: usize) -> Self {
    Self {
      doc_ids: Vec::with_capacity(capacity),
      term_freqs: Vec::with_capacity(capacity),
      doc_lens: Vec::with_capacity(capacity),
      doc_freq: 0,
    }
  }

  fn push(&mut self, doc_id: DocId, term_freq: u32, doc_len: u32) {
    self.doc_ids.push(doc_id);
    self.term_freqs.push(term_freq as f32);
    self.doc_lens.push(doc_len as f32);
    self.doc_freq += 1;
  }

  /// Number of matching documents.
  pub fn len(&self) -> usize {
    self.doc_ids.len()
  }

  /// Returns `true` when nothing matched.
  pub fn is_empty(&self) -> bool {
    self.doc_ids.is_empty()
  }
}

/// Read-only term statistics for one field of a corpus snapshot.
///
/// Implementors only need to expose postings and lengths; term and phrase
/// matching are derived from them. Postings returned for a token must be sorted
/// by ascending `doc_id` and contain each document at most once.
///
/// The `Send` and `Sync` bounds allow one snapshot to be scored by many
/// queries concurrently.
pub trait TermStatsProvider: Send + Sync {
  /// Total number of documents in the snapshot, matching or not.
  fn num_docs(&self) -> usize;

  /// Mean field length over all documents. `0.0` for an empty field.
  fn avg_doc_len(&self) -> f32;

  /// Field length (in tokens) of a document.
  fn doc_len(&self, doc_id: DocId) -> u32;

  /// Postings for `token`; an empty slice when the token never occurs.
  fn postings(&self, token: &str) -> &[Posting];

  /// Number of documents containing `token` at least once.
  fn doc_freq(&self, token: &str) -> usize {
    self.postings(token).len()
  }

  /// Statistics for a single token over the documents that contain it.
  fn term_matches(&self, token: &str) -> TermMatches {
    let postings = self.postings(token);
    let mut matches = TermMatches::with_capacity(postings.len());
    for posting in postings {
      if posting.positions.is_empty() {
        continue;
      }
      matches.push(posting.doc_id, posting.term_freq(), self.doc_len(posting.doc_id));
    }
    matches
  }

  /// Statistics for a phrase over the documents that satisfy it.
  ///
  /// A one-token phrase is the token itself; an empty phrase matches nothing.
  fn phrase_matches(&self, tokens: &[String], mode: PhraseMode) -> TermMatches {
    match tokens {
      [] => TermMatches::default(),
      [single] => self.term_matches(single),
      _ => {
        let lists: Vec<&[Posting]> = tokens.iter().map(|t| self.postings(t)).collect();
        if lists.iter().any(|l| l.is_empty()) {
          return TermMatches::default();
        }

        let mut matches = TermMatches::default();
        let mut positions: Vec<&[u32]> = Vec::with_capacity(lists.len());
        'docs: for lead in lists[0] {
          positions.clear();
          positions.push(&lead.positions);
          for list in &lists[1..] {
            match list.binary_search_by_key(&lead.doc_id, |p| p.doc_id) {
              Ok(i) => positions.push(&list[i].positions),
              Err(_) => continue 'docs,
            }
          }

          let freq = phrase_freq(&positions, mode);
          if freq > 0 {
            matches.push(lead.doc_id, freq, self.doc_len(lead.doc_id));
          }
        }
        matches
      }
    }
  }
}

/// Phrase frequency within one document given each token's positions, in
/// phrase order.
pub fn phrase_freq(positions: &[&[u32]], mode: PhraseMode) -> u32 {
  let Some((first, rest)) = positions.split_first() else {
    return 0;
  };

  match mode {
    PhraseMode::CoOccurrence => positions.iter().map(|p| p.len() as u32).min().unwrap_or(0),
    PhraseMode::Adjacent => first
      .iter()
      .filter(|&&start| {
        rest
          .iter()
          .enumerate()
          .all(|(offset, p)| p.binary_search(&(start + offset as u32 + 1)).is_ok())
      })
      .count() as u32,
  }
}
