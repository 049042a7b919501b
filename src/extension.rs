//! Defines the extension system for the scoring engine.

use crate::types::{RankedHit, ScoreVector};

/// A trait for extensions that can hook into a ranking pass.
///
/// Extensions see the raw query text at every stage and may rewrite the
/// analyzed tokens, adjust the final score vector, or edit the returned hits.
///
/// # Examples
///
/// Dropping stop words before scoring:
///
/// ```rust
/// use lexscore::prelude::*;
///
/// struct StopWords(Vec<&'static str>);
///
/// impl ScoringExtension for StopWords {
///   fn before_tokens(&self, _query: &str, tokens: &mut Vec<String>) {
///     tokens.retain(|t| !self.0.contains(&t.as_str()));
///   }
/// }
/// ```
pub trait ScoringExtension: Send + Sync {
  /// Called after the query is tokenized, before any field is scored.
  fn before_tokens(&self, _query: &str, _tokens: &mut Vec<String>) {}

  /// Called once token scores and boosts are summed, before top-k selection.
  fn after_scores(&self, _query: &str, _scores: &mut ScoreVector) {}

  /// Called on the final, truncated hit list.
  fn after_limit(&self, _query: &str, _hits: &mut Vec<RankedHit>) {}
}
