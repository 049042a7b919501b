//! Query shapes understood by field scoring.

use serde::{Deserialize, Serialize};

/// How the children of a [`Query::Boolean`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
  /// Disjunction: a document scores if any child matches; scores add up.
  #[default]
  Or,
  /// Conjunction: a document scores only if every child matches.
  And,
}

/// A query against one field (or one token across several fields).
///
/// Queries are never tokenized implicitly. `Query::from("ski conditions")`
/// is a single literal token containing a space, which matches nothing under
/// a whitespace-splitting index. Use [`Query::tokens`] or [`Query::phrase`]
/// with the output of the same tokenizer the field was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
  /// One exact token.
  Token(String),
  /// An ordered token list that must match as a unit.
  Phrase(Vec<String>),
  /// A boolean combination of sub-queries.
  Boolean(Vec<Query>, BoolOp),
}

impl Query {
  /// A single literal token.
  pub fn token(token: impl Into<String>) -> Self {
    Self::Token(token.into())
  }

  /// A phrase from already-tokenized text.
  pub fn phrase<I, S>(tokens: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::Phrase(tokens.into_iter().map(Into::into).collect())
  }

  /// One `Token` per element, combined with `op`.
  pub fn tokens<I, S>(tokens: I, op: BoolOp) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::Boolean(tokens.into_iter().map(|t| Self::Token(t.into())).collect(), op)
  }

  /// Disjunction of several phrases, e.g. a list of predicted labels.
  pub fn any_phrase<I, P, S>(phrases: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::Boolean(phrases.into_iter().map(Self::phrase::<P, S>).collect(), BoolOp::Or)
  }

  /// Returns `true` if the query contains no token at all.
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Token(_) => false,
      Self::Phrase(tokens) => tokens.is_empty(),
      Self::Boolean(children, _) => children.iter().all(Query::is_empty),
    }
  }
}

impl From<&str> for Query {
  fn from(token: &str) -> Self {
    Self::Token(token.to_string())
  }
}

impl From<String> for Query {
  fn from(token: String) -> Self {
    Self::Token(token)
  }
}

impl From<Vec<String>> for Query {
  fn from(tokens: Vec<String>) -> Self {
    Self::Phrase(tokens)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_raw_string_is_one_token() {
    assert_eq!(Query::from("ski conditions"), Query::Token("ski conditions".into()));
  }

  #[test]
  fn test_builders() {
    let q = Query::tokens(["doug", "complaint"], BoolOp::And);
    assert_eq!(
      q,
      Query::Boolean(vec![Query::token("doug"), Query::token("complaint")], BoolOp::And)
    );
    let labels = Query::any_phrase([vec!["home", "decor"], vec!["lighting"]]);
    match labels {
      Query::Boolean(children, BoolOp::Or) => assert_eq!(children.len(), 2),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn test_emptiness() {
    assert!(Query::Phrase(vec![]).is_empty());
    assert!(Query::Boolean(vec![], BoolOp::Or).is_empty());
    assert!(!Query::token("").is_empty());
  }
}
