//! Error types for lexical scoring.

/// Errors for lexical scoring.
///
/// Only configuration and wiring problems surface here. Absent terms, empty
/// queries and phrases without matches are ordinary zero results.
#[derive(thiserror::Error, Debug)]
pub enum Error {
  /// A query or rule named a field that is not attached to the corpus.
  #[error("unknown field: {0}")]
  UnknownField(String),
  /// A field index was built over a different number of documents than the corpus holds.
  #[error("field `{field}` covers {actual} documents, corpus has {expected}")]
  DocCountMismatch {
    /// Field being attached.
    field: String,
    /// Corpus size.
    expected: usize,
    /// Documents in the field index.
    actual: usize,
  },
  /// A scoring parameter was out of range.
  #[error("invalid parameter `{name}` = {value}: {reason}")]
  InvalidParameter {
    /// Parameter name.
    name: &'static str,
    /// Offending value.
    value: f32,
    /// Accepted range.
    reason: &'static str,
  },
  /// Rules could not be parsed.
  #[error("invalid configuration: {0}")]
  InvalidConfig(#[from] serde_json::Error),
  /// A cache was created with no room for entries.
  #[error("cache capacity must be at least 1")]
  ZeroCapacity,
}

/// Result alias for lexical scoring.
pub type Result<T> = std::result::Result<T, Error>;
