//! lexscore - Pluggable multi-field lexical relevance scoring.
//!
//! lexscore scores tokenized queries against in-memory term statistics. The
//! pipeline is built from small, swappable pieces:
//!
//! - a [`Similarity`](similarity::Similarity) turns term statistics into
//!   per-document scores (raw counts up to BM25),
//! - a [`FieldScorer`](scorer::FieldScorer) evaluates tokens, phrases and
//!   boolean queries in one field,
//! - a [`FieldAggregator`](aggregate::FieldAggregator) merges evidence across
//!   fields (sum, dismax or BM25F),
//! - a [`RankedListBuilder`](ranking::RankedListBuilder) adds token scores and
//!   boosts and picks the top documents.
//!
//! [`LexicalEngine`](engine::LexicalEngine) wires the pieces together from
//! serializable [`SearchRules`](rules::SearchRules).

pub mod aggregate;
pub mod boost;
pub mod cache;
pub mod combine;
pub mod engine;
pub mod error;
pub mod extension;
pub mod index;
pub mod query;
pub mod ranking;
pub mod rules;
pub mod scorer;
pub mod similarity;
pub mod tokenizer;
pub mod types;

pub use error::{Error, Result};

pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::aggregate::*;
    pub use crate::boost::*;
    pub use crate::cache::*;
    pub use crate::combine::*;
    pub use crate::engine::*;
    pub use crate::error::{Error, Result};
    pub use crate::extension::*;
    pub use crate::index::*;
    pub use crate::query::*;
    pub use crate::ranking::*;
    pub use crate::rules::*;
    pub use crate::scorer::{score, score_with, FieldScorer};
    pub use crate::similarity::*;
    pub use crate::tokenizer::*;
    pub use crate::types::*;
}
