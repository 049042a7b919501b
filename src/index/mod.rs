//! In-memory term statistics for scoring.

pub mod corpus;
pub mod memory;
pub mod provider;

pub use corpus::Corpus;
pub use memory::FieldIndex;
pub use provider::{phrase_freq, PhraseMode, Posting, TermMatches, TermStatsProvider};
