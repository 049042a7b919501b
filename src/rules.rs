//! Serializable configuration for multi-field lexical scoring.

use crate::aggregate::Aggregation;
use crate::combine::MinMatch;
use crate::error::{Error, Result};
use crate::index::provider::PhraseMode;
use crate::query::BoolOp;
use crate::similarity::SimilarityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scoring rules: which fields to search, how to weigh them, and how to combine evidence.
///
/// Rules can be written by hand, assembled with [`SearchRules::builder`], or
/// read from JSON:
///
/// ```rust
/// use lexscore::prelude::*;
///
/// let rules = SearchRules::from_json(r#"{
///   "fields": { "name": { "boost": 9.3 }, "description": { "boost": 4.1 } },
///   "similarity": { "type": "bm25", "k1": 1.2, "b": 0.75 },
///   "aggregation": { "type": "term_centric" },
///   "operator": "or"
/// }"#).unwrap();
///
/// assert_eq!(rules.limit, 10);
/// assert_eq!(rules.fields["name"].boost, 9.3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRules {
  /// Per-field rules. When empty, every field of the corpus is searched with boost `1.0`.
  #[serde(default)]
  pub fields: BTreeMap<String, FieldRule>,
  /// Per-field similarity for field-centric and term-centric aggregation.
  #[serde(default)]
  pub similarity: SimilarityKind,
  /// How one token's per-field evidence is merged.
  #[serde(default)]
  pub aggregation: Aggregation,
  /// How the query's tokens are combined.
  #[serde(default)]
  pub operator: BoolOp,
  /// Soft penalty for documents matching too few query tokens.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min_match: Option<MinMatch>,
  /// How phrases (and boost labels) match.
  #[serde(default)]
  pub phrase_mode: PhraseMode,
  /// Default number of hits returned.
  #[serde(default = "default_limit")]
  pub limit: usize,
}

fn default_limit() -> usize {
  10
}

impl Default for SearchRules {
  fn default() -> Self {
    Self {
      fields: BTreeMap::new(),
      similarity: SimilarityKind::default(),
      aggregation: Aggregation::default(),
      operator: BoolOp::default(),
      min_match: None,
      phrase_mode: PhraseMode::default(),
      limit: default_limit(),
    }
  }
}

impl SearchRules {
  /// Create a new rules builder.
  pub fn builder() -> SearchRulesBuilder {
    SearchRulesBuilder::default()
  }

  /// Parses and validates rules from JSON.
  pub fn from_json(json: &str) -> Result<Self> {
    let rules: Self = serde_json::from_str(json)?;
    rules.validate()?;
    Ok(rules)
  }

  /// Serializes the rules to JSON.
  pub fn to_json(&self) -> Result<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Checks every parameter for range errors.
  pub fn validate(&self) -> Result<()> {
    self.similarity.build()?;
    self.aggregation.validate()?;
    if let Some(min_match) = &self.min_match {
      min_match.validate()?;
    }
    for rule in self.fields.values() {
      rule.validate()?;
    }
    Ok(())
  }
}

/// Builder for search rules.
#[derive(Debug, Default)]
pub struct SearchRulesBuilder {
  rules: SearchRules,
}

impl SearchRulesBuilder {
  /// Add a field rule.
  pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
    self.rules.fields.insert(name.into(), rule);
    self
  }

  /// Set the per-field similarity.
  pub fn similarity(mut self, similarity: SimilarityKind) -> Self {
    self.rules.similarity = similarity;
    self
  }

  /// Set the cross-field aggregation.
  pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
    self.rules.aggregation = aggregation;
    self
  }

  /// Set the operator joining query tokens.
  pub fn operator(mut self, operator: BoolOp) -> Self {
    self.rules.operator = operator;
    self
  }

  /// Penalize documents matching fewer than a share of the query tokens.
  pub fn min_match(mut self, min_match: MinMatch) -> Self {
    self.rules.min_match = Some(min_match);
    self
  }

  /// Set the phrase matching mode.
  pub fn phrase_mode(mut self, mode: PhraseMode) -> Self {
    self.rules.phrase_mode = mode;
    self
  }

  /// Set the default number of hits.
  pub fn limit(mut self, limit: usize) -> Self {
    self.rules.limit = limit;
    self
  }

  /// Validate and build the rules.
  pub fn build(self) -> Result<SearchRules> {
    self.rules.validate()?;
    Ok(self.rules)
  }
}

/// Rule for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
  /// Multiplier for scores from this field.
  #[serde(default = "default_boost")]
  pub boost: f32,
  /// BM25F length normalization for this field; falls back to the aggregation's `b`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub b: Option<f32>,
}

fn default_boost() -> f32 {
  1.0
}

impl Default for FieldRule {
  fn default() -> Self {
    Self {
      boost: default_boost(),
      b: None,
    }
  }
}

impl FieldRule {
  /// Create a field rule with boost `1.0`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the boost factor.
  pub fn boost(mut self, boost: f32) -> Self {
    self.boost = boost;
    self
  }

  /// Set the BM25F `b` for this field.
  pub fn b(mut self, b: f32) -> Self {
    self.b = Some(b);
    self
  }

  fn validate(&self) -> Result<()> {
    if !self.boost.is_finite() || self.boost < 0.0 {
      return Err(Error::InvalidParameter {
        name: "boost",
        value: self.boost,
        reason: "must be finite and non-negative",
      });
    }
    match self.b {
      Some(b) if !(0.0..=1.0).contains(&b) => Err(Error::InvalidParameter {
        name: "b",
        value: b,
        reason: "must be within [0, 1]",
      }),
      _ => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_from_empty_json() {
    let rules = SearchRules::from_json("{}").unwrap();
    assert_eq!(rules, SearchRules::default());
    assert_eq!(rules.similarity, SimilarityKind::Bm25 { k1: 1.2, b: 0.75 });
    assert_eq!(rules.operator, BoolOp::Or);
    assert_eq!(rules.phrase_mode, PhraseMode::Adjacent);
  }

  #[test]
  fn test_builder_round_trips_through_json() {
    let rules = SearchRules::builder()
      .field("name", FieldRule::new().boost(9.3).b(0.3))
      .field("description", FieldRule::new().boost(4.1))
      .aggregation(Aggregation::bm25f())
      .operator(BoolOp::And)
      .min_match(MinMatch::new(0.75, 0.5))
      .limit(5)
      .build()
      .unwrap();
    let parsed = SearchRules::from_json(&rules.to_json().unwrap()).unwrap();
    assert_eq!(parsed, rules);
  }

  #[test]
  fn test_rejects_bad_parameters() {
    let bad_b = SearchRules::builder().field("name", FieldRule::new().b(1.5)).build();
    assert!(matches!(bad_b, Err(Error::InvalidParameter { name: "b", .. })));

    let bad_boost = SearchRules::builder()
      .field("name", FieldRule::new().boost(f32::NAN))
      .build();
    assert!(matches!(bad_boost, Err(Error::InvalidParameter { name: "boost", .. })));

    let bad_k1 = SearchRules::from_json(r#"{"similarity": {"type": "bm25", "k1": -1, "b": 0.5}}"#);
    assert!(matches!(bad_k1, Err(Error::InvalidParameter { name: "k1", .. })));
  }

  #[test]
  fn test_min_match_defaults_from_json() {
    let rules = SearchRules::from_json(r#"{"min_match": {}}"#).unwrap();
    assert_eq!(rules.min_match, Some(MinMatch::new(0.5, 0.8)));

    let bad = SearchRules::from_json(r#"{"min_match": {"fraction": 2.0}}"#);
    assert!(matches!(bad, Err(Error::InvalidParameter { name: "fraction", .. })));
  }

  #[test]
  fn test_malformed_json() {
    assert!(matches!(SearchRules::from_json("{"), Err(Error::InvalidConfig(_))));
    assert!(matches!(
      SearchRules::from_json(r#"{"operator": "xor"}"#),
      Err(Error::InvalidConfig(_))
    ));
  }
}
