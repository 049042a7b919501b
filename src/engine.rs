//! The engine that turns query text into a ranked list of documents.

use crate::aggregate::{Aggregation, FieldAggregator, WeightedField};
use crate::boost::{Boost, BoostProvider};
use crate::combine::BooleanCombinator;
use crate::error::Result;
use crate::extension::ScoringExtension;
use crate::index::corpus::Corpus;
use crate::query::Query;
use crate::ranking::{top_k, RankedListBuilder};
use crate::rules::{FieldRule, SearchRules};
use crate::scorer::FieldScorer;
use crate::similarity::{RawTermCount, Similarity};
use crate::tokenizer::{punctuation_tokenize, Tokenizer};
use crate::types::{DocId, RankedHit, ScoreVector};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scores free-text queries against the fields of a [`Corpus`].
///
/// A ranking pass runs these stages:
///
/// 1. The query text is tokenized and `before_tokens` hooks run.
/// 2. Every token is scored in every configured field and the per-field
///    evidence is merged with the configured [`Aggregation`].
/// 3. The per-token vectors are combined with the rules' operator. `Or` adds
///    them up; `And` additionally drops documents missing any token.
/// 4. Boosts from the [`BoostProvider`] are added to documents whose field
///    contains the boost label. With a [`MinMatch`](crate::combine::MinMatch)
///    rule, documents matching too few tokens are then scaled down.
/// 5. `after_scores` hooks run, the top `k` documents are selected, and
///    `after_limit` hooks run.
///
/// Create a `LexicalEngine` using the [`LexicalEngineBuilder`].
///
/// # Examples
///
/// ```rust
/// use lexscore::prelude::*;
///
/// let names = ["patio sofa", "leather sofa", "garden chair"];
/// let descriptions = ["weatherproof outdoor sofa", "a sofa for the living room", "folding chair"];
///
/// let engine = LexicalEngine::builder()
///   .tokenizer(punctuation_tokenize)
///   .rules(
///     SearchRules::builder()
///       .field("name", FieldRule::new().boost(9.3))
///       .field("description", FieldRule::new().boost(4.1))
///       .build()
///       .unwrap(),
///   )
///   .build()
///   .unwrap();
///
/// let mut corpus = Corpus::new(3);
/// engine.index_field(&mut corpus, "name", &names).unwrap();
/// engine.index_field(&mut corpus, "description", &descriptions).unwrap();
///
/// let hits = engine.search(&corpus, "outdoor sofa").unwrap();
/// assert_eq!(hits[0].doc_id, 0);
/// ```
pub struct LexicalEngine {
  tokenizer: Arc<dyn Tokenizer>,
  rules: SearchRules,
  similarity: Box<dyn Similarity>,
  boosts: Option<Box<dyn BoostProvider>>,
  extensions: Vec<Box<dyn ScoringExtension>>,
}

impl LexicalEngine {
  /// Creates a new `LexicalEngineBuilder` to construct an engine.
  pub fn builder() -> LexicalEngineBuilder {
    LexicalEngineBuilder::new()
  }

  /// The rules this engine was built with.
  pub fn rules(&self) -> &SearchRules {
    &self.rules
  }

  /// The tokenizer used for fields, queries and boost labels.
  pub fn tokenizer(&self) -> &dyn Tokenizer {
    self.tokenizer.as_ref()
  }

  /// Indexes one text per document under `name` with the engine's tokenizer.
  pub fn index_field<S: AsRef<str>>(
    &self,
    corpus: &mut Corpus,
    name: impl Into<String>,
    texts: &[S],
  ) -> Result<()> {
    corpus.index_field(name, texts, self.tokenizer.as_ref())
  }

  /// Tokenizes `text` and runs the `before_tokens` hooks.
  pub fn analyze(&self, text: &str) -> Vec<String> {
    let mut tokens = self.tokenizer.tokenize(text);
    for ext in &self.extensions {
      ext.before_tokens(text, &mut tokens);
    }
    tokens
  }

  /// Final scores of every document for `text`, boosts included.
  pub fn scores(&self, corpus: &Corpus, text: &str) -> Result<ScoreVector> {
    let tokens = self.analyze(text);
    let boosts = self.boost_matches(corpus, text);
    Ok(self.rank(corpus, text, &tokens, &boosts)?.scores)
  }

  /// The best documents for `text`, up to the rules' default limit.
  pub fn search(&self, corpus: &Corpus, text: &str) -> Result<Vec<RankedHit>> {
    self.search_k(corpus, text, self.rules.limit)
  }

  /// The `k` best documents for `text`.
  pub fn search_k(&self, corpus: &Corpus, text: &str, k: usize) -> Result<Vec<RankedHit>> {
    let scores = self.scores(corpus, text)?;
    Ok(self.limit(text, &scores, k))
  }

  /// The `k` best documents for an already tokenized query.
  ///
  /// `before_tokens` hooks are skipped. Boost providers see the tokens joined
  /// by single spaces.
  pub fn search_tokens(
    &self,
    corpus: &Corpus,
    tokens: &[String],
    k: usize,
  ) -> Result<Vec<RankedHit>> {
    let text = tokens.join(" ");
    let boosts = self.boost_matches(corpus, &text);
    let ranked = self.rank(corpus, &text, tokens, &boosts)?;
    Ok(self.limit(&text, &ranked.scores, k))
  }

  /// Runs [`search`](Self::search) for every query.
  ///
  /// With the `parallel` feature, queries are scored concurrently.
  pub fn search_batch<S>(&self, corpus: &Corpus, queries: &[S]) -> Result<Vec<Vec<RankedHit>>>
  where
    S: AsRef<str> + Sync,
  {
    #[cfg(feature = "parallel")]
    let results = queries
      .par_iter()
      .map(|q| self.search(corpus, q.as_ref()))
      .collect();

    #[cfg(not(feature = "parallel"))]
    let results = queries
      .iter()
      .map(|q| self.search(corpus, q.as_ref()))
      .collect();

    results
  }

  /// Breaks down how `doc_id` scored for `text`.
  ///
  /// Token scores are the merged cross-field contributions before the query
  /// operator is applied. For BM25F, a field's contribution is the score that
  /// field would give on its own.
  pub fn explain(&self, corpus: &Corpus, text: &str, doc_id: DocId) -> Result<Explanation> {
    let tokens = self.analyze(text);
    let fields = self.fields(corpus)?;
    let weighted: Vec<WeightedField<'_>> = fields.iter().map(|(_, f)| *f).collect();
    let aggregator = self.aggregator();
    let at = |v: &ScoreVector| v.get(doc_id).copied().unwrap_or(0.0);

    let mut explained = Vec::with_capacity(tokens.len());
    for token in &tokens {
      if weighted.is_empty() {
        break;
      }
      let query = Query::token(token.as_str());
      let per_field: Vec<ScoreVector> = match aggregator.aggregation() {
        Aggregation::Bm25f { .. } => weighted
          .iter()
          .map(|f| aggregator.score(&query, std::slice::from_ref(f), self.similarity.as_ref()))
          .collect(),
        _ => aggregator.per_field(&query, &weighted, self.similarity.as_ref()),
      };
      let merged = aggregator.score(&query, &weighted, self.similarity.as_ref());
      explained.push(TokenExplanation {
        token: token.clone(),
        score: at(&merged),
        fields: fields
          .iter()
          .zip(&per_field)
          .map(|((name, _), v)| FieldContribution {
            field: name.clone(),
            score: at(v),
          })
          .collect(),
      });
    }

    let boosts = self.boost_matches(corpus, text);
    let ranked = self.rank(corpus, text, &tokens, &boosts)?;
    Ok(Explanation {
      doc_id,
      score: at(&ranked.scores),
      tokens: explained,
      boosts: boosts
        .into_iter()
        .filter(|(_, matched)| matched.matches(doc_id))
        .map(|(boost, _)| boost)
        .collect(),
      penalized: ranked.short_docs.binary_search(&doc_id).is_ok(),
    })
  }

  fn aggregator(&self) -> FieldAggregator {
    FieldAggregator::new(self.rules.aggregation).phrase_mode(self.rules.phrase_mode)
  }

  fn fields<'c>(&self, corpus: &'c Corpus) -> Result<Vec<(String, WeightedField<'c>)>> {
    let rules: Vec<(String, FieldRule)> = if self.rules.fields.is_empty() {
      corpus
        .field_names()
        .map(|name| (name.to_string(), FieldRule::default()))
        .collect()
    } else {
      self
        .rules
        .fields
        .iter()
        .map(|(name, rule)| (name.clone(), *rule))
        .collect()
    };

    rules
      .into_iter()
      .map(|(name, rule)| -> Result<(String, WeightedField<'c>)> {
        let mut field = WeightedField::new(corpus.field(&name)?).boost(rule.boost);
        if let Some(b) = rule.b {
          field = field.b(b);
        }
        Ok((name, field))
      })
      .collect()
  }

  fn rank(
    &self,
    corpus: &Corpus,
    text: &str,
    tokens: &[String],
    boosts: &[(Boost, ScoreVector)],
  ) -> Result<Ranked> {
    let fields = self.fields(corpus)?;
    let weighted: Vec<WeightedField<'_>> = fields.iter().map(|(_, f)| *f).collect();
    let num_docs = corpus.num_docs();
    debug!(
      query = text,
      tokens = tokens.len(),
      fields = weighted.len(),
      "scoring query"
    );

    let aggregator = self.aggregator();
    let per_token: Vec<ScoreVector> = if weighted.is_empty() {
      Vec::new()
    } else {
      tokens
        .iter()
        .map(|token| {
          let v = aggregator.score(
            &Query::token(token.as_str()),
            &weighted,
            self.similarity.as_ref(),
          );
          trace!(token = %token, matches = v.support().len(), "scored token");
          v
        })
        .collect()
    };

    let mut ranking = RankedListBuilder::new(num_docs);
    ranking.add(&BooleanCombinator::new(self.rules.operator).combine(&per_token, num_docs));
    for (boost, matched) in boosts {
      trace!(field = %boost.field, label = %boost.label, amount = boost.amount, "applying boost");
      ranking.boost(matched, boost.amount);
    }

    // The match-count penalty scales boosted scores too.
    let short_docs = match &self.rules.min_match {
      Some(min_match) => {
        let short = min_match.short_docs(&per_token, num_docs);
        ranking.penalize(&short, min_match.penalty);
        short
      }
      None => Vec::new(),
    };

    let mut scores = ranking.finish();
    for ext in &self.extensions {
      ext.after_scores(text, &mut scores);
    }
    Ok(Ranked { scores, short_docs })
  }

  fn boost_matches(&self, corpus: &Corpus, text: &str) -> Vec<(Boost, ScoreVector)> {
    let Some(provider) = &self.boosts else {
      return Vec::new();
    };

    provider
      .boosts(text)
      .into_iter()
      .filter_map(|boost| {
        let Ok(field) = corpus.field(&boost.field) else {
          warn!(field = %boost.field, "boost names an unknown field");
          return None;
        };
        let label = self.tokenizer.tokenize(&boost.label);
        if label.is_empty() {
          warn!(label = %boost.label, "boost label has no tokens");
          return None;
        }
        let matched = FieldScorer::new(field, &RawTermCount)
          .phrase_mode(self.rules.phrase_mode)
          .score(&Query::Phrase(label));
        Some((boost, matched))
      })
      .collect()
  }

  fn limit(&self, text: &str, scores: &ScoreVector, k: usize) -> Vec<RankedHit> {
    let mut hits = top_k(scores, k);
    for ext in &self.extensions {
      ext.after_limit(text, &mut hits);
    }
    debug!(query = text, hits = hits.len(), "ranked");
    hits
  }
}

struct Ranked {
  scores: ScoreVector,
  // Ascending.
  short_docs: Vec<DocId>,
}

/// How one document's score came about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
  /// The explained document.
  pub doc_id: DocId,
  /// Its final score, boosts included.
  pub score: f32,
  /// One entry per query token, in query order.
  pub tokens: Vec<TokenExplanation>,
  /// Boosts whose label matched the document.
  pub boosts: Vec<Boost>,
  /// Whether the match-count penalty scaled the score.
  pub penalized: bool,
}

/// One token's contribution to a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenExplanation {
  /// The token.
  pub token: String,
  /// Merged contribution across fields.
  pub score: f32,
  /// Per-field contributions, boosts applied.
  pub fields: Vec<FieldContribution>,
}

/// A token's score in one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldContribution {
  /// Field name.
  pub field: String,
  /// Score in that field.
  pub score: f32,
}

/// A builder for creating `LexicalEngine` instances.
///
/// Without an explicit tokenizer, [`punctuation_tokenize`] is used. Without an
/// explicit similarity, the one named by the rules is instantiated.
#[derive(Default)]
pub struct LexicalEngineBuilder {
  tokenizer: Option<Arc<dyn Tokenizer>>,
  rules: SearchRules,
  similarity: Option<Box<dyn Similarity>>,
  boosts: Option<Box<dyn BoostProvider>>,
  extensions: Vec<Box<dyn ScoringExtension>>,
}

impl LexicalEngineBuilder {
  /// Creates a new, empty `LexicalEngineBuilder`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets the tokenizer for fields, queries and boost labels.
  pub fn tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
    self.tokenizer = Some(Arc::new(tokenizer));
    self
  }

  /// Sets a tokenizer shared with other components.
  pub fn shared_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
    self.tokenizer = Some(tokenizer);
    self
  }

  /// Sets the scoring rules.
  pub fn rules(mut self, rules: SearchRules) -> Self {
    self.rules = rules;
    self
  }

  /// Overrides the rules' similarity with a custom one.
  pub fn similarity(mut self, similarity: impl Similarity + 'static) -> Self {
    self.similarity = Some(Box::new(similarity));
    self
  }

  /// Sets the source of additive boosts.
  pub fn boosts(mut self, provider: impl BoostProvider + 'static) -> Self {
    self.boosts = Some(Box::new(provider));
    self
  }

  /// Adds an extension to the engine.
  pub fn with_extension(mut self, extension: Box<dyn ScoringExtension>) -> Self {
    self.extensions.push(extension);
    self
  }

  /// Validates the rules and builds the engine.
  pub fn build(self) -> Result<LexicalEngine> {
    self.rules.validate()?;
    let similarity = match self.similarity {
      Some(similarity) => similarity,
      None => self.rules.similarity.build()?,
    };
    let tokenizer = match self.tokenizer {
      Some(tokenizer) => tokenizer,
      None => {
        let default: Arc<dyn Tokenizer> = Arc::new(punctuation_tokenize);
        default
      }
    };
    Ok(LexicalEngine {
      tokenizer,
      rules: self.rules,
      similarity,
      boosts: self.boosts,
      extensions: self.extensions,
    })
  }
}
