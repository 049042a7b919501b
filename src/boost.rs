//! Additive boosts supplied from outside the scoring pipeline.
//!
//! A [`BoostProvider`] looks at the raw query text and returns `(field, label,
//! amount)` triples. The engine tokenizes each label, matches it as a phrase
//! in the named field and adds `amount` to every document that contains it.
//! The most common provider is a query classifier mapping a query onto a
//! product category and sub-category ([`CategoryBoosts`]).

use crate::cache::{CacheStats, LruCache};
use crate::error::Result;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Label a classifier returns when no category applies.
pub const NO_CATEGORY: &str = "No Category Fits";

/// Label a classifier returns when no sub-category applies.
pub const NO_SUB_CATEGORY: &str = "No SubCategory Fits";

/// Adds `amount` to documents whose `field` contains the phrase `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boost {
  /// Field the label is matched against.
  pub field: String,
  /// Free text, tokenized with the engine's tokenizer before matching.
  pub label: String,
  /// Constant added to each matching document.
  pub amount: f32,
}

impl Boost {
  /// Creates a boost.
  pub fn new(field: impl Into<String>, label: impl Into<String>, amount: f32) -> Self {
    Self {
      field: field.into(),
      label: label.into(),
      amount,
    }
  }
}

/// Produces boosts for a query.
pub trait BoostProvider: Send + Sync {
  /// Boosts to apply for `query`. May be empty.
  fn boosts(&self, query: &str) -> Vec<Boost>;
}

impl<F> BoostProvider for F
where
  F: Fn(&str) -> Vec<Boost> + Send + Sync,
{
  fn boosts(&self, query: &str) -> Vec<Boost> {
    self(query)
  }
}

/// Category labels assigned to a query.
///
/// A query may fall into several categories at once; every distinct label
/// becomes its own boost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
  /// Top-level categories.
  #[serde(default)]
  pub categories: Vec<String>,
  /// Finer-grained categories.
  #[serde(default)]
  pub sub_categories: Vec<String>,
}

impl Classification {
  /// A classification with one label on each level.
  pub fn new(category: impl Into<String>, sub_category: impl Into<String>) -> Self {
    Self {
      categories: vec![category.into()],
      sub_categories: vec![sub_category.into()],
    }
  }

  /// Parses fully qualified `"Category / SubCategory"` labels.
  ///
  /// A label without a `" / "` separator only names a category. Repeated
  /// labels are kept once, in first-seen order.
  pub fn from_qualified<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut categories = IndexSet::new();
    let mut sub_categories = IndexSet::new();
    for label in labels {
      let mut parts = label.as_ref().split(" / ");
      if let Some(category) = parts.next() {
        categories.insert(category.trim().to_string());
      }
      if let Some(sub_category) = parts.next() {
        sub_categories.insert(sub_category.trim().to_string());
      }
    }
    Self {
      categories: categories.into_iter().collect(),
      sub_categories: sub_categories.into_iter().collect(),
    }
  }
}

/// Maps query text onto categories. Typically backed by an external model.
pub trait QueryClassifier: Send + Sync {
  /// Classifies `query`.
  fn classify(&self, query: &str) -> Classification;
}

impl<F> QueryClassifier for F
where
  F: Fn(&str) -> Classification + Send + Sync,
{
  fn classify(&self, query: &str) -> Classification {
    self(query)
  }
}

/// Turns a query classification into category and sub-category boosts.
///
/// Sentinel labels ([`NO_CATEGORY`], [`NO_SUB_CATEGORY`]) and blank labels
/// produce no boost.
#[derive(Debug, Clone)]
pub struct CategoryBoosts<C> {
  classifier: C,
  category_field: String,
  sub_category_field: String,
  category_boost: f32,
  sub_category_boost: f32,
}

impl<C: QueryClassifier> CategoryBoosts<C> {
  /// Creates a provider with the default amounts (`10` and `5`).
  pub fn new(
    classifier: C,
    category_field: impl Into<String>,
    sub_category_field: impl Into<String>,
  ) -> Self {
    Self {
      classifier,
      category_field: category_field.into(),
      sub_category_field: sub_category_field.into(),
      category_boost: 10.0,
      sub_category_boost: 5.0,
    }
  }

  /// Sets the amount added for a category match.
  pub fn category_boost(mut self, amount: f32) -> Self {
    self.category_boost = amount;
    self
  }

  /// Sets the amount added for a sub-category match.
  pub fn sub_category_boost(mut self, amount: f32) -> Self {
    self.sub_category_boost = amount;
    self
  }
}

fn distinct(labels: Vec<String>, sentinel: &str) -> IndexSet<String> {
  labels
    .into_iter()
    .map(|label| label.trim().to_string())
    .filter(|label: &String| !label.is_empty() && label.as_str() != sentinel)
    .collect()
}

impl<C: QueryClassifier> BoostProvider for CategoryBoosts<C> {
  fn boosts(&self, query: &str) -> Vec<Boost> {
    let Classification {
      categories,
      sub_categories,
    } = self.classifier.classify(query);
    trace!(?categories, ?sub_categories, "classified query");

    let categories = distinct(categories, NO_CATEGORY);
    let sub_categories = distinct(sub_categories, NO_SUB_CATEGORY);
    let mut boosts = Vec::with_capacity(categories.len() + sub_categories.len());
    for label in categories {
      boosts.push(Boost::new(&self.category_field, label, self.category_boost));
    }
    for label in sub_categories {
      boosts.push(Boost::new(
        &self.sub_category_field,
        label,
        self.sub_category_boost,
      ));
    }
    boosts
  }
}

/// Memoizes another provider per query string.
///
/// Classifiers are often slow or metered; repeated queries are answered from
/// a bounded LRU cache instead.
#[derive(Debug)]
pub struct CachedBoosts<P> {
  inner: P,
  cache: LruCache<String, Vec<Boost>>,
}

impl<P: BoostProvider> CachedBoosts<P> {
  /// Wraps `inner`, remembering at most `capacity` queries.
  pub fn new(inner: P, capacity: usize) -> Result<Self> {
    Ok(Self {
      inner,
      cache: LruCache::new(capacity)?,
    })
  }

  /// The wrapped provider.
  pub fn inner(&self) -> &P {
    &self.inner
  }

  /// Cache hit and miss counters.
  pub fn stats(&self) -> CacheStats {
    self.cache.stats()
  }
}

impl<P: BoostProvider> BoostProvider for CachedBoosts<P> {
  fn boosts(&self, query: &str) -> Vec<Boost> {
    if let Some(boosts) = self.cache.get(query) {
      return boosts;
    }
    let boosts = self.inner.boosts(query);
    self.cache.insert(query.to_string(), boosts.clone());
    boosts
  }
}
