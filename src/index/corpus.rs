//! A corpus snapshot: named field indexes over a fixed set of documents.

use crate::error::{Error, Result};
use crate::index::memory::FieldIndex;
use crate::index::provider::TermStatsProvider;
use crate::tokenizer::Tokenizer;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A fixed-size set of documents and the term statistics of each indexed field.
///
/// Fields are stored separately from the documents, keyed by name. Attaching
/// a field that already exists replaces its snapshot wholesale; scorers that
/// still hold the previous `Arc<FieldIndex>` keep reading the old statistics.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
  num_docs: usize,
  fields: BTreeMap<String, Arc<FieldIndex>>,
}

impl Corpus {
  /// Creates an empty corpus of `num_docs` documents with no indexed fields.
  pub fn new(num_docs: usize) -> Self {
    Self {
      num_docs,
      fields: BTreeMap::new(),
    }
  }

  /// Number of documents in the snapshot.
  pub fn num_docs(&self) -> usize {
    self.num_docs
  }

  /// Attaches a built field index under `name`, returning the replaced one.
  ///
  /// Fails if the index covers a different number of documents than the corpus.
  pub fn attach(
    &mut self,
    name: impl Into<String>,
    index: FieldIndex,
  ) -> Result<Option<Arc<FieldIndex>>> {
    let name = name.into();
    if index.num_docs() != self.num_docs {
      return Err(Error::DocCountMismatch {
        field: name,
        expected: self.num_docs,
        actual: index.num_docs(),
      });
    }
    debug!(field = %name, "attached field index");
    Ok(self.fields.insert(name, Arc::new(index)))
  }

  /// Tokenizes one text per document and attaches the result under `name`.
  pub fn index_field<S, T>(&mut self, name: impl Into<String>, texts: &[S], tokenizer: &T) -> Result<()>
  where
    S: AsRef<str>,
    T: Tokenizer + ?Sized,
  {
    self.attach(name, FieldIndex::build(texts, tokenizer))?;
    Ok(())
  }

  /// Returns the statistics of a field.
  pub fn field(&self, name: &str) -> Result<&FieldIndex> {
    self
      .fields
      .get(name)
      .map(Arc::as_ref)
      .ok_or_else(|| Error::UnknownField(name.to_string()))
  }

  /// Returns a shared handle to a field's current snapshot.
  pub fn snapshot(&self, name: &str) -> Result<Arc<FieldIndex>> {
    self
      .fields
      .get(name)
      .cloned()
      .ok_or_else(|| Error::UnknownField(name.to_string()))
  }

  /// Returns `true` if a field with this name is attached.
  pub fn has_field(&self, name: &str) -> bool {
    self.fields.contains_key(name)
  }

  /// Names of all attached fields, sorted.
  pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
    self.fields.keys().map(String::as_str)
  }
}
