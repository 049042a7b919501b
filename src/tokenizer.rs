//! Text tokenization utilities.
//!
//! Tokenization is owned by the caller: the same [`Tokenizer`] must be used to
//! build a field and to analyze queries against it. Mixing tokenizers is not an
//! error, it silently produces zero matches.

#[cfg(feature = "unicode")]
use unicode_segmentation::UnicodeSegmentation;

/// Turns text into an ordered sequence of tokens.
///
/// Any `Fn(&str) -> Vec<String>` closure or function is a tokenizer.
pub trait Tokenizer: Send + Sync {
  /// Splits `text` into tokens, preserving order.
  fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<F> Tokenizer for F
where
  F: Fn(&str) -> Vec<String> + Send + Sync,
{
  fn tokenize(&self, text: &str) -> Vec<String> {
    self(text)
  }
}

/// Splits on whitespace only. Casing and punctuation are kept, so `"Doug,"`
/// and `"doug"` are different tokens.
pub fn whitespace_tokenize(text: &str) -> Vec<String> {
  text.split_whitespace().map(str::to_string).collect()
}

/// Lowercases, strips ASCII punctuation, then splits on whitespace.
pub fn punctuation_tokenize(text: &str) -> Vec<String> {
  let cleaned: String = text
    .to_lowercase()
    .chars()
    .filter(|c| !c.is_ascii_punctuation())
    .collect();
  whitespace_tokenize(&cleaned)
}

/// Tokenize text into lowercase Unicode words.
#[cfg(feature = "unicode")]
pub fn unicode_tokenize(text: &str) -> Vec<String> {
  text
    .unicode_words()
    .map(|word| word.to_lowercase())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_whitespace_keeps_case_and_punctuation() {
    let tokens = whitespace_tokenize("Hi this is Doug, I'd");
    assert_eq!(tokens, vec!["Hi", "this", "is", "Doug,", "I'd"]);
  }

  #[test]
  fn test_punctuation_tokenize() {
    let tokens = punctuation_tokenize("Doug, this is Tom's  Earth's Climate!");
    assert_eq!(tokens, vec!["doug", "this", "is", "toms", "earths", "climate"]);
  }

  #[cfg(feature = "unicode")]
  #[test]
  fn test_unicode_tokenize() {
    let text = "Hello, World! This is a test.";
    let tokens = unicode_tokenize(text);
    assert_eq!(tokens, vec!["hello", "world", "this", "is", "a", "test"]);
  }

  #[test]
  fn test_closures_are_tokenizers() {
    let upper = |text: &str| -> Vec<String> { vec![text.to_uppercase()] };
    assert_eq!(upper.tokenize("abc"), vec!["ABC"]);
    assert_eq!(Tokenizer::tokenize(&punctuation_tokenize, "A.b"), vec!["ab"]);
  }
}
