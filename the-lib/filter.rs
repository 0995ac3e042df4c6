//! Option filtering.
//!
//! A query compiles to a case-insensitive pattern anchored at a word
//! boundary, whitespace or the start of the text, so `"ap"` finds `"Apple"`
//! and `"green apple"` but not `"grape"`. Accents are folded on both sides
//! before matching.
//!
//! Filtering keeps the completer's own order and stops after `max` hits: the
//! cap is a ceiling on the visible list, not a ranking.

use regex::Regex;
use tracing::warn;

use crate::completer::{
  CompletionOption,
  KeyedOption,
};

#[derive(Debug, Clone, Default)]
pub enum SearchPattern {
  /// Matches everything. Used while no completer is open.
  #[default]
  Any,
  Query { source: String, regex: Regex },
}

impl SearchPattern {
  pub fn for_query(query: &str) -> Self {
    let pattern = format!(r"(?i)(?:\b|\s|^){}", regex::escape(&fold_diacritics(query)));
    match Regex::new(&pattern) {
      Ok(regex) => {
        Self::Query {
          source: query.to_string(),
          regex,
        }
      },
      Err(err) => {
        warn!(query, %err, "failed to build search pattern, matching everything");
        Self::Any
      },
    }
  }

  pub fn source(&self) -> Option<&str> {
    match self {
      Self::Any => None,
      Self::Query { source, .. } => Some(source),
    }
  }

  pub fn is_match(&self, text: &str) -> bool {
    match self {
      Self::Any => true,
      Self::Query { regex, .. } => regex.is_match(&fold_diacritics(text)),
    }
  }

  /// Whether any keyword or the label of `option` matches.
  pub fn matches(&self, option: &CompletionOption) -> bool {
    option.match_terms().any(|term| self.is_match(term))
  }
}

impl PartialEq for SearchPattern {
  fn eq(&self, other: &Self) -> bool {
    self.source() == other.source()
  }
}

impl Eq for SearchPattern {}

/// Strip combining accents (`é` → `e`).
pub fn fold_diacritics(text: &str) -> String {
  text.chars().map(nucleo::chars::normalize).collect()
}

/// The first `max` options matching `search`, in their original order.
pub fn filter_options(search: &SearchPattern, options: &[KeyedOption], max: usize) -> Vec<KeyedOption> {
  options
    .iter()
    .filter(|keyed| search.matches(&keyed.option))
    .take(max)
    .cloned()
    .collect()
}
