//! Completion providers.
//!
//! A [`Completer`] owns a trigger prefix, a couple of applicability
//! predicates, and an asynchronous option source. Completers are registered
//! once per session in a [`CompleterRegistry`]; their position in the registry
//! is their identity everywhere else (option keys, caches, loader requests).

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{
  Deserialize,
  Serialize,
};
use serde_json::Value;
use thiserror::Error;

use crate::{
  document::Fragment,
  selection::Range,
  text_tree::{
    NodeId,
    TextTree,
  },
};

pub type OptionsFuture = BoxFuture<'static, Result<Vec<CompletionOption>, LoadError>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
  #[error("option source failed: {0}")]
  Source(String),
  #[error("option request was dropped before completing")]
  Canceled,
}

/// A single selectable candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompletionOption {
  /// Opaque value handed back to [`Completer::on_select`].
  #[serde(default)]
  pub value:       Value,
  pub label:       String,
  #[serde(default)]
  pub keywords:    Vec<String>,
  #[serde(default, rename = "disabled")]
  pub is_disabled: bool,
}

impl CompletionOption {
  pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
    Self {
      value:       value.into(),
      label:       label.into(),
      keywords:    Vec::new(),
      is_disabled: false,
    }
  }

  #[must_use]
  pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.keywords = keywords.into_iter().map(Into::into).collect();
    self
  }

  #[must_use]
  pub fn disabled(mut self) -> Self {
    self.is_disabled = true;
    self
  }

  /// Keywords followed by the label, the texts a query is matched against.
  pub fn match_terms(&self) -> impl Iterator<Item = &str> {
    self
      .keywords
      .iter()
      .map(String::as_str)
      .chain(std::iter::once(self.label.as_str()))
  }
}

/// An option tagged with a key unique among the options of its completer.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedOption {
  pub key:    String,
  pub option: CompletionOption,
}

/// Attach `"<completer>_<position>"` keys to freshly loaded options.
pub fn key_options(completer: usize, options: Vec<CompletionOption>) -> Vec<KeyedOption> {
  options
    .into_iter()
    .enumerate()
    .map(|(position, option)| {
      KeyedOption {
        key: format!("{completer}_{position}"),
        option,
      }
    })
    .collect()
}

/// The three ranges a completer sees when deciding whether a trigger counts:
/// everything before the trigger, the trigger plus query, and everything
/// after the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchContext {
  pub before:  Range,
  pub matched: Range,
  pub after:   Range,
}

pub trait Completer: Send + Sync {
  /// Name used in logs and configuration.
  fn name(&self) -> &str;

  /// Literal text that must precede the query. Empty means always eligible.
  fn trigger_prefix(&self) -> &str {
    ""
  }

  fn class_name(&self) -> Option<&str> {
    None
  }

  /// Whether the option request of an activation waits `debounce-ms` first.
  ///
  /// Options are fetched once per activation, not per keystroke, so this
  /// only delays that single fetch; re-activating or closing within the
  /// window replaces or drops it.
  fn is_debounced(&self) -> bool {
    false
  }

  /// Whether the completer may activate inside `node`.
  fn allow_node(&self, tree: &dyn TextTree, node: NodeId, container: NodeId) -> bool {
    let _ = (tree, node, container);
    true
  }

  /// Veto an otherwise matching trigger based on its surroundings.
  fn allow_context(&self, tree: &dyn TextTree, context: &MatchContext) -> bool {
    let _ = (tree, context);
    true
  }

  /// Fetch options. Called once per activation, never per keystroke.
  fn options(&self) -> OptionsFuture;

  /// Content replacing the trigger and query when `value` is chosen. `None`
  /// leaves the document alone.
  fn on_select(&self, value: &Value, range: &Range, query: &str) -> Option<Vec<Fragment>> {
    let _ = (value, range, query);
    None
  }
}

/// Ordered, immutable set of completers shared by the engine and the loader.
#[derive(Clone, Default)]
pub struct CompleterRegistry {
  completers: Arc<[Arc<dyn Completer>]>,
}

impl CompleterRegistry {
  pub fn new(completers: Vec<Arc<dyn Completer>>) -> Self {
    Self {
      completers: completers.into(),
    }
  }

  pub fn get(&self, index: usize) -> Option<&Arc<dyn Completer>> {
    self.completers.get(index)
  }

  pub fn len(&self) -> usize {
    self.completers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.completers.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Completer>> {
    self.completers.iter()
  }
}

impl std::fmt::Debug for CompleterRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list()
      .entries(self.completers.iter().map(|completer| completer.name()))
      .finish()
  }
}

impl FromIterator<Arc<dyn Completer>> for CompleterRegistry {
  fn from_iter<I: IntoIterator<Item = Arc<dyn Completer>>>(iter: I) -> Self {
    Self::new(iter.into_iter().collect())
  }
}
