//! Engine and static completer configuration.

use std::time::Duration;

use serde::{
  Deserialize,
  Serialize,
};

use crate::completer::CompletionOption;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct AutocompleteConfig {
  /// Ceiling on the visible result list.
  pub max_results: usize,
  /// Settle time for debounced completers, in milliseconds.
  pub debounce_ms: u64,
}

impl Default for AutocompleteConfig {
  fn default() -> Self {
    Self {
      max_results: 10,
      debounce_ms: 250,
    }
  }
}

impl AutocompleteConfig {
  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

/// A completer whose options are listed in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StaticCompleterConfig {
  pub name:           String,
  #[serde(default)]
  pub trigger_prefix: String,
  #[serde(default)]
  pub class_name:     Option<String>,
  #[serde(default)]
  pub debounced:      bool,
  #[serde(default = "default_allow_mid_word")]
  pub allow_mid_word: bool,
  #[serde(default)]
  pub options:        Vec<CompletionOption>,
  #[serde(default)]
  pub insert:         Option<InsertConfig>,
}

fn default_allow_mid_word() -> bool {
  true
}

/// What replaces the trigger and query on selection. `template` may use
/// `{label}`, `{value}` and `{query}`; `tag` wraps the result in an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InsertConfig {
  #[serde(default)]
  pub tag:      Option<String>,
  #[serde(default = "default_template")]
  pub template: String,
}

fn default_template() -> String {
  "{label}".to_string()
}

impl Default for InsertConfig {
  fn default() -> Self {
    Self {
      tag:      None,
      template: default_template(),
    }
  }
}
