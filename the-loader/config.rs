use std::{
  path::Path,
  sync::Arc,
};

use eyre::{
  Context,
  Result,
};
use serde::{
  Deserialize,
  Serialize,
};
use the_lib::{
  completer::{
    Completer,
    CompleterRegistry,
  },
  config::{
    AutocompleteConfig,
    StaticCompleterConfig,
  },
  static_completer::StaticCompleter,
};

/// Root, `completer` array, completer table, then its `insert` table.
const MERGE_DEPTH: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
  #[serde(default)]
  pub autocomplete: AutocompleteConfig,
  #[serde(default, rename = "completer")]
  pub completers:   Vec<StaticCompleterConfig>,
}

impl Config {
  /// Completers in declaration order, which is also matching order.
  pub fn registry(&self) -> CompleterRegistry {
    self
      .completers
      .iter()
      .cloned()
      .map(|config| Arc::new(StaticCompleter::new(config)) as Arc<dyn Completer>)
      .collect()
  }

  pub fn to_toml(&self) -> Result<String> {
    toml::to_string(self).context("failed to serialize configuration")
  }
}

/// Built-in `autocomplete.toml`.
pub fn default_config_value() -> Result<toml::Value> {
  toml::from_str(include_str!("autocomplete.toml"))
    .context("failed to parse built-in autocomplete.toml")
}

fn read_toml(path: &Path) -> Result<toml::Value> {
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {}", path.display()))?;
  toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Built-in config with user overrides merged on top.
///
/// An explicitly given `path` must exist. Otherwise the user config file and
/// the workspace config file are each applied when present.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
  let mut value = default_config_value()?;

  let overrides = match path {
    Some(path) => vec![read_toml(path)?],
    None => {
      let candidates = std::iter::once(crate::config_file()).chain(crate::workspace_config_file());
      let mut found = Vec::new();
      for file in candidates.filter(|file| file.is_file()) {
        tracing::debug!("loading config from {}", file.display());
        found.push(read_toml(&file)?);
      }
      found
    },
  };
  for user in overrides {
    value = crate::merge_toml_values(value, user, MERGE_DEPTH);
  }

  value.try_into().context("invalid autocomplete configuration")
}
