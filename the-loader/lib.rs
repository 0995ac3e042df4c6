pub mod config;

use std::{
  path::{
    Path,
    PathBuf,
  },
  sync::OnceLock,
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};

const APP_NAME: &str = "the-autocomplete";

/// Directory marking a per-project configuration override.
pub const WORKSPACE_DIR: &str = ".the-autocomplete";

static CONFIG_FILE: OnceLock<PathBuf> = OnceLock::new();

static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();

pub fn initialize_config_file(specified_file: Option<PathBuf>) {
  let config_file = specified_file.unwrap_or_else(default_config_file);
  ensure_parent_dir(&config_file);
  CONFIG_FILE.set(config_file).ok();
}

pub fn initialize_log_file(specified_file: Option<PathBuf>) {
  let log_file = specified_file.unwrap_or_else(default_log_file);
  ensure_parent_dir(&log_file);
  LOG_FILE.set(log_file).ok();
}

/// User configuration directory.
///
/// `THE_AUTOCOMPLETE_CONFIG_DIR` wins when set. Falls back to the current
/// directory if the platform has no notion of a home directory.
pub fn config_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("THE_AUTOCOMPLETE_CONFIG_DIR") {
    return expand_tilde(Path::new(&dir));
  }
  match choose_base_strategy() {
    Ok(strategy) => strategy.config_dir().join(APP_NAME),
    Err(err) => {
      tracing::warn!("unable to find the config directory: {err}");
      PathBuf::from(".")
    },
  }
}

pub fn cache_dir() -> PathBuf {
  if let Ok(dir) = std::env::var("THE_AUTOCOMPLETE_CACHE_DIR") {
    return expand_tilde(Path::new(&dir));
  }
  match choose_base_strategy() {
    Ok(strategy) => strategy.cache_dir().join(APP_NAME),
    Err(err) => {
      tracing::warn!("unable to find the cache directory: {err}");
      std::env::temp_dir().join(APP_NAME)
    },
  }
}

pub fn config_file() -> PathBuf {
  CONFIG_FILE
    .get_or_init(|| {
      let path = default_config_file();
      ensure_parent_dir(&path);
      path
    })
    .clone()
}

pub fn log_file() -> PathBuf {
  LOG_FILE
    .get_or_init(|| {
      let path = default_log_file();
      ensure_parent_dir(&path);
      path
    })
    .clone()
}

pub fn default_log_file() -> PathBuf {
  cache_dir().join(format!("{APP_NAME}.log"))
}

/// `config.toml` inside the nearest workspace, if one was found.
pub fn workspace_config_file() -> Option<PathBuf> {
  let cwd = std::env::current_dir().ok()?;
  let (workspace, is_cwd) = find_workspace_in(cwd);
  (!is_cwd).then(|| workspace.join(WORKSPACE_DIR).join("config.toml"))
}

/// Merge two TOML documents, merging values from `right` onto `left`
///
/// `merge_depth` sets the nesting depth up to which values are merged instead
/// of overridden. Arrays of tables that all carry a `name` key are merged
/// entry by entry, matching on `name`; any other array replaces the left one.
///
/// `crate::merge_toml_values(builtin, user, 4)` combines, for example:
///
/// builtin:
/// ```toml
/// [[completer]]
/// name = "users"
/// trigger-prefix = "@"
/// debounced = true
/// ```
/// user:
/// ```toml
/// [[completer]]
/// name = "users"
/// trigger-prefix = "+"
/// ```
///
/// into:
/// ```toml
/// [[completer]]
/// name = "users"
/// trigger-prefix = "+"
/// debounced = true
/// ```
pub fn merge_toml_values(left: toml::Value, right: toml::Value, merge_depth: usize) -> toml::Value {
  use toml::Value;

  fn get_name(v: &Value) -> Option<&str> {
    v.get("name").and_then(Value::as_str)
  }

  match (left, right) {
    (Value::Array(mut left_items), Value::Array(right_items))
      if merge_depth > 0
        && !right_items.is_empty()
        && right_items.iter().all(|v| get_name(v).is_some()) =>
    {
      for rvalue in right_items {
        let lpos = get_name(&rvalue)
          .and_then(|rname| left_items.iter().position(|v| get_name(v) == Some(rname)));
        match lpos {
          // merged in place, entry order is matching order
          Some(lpos) => {
            let lvalue = std::mem::replace(&mut left_items[lpos], Value::Boolean(false));
            left_items[lpos] = merge_toml_values(lvalue, rvalue, merge_depth - 1);
          },
          None => left_items.push(rvalue),
        }
      }
      Value::Array(left_items)
    },
    (Value::Table(mut left_map), Value::Table(right_map)) if merge_depth > 0 => {
      for (rname, rvalue) in right_map {
        let merged = match left_map.remove(&rname) {
          Some(lvalue) => merge_toml_values(lvalue, rvalue, merge_depth - 1),
          None => rvalue,
        };
        left_map.insert(rname, merged);
      }
      Value::Table(left_map)
    },
    (_, value) => value,
  }
}

/// Walks up from `dir` to the first directory holding `.git`, `.jj` or
/// [`WORKSPACE_DIR`]. Returns `(dir, true)` when none does.
pub fn find_workspace_in(dir: impl AsRef<Path>) -> (PathBuf, bool) {
  let dir = dir.as_ref();
  for ancestor in dir.ancestors() {
    if ancestor.join(".git").exists()
      || ancestor.join(".jj").exists()
      || ancestor.join(WORKSPACE_DIR).exists()
    {
      return (ancestor.to_owned(), false);
    }
  }

  (dir.to_owned(), true)
}

/// Replaces a leading `~` with the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let Ok(rest) = path.strip_prefix("~") else {
    return path.to_owned();
  };
  match etcetera::home_dir() {
    Ok(home) => home.join(rest),
    Err(_) => path.to_owned(),
  }
}

fn default_config_file() -> PathBuf {
  config_dir().join("config.toml")
}

fn ensure_parent_dir(path: &Path) {
  if let Some(parent) = path.parent()
    && !parent.exists()
  {
    std::fs::create_dir_all(parent).ok();
  }
}

#[cfg(test)]
mod merge_toml_tests {
  use toml::Value;

  use super::merge_toml_values;

  fn completer<'a>(merged: &'a Value, name: &str) -> &'a Value {
    merged
      .get("completer")
      .and_then(Value::as_array)
      .unwrap()
      .iter()
      .find(|v| v.get("name").and_then(Value::as_str) == Some(name))
      .unwrap()
  }

  #[test]
  fn completers_merge_by_name() {
    const USER: &str = r#"
        [[completer]]
        name = "users"
        trigger-prefix = "+"

        [completer.insert]
        template = "+{value}"
        "#;

    let base: Value = toml::from_str(include_str!("autocomplete.toml")).unwrap();
    let user: Value = toml::from_str(USER).unwrap();
    let merged = merge_toml_values(base, user, 4);

    let users = completer(&merged, "users");
    assert_eq!(users.get("trigger-prefix").unwrap().as_str(), Some("+"));
    // untouched keys survive
    assert_eq!(users.get("debounced").unwrap().as_bool(), Some(true));
    let insert = users.get("insert").unwrap();
    assert_eq!(insert.get("template").unwrap().as_str(), Some("+{value}"));
    assert_eq!(insert.get("tag").unwrap().as_str(), Some("a"));
    // the other completer is still there
    completer(&merged, "blocks");
  }

  #[test]
  fn new_completers_are_appended() {
    const USER: &str = r##"
        [[completer]]
        name = "tags"
        trigger-prefix = "#"
        "##;

    let base: Value = toml::from_str(include_str!("autocomplete.toml")).unwrap();
    let user: Value = toml::from_str(USER).unwrap();
    let merged = merge_toml_values(base, user, 4);
    let names: Vec<_> = merged
      .get("completer")
      .and_then(Value::as_array)
      .unwrap()
      .iter()
      .filter_map(|v| v.get("name").and_then(Value::as_str))
      .collect();
    assert_eq!(names, ["blocks", "users", "tags"]);
  }

  #[test]
  fn unnamed_arrays_are_replaced() {
    const USER: &str = r#"
        [[completer]]
        name = "blocks"
        options = [{ value = "core/table", label = "Table" }]
        "#;

    let base: Value = toml::from_str(include_str!("autocomplete.toml")).unwrap();
    let user: Value = toml::from_str(USER).unwrap();
    let merged = merge_toml_values(base, user, 4);
    let options = completer(&merged, "blocks")
      .get("options")
      .and_then(Value::as_array)
      .unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].get("label").unwrap().as_str(), Some("Table"));

    let names: Vec<_> = merged
      .get("completer")
      .and_then(Value::as_array)
      .unwrap()
      .iter()
      .filter_map(|v| v.get("name").and_then(Value::as_str))
      .collect();
    assert_eq!(names, ["blocks", "users"]);
  }

  #[test]
  fn arrays_override_past_merge_depth() {
    let left: Value = toml::from_str("list = [1, 2]").unwrap();
    let right: Value = toml::from_str("list = [3]").unwrap();
    let merged = merge_toml_values(left, right, 1);
    assert_eq!(merged.get("list").unwrap().as_array().unwrap().len(), 1);
  }
}
