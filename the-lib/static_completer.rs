//! Completers backed by a fixed option list from configuration.

use serde_json::Value;

use crate::{
  completer::{
    Completer,
    CompletionOption,
    MatchContext,
    OptionsFuture,
  },
  config::{
    InsertConfig,
    StaticCompleterConfig,
  },
  document::Fragment,
  selection::Range,
  text_tree::TextTree,
};

#[derive(Debug, Clone)]
pub struct StaticCompleter {
  config: StaticCompleterConfig,
}

impl StaticCompleter {
  pub fn new(config: StaticCompleterConfig) -> Self {
    Self { config }
  }

  fn option_for(&self, value: &Value) -> Option<&CompletionOption> {
    self
      .config
      .options
      .iter()
      .find(|option| &option.value == value)
  }
}

impl Completer for StaticCompleter {
  fn name(&self) -> &str {
    &self.config.name
  }

  fn trigger_prefix(&self) -> &str {
    &self.config.trigger_prefix
  }

  fn class_name(&self) -> Option<&str> {
    self.config.class_name.as_deref()
  }

  fn is_debounced(&self) -> bool {
    self.config.debounced
  }

  fn allow_context(&self, tree: &dyn TextTree, context: &MatchContext) -> bool {
    if self.config.allow_mid_word {
      return true;
    }
    !tree
      .range_text(&context.before)
      .chars()
      .last()
      .is_some_and(the_core::chars::char_is_word)
  }

  fn options(&self) -> OptionsFuture {
    let options = self.config.options.clone();
    Box::pin(async move { Ok(options) })
  }

  fn on_select(&self, value: &Value, _range: &Range, query: &str) -> Option<Vec<Fragment>> {
    let insert = self.config.insert.as_ref()?;
    let label = self.option_for(value).map_or("", |option| option.label.as_str());
    Some(vec![render_insert(insert, label, value, query)])
  }
}

fn render_insert(insert: &InsertConfig, label: &str, value: &Value, query: &str) -> Fragment {
  let value = match value {
    Value::String(value) => value.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  };
  let text = insert
    .template
    .replace("{label}", label)
    .replace("{value}", &value)
    .replace("{query}", query);
  match &insert.tag {
    Some(tag) => Fragment::element(tag.as_str(), vec![Fragment::Text(text)]),
    None => Fragment::Text(text),
  }
}
