use std::time::Duration;

use eyre::Result;
use the_default::{
  AutocompleteContext,
  KeyPipeline,
  build_list_box,
  click_result,
  default_key_pipeline,
  focus_outside,
  handle_input,
  wait_for_options,
};
use the_lib::{
  autocomplete::{
    Autocomplete,
    Politeness,
  },
  document::Document,
  input::{
    Key,
    KeyEvent,
    KeyOutcome,
  },
  selection::Boundary,
  text_tree::TextTree,
};
use tracing::warn;

use crate::script::Command;

/// Extra time granted on top of the debounce before giving up on options.
const LOAD_GRACE: Duration = Duration::from_secs(2);

/// A single-paragraph editor hosting the engine. Everything it would show
/// or say goes to `transcript`.
pub struct Host {
  engine:     Autocomplete,
  doc:        Document,
  transcript: Vec<String>,
}

impl AutocompleteContext for Host {
  fn autocomplete(&self) -> &Autocomplete {
    &self.engine
  }

  fn document(&self) -> &Document {
    &self.doc
  }

  fn parts_mut(&mut self) -> (&mut Autocomplete, &mut Document) {
    (&mut self.engine, &mut self.doc)
  }

  fn request_render(&mut self) {}

  fn speak(&mut self, message: &str, politeness: Politeness) {
    let level = match politeness {
      Politeness::Polite => "polite",
      Politeness::Assertive => "assertive",
    };
    self.transcript.push(format!("({level}) {message}"));
  }
}

impl Host {
  pub fn new(engine: Autocomplete) -> Self {
    let mut doc = Document::new("p");
    let root = doc.root();
    doc.set_caret(Boundary::new(root, 0));
    Self {
      engine,
      doc,
      transcript: Vec::new(),
    }
  }

  pub fn take_transcript(&mut self) -> Vec<String> {
    std::mem::take(&mut self.transcript)
  }

  fn caret(&self) -> Boundary {
    let root = self.doc.root();
    self
      .doc
      .selection()
      .map(|selection| selection.focus)
      .unwrap_or_else(|| Boundary::new(root, self.doc.child_count(root)))
  }

  fn type_char(&mut self, ch: char) -> Result<()> {
    let mut buf = [0; 4];
    let caret = self.doc.insert_text(self.caret(), ch.encode_utf8(&mut buf))?;
    self.doc.set_caret(caret);
    handle_input(self);
    Ok(())
  }

  pub async fn run(&mut self, keys: &mut KeyPipeline<Host>, command: Command) -> Result<()> {
    match command {
      Command::Type(text) => {
        for ch in text.chars() {
          self.type_char(ch)?;
        }
      },
      Command::Keys(events) => {
        for event in events {
          keys.handle(self, event);
          self.settle().await;
        }
      },
      Command::Click(index) => {
        let line = match click_result(self, index) {
          Ok(commit) => format!("clicked {index}: {commit:?}"),
          Err(err) => {
            warn!(%err, "click failed");
            format!("click {index} failed: {err}")
          },
        };
        self.transcript.push(line);
      },
      Command::Blur => focus_outside(self),
      Command::Show => self.show(),
    }
    self.settle().await;
    Ok(())
  }

  /// Wait until the open completer's options have arrived.
  async fn settle(&mut self) {
    let limit = self.engine.config().debounce() + LOAD_GRACE;
    while self.engine.is_loading() {
      match tokio::time::timeout(limit, wait_for_options(self)).await {
        Ok(true) => {},
        Ok(false) => break,
        Err(_) => {
          warn!("options did not arrive within {limit:?}");
          break;
        },
      }
    }
  }

  fn show(&mut self) {
    let root = self.doc.root();
    let caret = self.caret();
    self.transcript.push(format!("doc: {}", self.doc.markup(root)));
    self
      .transcript
      .push(format!("caret: {:?} +{}", self.doc.text(caret.node), caret.offset));

    let list = build_list_box(&self.engine);
    if !list.props.is_expanded {
      self.transcript.push("popup: closed".to_string());
      return;
    }
    self.transcript.push(format!(
      "popup: {} (active {})",
      list.props.list_box_id.unwrap_or_default(),
      list.props.active_id.unwrap_or_default()
    ));
    for (index, item) in list.items.iter().enumerate() {
      let marker = if item.selected { '>' } else { ' ' };
      let disabled = if item.disabled { " (disabled)" } else { "" };
      self
        .transcript
        .push(format!("{marker} {index}: {}{disabled}", item.label));
    }
  }

  /// Editing keys the engine let through.
  fn edit(&mut self, event: KeyEvent) -> KeyOutcome {
    let caret = self.caret();
    let edited = match event.key {
      Key::Char(ch) if event.modifiers.is_empty() || event.modifiers.shift() => {
        self.doc.insert_text(caret, ch.encode_utf8(&mut [0; 4]))
      },
      Key::Backspace => self.doc.delete_backward(caret),
      _ => {
        self.transcript.push(format!("host: {:?}", event.key));
        return KeyOutcome::Handled;
      },
    };
    match edited {
      Ok(caret) => {
        self.doc.set_caret(caret);
        handle_input(self);
      },
      Err(err) => warn!(%err, "edit failed"),
    }
    KeyOutcome::Handled
  }
}

/// The default pipeline with the host's own editing installed behind it.
pub fn key_pipeline() -> KeyPipeline<Host> {
  default_key_pipeline::<Host>().with_on(0, Host::edit)
}

#[cfg(test)]
mod test {
  use std::sync::Arc;

  use the_lib::{
    completer::{
      Completer,
      CompleterRegistry,
    },
    config::AutocompleteConfig,
  };

  use super::*;
  use crate::script::parse_script;

  fn host() -> Host {
    let config: the_loader::config::Config = the_loader::config::default_config_value()
      .unwrap()
      .try_into()
      .unwrap();
    Host::new(Autocomplete::new(config.registry(), config.autocomplete))
  }

  async fn run_script(host: &mut Host, script: &str) -> Vec<String> {
    let mut keys = key_pipeline();
    for command in parse_script(script).unwrap() {
      host.run(&mut keys, command).await.unwrap();
    }
    host.take_transcript()
  }

  #[tokio::test(start_paused = true)]
  async fn mention_is_completed() {
    let mut host = host();
    let transcript = run_script(&mut host, "type hi @ed\nshow\nkey enter\nshow").await;
    assert_eq!(transcript[0], "(assertive) 1 result found, use up and down arrow keys to navigate.");
    assert!(transcript.iter().any(|line| line.ends_with("> 0: Éditeur en chef")));
    assert!(transcript.contains(&"doc: <p>hi <a>@editor</a></p>".to_string()));
    assert_eq!(transcript.last().map(String::as_str), Some("popup: closed"));
  }

  #[tokio::test(start_paused = true)]
  async fn backspace_reaches_the_host_and_refilters() {
    let mut host = host();
    let transcript = run_script(&mut host, "type /headx\nkey backspace\nshow").await;
    assert!(transcript.iter().any(|line| line.ends_with("> 0: Heading")), "{transcript:?}");
    assert!(transcript.contains(&"doc: <p>/head</p>".to_string()));
  }

  #[tokio::test(start_paused = true)]
  async fn escape_closes_and_is_consumed() {
    let mut host = host();
    let transcript = run_script(&mut host, "type /\nkey escape\nkey escape\nshow").await;
    // only the second escape reaches the host
    assert_eq!(
      transcript.iter().filter(|line| line.starts_with("host:")).count(),
      1
    );
    assert!(transcript.contains(&"popup: closed".to_string()));
  }

  #[tokio::test(start_paused = true)]
  async fn click_without_results_keeps_the_script_going() {
    let mut host = host();
    let transcript = run_script(&mut host, "click 3\ntype /para\nkey enter\nshow").await;
    assert_eq!(transcript[0], "click 3 failed: no option at index 3, 0 listed");
    assert!(transcript.contains(&"doc: <p>[Paragraph]</p>".to_string()), "{transcript:?}");
  }

  #[tokio::test]
  async fn long_bursts_of_activations_finish() {
    let mut host = host();
    let script = format!("type {}\ntype /he\nshow", "/a ".repeat(100));
    let transcript = run_script(&mut host, &script).await;
    assert!(transcript.iter().any(|line| line.ends_with("> 0: Heading")), "{transcript:?}");
  }

  #[tokio::test]
  async fn empty_registry_never_opens() {
    let registry = CompleterRegistry::new(Vec::<Arc<dyn Completer>>::new());
    let mut host = Host::new(Autocomplete::new(registry, AutocompleteConfig::default()));
    let transcript = run_script(&mut host, "type @x\nshow").await;
    assert_eq!(transcript, ["doc: <p>@x</p>", "caret: Some(\"@x\") +2", "popup: closed"]);
  }
}
