//! The autocomplete engine.
//!
//! [`Autocomplete`] ties the pieces together: on every input event the host
//! calls [`Autocomplete::search`], which locates the caret, scans for a
//! trigger, requests options when a completer becomes active and re-filters
//! whatever options are already cached. Key events go through
//! [`Autocomplete::handle_key`] before the host editor sees them. Option
//! results arrive asynchronously and are folded in by
//! [`Autocomplete::poll_options`] or [`Autocomplete::wait_for_options`].
//!
//! The engine state is a plain value ([`EngineState`]); closing the popup in
//! any way (escape, selection, leaving the trigger) restores its default.

use std::{
  collections::{
    HashMap,
    VecDeque,
  },
  sync::atomic::{
    AtomicUsize,
    Ordering,
  },
};

use thiserror::Error;
use tracing::{
  debug,
  trace,
  warn,
};

use crate::{
  completer::{
    CompleterRegistry,
    KeyedOption,
  },
  config::AutocompleteConfig,
  cursor::locate_cursor,
  document::{
    Document,
    DomError,
  },
  filter::{
    SearchPattern,
    filter_options,
  },
  input::{
    Key,
    KeyEvent,
    KeyOutcome,
  },
  loader::{
    LoadedOptions,
    OptionLoader,
  },
  replace::replace_range,
  scanner::find_match,
  selection::{
    Boundary,
    Range,
    Selection,
  },
  text_tree::{
    NodeId,
    TextTree,
  },
};

pub type Result<T> = std::result::Result<T, AutocompleteError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutocompleteError {
  #[error(transparent)]
  Dom(#[from] DomError),
  #[error("no option at index {index}, {len} listed")]
  NoSuchOption { index: usize, len: usize },
}

static NEXT_INSTANCE: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
  pub search:           SearchPattern,
  pub selected_index:   usize,
  /// Registry index of the active completer.
  pub open:             Option<usize>,
  pub query:            Option<String>,
  /// Trigger prefix plus query in the document.
  pub range:            Option<Range>,
  pub filtered_options: Vec<KeyedOption>,
}

impl EngineState {
  pub fn is_open(&self) -> bool {
    self.open.is_some()
  }

  /// Open with something to show.
  pub fn is_expanded(&self) -> bool {
    self.is_open() && !self.filtered_options.is_empty()
  }

  pub fn selected(&self) -> Option<&KeyedOption> {
    self.filtered_options.get(self.selected_index)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Politeness {
  Polite,
  Assertive,
}

/// A message for assistive technology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
  pub message:    String,
  pub politeness: Politeness,
}

impl Announcement {
  fn result_count(count: usize) -> Self {
    let message = match count {
      0 => "No results.".to_string(),
      1 => "1 result found, use up and down arrow keys to navigate.".to_string(),
      n => format!("{n} results found, use up and down arrow keys to navigate."),
    };
    Self {
      message,
      politeness: Politeness::Assertive,
    }
  }
}

/// Outcome of committing an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
  /// The trigger and query were replaced; the caret sits after the content.
  Replaced { caret: Boundary },
  /// The completer handled the selection itself, the document is untouched.
  Delegated,
  /// The option is disabled; nothing changed.
  Disabled,
}

#[derive(Debug)]
pub struct Autocomplete {
  instance_id:   usize,
  config:        AutocompleteConfig,
  registry:      CompleterRegistry,
  state:         EngineState,
  options:       HashMap<usize, Vec<KeyedOption>>,
  loader:        OptionLoader,
  announcements: VecDeque<Announcement>,
}

impl Autocomplete {
  /// Create an engine. Must run inside a tokio runtime for options to load.
  pub fn new(registry: CompleterRegistry, config: AutocompleteConfig) -> Self {
    let loader = OptionLoader::new(registry.clone(), config.debounce());
    Self {
      instance_id: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
      config,
      registry,
      state: EngineState::default(),
      options: HashMap::new(),
      loader,
      announcements: VecDeque::new(),
    }
  }

  pub fn instance_id(&self) -> usize {
    self.instance_id
  }

  pub fn config(&self) -> &AutocompleteConfig {
    &self.config
  }

  pub fn registry(&self) -> &CompleterRegistry {
    &self.registry
  }

  pub fn state(&self) -> &EngineState {
    &self.state
  }

  pub fn is_open(&self) -> bool {
    self.state.is_open()
  }

  /// Open, but the active completer's options have not arrived yet.
  pub fn is_loading(&self) -> bool {
    self
      .state
      .open
      .is_some_and(|open| !self.options.contains_key(&open))
  }

  pub fn cached_options(&self, completer: usize) -> Option<&[KeyedOption]> {
    self.options.get(&completer).map(Vec::as_slice)
  }

  /// Re-run matching after the text or the caret changed.
  pub fn search(&mut self, tree: &dyn TextTree, container: NodeId, selection: Option<&Selection>) {
    let Some(cursor) = locate_cursor(tree, container, selection) else {
      return;
    };

    let was_open = self.state.open;
    let Some(found) = find_match(tree, container, cursor, &self.registry, was_open) else {
      if was_open.is_some() {
        self.reset();
      }
      return;
    };

    if was_open != Some(found.completer) {
      if let Some(completer) = self.registry.get(found.completer) {
        debug!(completer = completer.name(), "completer activated");
      }
      self.loader.request(found.completer);
    }

    let search = SearchPattern::for_query(&found.query);
    let cached = self.options.get(&found.completer);
    let loaded = cached.is_some();
    let filtered_options = cached
      .map(|options| filter_options(&search, options, self.config.max_results))
      .unwrap_or_default();

    self.state = EngineState {
      search,
      selected_index: 0,
      open: Some(found.completer),
      query: Some(found.query),
      range: Some(found.range),
      filtered_options,
    };
    if loaded {
      self.announce();
    }
  }

  /// Handle a key before the host editor does.
  ///
  /// Navigation and commit keys are consumed while results are listed.
  /// Escape always closes an open popup. Left, right and tab close it but
  /// still reach the host.
  pub fn handle_key(&mut self, doc: &mut Document, event: KeyEvent) -> KeyOutcome {
    if !self.state.is_open() {
      return KeyOutcome::Continue;
    }
    if event.key == Key::Escape {
      self.reset();
      return KeyOutcome::Handled;
    }

    let len = self.state.filtered_options.len();
    if len == 0 {
      return KeyOutcome::Continue;
    }
    let selected = self.state.selected_index;
    match event.key {
      Key::Up => {
        self.state.selected_index = (if selected == 0 { len } else { selected }) - 1;
        KeyOutcome::Handled
      },
      Key::Down => {
        self.state.selected_index = (selected + 1) % len;
        KeyOutcome::Handled
      },
      Key::Enter => {
        if let Err(err) = self.select(doc, selected) {
          warn!(%err, "failed to apply completion");
        }
        KeyOutcome::Handled
      },
      Key::Left | Key::Right | Key::Tab => {
        self.reset();
        KeyOutcome::Continue
      },
      _ => KeyOutcome::Continue,
    }
  }

  /// Commit the listed option at `index`.
  ///
  /// The engine is reset before the completer runs, then its content (if
  /// any) replaces the trigger and query and the caret moves after it.
  pub fn select(&mut self, doc: &mut Document, index: usize) -> Result<Commit> {
    let Some(option) = self.state.filtered_options.get(index).cloned() else {
      return Err(AutocompleteError::NoSuchOption {
        index,
        len: self.state.filtered_options.len(),
      });
    };
    if option.option.is_disabled {
      return Ok(Commit::Disabled);
    }

    let EngineState {
      open, range, query, ..
    } = self.take_state();
    let completer = open.and_then(|open| self.registry.get(open)).cloned();
    let (Some(completer), Some(range)) = (completer, range) else {
      return Ok(Commit::Delegated);
    };

    let query = query.unwrap_or_default();
    let Some(content) = completer.on_select(&option.option.value, &range, &query) else {
      return Ok(Commit::Delegated);
    };
    let caret = replace_range(doc, range, &content)?;
    doc.set_caret(caret);
    Ok(Commit::Replaced { caret })
  }

  /// Close the popup and forget the current match.
  pub fn reset(&mut self) {
    self.take_state();
  }

  pub fn handle_focus_outside(&mut self) {
    if self.state.is_open() {
      self.reset();
    }
  }

  /// Fold loaded options into the cache, refreshing the list if they belong
  /// to the open completer.
  pub fn apply_loaded(&mut self, loaded: LoadedOptions) {
    let LoadedOptions { completer, result } = loaded;
    let options = match result {
      Ok(options) => options,
      Err(err) => {
        let name = self.registry.get(completer).map_or("?", |completer| completer.name());
        warn!(completer = name, %err, "failed to load options");
        if self.state.open == Some(completer) {
          self.reset();
        }
        return;
      },
    };

    if self.state.open == Some(completer) {
      let filtered = filter_options(&self.state.search, &options, self.config.max_results);
      if filtered.len() != self.state.filtered_options.len() {
        self.state.selected_index = 0;
      }
      self.state.filtered_options = filtered;
      self.options.insert(completer, options);
      self.announce();
    } else {
      self.options.insert(completer, options);
    }
  }

  /// Apply every result that already arrived. Returns whether any did.
  pub fn poll_options(&mut self) -> bool {
    let mut applied = false;
    while let Some(loaded) = self.loader.try_next() {
      self.apply_loaded(loaded);
      applied = true;
    }
    applied
  }

  /// Wait for the next option result, then apply it and anything else
  /// already queued. Returns `false` once the loader has shut down.
  pub async fn wait_for_options(&mut self) -> bool {
    let Some(loaded) = self.loader.next().await else {
      return false;
    };
    self.apply_loaded(loaded);
    self.poll_options();
    true
  }

  pub fn take_announcements(&mut self) -> Vec<Announcement> {
    self.announcements.drain(..).collect()
  }

  fn announce(&mut self) {
    self
      .announcements
      .push_back(Announcement::result_count(self.state.filtered_options.len()));
  }

  fn take_state(&mut self) -> EngineState {
    if self.state.is_open() {
      trace!(instance = self.instance_id, "autocomplete reset");
      self.loader.close();
    }
    std::mem::take(&mut self.state)
  }
}
