//! Asynchronous option loading.
//!
//! Each activation of a completer asks the [`OptionLoader`] for its options.
//! Requests are handled by an [`AsyncHook`] running on the tokio runtime:
//! regular completers are fetched right away, debounced ones only once no
//! newer request arrived for the configured settle time. Results come back
//! over a channel that the engine drains on its own schedule.
//!
//! In-flight fetches are never cancelled. A result for a completer that is no
//! longer open is still delivered; the engine decides whether it matters.

use std::time::Duration;

use the_event::{
  AsyncHook,
  try_send,
};
use tokio::{
  sync::mpsc::{
    self,
    Sender,
    UnboundedReceiver,
    UnboundedSender,
  },
  time::Instant,
};
use tracing::{
  debug,
  warn,
};

use crate::completer::{
  CompleterRegistry,
  KeyedOption,
  LoadError,
  key_options,
};

/// Options (or the failure) for one completer activation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedOptions {
  pub completer: usize,
  pub result:    Result<Vec<KeyedOption>, LoadError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadEvent {
  Activate(usize),
  Close,
}

struct OptionsHook {
  registry: CompleterRegistry,
  debounce: Duration,
  pending:  Option<usize>,
  results:  UnboundedSender<LoadedOptions>,
}

impl OptionsHook {
  fn fetch(&self, index: usize) {
    let Some(completer) = self.registry.get(index) else {
      return;
    };
    debug!(completer = completer.name(), index, "requesting options");
    let options = completer.options();
    let results = self.results.clone();
    tokio::spawn(async move {
      let result = options.await.map(|options| key_options(index, options));
      // the engine may already be gone
      let _ = results.send(LoadedOptions {
        completer: index,
        result,
      });
    });
  }
}

impl AsyncHook for OptionsHook {
  type Event = LoadEvent;

  fn handle_event(&mut self, event: LoadEvent, _timeout: Option<Instant>) -> Option<Instant> {
    match event {
      LoadEvent::Close => {
        self.pending = None;
        None
      },
      LoadEvent::Activate(index) => {
        let debounced = self
          .registry
          .get(index)
          .is_some_and(|completer| completer.is_debounced());
        if debounced {
          self.pending = Some(index);
          Some(Instant::now() + self.debounce)
        } else {
          self.pending = None;
          self.fetch(index);
          None
        }
      },
    }
  }

  fn finish_debounce(&mut self) {
    if let Some(index) = self.pending.take() {
      self.fetch(index);
    }
  }
}

/// Handle to the option loading task.
///
/// Must be created inside a tokio runtime; without one, requests are
/// silently dropped and no results ever arrive.
#[derive(Debug)]
pub struct OptionLoader {
  events:  Sender<LoadEvent>,
  results: UnboundedReceiver<LoadedOptions>,
}

impl OptionLoader {
  pub fn new(registry: CompleterRegistry, debounce: Duration) -> Self {
    let (tx, results) = mpsc::unbounded_channel();
    let hook = OptionsHook {
      registry,
      debounce,
      pending: None,
      results: tx,
    };
    Self {
      events: hook.spawn(),
      results,
    }
  }

  /// Ask for the options of the completer at `index`.
  pub fn request(&self, index: usize) {
    self.send(LoadEvent::Activate(index));
  }

  /// Drop a pending debounced request.
  pub fn close(&self) {
    self.send(LoadEvent::Close);
  }

  // never blocks: the hook task may share this thread
  fn send(&self, event: LoadEvent) {
    if !try_send(&self.events, event) && !self.events.is_closed() {
      warn!(?event, "option loader is saturated, request dropped");
    }
  }

  pub fn try_next(&mut self) -> Option<LoadedOptions> {
    self.results.try_recv().ok()
  }

  pub async fn next(&mut self) -> Option<LoadedOptions> {
    self.results.recv().await
  }
}

#[cfg(test)]
mod test {
  use std::sync::{
    Arc,
    atomic::{
      AtomicUsize,
      Ordering,
    },
  };

  use super::*;
  use crate::completer::{
    Completer,
    CompletionOption,
    OptionsFuture,
  };

  struct Counting {
    debounced: bool,
    fail:      bool,
    calls:     Arc<AtomicUsize>,
  }

  impl Completer for Counting {
    fn name(&self) -> &str {
      "counting"
    }

    fn is_debounced(&self) -> bool {
      self.debounced
    }

    fn options(&self) -> OptionsFuture {
      self.calls.fetch_add(1, Ordering::SeqCst);
      let fail = self.fail;
      Box::pin(async move {
        if fail {
          Err(LoadError::Source("offline".into()))
        } else {
          Ok(vec![CompletionOption::new(1, "one")])
        }
      })
    }
  }

  fn loader(debounced: bool, fail: bool) -> (OptionLoader, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let completer = Counting {
      debounced,
      fail,
      calls: calls.clone(),
    };
    let registry = CompleterRegistry::new(vec![Arc::new(completer)]);
    (OptionLoader::new(registry, Duration::from_millis(250)), calls)
  }

  #[tokio::test(start_paused = true)]
  async fn immediate_fetch_is_keyed() {
    let (mut loader, calls) = loader(false, false);
    loader.request(0);
    let loaded = loader.next().await.unwrap();
    assert_eq!(loaded.completer, 0);
    let options = loaded.result.unwrap();
    assert_eq!(options[0].key, "0_0");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn debounced_requests_collapse() {
    let (mut loader, calls) = loader(true, false);
    let start = Instant::now();
    loader.request(0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    loader.request(0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(loader.try_next().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let loaded = loader.next().await.unwrap();
    assert!(loaded.result.is_ok());
    assert!(start.elapsed() >= Duration::from_millis(350));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn close_drops_pending_request() {
    let (mut loader, calls) = loader(true, false);
    loader.request(0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    loader.close();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(loader.try_next().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn failures_are_delivered() {
    let (mut loader, _) = loader(false, true);
    loader.request(0);
    let loaded = loader.next().await.unwrap();
    assert_eq!(loaded.result, Err(LoadError::Source("offline".into())));
  }

  #[tokio::test(start_paused = true)]
  async fn request_bursts_never_block() {
    let (mut loader, calls) = loader(false, false);
    for _ in 0..300 {
      loader.request(0);
      loader.close();
    }
    let loaded = loader.next().await.unwrap();
    assert!(loaded.result.is_ok());
    tokio::time::sleep(Duration::from_millis(10)).await;
    let calls = calls.load(Ordering::SeqCst);
    assert!(calls >= 1 && calls < 300, "{calls} fetches");
  }

  #[test]
  fn without_runtime_nothing_arrives() {
    let (mut loader, calls) = loader(false, false);
    loader.request(0);
    assert!(loader.try_next().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }
}
