//! Debounced async hooks.
//!
//! The engine reacts to input synchronously, but some follow-up work (like
//! fetching completion options) has to happen off the event path and may need
//! to wait for typing to settle. An [`AsyncHook`] is a small state machine that
//! runs as a tokio task and receives its events through a channel.

use tokio::{
  sync::mpsc::{
    self,
    Sender,
    error::TrySendError,
  },
  time::Instant,
};

const CHANNEL_CAPACITY: usize = 128;

pub trait AsyncHook: Send + 'static + Sized {
  type Event: Send + 'static;

  /// Called for every received event. Returning `Some(deadline)` (re)arms the
  /// debounce timer, `None` disarms it. `timeout` is the currently armed
  /// deadline, if any.
  fn handle_event(&mut self, event: Self::Event, timeout: Option<Instant>) -> Option<Instant>;

  /// Called once the armed deadline passes without a newer event rearming it.
  fn finish_debounce(&mut self);

  /// Start the hook on the current tokio runtime.
  ///
  /// Outside of a runtime no worker is started and the returned sender is
  /// already closed, so callers degrade to a no-op instead of panicking.
  fn spawn(self) -> Sender<Self::Event> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    if tokio::runtime::Handle::try_current().is_ok() {
      tokio::spawn(run(self, rx));
    }
    tx
  }
}

async fn run<Hook: AsyncHook>(mut hook: Hook, mut rx: mpsc::Receiver<Hook::Event>) {
  let mut deadline: Option<Instant> = None;
  loop {
    let event = match deadline {
      Some(at) => {
        match tokio::time::timeout_at(at, rx.recv()).await {
          Ok(event) => event,
          Err(_) => {
            hook.finish_debounce();
            deadline = None;
            continue;
          },
        }
      },
      None => rx.recv().await,
    };
    let Some(event) = event else {
      break;
    };
    deadline = hook.handle_event(event, deadline);
  }
}

/// Send without blocking. Returns whether the event was queued; a full
/// channel drops it.
pub fn try_send<T>(tx: &Sender<T>, data: T) -> bool {
  match tx.try_send(data) {
    Ok(()) => true,
    Err(TrySendError::Full(_)) => false,
    Err(TrySendError::Closed(_)) => {
      log::debug!("hook channel closed, event ignored");
      false
    },
  }
}
