use the_lib::{
  autocomplete::{
    Autocomplete,
    AutocompleteError,
    Commit,
    Politeness,
  },
  document::Document,
  input::{
    KeyEvent,
    KeyOutcome,
  },
  text_tree::NodeId,
};
use tracing::debug;

/// What a host provides to drive the autocomplete engine.
pub trait AutocompleteContext: Sized + 'static {
  fn autocomplete(&self) -> &Autocomplete;
  fn document(&self) -> &Document;
  /// Both halves at once, for operations that edit the document.
  fn parts_mut(&mut self) -> (&mut Autocomplete, &mut Document);
  /// The editable element completion runs in.
  fn container(&self) -> NodeId {
    self.document().root()
  }
  fn request_render(&mut self);
  fn speak(&mut self, message: &str, politeness: Politeness);
}

/// Re-run matching after the host changed the text or moved the caret.
pub fn handle_input<Ctx: AutocompleteContext>(ctx: &mut Ctx) {
  let container = ctx.container();
  let changed = {
    let (engine, doc) = ctx.parts_mut();
    let before = engine.state().clone();
    let selection = doc.selection();
    engine.search(&*doc, container, selection.as_ref());
    *engine.state() != before
  };
  flush_announcements(ctx);
  if changed {
    ctx.request_render();
  }
}

/// Key hook installed in the `pre` stage of the key pipeline.
pub fn autocomplete_key_hook<Ctx: AutocompleteContext>(ctx: &mut Ctx, key: KeyEvent) -> KeyOutcome {
  let (outcome, changed) = {
    let (engine, doc) = ctx.parts_mut();
    if !engine.is_open() {
      return KeyOutcome::Continue;
    }
    let before = engine.state().clone();
    let outcome = engine.handle_key(doc, key);
    (outcome, *engine.state() != before)
  };
  if changed {
    ctx.request_render();
  }
  outcome
}

/// Commit the result at `index` as if it was clicked.
pub fn click_result<Ctx: AutocompleteContext>(
  ctx: &mut Ctx,
  index: usize,
) -> Result<Commit, AutocompleteError> {
  let commit = {
    let (engine, doc) = ctx.parts_mut();
    engine.select(doc, index)?
  };
  debug!(index, ?commit, "result clicked");
  ctx.request_render();
  Ok(commit)
}

pub fn focus_outside<Ctx: AutocompleteContext>(ctx: &mut Ctx) {
  if !ctx.autocomplete().is_open() {
    return;
  }
  let (engine, _) = ctx.parts_mut();
  engine.handle_focus_outside();
  ctx.request_render();
}

/// Apply option results that arrived since the last call.
pub fn poll_options<Ctx: AutocompleteContext>(ctx: &mut Ctx) -> bool {
  let (engine, _) = ctx.parts_mut();
  if !engine.poll_options() {
    return false;
  }
  flush_announcements(ctx);
  ctx.request_render();
  true
}

/// Wait for the next option result. Returns `false` once no more can
/// arrive.
pub async fn wait_for_options<Ctx: AutocompleteContext>(ctx: &mut Ctx) -> bool {
  let (engine, _) = ctx.parts_mut();
  if !engine.wait_for_options().await {
    return false;
  }
  flush_announcements(ctx);
  ctx.request_render();
  true
}

pub fn flush_announcements<Ctx: AutocompleteContext>(ctx: &mut Ctx) {
  let (engine, _) = ctx.parts_mut();
  for announcement in engine.take_announcements() {
    ctx.speak(&announcement.message, announcement.politeness);
  }
}
