use std::cmp::Reverse;

use the_lib::input::{
  KeyEvent,
  KeyOutcome,
};

use crate::{
  AutocompleteContext,
  autocomplete_key_hook,
};

/// Priority the autocomplete hook registers with in the `pre` stage.
pub const AUTOCOMPLETE_PRIORITY: i32 = 100;

/// Where a hook runs. Every `pre` hook runs before any `on` hook, which runs
/// before any `post` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyStage {
  Pre,
  On,
  Post,
}

pub type KeyHook<Ctx> = Box<dyn FnMut(&mut Ctx, KeyEvent) -> KeyOutcome>;

struct Registered<Ctx> {
  stage:    KeyStage,
  priority: i32,
  hook:     KeyHook<Ctx>,
}

/// Single ordered dispatch point for key events.
///
/// Hooks are sorted by stage, then by descending priority, then by
/// registration order. The first hook returning [`KeyOutcome::Handled`]
/// consumes the key; later hooks never see it.
pub struct KeyPipeline<Ctx> {
  hooks: Vec<Registered<Ctx>>,
}

impl<Ctx> Default for KeyPipeline<Ctx> {
  fn default() -> Self {
    Self { hooks: Vec::new() }
  }
}

impl<Ctx> KeyPipeline<Ctx> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register<F>(&mut self, stage: KeyStage, priority: i32, hook: F)
  where
    F: FnMut(&mut Ctx, KeyEvent) -> KeyOutcome + 'static,
  {
    let registered = Registered {
      stage,
      priority,
      hook: Box::new(hook),
    };
    // stable position among equal keys keeps registration order
    let at = self
      .hooks
      .partition_point(|other| (other.stage, Reverse(other.priority)) <= (stage, Reverse(priority)));
    self.hooks.insert(at, registered);
  }

  #[must_use]
  pub fn with_pre<F>(mut self, priority: i32, hook: F) -> Self
  where
    F: FnMut(&mut Ctx, KeyEvent) -> KeyOutcome + 'static,
  {
    self.register(KeyStage::Pre, priority, hook);
    self
  }

  #[must_use]
  pub fn with_on<F>(mut self, priority: i32, hook: F) -> Self
  where
    F: FnMut(&mut Ctx, KeyEvent) -> KeyOutcome + 'static,
  {
    self.register(KeyStage::On, priority, hook);
    self
  }

  #[must_use]
  pub fn with_post<F>(mut self, priority: i32, hook: F) -> Self
  where
    F: FnMut(&mut Ctx, KeyEvent) -> KeyOutcome + 'static,
  {
    self.register(KeyStage::Post, priority, hook);
    self
  }

  pub fn len(&self) -> usize {
    self.hooks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.hooks.is_empty()
  }

  pub fn handle(&mut self, ctx: &mut Ctx, key: KeyEvent) -> KeyOutcome {
    for registered in &mut self.hooks {
      if (registered.hook)(ctx, key).is_handled() {
        return KeyOutcome::Handled;
      }
    }
    KeyOutcome::Continue
  }
}

/// A pipeline with the autocomplete hook installed ahead of everything the
/// host adds to the `on` stage.
pub fn default_key_pipeline<Ctx: AutocompleteContext>() -> KeyPipeline<Ctx> {
  KeyPipeline::new().with_pre(AUTOCOMPLETE_PRIORITY, autocomplete_key_hook::<Ctx>)
}
