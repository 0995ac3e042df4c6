//! Default autocomplete behaviors for hosts.
//!
//! This crate is the policy layer on top of `the-lib`: it decides where the
//! engine sits in key dispatch, how results are exposed for rendering and
//! accessibility, and how announcements reach the host.

mod autocomplete;
mod key_pipeline;
mod listbox;

pub use autocomplete::{
  AutocompleteContext,
  autocomplete_key_hook,
  click_result,
  flush_announcements,
  focus_outside,
  handle_input,
  poll_options,
  wait_for_options,
};
pub use key_pipeline::{
  AUTOCOMPLETE_PRIORITY,
  KeyHook,
  KeyPipeline,
  KeyStage,
  default_key_pipeline,
};
pub use listbox::{
  ListBox,
  ListBoxProps,
  ResultItem,
  build_list_box,
  list_box_id,
  list_box_props,
  result_id,
};
pub use the_lib::input::{
  Key,
  KeyEvent,
  KeyOutcome,
  Modifiers,
};
