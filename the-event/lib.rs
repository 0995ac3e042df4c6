//! Event plumbing between the synchronous engine and its async workers.

mod debounce;

pub use debounce::{
  AsyncHook,
  try_send,
};
