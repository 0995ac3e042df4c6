use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod autocomplete;
pub mod completer;
pub mod config;
pub mod cursor;
pub mod document;
pub mod filter;
pub mod input;
pub mod loader;
pub mod replace;
pub mod scanner;
pub mod selection;
pub mod static_completer;
pub mod text_tree;

pub type Tendril = SmartString<LazyCompact>;
