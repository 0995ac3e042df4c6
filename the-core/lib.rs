//! Text primitives shared by the autocomplete crates.

pub mod chars;
