//! Boundaries, ranges and the caret selection of a [`TextTree`].
//!
//! These mirror the DOM `Range`/`Selection` shapes closely enough that a host
//! can translate its own selection into a [`Selection`] without loss:
//!
//! ```text
//! <p>"hello @ma|"</p>          caret at (text, 9), collapsed
//! <p>"he[llo]"</p>             anchor (text, 2), focus (text, 5)
//! <p>"hi "<b/>|</p>            caret at (p, 2), between children
//! ```
//!
//! [`TextTree`]: crate::text_tree::TextTree

use crate::text_tree::NodeId;

/// A position in the tree: `(node, offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
  pub node:   NodeId,
  pub offset: usize,
}

impl Boundary {
  pub const fn new(node: NodeId, offset: usize) -> Self {
    Self { node, offset }
  }
}

/// A span between two boundaries. `start` is expected to precede `end` in
/// document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
  pub start: Boundary,
  pub end:   Boundary,
}

impl Range {
  pub const fn new(start: Boundary, end: Boundary) -> Self {
    Self { start, end }
  }

  pub const fn collapsed(at: Boundary) -> Self {
    Self { start: at, end: at }
  }

  pub fn is_collapsed(&self) -> bool {
    self.start == self.end
  }

  /// Collapse onto the start boundary.
  pub fn collapse_to_start(&mut self) {
    self.end = self.start;
  }
}

/// The user's selection. `anchor` is where it began, `focus` where it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
  pub anchor: Boundary,
  pub focus:  Boundary,
}

impl Selection {
  pub const fn new(anchor: Boundary, focus: Boundary) -> Self {
    Self { anchor, focus }
  }

  /// A caret with nothing selected.
  pub const fn caret(at: Boundary) -> Self {
    Self {
      anchor: at,
      focus:  at,
    }
  }

  pub fn is_collapsed(&self) -> bool {
    self.anchor == self.focus
  }
}

impl From<Range> for Selection {
  fn from(range: Range) -> Self {
    Self::new(range.start, range.end)
  }
}
