//! Caret resolution.

use crate::{
  selection::Selection,
  text_tree::{
    NodeId,
    TextTree,
  },
};

/// A collapsed caret position inside the editable container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
  pub node:   NodeId,
  pub offset: usize,
}

/// Resolve the caret for `selection` inside `container`.
///
/// Returns `None` without a selection or when something is selected, since
/// completion only runs at a bare caret. A caret outside `container` is an
/// integration bug: debug builds panic, release builds return `None`.
pub fn locate_cursor(
  tree: &dyn TextTree,
  container: NodeId,
  selection: Option<&Selection>,
) -> Option<Cursor> {
  let selection = selection?;
  if !selection.is_collapsed() {
    return None;
  }

  let anchor = selection.anchor;
  let inside = tree.contains(container, anchor.node);
  debug_assert!(inside, "caret {anchor:?} is outside the autocomplete container");
  if !inside {
    return None;
  }

  Some(Cursor {
    node:   anchor.node,
    offset: anchor.offset,
  })
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    document::Document,
    selection::Boundary,
  };

  #[test]
  fn collapsed_caret_resolves() {
    let mut doc = Document::new("p");
    let root = doc.root();
    let text = doc.create_text("hello");
    doc.append_child(root, text).unwrap();

    let caret = Selection::caret(Boundary::new(text, 3));
    assert_eq!(
      locate_cursor(&doc, root, Some(&caret)),
      Some(Cursor {
        node:   text,
        offset: 3,
      })
    );
    assert_eq!(locate_cursor(&doc, root, None), None);
  }

  #[test]
  fn ranges_are_ignored() {
    let mut doc = Document::new("p");
    let root = doc.root();
    let text = doc.create_text("hello");
    doc.append_child(root, text).unwrap();

    let selection = Selection::new(Boundary::new(text, 1), Boundary::new(text, 4));
    assert_eq!(locate_cursor(&doc, root, Some(&selection)), None);
  }

  #[test]
  #[cfg(debug_assertions)]
  #[should_panic(expected = "outside the autocomplete container")]
  fn caret_outside_container_panics_in_debug() {
    let mut doc = Document::new("div");
    let root = doc.root();
    let inside = doc.create_element("p");
    let outside = doc.create_element("p");
    let text = doc.create_text("x");
    doc.append_child(root, inside).unwrap();
    doc.append_child(root, outside).unwrap();
    doc.append_child(outside, text).unwrap();

    let caret = Selection::caret(Boundary::new(text, 1));
    locate_cursor(&doc, inside, Some(&caret));
  }
}
