//! Read-only view over a tree of element and text nodes.
//!
//! The trigger scanner never touches a concrete document type. It walks any
//! [`TextTree`], which only has to answer a handful of structural questions
//! (parent, children, siblings, text contents). [`Document`] is the in-memory
//! implementation used by the engine and the tests; a host backed by a
//! different rich-text model implements the same trait over its own nodes.
//!
//! # Offsets
//!
//! A [`Boundary`] follows DOM conventions: inside a text node the offset is a
//! character index into its text, inside an element it is a child index.
//!
//! [`Document`]: crate::document::Document

use std::collections::HashMap;

use crate::selection::{
  Boundary,
  Range,
};

slotmap::new_key_type! {
  /// Handle to a node in a [`TextTree`].
  pub struct NodeId;
}

pub trait TextTree {
  fn is_text(&self, node: NodeId) -> bool;

  /// Text of a text node, `None` for elements and unknown nodes.
  fn text(&self, node: NodeId) -> Option<&str>;

  fn parent(&self, node: NodeId) -> Option<NodeId>;

  fn child_count(&self, node: NodeId) -> usize;

  fn child(&self, node: NodeId, index: usize) -> Option<NodeId>;

  fn previous_sibling(&self, node: NodeId) -> Option<NodeId>;

  fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

  fn first_child(&self, node: NodeId) -> Option<NodeId> {
    self.child(node, 0)
  }

  fn last_child(&self, node: NodeId) -> Option<NodeId> {
    self
      .child_count(node)
      .checked_sub(1)
      .and_then(|idx| self.child(node, idx))
  }

  /// Follow first children down to a leaf.
  fn descend_first(&self, node: NodeId) -> NodeId {
    let mut node = node;
    while let Some(child) = self.first_child(node) {
      node = child;
    }
    node
  }

  /// Follow last children down to a leaf.
  fn descend_last(&self, node: NodeId) -> NodeId {
    let mut node = node;
    while let Some(child) = self.last_child(node) {
      node = child;
    }
    node
  }

  /// Length of a text node in characters, 0 for elements.
  fn text_len(&self, node: NodeId) -> usize {
    self.text(node).map_or(0, |text| text.chars().count())
  }

  /// Whether `node` is `ancestor` or lies inside it.
  fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(node) = current {
      if node == ancestor {
        return true;
      }
      current = self.parent(node);
    }
    false
  }

  fn root_of(&self, node: NodeId) -> NodeId {
    let mut node = node;
    while let Some(parent) = self.parent(node) {
      node = parent;
    }
    node
  }

  /// Concatenated text covered by `range`, in document order.
  ///
  /// Returns an empty string for ranges whose boundaries do not resolve or
  /// whose end precedes the start.
  fn range_text(&self, range: &Range) -> String {
    let walk = TextWalk::new(self, self.root_of(range.start.node));
    let (Some(start), Some(end)) = (walk.position(range.start), walk.position(range.end)) else {
      return String::new();
    };
    if start >= end {
      return String::new();
    }
    walk.text.chars().skip(start).take(end - start).collect()
  }

  /// All text below `node`, in document order.
  fn text_content(&self, node: NodeId) -> String {
    TextWalk::new(self, node).text
  }
}

/// Flattened text of a subtree with the character position of every
/// boundary inside it.
struct TextWalk {
  text:         String,
  len:          usize,
  text_nodes:   HashMap<NodeId, (usize, usize)>,
  child_starts: HashMap<(NodeId, usize), usize>,
}

impl TextWalk {
  fn new<T: TextTree + ?Sized>(tree: &T, root: NodeId) -> Self {
    let mut walk = Self {
      text:         String::new(),
      len:          0,
      text_nodes:   HashMap::new(),
      child_starts: HashMap::new(),
    };
    walk.visit(tree, root);
    walk
  }

  fn visit<T: TextTree + ?Sized>(&mut self, tree: &T, node: NodeId) {
    if let Some(text) = tree.text(node) {
      let len = text.chars().count();
      self.text_nodes.insert(node, (self.len, len));
      self.text.push_str(text);
      self.len += len;
      return;
    }

    let count = tree.child_count(node);
    for idx in 0..count {
      self.child_starts.insert((node, idx), self.len);
      if let Some(child) = tree.child(node, idx) {
        self.visit(tree, child);
      }
    }
    self.child_starts.insert((node, count), self.len);
  }

  fn position(&self, boundary: Boundary) -> Option<usize> {
    if let Some(&(start, len)) = self.text_nodes.get(&boundary.node) {
      return Some(start + boundary.offset.min(len));
    }
    self
      .child_starts
      .get(&(boundary.node, boundary.offset))
      .copied()
  }
}
