//! In-memory document tree.
//!
//! [`Document`] is a small arena of element and text nodes with just enough of
//! the DOM editing surface for completion: creating nodes, inserting a node at
//! a range boundary (splitting text as needed), deleting a range's contents,
//! and tracking the caret. It implements [`TextTree`] so the scanner can walk
//! it directly.
//!
//! Ranges passed to [`Document::insert_node`] are updated the way live DOM
//! ranges are when the insertion splits a text node, so a caller can insert
//! several nodes and then delete the remainder of the original span.
//!
//! ```ignore
//! use the_lib::{document::{Document, Fragment}, selection::{Boundary, Range}};
//!
//! let mut doc = Document::new("p");
//! let text = doc.create_text("hi @ma");
//! doc.append_child(doc.root(), text)?;
//!
//! let mut range = Range::new(Boundary::new(text, 3), Boundary::new(text, 6));
//! let node = doc.instantiate(&Fragment::text("@matt"));
//! doc.insert_node(&mut range, node)?;
//! doc.set_start_after(&mut range, node)?;
//! doc.delete_contents(&range)?;
//! assert_eq!(doc.markup(doc.root()), "<p>hi @matt</p>");
//! ```

use slotmap::SlotMap;
use thiserror::Error;

use crate::{
  Tendril,
  selection::{
    Boundary,
    Range,
    Selection,
  },
  text_tree::{
    NodeId,
    TextTree,
  },
};

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DomError {
  #[error("node {0:?} does not exist")]
  StaleNode(NodeId),
  #[error("node {0:?} is not attached to a parent")]
  Detached(NodeId),
  #[error("offset {offset} is out of bounds for length {len}")]
  OffsetOutOfBounds { offset: usize, len: usize },
  #[error("text nodes cannot contain children")]
  NotAnElement,
  #[error("a node cannot be inserted into its own subtree")]
  Cycle,
  #[error("range boundaries must share a parent to be deleted")]
  UnsupportedRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
  Element { tag: Tendril },
  Text(Tendril),
}

#[derive(Debug, Clone)]
struct NodeData {
  kind:     NodeKind,
  parent:   Option<NodeId>,
  children: Vec<NodeId>,
}

impl NodeData {
  fn new(kind: NodeKind) -> Self {
    Self {
      kind,
      parent: None,
      children: Vec::new(),
    }
  }
}

/// Detached content produced by a completer, materialized with
/// [`Document::instantiate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
  Text(String),
  Element { tag: String, children: Vec<Fragment> },
}

impl Fragment {
  pub fn text(text: impl Into<String>) -> Self {
    Self::Text(text.into())
  }

  pub fn element(tag: impl Into<String>, children: Vec<Fragment>) -> Self {
    Self::Element {
      tag: tag.into(),
      children,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Document {
  nodes:     SlotMap<NodeId, NodeData>,
  root:      NodeId,
  selection: Option<Selection>,
}

impl Document {
  /// Create a document whose root is an empty `tag` element.
  pub fn new(tag: &str) -> Self {
    let mut nodes = SlotMap::with_key();
    let root = nodes.insert(NodeData::new(NodeKind::Element { tag: tag.into() }));
    Self {
      nodes,
      root,
      selection: None,
    }
  }

  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn create_element(&mut self, tag: &str) -> NodeId {
    self
      .nodes
      .insert(NodeData::new(NodeKind::Element { tag: tag.into() }))
  }

  pub fn create_text(&mut self, text: &str) -> NodeId {
    self.nodes.insert(NodeData::new(NodeKind::Text(text.into())))
  }

  pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
    self.nodes.get(node).map(|data| &data.kind)
  }

  pub fn tag(&self, node: NodeId) -> Option<&str> {
    match self.kind(node)? {
      NodeKind::Element { tag } => Some(tag.as_str()),
      NodeKind::Text(_) => None,
    }
  }

  pub fn children(&self, node: NodeId) -> &[NodeId] {
    self
      .nodes
      .get(node)
      .map_or(&[][..], |data| data.children.as_slice())
  }

  pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
    let parent = self.nodes.get(node)?.parent?;
    self.children(parent).iter().position(|&child| child == node)
  }

  pub fn selection(&self) -> Option<Selection> {
    self.selection
  }

  pub fn set_selection(&mut self, selection: Option<Selection>) {
    self.selection = selection;
  }

  pub fn set_caret(&mut self, at: Boundary) {
    self.selection = Some(Selection::caret(at));
  }

  pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
    let len = self.children(parent).len();
    self.insert_child(parent, len, child)
  }

  /// Insert `child` as the `index`th child of `parent`, detaching it from its
  /// current position first.
  pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
    let parent_data = self.nodes.get(parent).ok_or(DomError::StaleNode(parent))?;
    if matches!(parent_data.kind, NodeKind::Text(_)) {
      return Err(DomError::NotAnElement);
    }
    if !self.nodes.contains_key(child) {
      return Err(DomError::StaleNode(child));
    }
    if self.contains(child, parent) {
      return Err(DomError::Cycle);
    }

    let mut index = index;
    if let Some(old_index) = self.index_in_parent(child)
      && self.nodes[child].parent == Some(parent)
      && old_index < index
    {
      index -= 1;
    }
    self.detach(child);

    let children = &mut self.nodes[parent].children;
    if index > children.len() {
      return Err(DomError::OffsetOutOfBounds {
        offset: index,
        len:    children.len(),
      });
    }
    children.insert(index, child);
    self.nodes[child].parent = Some(parent);
    Ok(())
  }

  /// Unlink `node` from its parent, keeping its subtree alive.
  pub fn detach(&mut self, node: NodeId) {
    let Some(parent) = self.nodes.get(node).and_then(|data| data.parent) else {
      return;
    };
    if let Some(parent_data) = self.nodes.get_mut(parent) {
      parent_data.children.retain(|&child| child != node);
    }
    self.nodes[node].parent = None;
  }

  /// Detach `node` and free its whole subtree.
  pub fn remove(&mut self, node: NodeId) {
    self.detach(node);
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
      if let Some(data) = self.nodes.remove(node) {
        stack.extend(data.children);
      }
    }
  }

  pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
    match &mut self.nodes.get_mut(node).ok_or(DomError::StaleNode(node))?.kind {
      NodeKind::Text(value) => {
        *value = text.into();
        Ok(())
      },
      NodeKind::Element { .. } => Err(DomError::NotAnElement),
    }
  }

  /// Split a text node at `offset`. The node keeps the head, the returned
  /// node holds the tail and is inserted right after it.
  pub fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId> {
    let text = self.text(node).ok_or(DomError::NotAnElement)?;
    let len = text.chars().count();
    if offset > len {
      return Err(DomError::OffsetOutOfBounds { offset, len });
    }
    let at = byte_offset(text, offset);
    let (head, tail) = (text[..at].to_string(), text[at..].to_string());

    let parent = self.parent(node).ok_or(DomError::Detached(node))?;
    let index = self.index_in_parent(node).ok_or(DomError::Detached(node))?;
    self.set_text(node, &head)?;
    let tail = self.create_text(&tail);
    self.insert_child(parent, index + 1, tail)?;
    Ok(tail)
  }

  /// Build detached nodes for `fragment`.
  pub fn instantiate(&mut self, fragment: &Fragment) -> NodeId {
    match fragment {
      Fragment::Text(text) => self.create_text(text),
      Fragment::Element { tag, children } => {
        let element = self.create_element(tag);
        for child in children {
          let child = self.instantiate(child);
          // freshly created nodes cannot form a cycle
          let _ = self.append_child(element, child);
        }
        element
      },
    }
  }

  /// Insert `node` at the start of `range`.
  ///
  /// A start inside a text node splits it. `range` is adjusted like a live
  /// DOM range: boundaries past the split move into the tail node and child
  /// offsets after the insertion point shift by one.
  pub fn insert_node(&mut self, range: &mut Range, node: NodeId) -> Result<()> {
    let start = range.start;
    let (parent, index) = match self.text(start.node) {
      Some(text) => {
        let len = text.chars().count();
        if start.offset > len {
          return Err(DomError::OffsetOutOfBounds {
            offset: start.offset,
            len,
          });
        }
        let parent = self.parent(start.node).ok_or(DomError::Detached(start.node))?;
        let index = self
          .index_in_parent(start.node)
          .ok_or(DomError::Detached(start.node))?;
        if start.offset == 0 {
          (parent, index)
        } else if start.offset == len {
          (parent, index + 1)
        } else {
          let tail = self.split_text(start.node, start.offset)?;
          for boundary in [&mut range.start, &mut range.end] {
            if boundary.node == start.node && boundary.offset > start.offset {
              *boundary = Boundary::new(tail, boundary.offset - start.offset);
            } else {
              shift_after_insert(boundary, parent, index);
            }
          }
          (parent, index + 1)
        }
      },
      None => (start.node, start.offset),
    };

    self.insert_child(parent, index, node)?;
    for boundary in [&mut range.start, &mut range.end] {
      shift_after_insert(boundary, parent, index);
    }
    Ok(())
  }

  /// Move the start of `range` to just after `node`.
  pub fn set_start_after(&self, range: &mut Range, node: NodeId) -> Result<()> {
    let parent = self.parent(node).ok_or(DomError::Detached(node))?;
    let index = self.index_in_parent(node).ok_or(DomError::Detached(node))?;
    range.start = Boundary::new(parent, index + 1);
    Ok(())
  }

  /// Remove everything covered by `range` and return the collapsed boundary
  /// where it started.
  ///
  /// Both boundaries must live in the same node, or (after lifting text
  /// boundaries to their parent) under the same parent.
  pub fn delete_contents(&mut self, range: &Range) -> Result<Boundary> {
    let Range { start, end } = *range;

    if start.node == end.node {
      if let Some(text) = self.text(start.node) {
        let kept = remove_chars(text, start.offset, end.offset);
        self.set_text(start.node, &kept)?;
      } else {
        let children = self.children(start.node);
        let to = end.offset.min(children.len());
        let from = start.offset.min(to);
        let doomed = children[from..to].to_vec();
        for node in doomed {
          self.remove(node);
        }
      }
      return Ok(start);
    }

    let start_is_text = self.is_text(start.node);
    let end_is_text = self.is_text(end.node);
    let (parent, first) = if start_is_text {
      let parent = self.parent(start.node).ok_or(DomError::Detached(start.node))?;
      let index = self
        .index_in_parent(start.node)
        .ok_or(DomError::Detached(start.node))?;
      (parent, index + 1)
    } else {
      (start.node, start.offset)
    };
    let (end_parent, last) = if end_is_text {
      let parent = self.parent(end.node).ok_or(DomError::Detached(end.node))?;
      let index = self
        .index_in_parent(end.node)
        .ok_or(DomError::Detached(end.node))?;
      (parent, index)
    } else {
      (end.node, end.offset)
    };
    if parent != end_parent {
      return Err(DomError::UnsupportedRange);
    }

    if let Some(text) = self.text(start.node) {
      let len = text.chars().count();
      let kept = remove_chars(text, start.offset, len);
      self.set_text(start.node, &kept)?;
    }
    let children = self.children(parent);
    let last = last.min(children.len());
    let doomed = children[first.min(last)..last].to_vec();
    for node in doomed {
      self.remove(node);
    }
    if let Some(text) = self.text(end.node) {
      let kept = remove_chars(text, 0, end.offset);
      self.set_text(end.node, &kept)?;
    }

    Ok(if start_is_text {
      start
    } else {
      Boundary::new(parent, first)
    })
  }

  /// Type `text` at `at`, returning the caret after it.
  pub fn insert_text(&mut self, at: Boundary, text: &str) -> Result<Boundary> {
    let inserted = text.chars().count();
    if let Some(current) = self.text(at.node) {
      let len = current.chars().count();
      if at.offset > len {
        return Err(DomError::OffsetOutOfBounds {
          offset: at.offset,
          len,
        });
      }
      let byte = byte_offset(current, at.offset);
      let mut updated = String::with_capacity(current.len() + text.len());
      updated.push_str(&current[..byte]);
      updated.push_str(text);
      updated.push_str(&current[byte..]);
      self.set_text(at.node, &updated)?;
      return Ok(Boundary::new(at.node, at.offset + inserted));
    }

    let previous = at
      .offset
      .checked_sub(1)
      .and_then(|idx| self.child(at.node, idx))
      .filter(|&node| self.is_text(node));
    if let Some(previous) = previous {
      let len = self.text_len(previous);
      return self.insert_text(Boundary::new(previous, len), text);
    }

    let node = self.create_text(text);
    self.insert_child(at.node, at.offset, node)?;
    Ok(Boundary::new(node, inserted))
  }

  /// Delete the character before `at`, returning the new caret. Nothing
  /// happens when there is no text immediately before it.
  pub fn delete_backward(&mut self, at: Boundary) -> Result<Boundary> {
    let target = if self.is_text(at.node) {
      if at.offset > 0 {
        Some(at)
      } else {
        self
          .previous_sibling(at.node)
          .filter(|&node| self.is_text(node))
          .map(|node| Boundary::new(node, self.text_len(node)))
      }
    } else {
      at.offset
        .checked_sub(1)
        .and_then(|idx| self.child(at.node, idx))
        .map(|child| self.descend_last(child))
        .filter(|&leaf| self.is_text(leaf))
        .map(|leaf| Boundary::new(leaf, self.text_len(leaf)))
    };

    let Some(target) = target.filter(|target| target.offset > 0) else {
      return Ok(at);
    };
    let text = self.text(target.node).unwrap_or_default();
    let kept = remove_chars(text, target.offset - 1, target.offset);
    self.set_text(target.node, &kept)?;
    Ok(Boundary::new(target.node, target.offset - 1))
  }

  /// Serialize `node` and its subtree as markup.
  pub fn markup(&self, node: NodeId) -> String {
    let mut out = String::new();
    self.write_markup(node, &mut out);
    out
  }

  fn write_markup(&self, node: NodeId, out: &mut String) {
    match self.kind(node) {
      Some(NodeKind::Text(text)) => escape_into(text, out),
      Some(NodeKind::Element { tag }) => {
        out.push('<');
        out.push_str(tag);
        out.push('>');
        for &child in self.children(node) {
          self.write_markup(child, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
      },
      None => {},
    }
  }
}

impl TextTree for Document {
  fn is_text(&self, node: NodeId) -> bool {
    matches!(self.kind(node), Some(NodeKind::Text(_)))
  }

  fn text(&self, node: NodeId) -> Option<&str> {
    match self.kind(node)? {
      NodeKind::Text(text) => Some(text.as_str()),
      NodeKind::Element { .. } => None,
    }
  }

  fn parent(&self, node: NodeId) -> Option<NodeId> {
    self.nodes.get(node)?.parent
  }

  fn child_count(&self, node: NodeId) -> usize {
    self.children(node).len()
  }

  fn child(&self, node: NodeId, index: usize) -> Option<NodeId> {
    self.children(node).get(index).copied()
  }

  fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
    let parent = self.parent(node)?;
    let index = self.index_in_parent(node)?;
    index.checked_sub(1).and_then(|idx| self.child(parent, idx))
  }

  fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
    let parent = self.parent(node)?;
    let index = self.index_in_parent(node)?;
    self.child(parent, index + 1)
  }
}

fn shift_after_insert(boundary: &mut Boundary, parent: NodeId, index: usize) {
  if boundary.node == parent && boundary.offset > index {
    boundary.offset += 1;
  }
}

fn byte_offset(text: &str, char_idx: usize) -> usize {
  text
    .char_indices()
    .nth(char_idx)
    .map_or(text.len(), |(byte, _)| byte)
}

/// `text` without the characters in `from..to` (clamped).
fn remove_chars(text: &str, from: usize, to: usize) -> String {
  text
    .chars()
    .enumerate()
    .filter(|(idx, _)| *idx < from || *idx >= to)
    .map(|(_, ch)| ch)
    .collect()
}

fn escape_into(text: &str, out: &mut String) {
  for ch in text.chars() {
    match ch {
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '&' => out.push_str("&amp;"),
      ch => out.push(ch),
    }
  }
}
