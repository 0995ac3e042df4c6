//! Trigger detection.
//!
//! Starting at the caret, the scanner reads backwards through adjacent text
//! nodes until it meets whitespace (or runs out of text), then asks each
//! candidate completer whether its trigger prefix opens the zone in front of
//! the caret:
//!
//! ```text
//! <p>"say "<b/>"hel" "lo @ma|"</p>
//!                        ^^^   zone "@ma": prefix "@", query "ma"
//! ```
//!
//! Candidates are narrowed on every node visited through
//! [`Completer::allow_node`], and the first one whose prefix and
//! [`Completer::allow_context`] accept the zone wins. The completer that was
//! already open is tried first so an ongoing query keeps its provider.
//!
//! [`Completer::allow_node`]: crate::completer::Completer::allow_node
//! [`Completer::allow_context`]: crate::completer::Completer::allow_context

use the_core::chars::last_whitespace_index;
use tracing::trace;

use crate::{
  completer::{
    CompleterRegistry,
    MatchContext,
  },
  cursor::Cursor,
  selection::{
    Boundary,
    Range,
  },
  text_tree::{
    NodeId,
    TextTree,
  },
};

/// An active trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
  /// Registry index of the winning completer.
  pub completer: usize,
  /// Trigger prefix plus query.
  pub range:     Range,
  /// Text typed after the trigger prefix.
  pub query:     String,
}

pub fn find_match(
  tree: &dyn TextTree,
  container: NodeId,
  cursor: Cursor,
  registry: &CompleterRegistry,
  was_open: Option<usize>,
) -> Option<Match> {
  let (end_node, end_index) = resolve_end(tree, cursor)?;

  let mut candidates = candidate_order(registry.len(), was_open);
  let allows = |completer: usize, node: NodeId| {
    registry
      .get(completer)
      .is_some_and(|completer| completer.allow_node(tree, node, container))
  };
  candidates.retain(|&completer| allows(completer, end_node));
  if candidates.is_empty() {
    return None;
  }

  let mut start_node = end_node;
  let mut text: String = tree
    .text(end_node)
    .unwrap_or_default()
    .chars()
    .take(end_index)
    .collect();
  let mut boundary = last_whitespace_index(&text);
  while boundary.is_none() {
    let Some(previous) = tree
      .previous_sibling(start_node)
      .filter(|&node| tree.is_text(node))
    else {
      break;
    };
    candidates.retain(|&completer| allows(completer, previous));
    if candidates.is_empty() {
      return None;
    }
    let previous_text = tree.text(previous).unwrap_or_default();
    // the previous node is prepended, so its indices stay valid in `text`
    boundary = last_whitespace_index(previous_text);
    text.insert_str(0, previous_text);
    start_node = previous;
  }

  let zone_start = boundary.map_or(0, |idx| idx + 1);
  if text.chars().count() <= zone_start {
    return None;
  }
  let zone: String = text.chars().skip(zone_start).collect();

  let context = MatchContext {
    before:  Range::new(
      Boundary::new(container, 0),
      Boundary::new(start_node, zone_start),
    ),
    matched: Range::new(
      Boundary::new(start_node, zone_start),
      Boundary::new(end_node, end_index),
    ),
    after:   Range::new(
      Boundary::new(end_node, end_index),
      Boundary::new(container, tree.child_count(container)),
    ),
  };

  let (completer, prefix_len) = candidates.into_iter().find_map(|idx| {
    let completer = registry.get(idx)?;
    let prefix = completer.trigger_prefix();
    (zone.starts_with(prefix) && completer.allow_context(tree, &context))
      .then_some((idx, prefix.len()))
  })?;

  let query = zone[prefix_len..].to_string();
  trace!(completer, query = %query, "trigger matched");
  Some(Match {
    completer,
    range: context.matched,
    query,
  })
}

/// Resolve the caret to a text node and a character index in it.
fn resolve_end(tree: &dyn TextTree, cursor: Cursor) -> Option<(NodeId, usize)> {
  if tree.is_text(cursor.node) {
    return Some((cursor.node, cursor.offset.min(tree.text_len(cursor.node))));
  }

  let leaf = if cursor.offset == 0 {
    tree.descend_first(cursor.node)
  } else {
    tree.descend_last(tree.child(cursor.node, cursor.offset - 1)?)
  };
  if !tree.is_text(leaf) {
    return None;
  }
  let index = if cursor.offset == 0 {
    0
  } else {
    tree.text_len(leaf)
  };
  Some((leaf, index))
}

fn candidate_order(len: usize, was_open: Option<usize>) -> Vec<usize> {
  let mut order: Vec<usize> = (0..len).collect();
  if let Some(open) = was_open.filter(|&open| open < len) {
    order.remove(open);
    order.insert(0, open);
  }
  order
}

#[cfg(test)]
mod test {
  use std::sync::Arc;

  use super::*;
  use crate::{
    completer::{
      Completer,
      OptionsFuture,
    },
    document::Document,
  };

  struct Trigger {
    name:        &'static str,
    prefix:      &'static str,
    blocked:     Option<NodeId>,
    mid_word_ok: bool,
  }

  impl Trigger {
    fn new(name: &'static str, prefix: &'static str) -> Self {
      Self {
        name,
        prefix,
        blocked: None,
        mid_word_ok: true,
      }
    }
  }

  impl Completer for Trigger {
    fn name(&self) -> &str {
      self.name
    }

    fn trigger_prefix(&self) -> &str {
      self.prefix
    }

    fn allow_node(&self, _tree: &dyn TextTree, node: NodeId, _container: NodeId) -> bool {
      Some(node) != self.blocked
    }

    fn allow_context(&self, tree: &dyn TextTree, context: &MatchContext) -> bool {
      self.mid_word_ok
        || !tree
          .range_text(&context.before)
          .chars()
          .last()
          .is_some_and(the_core::chars::char_is_word)
    }

    fn options(&self) -> OptionsFuture {
      Box::pin(async { Ok(Vec::new()) })
    }
  }

  fn registry_of(completers: Vec<Trigger>) -> CompleterRegistry {
    completers
      .into_iter()
      .map(|completer| Arc::new(completer) as Arc<dyn Completer>)
      .collect()
  }

  fn paragraph(parts: &[&str]) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new("p");
    let root = doc.root();
    let nodes = parts
      .iter()
      .map(|part| {
        let node = doc.create_text(part);
        doc.append_child(root, node).unwrap();
        node
      })
      .collect();
    (doc, nodes)
  }

  fn caret_at_end(doc: &Document, node: NodeId) -> Cursor {
    Cursor {
      node,
      offset: doc.text_len(node),
    }
  }

  #[test]
  fn query_follows_prefix() {
    let (doc, nodes) = paragraph(&["hello @ma"]);
    let registry = registry_of(vec![Trigger::new("users", "@")]);
    let found = find_match(&doc, doc.root(), caret_at_end(&doc, nodes[0]), &registry, None)
      .unwrap();
    assert_eq!(found.completer, 0);
    assert_eq!(found.query, "ma");
    assert_eq!(
      found.range,
      Range::new(Boundary::new(nodes[0], 6), Boundary::new(nodes[0], 9))
    );
    assert_eq!(doc.range_text(&found.range), "@ma");
  }

  #[test]
  fn walks_into_previous_text_siblings() {
    let (doc, nodes) = paragraph(&["say /bl", "u", "e"]);
    let registry = registry_of(vec![Trigger::new("blocks", "/")]);
    let found = find_match(&doc, doc.root(), caret_at_end(&doc, nodes[2]), &registry, None)
      .unwrap();
    assert_eq!(found.query, "blue");
    assert_eq!(found.range.start, Boundary::new(nodes[0], 4));
    assert_eq!(found.range.end, Boundary::new(nodes[2], 1));
  }

  #[test]
  fn element_boundary_stops_the_walk() {
    let mut doc = Document::new("p");
    let root = doc.root();
    let head = doc.create_text("/x");
    let bold = doc.create_element("b");
    let tail = doc.create_text("yz");
    for node in [head, bold, tail] {
      doc.append_child(root, node).unwrap();
    }
    let registry = registry_of(vec![Trigger::new("blocks", "/")]);
    assert_eq!(
      find_match(&doc, root, caret_at_end(&doc, tail), &registry, None),
      None
    );

    let registry_any = registry_of(vec![Trigger::new("any", "")]);
    let found = find_match(&doc, root, caret_at_end(&doc, tail), &registry_any, None).unwrap();
    assert_eq!(found.query, "yz");
  }

  #[test]
  fn caret_on_element_resolves_to_leaf() {
    let mut doc = Document::new("p");
    let root = doc.root();
    let span = doc.create_element("span");
    let text = doc.create_text("@jo");
    doc.append_child(root, span).unwrap();
    doc.append_child(span, text).unwrap();
    let registry = registry_of(vec![Trigger::new("users", "@")]);

    let after = Cursor {
      node:   root,
      offset: 1,
    };
    assert_eq!(
      find_match(&doc, root, after, &registry, None).map(|found| found.query),
      Some("jo".to_string())
    );

    // a caret before the first leaf has nothing to scan
    let before = Cursor {
      node:   root,
      offset: 0,
    };
    assert_eq!(find_match(&doc, root, before, &registry, None), None);
  }

  #[test]
  fn empty_zone_never_matches() {
    let (doc, nodes) = paragraph(&["hello "]);
    let registry = registry_of(vec![Trigger::new("any", "")]);
    assert_eq!(
      find_match(&doc, doc.root(), caret_at_end(&doc, nodes[0]), &registry, None),
      None
    );
  }

  #[test]
  fn first_match_wins_and_open_completer_is_promoted() {
    let (doc, nodes) = paragraph(&["@al"]);
    let registry = registry_of(vec![Trigger::new("first", "@"), Trigger::new("second", "@")]);
    let cursor = caret_at_end(&doc, nodes[0]);
    assert_eq!(
      find_match(&doc, doc.root(), cursor, &registry, None).map(|found| found.completer),
      Some(0)
    );
    assert_eq!(
      find_match(&doc, doc.root(), cursor, &registry, Some(1)).map(|found| found.completer),
      Some(1)
    );
  }

  #[test]
  fn allow_node_narrows_candidates_per_node() {
    let (doc, nodes) = paragraph(&["@a", "b"]);
    let mut blocked = Trigger::new("users", "@");
    blocked.blocked = Some(nodes[0]);
    let registry = registry_of(vec![blocked]);
    assert_eq!(
      find_match(&doc, doc.root(), caret_at_end(&doc, nodes[1]), &registry, None),
      None
    );
  }

  #[test]
  fn allow_context_vetoes_mid_word_triggers() {
    let mut doc = Document::new("p");
    let root = doc.root();
    let word = doc.create_text("mail");
    let bold = doc.create_element("b");
    let host = doc.create_text("@host");
    for node in [word, bold, host] {
      doc.append_child(root, node).unwrap();
    }
    let mut strict = Trigger::new("users", "@");
    strict.mid_word_ok = false;
    let registry = registry_of(vec![strict, Trigger::new("fallback", "")]);

    let found = find_match(&doc, root, caret_at_end(&doc, host), &registry, None).unwrap();
    assert_eq!(found.completer, 1);
    assert_eq!(found.query, "@host");
  }
}
