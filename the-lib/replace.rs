//! Replacing a matched trigger and query with completion content.

use crate::{
  document::{
    Document,
    DomError,
    Fragment,
  },
  selection::{
    Boundary,
    Range,
  },
};

/// Insert `content` at the start of `range`, then delete what `range`
/// originally covered. Returns the caret position right after the inserted
/// content.
pub fn replace_range(
  doc: &mut Document,
  range: Range,
  content: &[Fragment],
) -> Result<Boundary, DomError> {
  let mut range = range;
  for fragment in content {
    let node = doc.instantiate(fragment);
    doc.insert_node(&mut range, node)?;
    doc.set_start_after(&mut range, node)?;
  }
  doc.delete_contents(&range)
}
