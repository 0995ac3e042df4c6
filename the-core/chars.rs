//! Character classes used when scanning backward for a completion trigger.
//!
//! Offsets throughout the workspace are character indices, so every helper
//! here works on `char` rather than bytes.

#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  matches!(
    ch,
    '\u{000A}' | // Line Feed
    '\u{000B}' | // Vertical Tab
    '\u{000C}' | // Form Feed
    '\u{000D}' | // Carriage Return
    '\u{0085}' | // Next Line
    '\u{2028}' | // Line Separator
    '\u{2029}'   // Paragraph Separator
  )
}

/// Whitespace that terminates a completion query.
///
/// Line endings count as whitespace here: a query never spans lines.
#[inline]
pub fn char_is_whitespace(ch: char) -> bool {
  match ch {
      '\u{0009}' | // Character Tabulation
      '\u{0020}' | // Space
      '\u{00A0}' | // No-break Space
      '\u{1680}' | // Ogham Space Mark
      '\u{202F}' | // Narrow No-break Space
      '\u{205F}' | // Medium Mathematical Space
      '\u{3000}' | // Ideographic Space
      '\u{FEFF}'   // Zero Width No-break Space
      => true,

      // En Quad through Hair Space. Zero Width Space (U+200B) is not a
      // separator: it is used as a caret anchor inside formatted runs.
      ch if ('\u{2000}' ..= '\u{200A}').contains(&ch) => true,

      ch => char_is_line_ending(ch),
    }
}

#[inline]
pub fn char_is_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}

/// Character index of the last whitespace in `text`, scanning from the end.
pub fn last_whitespace_index(text: &str) -> Option<usize> {
  let len = text.chars().count();
  text
    .chars()
    .rev()
    .position(char_is_whitespace)
    .map(|from_end| len - 1 - from_end)
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn word_chars() {
    assert!(char_is_word('a'));
    assert!(char_is_word('_'));
    assert!(char_is_word('漢'));
    assert!(!char_is_word('@'));
    assert!(!char_is_word('/'));
  }

  #[test]
  fn unicode_spaces() {
    assert!(char_is_whitespace('\u{00A0}'));
    assert!(char_is_whitespace('\u{2003}'));
    assert!(char_is_whitespace('\u{3000}'));
    assert!(char_is_whitespace('\r'));
    assert!(!char_is_whitespace('\u{200B}'));
    assert!(!char_is_whitespace('x'));
  }

  #[test]
  fn last_whitespace() {
    assert_eq!(last_whitespace_index("hello world"), Some(5));
    assert_eq!(last_whitespace_index("a b c"), Some(3));
    assert_eq!(last_whitespace_index("trailing "), Some(8));
    assert_eq!(last_whitespace_index("none"), None);
    assert_eq!(last_whitespace_index(""), None);
    // char indices, not bytes
    assert_eq!(last_whitespace_index("héllo wörld"), Some(5));
    assert_eq!(last_whitespace_index("日本 語"), Some(2));
  }

  quickcheck::quickcheck! {
    fn last_whitespace_is_whitespace(text: String) -> bool {
      match last_whitespace_index(&text) {
        Some(idx) => {
          let chars: Vec<char> = text.chars().collect();
          char_is_whitespace(chars[idx])
            && chars[idx + 1..].iter().all(|&c| !char_is_whitespace(c))
        },
        None => !text.chars().any(char_is_whitespace),
      }
    }
  }
}
