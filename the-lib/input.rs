//! Key events fed to the autocomplete engine and host pipelines.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
  bits: u8,
}

impl Modifiers {
  pub const CTRL: u8 = 0b0000_0001;
  pub const ALT: u8 = 0b0000_0010;
  pub const SHIFT: u8 = 0b0000_0100;

  #[must_use]
  pub const fn empty() -> Self {
    Self { bits: 0 }
  }

  #[must_use]
  pub const fn is_empty(self) -> bool {
    self.bits == 0
  }

  #[must_use]
  pub const fn ctrl(self) -> bool {
    (self.bits & Self::CTRL) != 0
  }

  #[must_use]
  pub const fn alt(self) -> bool {
    (self.bits & Self::ALT) != 0
  }

  #[must_use]
  pub const fn shift(self) -> bool {
    (self.bits & Self::SHIFT) != 0
  }

  pub fn insert(&mut self, bits: u8) {
    self.bits |= bits;
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
  Char(char),
  Enter,
  Escape,
  Backspace,
  Tab,
  Delete,
  Home,
  End,
  Left,
  Right,
  Up,
  Down,
  Other,
}

impl Key {
  /// Parse a key name as written in scripts and key maps (`"up"`,
  /// `"escape"`, a single character).
  pub fn from_name(name: &str) -> Option<Self> {
    let key = match name.to_ascii_lowercase().as_str() {
      "enter" | "ret" | "return" => Self::Enter,
      "escape" | "esc" => Self::Escape,
      "backspace" | "bs" => Self::Backspace,
      "tab" => Self::Tab,
      "delete" | "del" => Self::Delete,
      "home" => Self::Home,
      "end" => Self::End,
      "left" => Self::Left,
      "right" => Self::Right,
      "up" => Self::Up,
      "down" => Self::Down,
      "space" => Self::Char(' '),
      _ => {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
          (Some(ch), None) => Self::Char(ch),
          _ => return None,
        }
      },
    };
    Some(key)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
  pub key:       Key,
  pub modifiers: Modifiers,
}

impl KeyEvent {
  pub const fn new(key: Key) -> Self {
    Self {
      key,
      modifiers: Modifiers::empty(),
    }
  }
}

impl From<Key> for KeyEvent {
  fn from(key: Key) -> Self {
    Self::new(key)
  }
}

/// Whether a key was consumed or should continue to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOutcome {
  #[default]
  Continue,
  Handled,
}

impl KeyOutcome {
  pub fn is_handled(self) -> bool {
    matches!(self, Self::Handled)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn key_names() {
    assert_eq!(Key::from_name("Up"), Some(Key::Up));
    assert_eq!(Key::from_name("esc"), Some(Key::Escape));
    assert_eq!(Key::from_name("@"), Some(Key::Char('@')));
    assert_eq!(Key::from_name("space"), Some(Key::Char(' ')));
    assert_eq!(Key::from_name("nope"), None);
  }

  #[test]
  fn modifiers() {
    let mut mods = Modifiers::empty();
    assert!(mods.is_empty());
    mods.insert(Modifiers::CTRL | Modifiers::SHIFT);
    assert!(mods.ctrl() && mods.shift() && !mods.alt());
  }
}
