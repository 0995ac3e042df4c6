//! Line-oriented scripts driving a [`Host`](crate::host::Host).
//!
//! ```text
//! # comments and blank lines are skipped
//! type hello @ma
//! key down enter
//! click 0
//! show
//! ```

use eyre::{
  Result,
  WrapErr,
  bail,
  eyre,
};
use the_lib::input::{
  Key,
  KeyEvent,
  Modifiers,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Insert text at the caret, one character at a time.
  Type(String),
  Keys(Vec<KeyEvent>),
  Click(usize),
  /// Move focus away from the editable element.
  Blur,
  Show,
}

pub fn parse_script(source: &str) -> Result<Vec<Command>> {
  source
    .lines()
    .enumerate()
    .filter_map(|(idx, line)| {
      parse_line(line)
        .wrap_err_with(|| format!("line {}", idx + 1))
        .transpose()
    })
    .collect()
}

/// Parse one line; `None` for blanks and comments.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
  let trimmed = line.trim_start();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return Ok(None);
  }
  let (word, rest) = trimmed.split_once(' ').unwrap_or((trimmed.trim_end(), ""));

  let command = match word {
    // keep trailing spaces, they may be part of the text
    "type" => Command::Type(rest.to_string()),
    "key" | "keys" => {
      let keys = rest
        .split_whitespace()
        .map(parse_key)
        .collect::<Result<Vec<_>>>()?;
      if keys.is_empty() {
        bail!("`key` needs at least one key name");
      }
      Command::Keys(keys)
    },
    "click" => {
      let index = rest
        .trim()
        .parse()
        .wrap_err_with(|| format!("invalid result index {:?}", rest.trim()))?;
      Command::Click(index)
    },
    "blur" => Command::Blur,
    "show" => Command::Show,
    other => bail!("unknown command {other:?}"),
  };
  Ok(Some(command))
}

/// `down`, `C-a`, `S-tab`, `A-x`.
fn parse_key(name: &str) -> Result<KeyEvent> {
  let mut modifiers = Modifiers::empty();
  let mut rest = name;
  while let Some((prefix, tail)) = rest.split_once('-')
    && !tail.is_empty()
  {
    match prefix {
      "C" => modifiers.insert(Modifiers::CTRL),
      "A" => modifiers.insert(Modifiers::ALT),
      "S" => modifiers.insert(Modifiers::SHIFT),
      _ => break,
    }
    rest = tail;
  }
  let key = Key::from_name(rest).ok_or_else(|| eyre!("unknown key {name:?}"))?;
  Ok(KeyEvent { key, modifiers })
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn parses_a_script() {
    let script = "# demo\n\ntype hi @ma\nkey down enter\nclick 2\nblur\nshow\n";
    let commands = parse_script(script).unwrap();
    assert_eq!(commands, [
      Command::Type("hi @ma".into()),
      Command::Keys(vec![Key::Down.into(), Key::Enter.into()]),
      Command::Click(2),
      Command::Blur,
      Command::Show,
    ]);
  }

  #[test]
  fn type_keeps_trailing_space() {
    assert_eq!(
      parse_line("type @m ").unwrap(),
      Some(Command::Type("@m ".into()))
    );
  }

  #[test]
  fn modifiers_prefix_keys() {
    let key = parse_key("C-S-tab").unwrap();
    assert_eq!(key.key, Key::Tab);
    assert!(key.modifiers.ctrl() && key.modifiers.shift());
    assert!(!key.modifiers.alt());
    // a bare dash is a character
    assert_eq!(parse_key("-").unwrap().key, Key::Char('-'));
  }

  #[test]
  fn errors_name_the_line() {
    let err = parse_script("show\nfly away").unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("line 2"), "{message}");
    assert!(message.contains("unknown command"), "{message}");
    assert!(parse_line("key").is_err());
    assert!(parse_line("click first").is_err());
  }
}
