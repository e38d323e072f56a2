//! Key notation parsing
//!
//! The command prefix is configured in vim-style notation: `C-a`, `M-x`,
//! `C-S-w`, `<CR>`, `<C-Space>`, `<F5>`.

use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

/// A key code together with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Normalize a terminal key event to the parsed form
    ///
    /// Uppercase letters become lowercase plus SHIFT, so `C-A` in the config
    /// matches Ctrl+Shift+a whichever way the terminal reports it.
    pub fn from_key_event(event: &KeyEvent) -> Self {
        match event.code {
            KeyCode::Char(c) if c.is_ascii_uppercase() => Self {
                code: KeyCode::Char(c.to_ascii_lowercase()),
                modifiers: event.modifiers | KeyModifiers::SHIFT,
            },
            code => Self {
                code,
                modifiers: event.modifiers,
            },
        }
    }

    /// Whether a terminal key event is this combination
    pub fn matches(&self, event: &KeyEvent) -> bool {
        Self::from_key_event(event) == *self
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, prefix) in [
            (KeyModifiers::CONTROL, "C-"),
            (KeyModifiers::ALT, "M-"),
            (KeyModifiers::SHIFT, "S-"),
        ] {
            if self.modifiers.contains(flag) {
                f.write_str(prefix)?;
            }
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("<Space>"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::Enter => f.write_str("<CR>"),
            KeyCode::Esc => f.write_str("<Esc>"),
            KeyCode::Tab => f.write_str("<Tab>"),
            KeyCode::Backspace => f.write_str("<BS>"),
            KeyCode::F(n) => write!(f, "<F{}>", n),
            other => write!(f, "<{:?}>", other),
        }
    }
}

/// Error type for key parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("empty key notation")]
    Empty,

    #[error("no key specified")]
    NoKey,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid modifier: {0}")]
    InvalidModifier(String),
}

fn modifier(part: &str) -> Option<KeyModifiers> {
    match part {
        "C" => Some(KeyModifiers::CONTROL),
        "M" | "A" => Some(KeyModifiers::ALT),
        "S" => Some(KeyModifiers::SHIFT),
        _ => None,
    }
}

fn named_key(name: &str) -> Option<KeyCode> {
    let code = match name.to_ascii_uppercase().as_str() {
        "CR" | "ENTER" | "RETURN" => KeyCode::Enter,
        "ESC" | "ESCAPE" => KeyCode::Esc,
        "TAB" => KeyCode::Tab,
        "BS" | "BACKSPACE" => KeyCode::Backspace,
        "DEL" | "DELETE" => KeyCode::Delete,
        "SPACE" => KeyCode::Char(' '),
        "UP" => KeyCode::Up,
        "DOWN" => KeyCode::Down,
        "LEFT" => KeyCode::Left,
        "RIGHT" => KeyCode::Right,
        "HOME" => KeyCode::Home,
        "END" => KeyCode::End,
        upper => {
            let n: u8 = upper.strip_prefix('F')?.parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
    };
    Some(code)
}

/// Parse a vim-style key notation string into a [`KeyCombo`]
pub fn parse_key_notation(s: &str) -> Result<KeyCombo, KeyParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(KeyParseError::Empty);
    }

    let bracketed = s.len() > 2 && s.starts_with('<') && s.ends_with('>');
    let inner = if bracketed { &s[1..s.len() - 1] } else { s };

    // A trailing '-' is the minus key itself, as in "C--"
    let (mods, key) = match inner.rsplit_once('-') {
        Some((mods, "")) if !mods.is_empty() => (mods.strip_suffix('-').unwrap_or(mods), "-"),
        Some((mods, key)) => (mods, key),
        None => ("", inner),
    };

    let mut modifiers = KeyModifiers::NONE;
    for part in mods.split('-').filter(|p| !p.is_empty()) {
        modifiers |= modifier(part).ok_or_else(|| KeyParseError::InvalidModifier(part.into()))?;
    }

    if key.is_empty() {
        return Err(KeyParseError::NoKey);
    }

    let mut chars = key.chars();
    let code = match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => {
            modifiers |= KeyModifiers::SHIFT;
            KeyCode::Char(c.to_ascii_lowercase())
        }
        (Some(c), None) => KeyCode::Char(c),
        _ => named_key(key).ok_or_else(|| KeyParseError::InvalidKey(key.into()))?,
    };

    Ok(KeyCombo::new(code, modifiers))
}

impl FromStr for KeyCombo {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key_notation(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ctrl_key() {
        let key = parse_key_notation("C-a").unwrap();
        assert_eq!(key.code, KeyCode::Char('a'));
        assert_eq!(key.modifiers, KeyModifiers::CONTROL);
    }

    #[test]
    fn test_parse_uppercase_adds_shift() {
        let key = parse_key_notation("M-G").unwrap();
        assert_eq!(key.code, KeyCode::Char('g'));
        assert_eq!(key.modifiers, KeyModifiers::ALT | KeyModifiers::SHIFT);
    }

    #[test]
    fn test_parse_bracketed_keys() {
        assert_eq!(parse_key_notation("<CR>").unwrap().code, KeyCode::Enter);
        assert_eq!(parse_key_notation("<F5>").unwrap().code, KeyCode::F(5));
        let space = parse_key_notation("<C-Space>").unwrap();
        assert_eq!(space.code, KeyCode::Char(' '));
        assert_eq!(space.modifiers, KeyModifiers::CONTROL);
    }

    #[test]
    fn test_parse_minus_key() {
        let key = parse_key_notation("C--").unwrap();
        assert_eq!(key.code, KeyCode::Char('-'));
        assert_eq!(key.modifiers, KeyModifiers::CONTROL);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_key_notation("  "), Err(KeyParseError::Empty));
        assert_eq!(
            parse_key_notation("X-a"),
            Err(KeyParseError::InvalidModifier("X".into()))
        );
        assert_eq!(
            parse_key_notation("<F13>"),
            Err(KeyParseError::InvalidKey("F13".into()))
        );
    }

    #[test]
    fn test_display_round_trips_prefix() {
        let key = parse_key_notation("C-a").unwrap();
        assert_eq!(key.to_string(), "C-a");
        assert_eq!(key.to_string().parse::<KeyCombo>().unwrap(), key);
    }

    #[test]
    fn test_matches_key_event() {
        let prefix = parse_key_notation("C-a").unwrap();
        let event = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert!(prefix.matches(&event));
        let plain = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert!(!prefix.matches(&plain));
    }
}
