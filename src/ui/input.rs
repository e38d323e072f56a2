//! Key dispatch
//!
//! Every command sits behind the configured prefix key so that everything
//! else can pass straight through to the focused terminal. The composer and
//! the picker own the keyboard while they are focused.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::KeyCombo;
use crate::lifecycle::SpawnVariant;

use super::action::{Action, EditOp};

/// Pending multi-key command state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// The prefix key was pressed; the next key is a command
    Prefix,
    /// `x` followed the prefix; the next digit picks the session to kill
    KillPending,
}

/// What currently receives keystrokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Terminal,
    Composer { insert: bool },
    Picker,
    /// A plain buffer, or nothing at all
    Idle,
}

/// Character typed without Ctrl or Alt, with Shift applied
fn typed_char(key: &KeyEvent) -> Option<char> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::SHIFT) => {
            Some(c.to_ascii_uppercase())
        }
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

fn digit(key: &KeyEvent) -> Option<usize> {
    typed_char(key)
        .and_then(|c| c.to_digit(10))
        .filter(|&d| d > 0)
        .map(|d| d as usize)
}

/// Bytes a terminal expects for a key press
pub fn key_to_bytes(key: &KeyEvent) -> Option<Vec<u8>> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let bytes: Vec<u8> = match key.code {
        KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
            l @ 'a'..='z' => vec![l as u8 & 0x1f],
            ' ' | '@' | '2' => vec![0],
            '[' => vec![0x1b],
            '\\' => vec![0x1c],
            ']' => vec![0x1d],
            _ => return None,
        },
        KeyCode::Char(c) => {
            let c = if key.modifiers.contains(KeyModifiers::SHIFT) {
                c.to_ascii_uppercase()
            } else {
                c
            };
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        }
        KeyCode::Enter => b"\r".to_vec(),
        KeyCode::Tab => b"\t".to_vec(),
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Backspace => vec![0x7f],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::F(n @ 1..=4) => vec![0x1b, b'O', b'P' + (n - 1)],
        KeyCode::F(n) => {
            let code = match n {
                5 => 15,
                6 => 17,
                7 => 18,
                8 => 19,
                9 => 20,
                10 => 21,
                11 => 23,
                12 => 24,
                _ => return None,
            };
            format!("\x1b[{}~", code).into_bytes()
        }
        _ => return None,
    };

    if alt {
        let mut prefixed = vec![0x1b];
        prefixed.extend(bytes);
        Some(prefixed)
    } else {
        Some(bytes)
    }
}

pub struct KeyMap {
    prefix: KeyCombo,
}

impl KeyMap {
    pub fn new(prefix: KeyCombo) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> KeyCombo {
        self.prefix
    }

    /// Resolve a key press, updating the pending command state
    pub fn dispatch(&self, mode: &mut InputMode, focus: Focus, key: &KeyEvent) -> Option<Action> {
        match std::mem::take(mode) {
            InputMode::Prefix => return self.command(mode, focus, key),
            InputMode::KillPending => return digit(key).map(Action::Kill),
            InputMode::Normal => {}
        }

        if focus != Focus::Picker && self.prefix.matches(key) {
            *mode = InputMode::Prefix;
            return None;
        }

        match focus {
            Focus::Terminal => key_to_bytes(key).map(Action::Forward),
            Focus::Composer { insert: true } => composer_insert(key),
            Focus::Composer { insert: false } => composer_normal(key),
            Focus::Picker => picker(key),
            Focus::Idle => None,
        }
    }

    fn command(&self, mode: &mut InputMode, focus: Focus, key: &KeyEvent) -> Option<Action> {
        if self.prefix.matches(key) {
            // Prefix twice sends it through
            return match focus {
                Focus::Terminal => key_to_bytes(key).map(Action::Forward),
                _ => None,
            };
        }
        if let Some(number) = digit(key) {
            return Some(Action::Focus(number));
        }
        match typed_char(key)? {
            'c' => Some(Action::Spawn(SpawnVariant::Fresh)),
            'r' => Some(Action::Spawn(SpawnVariant::Resume)),
            'C' => Some(Action::Spawn(SpawnVariant::Continue)),
            'x' => {
                *mode = InputMode::KillPending;
                None
            }
            'p' => Some(Action::ToggleComposer),
            's' => Some(Action::ToggleStatus),
            'D' => Some(Action::DebugDump),
            'q' => Some(Action::Quit),
            _ => None,
        }
    }
}

fn composer_insert(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => Some(Action::SendDraft),
            _ => None,
        };
    }
    let op = match key.code {
        KeyCode::Esc => return Some(Action::LeaveInsert),
        KeyCode::Enter => EditOp::Newline,
        KeyCode::Backspace => EditOp::Backspace,
        KeyCode::Delete => EditOp::Delete,
        KeyCode::Left => EditOp::Left,
        KeyCode::Right => EditOp::Right,
        KeyCode::Up => EditOp::Up,
        KeyCode::Down => EditOp::Down,
        KeyCode::Home => EditOp::Home,
        KeyCode::End => EditOp::End,
        KeyCode::Tab => EditOp::Insert('\t'),
        _ => EditOp::Insert(typed_char(key)?),
    };
    Some(Action::Edit(op))
}

fn composer_normal(key: &KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter => return Some(Action::SendDraft),
        KeyCode::Esc => return Some(Action::CloseComposer),
        KeyCode::Left => return Some(Action::Edit(EditOp::Left)),
        KeyCode::Right => return Some(Action::Edit(EditOp::Right)),
        KeyCode::Up => return Some(Action::Edit(EditOp::Up)),
        KeyCode::Down => return Some(Action::Edit(EditOp::Down)),
        KeyCode::Home => return Some(Action::Edit(EditOp::Home)),
        KeyCode::End => return Some(Action::Edit(EditOp::End)),
        _ => {}
    }
    let action = match typed_char(key)? {
        'i' => Action::EnterInsert { append: false },
        'a' => Action::EnterInsert { append: true },
        'h' => Action::Edit(EditOp::Left),
        'l' => Action::Edit(EditOp::Right),
        'k' => Action::Edit(EditOp::Up),
        'j' => Action::Edit(EditOp::Down),
        '0' => Action::Edit(EditOp::Home),
        '$' => Action::Edit(EditOp::End),
        'x' => Action::Edit(EditOp::Delete),
        ']' => Action::NextTab,
        '[' => Action::PrevTab,
        'n' => Action::NewTab,
        'X' => Action::DeleteTab,
        'q' => Action::CloseComposer,
        _ => return None,
    };
    Some(action)
}

fn picker(key: &KeyEvent) -> Option<Action> {
    if let Some(number) = digit(key) {
        return Some(Action::PickerNumber(number));
    }
    match key.code {
        KeyCode::Up | KeyCode::BackTab | KeyCode::Char('k') => Some(Action::PickerUp),
        KeyCode::Down | KeyCode::Tab | KeyCode::Char('j') => Some(Action::PickerDown),
        KeyCode::Enter => Some(Action::PickerConfirm),
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::PickerCancel),
        _ => None,
    }
}
