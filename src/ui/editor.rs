//! Draft editing through the host's buffer and surface ports
//!
//! Cursor columns count characters, not bytes.

use crate::error::HostError;
use crate::host::{Buffers, Position, SurfaceId, Surfaces};

use super::action::EditOp;

fn char_len(line: &str) -> usize {
    line.chars().count()
}

fn byte_offset(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

/// Apply `op` to the buffer shown in `surface`
pub fn apply<H: Buffers + Surfaces>(
    host: &mut H,
    surface: SurfaceId,
    op: &EditOp,
) -> Result<(), HostError> {
    let buffer = host
        .surface_buffer(surface)
        .ok_or(HostError::UnknownSurface(surface))?;
    let mut lines = host.lines(buffer)?;
    if lines.is_empty() {
        lines.push(String::new());
    }
    let cursor = host.cursor(surface).unwrap_or(Position::START);
    let row = cursor.line.clamp(1, lines.len()) - 1;
    let col = cursor.col.min(char_len(&lines[row]));

    let (row, col, changed) = match op {
        EditOp::Insert(c) => {
            let at = byte_offset(&lines[row], col);
            lines[row].insert(at, *c);
            (row, col + 1, true)
        }
        EditOp::InsertText(text) => {
            let at = byte_offset(&lines[row], col);
            let tail = lines[row].split_off(at);
            let mut inserted: Vec<String> = text.split('\n').map(str::to_string).collect();
            let last = inserted.len() - 1;
            let end_col = char_len(&inserted[last]) + if last == 0 { col } else { 0 };
            let first = inserted.remove(0);
            lines[row].push_str(&first);
            let end_row = row + inserted.len();
            for (i, line) in inserted.into_iter().enumerate() {
                lines.insert(row + 1 + i, line);
            }
            lines[end_row].push_str(&tail);
            (end_row, end_col, true)
        }
        EditOp::Newline => {
            let at = byte_offset(&lines[row], col);
            let tail = lines[row].split_off(at);
            lines.insert(row + 1, tail);
            (row + 1, 0, true)
        }
        EditOp::Backspace if col > 0 => {
            let at = byte_offset(&lines[row], col - 1);
            lines[row].remove(at);
            (row, col - 1, true)
        }
        EditOp::Backspace if row > 0 => {
            let line = lines.remove(row);
            let prev_len = char_len(&lines[row - 1]);
            lines[row - 1].push_str(&line);
            (row - 1, prev_len, true)
        }
        EditOp::Backspace => (row, col, false),
        EditOp::Delete if col < char_len(&lines[row]) => {
            let at = byte_offset(&lines[row], col);
            lines[row].remove(at);
            (row, col, true)
        }
        EditOp::Delete if row + 1 < lines.len() => {
            let next = lines.remove(row + 1);
            lines[row].push_str(&next);
            (row, col, true)
        }
        EditOp::Delete => (row, col, false),
        EditOp::Left => (row, col.saturating_sub(1), false),
        EditOp::Right => (row, (col + 1).min(char_len(&lines[row])), false),
        EditOp::Up if row > 0 => (row - 1, col.min(char_len(&lines[row - 1])), false),
        EditOp::Up => (row, col, false),
        EditOp::Down if row + 1 < lines.len() => {
            (row + 1, col.min(char_len(&lines[row + 1])), false)
        }
        EditOp::Down => (row, col, false),
        EditOp::Home => (row, 0, false),
        EditOp::End => (row, char_len(&lines[row]), false),
    };

    if changed {
        host.set_lines(buffer, lines)?;
    }
    host.set_cursor(surface, Position::new(row + 1, col))
}
