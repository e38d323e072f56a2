//! Destination picker shown when sending a draft

use chrono::Utc;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::picker::{PickerEntry, PickerMenu};

use super::theme::{session_color, SELECTED_BG};
use super::{DialogFrame, InstructionBar};

/// State for the picker dialog
#[derive(Debug, Clone)]
pub struct SessionPickerState {
    menu: PickerMenu,
    labels: Vec<String>,
    /// Currently selected row
    pub selected: usize,
}

impl SessionPickerState {
    pub fn new(menu: PickerMenu) -> Self {
        let labels = menu.labels(Utc::now());
        Self {
            menu,
            labels,
            selected: 0,
        }
    }

    pub fn menu(&self) -> &PickerMenu {
        &self.menu
    }

    /// Move selection up
    pub fn select_previous(&mut self) {
        if self.labels.is_empty() {
            return;
        }
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.labels.len() - 1;
        }
    }

    /// Move selection down
    pub fn select_next(&mut self) {
        if self.labels.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.labels.len();
    }

    /// Jump to a 1-based row, as typed on the keyboard
    pub fn select_number(&mut self, number: usize) -> bool {
        if (1..=self.labels.len()).contains(&number) {
            self.selected = number - 1;
            true
        } else {
            false
        }
    }
}

/// Picker dialog widget
pub struct SessionPicker;

impl SessionPicker {
    pub fn render(area: Rect, buf: &mut Buffer, state: &SessionPickerState) {
        let widest = state.labels.iter().map(|l| l.width()).max().unwrap_or(0);
        let width = u16::try_from(widest + 8).unwrap_or(u16::MAX).max(44);
        let height = u16::try_from(state.labels.len() + 4).unwrap_or(u16::MAX);

        let inner = DialogFrame::new("Send to", width, height).render(area, buf);

        let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

        let rows = chunks[0];
        for (i, (label, entry)) in state
            .labels
            .iter()
            .zip(&state.menu.entries)
            .enumerate()
            .take(usize::from(rows.height))
        {
            let is_selected = i == state.selected;
            let label_style = match entry {
                PickerEntry::Existing(e) => Style::default().fg(session_color(e.session.color)),
                PickerEntry::Spawn(_) => Style::default().fg(Color::DarkGray),
            };
            let label_style = if is_selected {
                label_style.add_modifier(Modifier::BOLD)
            } else {
                label_style
            };

            let line = Line::from(vec![
                Span::styled(
                    if is_selected { " ▶ " } else { "   " },
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(label.as_str(), label_style),
            ]);
            let row = Rect {
                y: rows.y + i as u16,
                height: 1,
                ..rows
            };
            Paragraph::new(line).render(row, buf);

            if is_selected {
                for x in row.x..row.x + row.width {
                    buf[(x, row.y)].set_bg(SELECTED_BG);
                }
            }
        }

        InstructionBar::new(vec![("↑↓", "select"), ("Enter", "send"), ("Esc", "cancel")])
            .render(chunks[1], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::SpawnVariant;

    fn state() -> SessionPickerState {
        SessionPickerState::new(PickerMenu::build(Vec::new(), None))
    }

    #[test]
    fn test_selection_wraps() {
        let mut state = state();
        assert_eq!(state.menu().len(), SpawnVariant::ALL.len());

        state.select_previous();
        assert_eq!(state.selected, 2);
        state.select_next();
        assert_eq!(state.selected, 0);

        assert!(state.select_number(2));
        assert_eq!(state.selected, 1);
        assert!(!state.select_number(9));
        assert_eq!(state.selected, 1);
    }

    #[test]
    fn test_render_lists_spawn_entries() {
        let state = state();
        let area = Rect::new(0, 0, 60, 12);
        let mut buf = Buffer::empty(area);
        SessionPicker::render(area, &mut buf, &state);

        let text: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(text.contains("Send to"));
        assert!(text.contains("▶ + New session"));
        assert!(text.contains("+ Continue last session"));
    }
}
