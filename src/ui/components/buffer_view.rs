//! Plain text buffer widget, used for the composer and scratch buffers

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::Style,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::host;

/// Lines of a buffer with an optional frame and cursor
pub struct BufferView<'a> {
    lines: &'a [String],
    title: Option<&'a str>,
    border: Option<Style>,
    cursor: Option<host::Position>,
}

impl<'a> BufferView<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        Self {
            lines,
            title: None,
            border: None,
            cursor: None,
        }
    }

    pub fn title(mut self, title: Option<&'a str>) -> Self {
        self.title = title;
        self
    }

    pub fn border(mut self, style: Style) -> Self {
        self.border = Some(style);
        self
    }

    pub fn cursor(mut self, cursor: Option<host::Position>) -> Self {
        self.cursor = cursor;
        self
    }

    fn inner(&self, area: Rect) -> Rect {
        if self.border.is_some() {
            Block::default().borders(Borders::ALL).inner(area)
        } else {
            area
        }
    }

    /// First buffer line drawn, keeping the cursor line in view
    fn scroll(&self, height: u16) -> usize {
        let cursor_row = self.cursor.map_or(0, |c| c.line.saturating_sub(1));
        (cursor_row + 1).saturating_sub(usize::from(height.max(1)))
    }

    /// Screen position of the cursor once rendered into `area`
    pub fn cursor_position(&self, area: Rect) -> Option<Position> {
        let cursor = self.cursor?;
        let inner = self.inner(area);
        let row = cursor.line.saturating_sub(1).checked_sub(self.scroll(inner.height))?;
        let line = self.lines.get(cursor.line.saturating_sub(1))?;
        let prefix: String = line.chars().take(cursor.col).collect();
        let x = u16::try_from(prefix.width()).ok()?;
        let y = u16::try_from(row).ok()?;
        (x < inner.width && y < inner.height).then(|| Position::new(inner.x + x, inner.y + y))
    }
}

impl Widget for BufferView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let inner = self.inner(area);
        if let Some(style) = self.border {
            let mut block = Block::default().borders(Borders::ALL).border_style(style);
            if let Some(title) = self.title {
                block = block.title(title);
            }
            block.render(area, buf);
        }

        let skip = self.scroll(inner.height);
        let lines: Vec<Line> = self
            .lines
            .iter()
            .skip(skip)
            .take(usize::from(inner.height))
            .map(|l| Line::raw(l.as_str()))
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }
}
