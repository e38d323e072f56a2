//! Bottom row showing the latest notification

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::host::Level;

use super::theme::{LEVEL_ERROR, LEVEL_INFO, LEVEL_WARN, MESSAGE_BG};

pub struct MessageLine<'a> {
    message: Option<(Level, &'a str)>,
    /// Shown at the right edge, e.g. a pending prefix key
    pending: Option<&'a str>,
}

impl<'a> MessageLine<'a> {
    pub fn new(message: Option<(Level, &'a str)>) -> Self {
        Self {
            message,
            pending: None,
        }
    }

    pub fn pending(mut self, pending: Option<&'a str>) -> Self {
        self.pending = pending;
        self
    }
}

impl Widget for MessageLine<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(MESSAGE_BG));

        if let Some((level, text)) = self.message {
            let color = match level {
                Level::Info => LEVEL_INFO,
                Level::Warn => LEVEL_WARN,
                Level::Error => LEVEL_ERROR,
            };
            Paragraph::new(Line::from(Span::styled(text, Style::default().fg(color))))
                .render(area, buf);
        }

        if let Some(pending) = self.pending {
            Paragraph::new(Line::from(pending).right_aligned()).render(area, buf);
        }
    }
}
