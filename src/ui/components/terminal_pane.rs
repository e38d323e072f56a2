//! Emulated terminal screen widget

use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    widgets::Widget,
};

fn convert_color(color: vt100::Color) -> Option<Color> {
    match color {
        vt100::Color::Default => None,
        vt100::Color::Idx(i) => Some(Color::Indexed(i)),
        vt100::Color::Rgb(r, g, b) => Some(Color::Rgb(r, g, b)),
    }
}

fn cell_style(cell: &vt100::Cell) -> Style {
    let mut style = Style::default();
    if let Some(fg) = convert_color(cell.fgcolor()) {
        style = style.fg(fg);
    }
    if let Some(bg) = convert_color(cell.bgcolor()) {
        style = style.bg(bg);
    }
    if cell.bold() {
        style = style.add_modifier(Modifier::BOLD);
    }
    if cell.italic() {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if cell.underline() {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if cell.inverse() {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

pub struct TerminalPane<'a> {
    screen: &'a vt100::Screen,
}

impl<'a> TerminalPane<'a> {
    pub fn new(screen: &'a vt100::Screen) -> Self {
        Self { screen }
    }

    /// Where the terminal cursor lands inside `area`, unless hidden
    pub fn cursor(&self, area: Rect) -> Option<Position> {
        if self.screen.hide_cursor() {
            return None;
        }
        let (row, col) = self.screen.cursor_position();
        (row < area.height && col < area.width).then(|| Position::new(area.x + col, area.y + row))
    }
}

impl Widget for TerminalPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (rows, cols) = self.screen.size();
        for row in 0..rows.min(area.height) {
            for col in 0..cols.min(area.width) {
                let Some(cell) = self.screen.cell(row, col) else {
                    continue;
                };
                if cell.is_wide_continuation() {
                    continue;
                }
                let target = &mut buf[(area.x + col, area.y + row)];
                let contents = cell.contents();
                target.set_symbol(if contents.is_empty() { " " } else { contents });
                target.set_style(cell_style(cell));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_parsed_output() {
        let mut parser = vt100::Parser::new(3, 10, 0);
        parser.process(b"hi \x1b[31mred\x1b[0m");

        let area = Rect::new(0, 0, 10, 3);
        let mut buf = Buffer::empty(area);
        let pane = TerminalPane::new(parser.screen());
        assert_eq!(pane.cursor(area), Some(Position::new(6, 0)));
        pane.render(area, &mut buf);

        assert_eq!(buf[(0, 0)].symbol(), "h");
        assert_eq!(buf[(3, 0)].symbol(), "r");
        assert_eq!(buf[(3, 0)].fg, Color::Indexed(1));
    }

    #[test]
    fn test_clips_to_area() {
        let mut parser = vt100::Parser::new(2, 10, 0);
        parser.process(b"abcdefghij");

        let area = Rect::new(2, 1, 4, 1);
        let mut buf = Buffer::empty(Rect::new(0, 0, 8, 3));
        TerminalPane::new(parser.screen()).render(area, &mut buf);

        assert_eq!(buf[(2, 1)].symbol(), "a");
        assert_eq!(buf[(5, 1)].symbol(), "d");
        assert_eq!(buf[(6, 1)].symbol(), " ");
    }
}
