//! Shared UI color constants.

use ratatui::style::Color;

use crate::registry::ColorIndex;

pub const SELECTED_BG: Color = Color::Rgb(40, 60, 80);

pub const MESSAGE_BG: Color = Color::Rgb(25, 25, 25);
pub const MARKER_FG: Color = Color::DarkGray;

pub const BORDER_FOCUSED: Color = Color::Cyan;
pub const BORDER_UNFOCUSED: Color = Color::DarkGray;

pub const LEVEL_INFO: Color = Color::Gray;
pub const LEVEL_WARN: Color = Color::Yellow;
pub const LEVEL_ERROR: Color = Color::Red;

/// Terminal colors of the session palette, in slot order
const PALETTE: [Color; ColorIndex::COUNT as usize] = [
    Color::Blue,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Red,
    Color::Rgb(255, 165, 0),
    Color::Rgb(160, 32, 240),
];

pub fn session_color(color: ColorIndex) -> Color {
    PALETTE[usize::from(color.get() - 1)]
}
