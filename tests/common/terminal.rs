//! Rendering helpers on top of Ratatui's TestBackend

use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

pub fn test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    Terminal::new(TestBackend::new(width, height)).expect("Failed to create test terminal")
}

/// Rows of the buffer with trailing whitespace trimmed
pub fn rows(buffer: &Buffer) -> Vec<String> {
    let area = buffer.area;
    (area.y..area.y + area.height)
        .map(|y| {
            (area.x..area.x + area.width)
                .filter_map(|x| buffer.cell((x, y)).map(|c| c.symbol().to_string()))
                .collect::<String>()
                .trim_end()
                .to_string()
        })
        .collect()
}

pub fn buffer_contains(buffer: &Buffer, text: &str) -> bool {
    rows(buffer).iter().any(|row| row.contains(text))
}
