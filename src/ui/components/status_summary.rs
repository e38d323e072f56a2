//! Session status summary drawn over the top row

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Widget},
};

use crate::status::{StyleGroup, StyleRegion};

use super::theme::{session_color, MARKER_FG};

fn group_style(group: StyleGroup) -> Style {
    match group {
        StyleGroup::Active(color) => Style::default()
            .bg(session_color(color))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
        StyleGroup::Inactive(color) => Style::default().fg(session_color(color)),
        StyleGroup::Marker => Style::default().fg(MARKER_FG),
    }
}

/// Split `text` into spans at the region boundaries
///
/// Regions are byte ranges; any range that does not fall on character
/// boundaries is drawn unstyled.
pub fn styled_line<'a>(text: &'a str, regions: &[StyleRegion]) -> Line<'a> {
    let mut regions = regions.to_vec();
    regions.sort_by_key(|r| r.start);

    let mut spans = Vec::new();
    let mut pos = 0;
    for region in regions {
        if region.start < pos || region.end <= region.start {
            continue;
        }
        let (Some(gap), Some(styled)) = (text.get(pos..region.start), text.get(region.start..region.end))
        else {
            continue;
        };
        if !gap.is_empty() {
            spans.push(Span::raw(gap));
        }
        spans.push(Span::styled(styled, group_style(region.group)));
        pos = region.end;
    }
    if let Some(rest) = text.get(pos..).filter(|r| !r.is_empty()) {
        spans.push(Span::raw(rest));
    }
    Line::from(spans)
}

pub struct StatusSummary<'a> {
    text: &'a str,
    regions: &'a [StyleRegion],
}

impl<'a> StatusSummary<'a> {
    pub fn new(text: &'a str, regions: &'a [StyleRegion]) -> Self {
        Self { text, regions }
    }
}

impl Widget for StatusSummary<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        Paragraph::new(styled_line(self.text, self.regions)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ColorIndex;

    #[test]
    fn test_regions_become_spans() {
        let blue = ColorIndex::FIRST;
        let text = "● 1 │●2";
        let regions = vec![
            StyleRegion {
                start: 0,
                end: 5,
                group: StyleGroup::Active(blue),
            },
            StyleRegion {
                start: 9,
                end: 13,
                group: StyleGroup::Inactive(blue.next()),
            },
        ];
        let line = styled_line(text, &regions);

        let parts: Vec<&str> = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(parts, vec!["● 1", " │", "●2"]);
        assert_eq!(line.spans[0].style.bg, Some(Color::Blue));
        assert_eq!(line.spans[2].style.fg, Some(Color::Green));
    }

    #[test]
    fn test_misaligned_region_is_skipped() {
        let regions = vec![StyleRegion {
            start: 1,
            end: 2,
            group: StyleGroup::Marker,
        }];
        let line = styled_line("●x", &regions);
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "●x");
    }

    #[test]
    fn test_widget_renders_text() {
        let area = Rect::new(0, 0, 6, 1);
        let mut buf = Buffer::empty(area);
        StatusSummary::new("ab", &[]).render(area, &mut buf);
        assert_eq!(buf[(0, 0)].symbol(), "a");
        assert_eq!(buf[(1, 0)].symbol(), "b");
    }
}
