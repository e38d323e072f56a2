//! Status summary renderer
//!
//! A pure function from the registry snapshot and focus state to one line of
//! text plus style regions. Widths are measured in display columns, region
//! offsets in bytes of the produced text.

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::config::{StatusConfig, StatusStyle};
use crate::host::{ChannelId, SurfaceId};
use crate::registry::{ColorIndex, SessionEntry};

/// Appended when not every session token fits
pub const TRUNCATION_MARKER: &str = "…";

/// Highlight group of a styled region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "color", rename_all = "lowercase")]
pub enum StyleGroup {
    Active(ColorIndex),
    Inactive(ColorIndex),
    Marker,
}

/// Byte range `[start, end)` of the first line drawn with `group`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleRegion {
    pub start: usize,
    pub end: usize,
    pub group: StyleGroup,
}

/// Focus state the active indicator is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusContext {
    pub current_surface: SurfaceId,
    /// Surface of the prompt composer, when it is open
    pub prompt_surface: Option<SurfaceId>,
    /// Session focused most recently before the composer took focus
    pub last_focused: Option<ChannelId>,
}

impl FocusContext {
    /// Whether `entry` should be highlighted as the session being addressed
    pub fn is_active(&self, entry: &SessionEntry) -> bool {
        if self.prompt_surface == Some(self.current_surface) {
            self.last_focused == Some(entry.session.channel)
        } else {
            entry.surface == Some(self.current_surface)
        }
    }
}

/// A rendered summary line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub regions: Vec<StyleRegion>,
    /// Display columns of `text`
    pub width: usize,
    pub truncated: bool,
}

struct Token {
    text: String,
    width: usize,
    group: StyleGroup,
}

fn token(entry: &SessionEntry, active: bool, config: &StatusConfig) -> Token {
    let icon = &config.icon;
    let n = entry.number;
    let color = entry.session.color;
    let (text, group) = match (config.style, active) {
        (StatusStyle::Emphasis, true) => (format!(" {} {} ", icon, n), StyleGroup::Active(color)),
        (StatusStyle::Emphasis, false) => (format!("{} {}", icon, n), StyleGroup::Inactive(color)),
        (StatusStyle::Plain, true) => (format!("[{}{}]", icon, n), StyleGroup::Active(color)),
        (StatusStyle::Plain, false) => (format!("{}{}", icon, n), StyleGroup::Inactive(color)),
    };
    Token {
        width: text.width(),
        text,
        group,
    }
}

/// Width the summary occupies for `content` columns on a display `available` wide
///
/// The upper bound never drops below `min_width`, so a too-narrow display
/// still gets the minimum and the caller clips.
pub fn summary_width(content: usize, available: usize, config: &StatusConfig) -> usize {
    let ratio_bound = (available as f64 * config.max_width_ratio).floor() as usize;
    let max = config.min_width.max(ratio_bound);
    content.clamp(config.min_width, max)
}

/// Render the summary for `entries` on a display `available` columns wide
pub fn render(
    entries: &[SessionEntry],
    focus: &FocusContext,
    available: usize,
    config: &StatusConfig,
) -> StatusLine {
    let tokens: Vec<Token> = entries
        .iter()
        .map(|entry| token(entry, focus.is_active(entry), config))
        .collect();

    let content: usize =
        tokens.iter().map(|t| t.width).sum::<usize>() + tokens.len().saturating_sub(1);
    let width = summary_width(content, available, config);

    // Whole tokens only; the marker and its separator must fit too
    let mut shown = tokens.len();
    let mut used = content;
    let truncated = content > width;
    if truncated {
        let marker_width = TRUNCATION_MARKER.width();
        shown = 0;
        used = 0;
        for t in &tokens {
            let sep = usize::from(shown > 0);
            if used + sep + t.width + 1 + marker_width > width {
                break;
            }
            used += sep + t.width;
            shown += 1;
        }
        used += usize::from(shown > 0) + marker_width;
    }

    let left = width.saturating_sub(used) / 2;
    let right = width.saturating_sub(used) - left;

    let mut text = " ".repeat(left);
    let mut regions = Vec::new();
    for (i, t) in tokens.iter().take(shown).enumerate() {
        if i > 0 {
            text.push(' ');
        }
        let start = text.len();
        text.push_str(&t.text);
        if config.style == StatusStyle::Emphasis {
            regions.push(StyleRegion {
                start,
                end: text.len(),
                group: t.group,
            });
        }
    }
    if truncated {
        if shown > 0 {
            text.push(' ');
        }
        let start = text.len();
        text.push_str(TRUNCATION_MARKER);
        if config.style == StatusStyle::Emphasis {
            regions.push(StyleRegion {
                start,
                end: text.len(),
                group: StyleGroup::Marker,
            });
        }
    }
    text.push_str(&" ".repeat(right));

    StatusLine {
        width: text.width(),
        text,
        regions,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BufferId;
    use crate::lifecycle::SpawnVariant;
    use crate::registry::Session;
    use chrono::Utc;
    use std::path::PathBuf;

    fn entry(number: usize, surface: Option<u32>) -> SessionEntry {
        SessionEntry {
            number,
            surface: surface.map(SurfaceId),
            session: Session {
                channel: ChannelId(100 + number as u32),
                buffer: BufferId(200 + number as u32),
                color: ColorIndex::new(((number - 1) % 8 + 1) as u8).unwrap(),
                cwd: PathBuf::from("/proj"),
                variant: SpawnVariant::Fresh,
                created_at: Utc::now(),
            },
        }
    }

    fn focus_on(surface: u32) -> FocusContext {
        FocusContext {
            current_surface: SurfaceId(surface),
            prompt_surface: None,
            last_focused: None,
        }
    }

    fn config(style: StatusStyle, min_width: usize) -> StatusConfig {
        StatusConfig {
            min_width,
            style,
            ..StatusConfig::default()
        }
    }

    #[test]
    fn test_active_token_is_padded() {
        let entries = vec![entry(1, Some(2)), entry(2, None)];
        let line = render(&entries, &focus_on(2), 200, &config(StatusStyle::Emphasis, 0));

        assert_eq!(line.text, " ● 1  ● 2");
        assert!(!line.truncated);
        assert_eq!(line.regions.len(), 2);
        assert_eq!(&line.text[line.regions[0].start..line.regions[0].end], " ● 1 ");
        assert_eq!(line.regions[0].group, StyleGroup::Active(ColorIndex::FIRST));
        assert!(matches!(line.regions[1].group, StyleGroup::Inactive(_)));
    }

    #[test]
    fn test_prompt_focus_uses_last_focused_session() {
        let entries = vec![entry(1, Some(2)), entry(2, Some(5))];
        let focus = FocusContext {
            current_surface: SurfaceId(9),
            prompt_surface: Some(SurfaceId(9)),
            last_focused: Some(ChannelId(102)),
        };

        assert!(!focus.is_active(&entries[0]));
        assert!(focus.is_active(&entries[1]));

        // Focus on an unrelated surface marks nothing
        let elsewhere = FocusContext {
            prompt_surface: Some(SurfaceId(3)),
            ..focus
        };
        assert!(!entries.iter().any(|e| elsewhere.is_active(e)));
    }

    #[test]
    fn test_ample_width_is_centered() {
        let entries = vec![entry(1, None), entry(2, None)];
        let line = render(&entries, &focus_on(2), 200, &config(StatusStyle::Emphasis, 20));

        assert_eq!(line.width, 20);
        let left = line.text.len() - line.text.trim_start().len();
        let right = line.text.len() - line.text.trim_end().len();
        assert!(left.abs_diff(right) <= 1);
        assert_eq!(line.text.trim(), "● 1 ● 2");
    }

    #[test]
    fn test_truncation_keeps_whole_tokens() {
        let entries: Vec<_> = (1..=12).map(|n| entry(n, None)).collect();
        let line = render(&entries, &focus_on(2), 40, &config(StatusStyle::Plain, 0));

        assert!(line.truncated);
        assert!(line.width <= 20);
        assert!(line.text.trim_end().ends_with(TRUNCATION_MARKER));
        let body = line.text.trim().trim_end_matches(TRUNCATION_MARKER).trim();
        for token in body.split(' ') {
            let n: usize = token.trim_start_matches('●').parse().unwrap();
            assert!((1..=12).contains(&n));
        }
        assert!(line.regions.is_empty());
    }

    #[test]
    fn test_emphasis_truncation_styles_marker() {
        let entries: Vec<_> = (1..=12).map(|n| entry(n, None)).collect();
        let line = render(&entries, &focus_on(2), 30, &config(StatusStyle::Emphasis, 10));

        assert!(line.truncated);
        let last = line.regions.last().unwrap();
        assert_eq!(last.group, StyleGroup::Marker);
        assert_eq!(&line.text[last.start..last.end], TRUNCATION_MARKER);
    }

    #[test]
    fn test_wide_icon_measured_in_columns() {
        let wide = StatusConfig {
            icon: "🤖".to_string(),
            ..config(StatusStyle::Plain, 0)
        };
        let line = render(&[entry(1, None)], &focus_on(2), 200, &wide);

        assert_eq!(line.text, "🤖1");
        assert_eq!(line.width, 3);
    }

    #[test]
    fn test_minimum_wider_than_display_is_best_effort() {
        let line = render(&[entry(1, None)], &focus_on(2), 4, &config(StatusStyle::Emphasis, 20));
        assert_eq!(line.width, 20);
        assert_eq!(line.text.trim(), "● 1");
    }
}
