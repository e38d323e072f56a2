//! Multi-tab prompt composer
//!
//! Drafts live in scratch buffers, one per tab, shown in a single floating
//! surface. Leaving a tab stores its cursor and edit mode on the tab's
//! buffer; entering it restores them, except that an empty draft always
//! starts at the top in insert mode.

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::DeckError;
use crate::host::{BufferId, BufferOptions, Host, Position, SurfaceConfig, SurfaceId};
use crate::state::State;
use crate::util::names::next_tab_name;

/// Buffer mark holding the cursor of a tab that is not shown
pub const CURSOR_MARK: &str = "prompt_cursor";
/// Buffer flag holding whether a tab was left in insert mode
pub const INSERT_FLAG: &str = "prompt_insert";

const MIN_WIDTH: u16 = 20;
const MIN_HEIGHT: u16 = 3;

/// One draft composition tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptTab {
    pub name: String,
    pub buffer: BufferId,
}

/// Ordered tabs with a current index
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptTabs {
    tabs: Vec<PromptTab>,
    current: usize,
}

impl PromptTabs {
    /// Add a tab for `buffer` under the lowest free name and make it current
    pub fn push(&mut self, buffer: BufferId) -> &PromptTab {
        let name = next_tab_name(&self.names());
        self.tabs.push(PromptTab { name, buffer });
        self.current = self.tabs.len() - 1;
        &self.tabs[self.current]
    }

    /// Remove the current tab; the next one (or the new last one) becomes current
    pub fn remove_current(&mut self) -> Option<PromptTab> {
        if self.tabs.is_empty() {
            return None;
        }
        let removed = self.tabs.remove(self.current);
        if self.current >= self.tabs.len() {
            self.current = self.tabs.len().saturating_sub(1);
        }
        Some(removed)
    }

    /// Drop the tab owning `buffer`, if any
    pub fn remove_buffer(&mut self, buffer: BufferId) -> bool {
        let Some(index) = self.tabs.iter().position(|t| t.buffer == buffer) else {
            return false;
        };
        self.tabs.remove(index);
        if self.current > index || self.current >= self.tabs.len() {
            self.current = self.current.saturating_sub(1);
        }
        true
    }

    pub fn next(&mut self) {
        if !self.tabs.is_empty() {
            self.current = (self.current + 1) % self.tabs.len();
        }
    }

    pub fn prev(&mut self) {
        if !self.tabs.is_empty() {
            self.current = if self.current == 0 {
                self.tabs.len() - 1
            } else {
                self.current - 1
            };
        }
    }

    pub fn current(&self) -> Option<&PromptTab> {
        self.tabs.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn tabs(&self) -> &[PromptTab] {
        &self.tabs
    }

    pub fn names(&self) -> Vec<String> {
        self.tabs.iter().map(|t| t.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    /// Surface title: every tab name, the current one bracketed
    pub fn title(&self) -> String {
        let names: Vec<String> = self
            .tabs
            .iter()
            .enumerate()
            .map(|(i, t)| {
                if i == self.current {
                    format!("[{}]", t.name)
                } else {
                    t.name.clone()
                }
            })
            .collect();
        format!(" {} ", names.join(" | "))
    }
}

fn scaled(total: u16, ratio: f64, min: u16) -> u16 {
    let size = (f64::from(total) * ratio).floor() as u16;
    size.max(min).min(total)
}

/// Composer operations over a borrowed host and state
pub struct Composer<'a, H: Host> {
    pub host: &'a mut H,
    pub state: &'a mut State,
    pub config: &'a Config,
}

impl<'a, H: Host> Composer<'a, H> {
    pub fn new(host: &'a mut H, state: &'a mut State, config: &'a Config) -> Self {
        Self {
            host,
            state,
            config,
        }
    }

    /// The composer surface, if it is open and still valid
    pub fn surface(&self) -> Option<SurfaceId> {
        self.state
            .prompt_surface
            .filter(|s| self.host.surface_valid(*s))
    }

    pub fn is_open(&self) -> bool {
        self.surface().is_some()
    }

    /// Open the composer on the current tab, creating the first tab if needed
    pub fn open(&mut self) -> Result<(), DeckError> {
        if let Some(surface) = self.surface() {
            if self.host.current_surface() != surface {
                self.host.set_current_surface(surface)?;
                self.enter_current()?;
            }
            return Ok(());
        }

        // The session being looked at is the one a draft is most likely for
        let current = self.host.current_surface();
        if let Some(channel) = self
            .host
            .surface_buffer(current)
            .and_then(|b| self.state.registry.find_by_buffer(b))
            .map(|s| s.channel)
        {
            self.state.last_focused = Some(channel);
        }

        if self.state.prompt.is_empty() {
            self.create_tab()?;
        }
        let buffer = self.current_buffer()?;
        let placement = self.placement();
        let surface = self.host.open_surface(buffer, placement, true)?;
        self.state.prompt_surface = Some(surface);
        self.enter_current()?;
        debug!(surface = %surface, tabs = self.state.prompt.len(), "composer opened");
        Ok(())
    }

    /// Save the current tab's cursor and mode if the composer has focus
    pub fn suspend(&mut self) -> Result<(), DeckError> {
        match self.surface() {
            Some(surface) if self.host.current_surface() == surface => self.save_current(surface),
            _ => Ok(()),
        }
    }

    /// Close the composer, remembering where the current tab was left
    pub fn close(&mut self) -> Result<(), DeckError> {
        let Some(surface) = self.state.prompt_surface.take() else {
            return Ok(());
        };
        if self.host.surface_valid(surface) {
            self.save_current(surface)?;
            self.host.close_surface(surface);
        }

        let current = self.host.current_surface();
        let on_terminal = self
            .host
            .surface_buffer(current)
            .and_then(|b| self.host.terminal_channel(b))
            .is_some();
        self.host.set_insert_mode(on_terminal);
        debug!(surface = %surface, "composer closed");
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), DeckError> {
        if self.is_open() {
            self.close()
        } else {
            self.open()
        }
    }

    pub fn new_tab(&mut self) -> Result<(), DeckError> {
        if let Some(surface) = self.surface() {
            self.save_current(surface)?;
        }
        self.create_tab()?;
        self.enter_current()
    }

    pub fn next_tab(&mut self) -> Result<(), DeckError> {
        self.switch(PromptTabs::next)
    }

    pub fn prev_tab(&mut self) -> Result<(), DeckError> {
        self.switch(PromptTabs::prev)
    }

    fn switch(&mut self, step: fn(&mut PromptTabs)) -> Result<(), DeckError> {
        if let Some(surface) = self.surface() {
            self.save_current(surface)?;
        }
        step(&mut self.state.prompt);
        self.enter_current()
    }

    /// Delete the current tab; the last tab is replaced by a fresh empty one
    pub fn delete_tab(&mut self) -> Result<(), DeckError> {
        let Some(removed) = self.state.prompt.remove_current() else {
            return Ok(());
        };
        if self.state.prompt.is_empty() {
            self.create_tab()?;
        }
        // Show the successor first so deleting the buffer leaves the surface open
        self.enter_current()?;
        self.host.delete_buffer(removed.buffer);
        debug!(tab = %removed.name, "prompt tab deleted");
        Ok(())
    }

    /// Text of the current draft, lines joined with newlines
    pub fn get_content(&self) -> Result<String, DeckError> {
        match self.state.prompt.current() {
            Some(tab) => Ok(self.host.lines(tab.buffer)?.join("\n")),
            None => Ok(String::new()),
        }
    }

    /// Empty the current draft and make it edit-ready
    pub fn clear(&mut self) -> Result<(), DeckError> {
        let Some(buffer) = self.state.prompt.current().map(|t| t.buffer) else {
            return Ok(());
        };
        self.host.set_lines(buffer, Vec::new())?;
        self.mark_fresh(buffer)?;
        if let Some(surface) = self.surface() {
            self.host.set_cursor(surface, Position::START)?;
            self.host.set_insert_mode(true);
        }
        Ok(())
    }

    /// Fit the surface to the current display size
    pub fn reposition(&mut self) -> Result<(), DeckError> {
        if let Some(surface) = self.surface() {
            let placement = self.placement();
            self.host.configure_surface(surface, placement)?;
        }
        Ok(())
    }

    fn placement(&self) -> SurfaceConfig {
        let geometry = self.host.geometry();
        let width = scaled(geometry.columns, self.config.prompt.width_ratio, MIN_WIDTH);
        let height = scaled(geometry.lines, self.config.prompt.height_ratio, MIN_HEIGHT);
        SurfaceConfig {
            row: (geometry.lines - height) / 2,
            col: (geometry.columns - width) / 2,
            width,
            height,
            title: Some(self.state.prompt.title()),
            border: true,
            focusable: true,
        }
    }

    fn current_buffer(&self) -> Result<BufferId, DeckError> {
        self.state
            .prompt
            .current()
            .map(|t| t.buffer)
            .ok_or(DeckError::EmptyComposition)
    }

    fn create_tab(&mut self) -> Result<(), DeckError> {
        let buffer = self.host.create_buffer(BufferOptions::scratch());
        self.mark_fresh(buffer)?;
        let tab = self.state.prompt.push(buffer);
        debug!(tab = %tab.name, buffer = %buffer, "prompt tab created");
        Ok(())
    }

    fn mark_fresh(&mut self, buffer: BufferId) -> Result<(), DeckError> {
        self.host.set_mark(buffer, CURSOR_MARK, Position::START)?;
        self.host.set_flag(buffer, INSERT_FLAG, true)?;
        Ok(())
    }

    fn save_current(&mut self, surface: SurfaceId) -> Result<(), DeckError> {
        let Some(buffer) = self.state.prompt.current().map(|t| t.buffer) else {
            return Ok(());
        };
        if let Some(cursor) = self.host.cursor(surface) {
            self.host.set_mark(buffer, CURSOR_MARK, cursor)?;
        }
        // Insert mode belongs to whichever surface has focus
        if self.host.current_surface() == surface {
            let insert = self.host.insert_mode();
            self.host.set_flag(buffer, INSERT_FLAG, insert)?;
        }
        Ok(())
    }

    /// Show the current tab and restore its editing context
    fn enter_current(&mut self) -> Result<(), DeckError> {
        let Some(surface) = self.surface() else {
            return Ok(());
        };
        let buffer = self.current_buffer()?;
        self.host.show_buffer(surface, buffer)?;

        let lines = self.host.lines(buffer)?;
        let (cursor, insert) = if lines.iter().all(|l| l.is_empty()) {
            (Position::START, true)
        } else {
            let mark = self
                .host
                .mark(buffer, CURSOR_MARK)
                .unwrap_or(Position::START);
            let line = mark.line.clamp(1, lines.len());
            let col = mark.col.min(lines[line - 1].chars().count());
            let insert = self.host.flag(buffer, INSERT_FLAG).unwrap_or(true);
            (Position::new(line, col), insert)
        };
        self.host.set_cursor(surface, cursor)?;
        self.host.set_insert_mode(insert);

        let placement = self.placement();
        self.host.configure_surface(surface, placement)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::host::{Buffers, Surfaces};
    use crate::state::UiFlags;
    use std::path::PathBuf;

    fn state() -> State {
        State::init(
            PathBuf::from("/proj"),
            UiFlags {
                status_visible: true,
            },
        )
    }

    #[test]
    fn test_tab_names_fill_gaps() {
        let mut tabs = PromptTabs::default();
        for b in 1..=3 {
            tabs.push(BufferId(b));
        }
        tabs.prev(); // prompt-2
        assert_eq!(tabs.remove_current().unwrap().name, "prompt-2");
        assert_eq!(tabs.push(BufferId(4)).name, "prompt-2");
        assert_eq!(tabs.len(), 3);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut tabs = PromptTabs::default();
        tabs.push(BufferId(1));
        tabs.push(BufferId(2));
        assert_eq!(tabs.current_index(), 1);
        tabs.next();
        assert_eq!(tabs.current_index(), 0);
        tabs.prev();
        assert_eq!(tabs.current_index(), 1);
        assert_eq!(tabs.title(), " prompt-1 | [prompt-2] ");
    }

    #[test]
    fn test_open_creates_first_tab_in_insert_mode() {
        let mut host = FakeHost::new();
        let mut state = state();
        let config = Config::default();
        let mut composer = Composer::new(&mut host, &mut state, &config);

        composer.open().unwrap();

        let surface = composer.surface().unwrap();
        assert_eq!(composer.host.current_surface(), surface);
        assert_eq!(composer.state.prompt.names(), vec!["prompt-1"]);
        assert_eq!(composer.host.cursor(surface), Some(Position::START));
        assert!(composer.host.insert_mode());
        let config = composer.host.surface_config(surface).unwrap();
        assert_eq!((config.width, config.height), (72, 16));
    }

    #[test]
    fn test_switching_restores_cursor_and_mode() {
        let mut host = FakeHost::new();
        let mut state = state();
        let config = Config::default();
        let mut composer = Composer::new(&mut host, &mut state, &config);
        composer.open().unwrap();
        let surface = composer.surface().unwrap();

        let first = composer.state.prompt.current().unwrap().buffer;
        composer
            .host
            .set_lines(first, vec!["hello".into(), "world".into()])
            .unwrap();
        composer.host.set_cursor(surface, Position::new(2, 3)).unwrap();
        composer.host.set_insert_mode(false);

        composer.new_tab().unwrap();
        assert!(composer.host.insert_mode());
        assert_eq!(composer.host.cursor(surface), Some(Position::START));

        composer.prev_tab().unwrap();
        assert_eq!(composer.host.surface_buffer(surface), Some(first));
        assert_eq!(composer.host.cursor(surface), Some(Position::new(2, 3)));
        assert!(!composer.host.insert_mode());
    }

    #[test]
    fn test_emptied_draft_ignores_stale_mark() {
        let mut host = FakeHost::new();
        let mut state = state();
        let config = Config::default();
        let mut composer = Composer::new(&mut host, &mut state, &config);
        composer.open().unwrap();
        let surface = composer.surface().unwrap();
        let first = composer.state.prompt.current().unwrap().buffer;
        composer.host.set_lines(first, vec!["abc".into()]).unwrap();
        composer.host.set_cursor(surface, Position::new(1, 3)).unwrap();
        composer.host.set_insert_mode(false);
        composer.new_tab().unwrap();
        assert_eq!(composer.host.mark(first, CURSOR_MARK), Some(Position::new(1, 3)));

        composer.host.set_lines(first, Vec::new()).unwrap();
        composer.prev_tab().unwrap();

        assert_eq!(composer.host.surface_buffer(surface), Some(first));

        assert_eq!(composer.host.cursor(surface), Some(Position::START));
        assert!(composer.host.insert_mode());
    }

    #[test]
    fn test_deleting_last_tab_leaves_fresh_tab() {
        let mut host = FakeHost::new();
        let mut state = state();
        let config = Config::default();
        let mut composer = Composer::new(&mut host, &mut state, &config);
        composer.open().unwrap();
        let surface = composer.surface().unwrap();
        let old = composer.state.prompt.current().unwrap().buffer;
        composer.host.set_lines(old, vec!["draft".into()]).unwrap();

        composer.delete_tab().unwrap();

        assert_eq!(composer.state.prompt.len(), 1);
        let tab = composer.state.prompt.current().unwrap().clone();
        assert_ne!(tab.buffer, old);
        assert_eq!(composer.get_content().unwrap(), "");
        assert!(composer.is_open());
        assert_eq!(composer.host.surface_buffer(surface), Some(tab.buffer));
        assert!(composer.host.insert_mode());
        assert!(!composer.host.buffer_valid(old));
    }

    #[test]
    fn test_delete_while_closed_keeps_edit_ready_tab() {
        let mut host = FakeHost::new();
        let mut state = state();
        let config = Config::default();
        let mut composer = Composer::new(&mut host, &mut state, &config);
        composer.open().unwrap();
        composer.close().unwrap();

        composer.delete_tab().unwrap();

        let buffer = composer.state.prompt.current().unwrap().buffer;
        assert_eq!(composer.host.mark(buffer, CURSOR_MARK), Some(Position::START));
        assert_eq!(composer.host.flag(buffer, INSERT_FLAG), Some(true));
    }

    #[test]
    fn test_content_and_clear() {
        let mut host = FakeHost::new();
        let mut state = state();
        let config = Config::default();
        let mut composer = Composer::new(&mut host, &mut state, &config);
        composer.open().unwrap();
        let buffer = composer.state.prompt.current().unwrap().buffer;
        composer
            .host
            .set_lines(buffer, vec!["fix the".into(), "tests".into()])
            .unwrap();

        assert_eq!(composer.get_content().unwrap(), "fix the\ntests");
        composer.clear().unwrap();
        assert_eq!(composer.get_content().unwrap(), "");
    }
}
