//! Deck: the context object tying components to a host
//!
//! Components are short-lived views borrowing the host, the state store and
//! the configuration from here, so none of them holds a reference to another.
//! The deck is also where failures are reported: component operations return
//! errors, and the public commands below log and notify them exactly once.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::DeckError;
use crate::host::{
    BufferId, BufferOptions, ChannelId, Host, HostEvent, Level, SurfaceConfig, SurfaceId,
};
use crate::lifecycle::Lifecycle;
use crate::picker::{self, Picked, PickerMenu};
use crate::prompt::{Composer, PromptTabs};
use crate::registry::{ColorIndex, Session, SessionEntry};
use crate::state::{Deferred, State, UiFlags};
use crate::status::{self, FocusContext};

pub const BRACKETED_PASTE_START: &str = "\x1b[200~";
pub const BRACKETED_PASTE_END: &str = "\x1b[201~";

/// Upper bound on event rounds per pump, in case handlers keep raising events
const MAX_PUMP_ROUNDS: usize = 8;

#[derive(Serialize)]
struct DebugSnapshot<'a> {
    cwd: &'a Path,
    current_surface: SurfaceId,
    sessions: Vec<SessionEntry>,
    next_color: ColorIndex,
    ui: UiFlags,
    prompt: &'a PromptTabs,
    prompt_surface: Option<SurfaceId>,
    status_surface: Option<SurfaceId>,
    last_focused: Option<ChannelId>,
    stopping: Vec<ChannelId>,
    deferred: Vec<Deferred>,
}

pub struct Deck<H: Host> {
    host: H,
    state: State,
    config: Config,
}

impl<H: Host> Deck<H> {
    pub fn new(host: H, config: Config, cwd: PathBuf) -> Self {
        let ui = UiFlags {
            status_visible: config.status.visible,
        };
        Self {
            host,
            state: State::init(cwd, ui),
            config,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn lifecycle(&mut self) -> Lifecycle<'_, H> {
        Lifecycle::new(&mut self.host, &mut self.state, &self.config)
    }

    pub fn composer(&mut self) -> Composer<'_, H> {
        Composer::new(&mut self.host, &mut self.state, &self.config)
    }

    /// Log and notify a failed command; the result is passed through
    fn report<T>(&mut self, result: Result<T, DeckError>) -> Result<T, DeckError> {
        if let Err(e) = &result {
            let level = e.level();
            if level == Level::Error {
                error!(error = %e, "command failed");
            } else {
                warn!(error = %e, "command failed");
            }
            self.host.notify(level, &e.to_string());
        }
        result
    }

    /// Every session, numbered across all working directories
    pub fn sessions(&self) -> Vec<SessionEntry> {
        self.state.registry.query_all(&self.host)
    }

    /// Sessions of the deck's working directory
    pub fn scoped_sessions(&self) -> Vec<SessionEntry> {
        self.state.registry.query_scoped(&self.host, &self.state.cwd)
    }

    fn scoped_entry(&self, number: usize) -> Result<SessionEntry, DeckError> {
        let scoped = self.scoped_sessions();
        if scoped.is_empty() {
            return Err(DeckError::NoSessionsInScope(
                self.state.cwd.display().to_string(),
            ));
        }
        let count = scoped.len();
        scoped
            .into_iter()
            .find(|e| e.number == number)
            .ok_or(DeckError::InvalidSelector {
                index: number,
                count,
            })
    }

    /// Remember the composer's editing context before focus moves away
    fn leave_composer(&mut self) {
        if let Err(e) = self.composer().suspend() {
            debug!(error = %e, "failed to save composer state");
        }
    }

    pub fn spawn(&mut self, variant: &str) -> Result<Session, DeckError> {
        self.leave_composer();
        let result = self.lifecycle().spawn(variant);
        let result = self.report(result);
        self.sync_status();
        result
    }

    /// Focus scoped session `number`
    pub fn focus_number(&mut self, number: usize) -> Result<Session, DeckError> {
        self.leave_composer();
        let result = self.scoped_entry(number).and_then(|entry| {
            match self.lifecycle().focus(&entry.session) {
                Ok(()) => Ok(entry.session),
                Err(e) => {
                    if let DeckError::TerminalGone(channel) = e {
                        self.unregister(channel);
                    }
                    Err(e)
                }
            }
        });
        let result = self.report(result);
        self.sync_status();
        result
    }

    /// Kill scoped session `number`
    pub fn kill_number(&mut self, number: usize) -> Result<Session, DeckError> {
        let result = self.scoped_entry(number).map(|entry| {
            self.lifecycle().kill(&entry.session);
            entry.session
        });
        let result = self.report(result);
        self.sync_status();
        result
    }

    fn with_composer(
        &mut self,
        op: impl FnOnce(&mut Composer<'_, H>) -> Result<(), DeckError>,
    ) -> Result<(), DeckError> {
        let result = op(&mut self.composer());
        let result = self.report(result);
        self.sync_status();
        result
    }

    pub fn open_composer(&mut self) -> Result<(), DeckError> {
        self.with_composer(|c| c.open())
    }

    pub fn close_composer(&mut self) -> Result<(), DeckError> {
        self.with_composer(|c| c.close())
    }

    pub fn toggle_composer(&mut self) -> Result<(), DeckError> {
        self.with_composer(|c| c.toggle())
    }

    pub fn new_tab(&mut self) -> Result<(), DeckError> {
        self.with_composer(|c| c.new_tab())
    }

    pub fn next_tab(&mut self) -> Result<(), DeckError> {
        self.with_composer(|c| c.next_tab())
    }

    pub fn prev_tab(&mut self) -> Result<(), DeckError> {
        self.with_composer(|c| c.prev_tab())
    }

    pub fn delete_tab(&mut self) -> Result<(), DeckError> {
        self.with_composer(|c| c.delete_tab())
    }

    pub fn composer_open(&mut self) -> bool {
        self.composer().is_open()
    }

    fn draft(&mut self) -> Result<String, DeckError> {
        let content = self.composer().get_content()?;
        let content = content.trim_end_matches('\n');
        if content.trim().is_empty() {
            return Err(DeckError::EmptyComposition);
        }
        Ok(content.to_string())
    }

    /// Start sending the current draft: the menu to pick a destination from
    pub fn send_prompt(&mut self) -> Result<PickerMenu, DeckError> {
        let result = self.draft().map(|_| {
            PickerMenu::build(self.scoped_sessions(), self.state.last_focused)
        });
        self.report(result)
    }

    /// Finish sending with the user's choice from `menu`
    ///
    /// Returns the session that received the draft, or `None` when the
    /// selection was cancelled.
    pub fn complete_send(
        &mut self,
        menu: &PickerMenu,
        choice: Option<usize>,
    ) -> Result<Option<Session>, DeckError> {
        let result = self.deliver(menu, choice);
        let result = self.report(result);
        self.sync_status();
        result
    }

    fn deliver(
        &mut self,
        menu: &PickerMenu,
        choice: Option<usize>,
    ) -> Result<Option<Session>, DeckError> {
        let text = self.draft()?;
        let Some(picked) = picker::resolve(menu, choice, &mut self.lifecycle())? else {
            return Ok(None);
        };
        let session = picked.session().clone();

        // Liveness is checked now, not when the menu was built
        let live = self.host.terminal_channel(session.buffer) == Some(session.channel)
            && self.host.is_running(session.channel);
        if !live {
            self.unregister(session.channel);
            return Err(DeckError::TerminalGone(session.channel));
        }

        let payload = self.payload(&text);
        self.host.write(session.channel, payload.as_bytes())?;
        info!(channel = %session.channel, bytes = payload.len(), "draft delivered");

        let mut composer = self.composer();
        composer.clear()?;
        composer.close()?;

        if let Picked::Existing(_) = picked {
            self.lifecycle().focus(&session)?;
        }
        Ok(Some(session))
    }

    fn payload(&self, text: &str) -> String {
        let mut payload = if text.contains('\n') {
            format!("{}{}{}", BRACKETED_PASTE_START, text, BRACKETED_PASTE_END)
        } else {
            text.to_string()
        };
        if self.config.prompt.submit_with_enter {
            payload.push('\r');
        }
        payload
    }

    /// Flip the user's status flag; returns the new value
    pub fn toggle_status(&mut self) -> bool {
        self.state.ui.status_visible = !self.state.ui.status_visible;
        debug!(visible = self.state.ui.status_visible, "status toggled");
        self.sync_status();
        self.state.ui.status_visible
    }

    /// Whether the status summary is currently on screen
    pub fn status_shown(&self) -> bool {
        self.state
            .status_surface
            .is_some_and(|s| self.host.surface_valid(s))
    }

    /// Re-render the status summary, showing or hiding it as needed
    pub fn sync_status(&mut self) {
        if let Err(e) = self.render_status() {
            warn!(error = %e, "failed to update status summary");
        }
    }

    fn render_status(&mut self) -> Result<(), DeckError> {
        let visible = self.state.ui.status_visible && self.state.registry.count_all() > 0;
        if !visible {
            if let Some(surface) = self.state.status_surface.take() {
                self.host.close_surface(surface);
            }
            return Ok(());
        }

        let focus = FocusContext {
            current_surface: self.host.current_surface(),
            prompt_surface: self.state.prompt_surface,
            last_focused: self.state.last_focused,
        };
        let geometry = self.host.geometry();
        let line = status::render(
            &self.sessions(),
            &focus,
            usize::from(geometry.columns),
            &self.config.status,
        );

        let buffer = match self
            .state
            .status_buffer
            .filter(|b| self.host.buffer_valid(*b))
        {
            Some(buffer) => buffer,
            None => {
                let buffer = self.host.create_buffer(BufferOptions::scratch());
                self.state.status_buffer = Some(buffer);
                buffer
            }
        };
        self.host.set_lines(buffer, vec![line.text])?;
        self.host.set_styles(buffer, line.regions)?;

        let width = u16::try_from(line.width)
            .unwrap_or(u16::MAX)
            .min(geometry.columns);
        let placement = SurfaceConfig {
            row: 0,
            col: (geometry.columns - width) / 2,
            width,
            height: 1,
            title: None,
            border: false,
            focusable: false,
        };
        match self
            .state
            .status_surface
            .filter(|s| self.host.surface_valid(*s))
        {
            Some(surface) => self.host.configure_surface(surface, placement)?,
            None => {
                let surface = self.host.open_surface(buffer, placement, false)?;
                self.state.status_surface = Some(surface);
            }
        }
        Ok(())
    }

    /// Primary unregistration hook; idempotent
    fn unregister(&mut self, channel: ChannelId) -> bool {
        let found = self.lifecycle().unregister(channel);
        if found {
            info!(channel = %channel, remaining = self.state.registry.count_all(), "session removed");
            self.sync_status();
        }
        found
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        debug!(?event, "host event");
        match event {
            HostEvent::ProcessExited { channel, code } => {
                let buffer = self
                    .state
                    .registry
                    .find_by_channel(channel)
                    .map(|s| s.buffer);
                self.lifecycle().on_exit(channel, code);
                self.unregister(channel);
                // Nothing runs behind a finished terminal
                if let Some(buffer) = buffer.filter(|b| self.host.buffer_valid(*b)) {
                    self.host.delete_buffer(buffer);
                }
            }
            HostEvent::BufferRemoved(buffer) => {
                if self.state.status_buffer == Some(buffer) {
                    self.state.status_buffer = None;
                    self.state.status_surface = None;
                }
                self.state.prompt.remove_buffer(buffer);
                if self.state.registry.find_by_buffer(buffer).is_some() {
                    self.state
                        .deferred
                        .push_back(Deferred::UnregisterBuffer(buffer));
                }
            }
            HostEvent::Resized(_) => {
                if let Err(e) = self.composer().reposition() {
                    debug!(error = %e, "failed to reposition composer");
                }
                self.sync_status();
            }
            HostEvent::FocusChanged { to, .. } => {
                if let Some(channel) = self
                    .host
                    .surface_buffer(to)
                    .and_then(|b| self.state.registry.find_by_buffer(b))
                    .map(|s| s.channel)
                {
                    self.state.last_focused = Some(channel);
                }
                self.sync_status();
            }
        }
    }

    /// Dispatch every pending host event
    pub fn pump(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let events = self.host.poll_events();
            if events.is_empty() {
                return;
            }
            for event in events {
                self.handle_event(event);
            }
        }
    }

    /// Run work deferred by the previous round, then dispatch new events
    pub fn tick(&mut self) {
        let due: Vec<Deferred> = self.state.deferred.drain(..).collect();
        for deferred in due {
            match deferred {
                Deferred::UnregisterBuffer(buffer) => {
                    let channel = self
                        .state
                        .registry
                        .find_by_buffer(buffer)
                        .map(|s| s.channel);
                    if let Some(channel) = channel {
                        debug!(buffer = %buffer, channel = %channel, "unregistering after buffer removal");
                        self.unregister(channel);
                    }
                }
            }
        }
        self.pump();
    }

    /// JSON snapshot of registry and UI state
    pub fn debug_dump(&self) -> Result<String, DeckError> {
        let mut stopping: Vec<ChannelId> = self.state.stopping.iter().copied().collect();
        stopping.sort();
        let snapshot = DebugSnapshot {
            cwd: &self.state.cwd,
            current_surface: self.host.current_surface(),
            sessions: self.sessions(),
            next_color: self.state.registry.next_color(),
            ui: self.state.ui,
            prompt: &self.state.prompt,
            prompt_surface: self.state.prompt_surface,
            status_surface: self.state.status_surface,
            last_focused: self.state.last_focused,
            stopping,
            deferred: self.state.deferred.iter().copied().collect(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Write the debug snapshot into a scratch buffer on the main surface
    pub fn show_debug_dump(&mut self) -> Result<BufferId, DeckError> {
        let result = self.debug_dump().and_then(|dump| {
            let buffer = self.host.create_buffer(BufferOptions::scratch());
            self.host
                .set_lines(buffer, dump.lines().map(str::to_string).collect())?;
            let main = self.host.main_surface();
            self.host.show_buffer(main, buffer)?;
            self.host.set_current_surface(main)?;
            self.host.set_insert_mode(false);
            Ok(buffer)
        });
        let result = self.report(result);
        self.sync_status();
        result
    }

    /// Full teardown: stop every session and drop all deck state
    pub fn reset(&mut self) {
        if let Err(e) = self.composer().close() {
            debug!(error = %e, "failed to close composer during reset");
        }
        for session in self.state.registry.sessions().to_vec() {
            self.lifecycle().kill(&session);
        }
        if let Some(surface) = self.state.status_surface {
            self.host.close_surface(surface);
        }
        if let Some(buffer) = self.state.status_buffer {
            self.host.delete_buffer(buffer);
        }
        for tab in self.state.prompt.tabs().to_vec() {
            self.host.delete_buffer(tab.buffer);
        }

        let discarded = self.host.poll_events().len();
        self.state.reset();
        info!(discarded, "deck reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::host::{Buffers, Channels, Position, Surfaces};

    fn deck() -> Deck<FakeHost> {
        Deck::new(FakeHost::new(), Config::default(), PathBuf::from("/proj"))
    }

    #[test]
    fn test_status_shown_only_with_sessions() {
        let mut deck = deck();
        deck.sync_status();
        assert!(!deck.status_shown());

        deck.spawn("fresh").unwrap();
        assert!(deck.status_shown());

        assert!(!deck.toggle_status());
        assert!(!deck.status_shown());
        assert!(deck.toggle_status());
        assert!(deck.status_shown());
    }

    #[test]
    fn test_buffer_removal_unregisters_on_next_tick() {
        let mut deck = deck();
        let session = deck.spawn("fresh").unwrap();
        deck.host_mut().terminals_mut().vanish(session.channel);
        deck.host_mut().delete_buffer(session.buffer);

        deck.pump();
        assert_eq!(deck.state().registry.count_all(), 1);
        assert_eq!(deck.state().deferred.len(), 1);

        deck.tick();
        assert_eq!(deck.state().registry.count_all(), 0);
        assert!(!deck.status_shown());
    }

    #[test]
    fn test_errors_are_reported_once() {
        let mut deck = deck();
        assert!(matches!(
            deck.kill_number(1),
            Err(DeckError::NoSessionsInScope(_))
        ));
        deck.spawn("fresh").unwrap();
        assert!(matches!(
            deck.kill_number(3),
            Err(DeckError::InvalidSelector { index: 3, count: 1 })
        ));

        let notes = deck.host().notifications();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|(level, _)| *level == Level::Warn));
    }

    #[test]
    fn test_payload_wraps_multiline_text() {
        let deck = deck();
        assert_eq!(deck.payload("hi"), "hi\r");
        assert_eq!(
            deck.payload("a\nb"),
            format!("{}a\nb{}\r", BRACKETED_PASTE_START, BRACKETED_PASTE_END)
        );
    }

    #[test]
    fn test_debug_dump_lists_sessions() {
        let mut deck = deck();
        deck.spawn("resume").unwrap();
        let dump: serde_json::Value = serde_json::from_str(&deck.debug_dump().unwrap()).unwrap();

        assert_eq!(dump["sessions"][0]["number"], 1);
        assert_eq!(dump["sessions"][0]["session"]["variant"], "resume");
        assert_eq!(dump["next_color"], 2);
        assert_eq!(dump["cwd"], "/proj");

        let buffer = deck.show_debug_dump().unwrap();
        assert_eq!(deck.host().surface_buffer(deck.host().main_surface()), Some(buffer));
        assert!(deck.host().lines(buffer).unwrap().len() > 1);
    }

    #[test]
    fn test_reset_stops_everything() {
        let mut deck = deck();
        let a = deck.spawn("fresh").unwrap();
        deck.spawn("fresh").unwrap();
        deck.open_composer().unwrap();

        deck.reset();

        assert_eq!(deck.state().registry.count_all(), 0);
        assert_eq!(deck.state().registry.next_color().get(), 1);
        assert!(deck.state().prompt.is_empty());
        assert!(!deck.status_shown());
        assert!(!deck.host_mut().is_running(a.channel));
        assert_eq!(deck.spawn("fresh").unwrap().color.get(), 1);
    }

    #[test]
    fn test_organic_exit_deletes_terminal_buffer() {
        let mut deck = deck();
        let session = deck.spawn("fresh").unwrap();

        deck.host_mut().exit(session.channel, 0);
        deck.tick();
        deck.tick();

        assert!(!deck.host().buffer_valid(session.buffer));
        assert!(deck.host().terminals().is_released(session.channel));
        assert_eq!(deck.state().registry.count_all(), 0);
        assert!(deck.state().deferred.is_empty());
        let shown = deck.host().surface_buffer(deck.host().main_surface());
        assert!(shown.is_some_and(|b| deck.host().terminal_channel(b).is_none()));
    }

    #[test]
    fn test_composer_mode_survives_focus_change() {
        let mut deck = deck();
        deck.spawn("fresh").unwrap();
        deck.open_composer().unwrap();
        let surface = deck.state().prompt_surface.unwrap();
        let buffer = deck.state().prompt.current().unwrap().buffer;
        deck.host_mut()
            .set_lines(buffer, vec!["draft".into()])
            .unwrap();
        deck.host_mut().set_cursor(surface, Position::new(1, 2)).unwrap();
        deck.host_mut().set_insert_mode(false);

        deck.focus_number(1).unwrap();
        assert_ne!(deck.host().current_surface(), surface);
        assert!(deck.host().insert_mode());

        deck.open_composer().unwrap();
        assert_eq!(deck.host().current_surface(), surface);
        assert_eq!(deck.host().cursor(surface), Some(Position::new(1, 2)));
        assert!(!deck.host().insert_mode());

        // Closing from the terminal keeps the mode saved on the way out
        deck.focus_number(1).unwrap();
        deck.close_composer().unwrap();
        deck.open_composer().unwrap();
        assert!(!deck.host().insert_mode());
    }
}
