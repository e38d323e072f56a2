use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{EnableBracketedPaste, Event, EventStream, KeyEvent, KeyEventKind},
    execute,
    terminal::{self, enable_raw_mode, EnterAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, layout::Rect, style::Style, Frame, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::deck::{Deck, BRACKETED_PASTE_END, BRACKETED_PASTE_START};
use crate::host::native::{NativeHost, PtyMessage};
use crate::host::{Buffers, ChannelId, Channels, Geometry, Surfaces};
use crate::ui::action::{Action, EditOp};
use crate::ui::components::theme::{BORDER_FOCUSED, BORDER_UNFOCUSED};
use crate::ui::components::{
    BufferView, MessageLine, SessionPicker, SessionPickerState, StatusSummary, TerminalPane,
};
use crate::ui::editor;
use crate::ui::input::{Focus, InputMode, KeyMap};
use crate::ui::terminal_guard::TerminalGuard;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Main application state
pub struct App {
    deck: Deck<NativeHost>,
    keymap: KeyMap,
    /// Pending prefix command, if any
    mode: InputMode,
    /// Destination picker while a draft is being sent
    picker: Option<SessionPickerState>,
    /// Output forwarded by the PTY reader threads
    pty_rx: mpsc::UnboundedReceiver<PtyMessage>,
    /// Notification count when the last key was pressed; older ones are dismissed
    seen_notifications: usize,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, cwd: PathBuf) -> Self {
        let (columns, lines) = terminal::size().unwrap_or(FALLBACK_SIZE);
        let (pty_tx, pty_rx) = mpsc::unbounded_channel();
        let host = NativeHost::new(Geometry { columns, lines }, pty_tx);
        let keymap = KeyMap::new(config.prefix_key());

        Self {
            deck: Deck::new(host, config, cwd),
            keymap,
            mode: InputMode::Normal,
            picker: None,
            pty_rx,
            seen_notifications: 0,
            should_quit: false,
        }
    }

    /// Run the application main loop
    pub async fn run(&mut self) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        let mut guard = TerminalGuard::new();

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        info!(cwd = %self.deck.state().cwd.display(), prefix = %self.keymap.prefix(), "deck started");
        let result = self.event_loop(&mut terminal).await;

        self.deck.reset();
        guard.cleanup()?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let mut events = EventStream::new();
        let mut frames = tokio::time::interval(FRAME_INTERVAL);

        loop {
            terminal.draw(|f| self.draw(f))?;

            tokio::select! {
                _ = frames.tick() => {
                    self.deck.tick();
                }

                Some(message) = self.pty_rx.recv() => {
                    self.deck.host_mut().feed(message);
                    while let Ok(message) = self.pty_rx.try_recv() {
                        self.deck.host_mut().feed(message);
                    }
                }

                event = events.next() => match event {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(&key),
            Event::Paste(text) => self.handle_paste(text),
            Event::Resize(columns, lines) => {
                let (columns, lines) = terminal::size().unwrap_or((columns, lines));
                self.deck.host_mut().resize(Geometry { columns, lines });
            }
            _ => {}
        }
        self.deck.pump();
    }

    fn handle_key(&mut self, key: &KeyEvent) {
        self.seen_notifications = self.deck.host().notification_count();
        let focus = self.focus();
        if let Some(action) = self.keymap.dispatch(&mut self.mode, focus, key) {
            debug!(?action, "key action");
            self.apply(action);
        }
    }

    fn handle_paste(&mut self, text: String) {
        match self.focus() {
            Focus::Composer { .. } => self.apply(Action::Edit(EditOp::InsertText(text))),
            Focus::Terminal => {
                let payload = format!("{}{}{}", BRACKETED_PASTE_START, text, BRACKETED_PASTE_END);
                self.apply(Action::Forward(payload.into_bytes()));
            }
            Focus::Picker | Focus::Idle => {}
        }
    }

    /// Channel of the terminal shown in the focused surface
    fn focused_channel(&self) -> Option<ChannelId> {
        let host = self.deck.host();
        host.surface_buffer(host.current_surface())
            .and_then(|b| host.terminal_channel(b))
    }

    fn focus(&self) -> Focus {
        if self.picker.is_some() {
            return Focus::Picker;
        }
        let host = self.deck.host();
        if self.deck.state().prompt_surface == Some(host.current_surface()) {
            return Focus::Composer {
                insert: host.insert_mode(),
            };
        }
        match self.focused_channel() {
            Some(_) => Focus::Terminal,
            None => Focus::Idle,
        }
    }

    /// Apply one action. Deck commands log and notify their own failures,
    /// so their results are only inspected where the front-end reacts.
    fn apply(&mut self, action: Action) {
        match action {
            Action::Spawn(variant) => {
                self.deck.spawn(variant.as_str()).ok();
            }
            Action::Focus(number) => {
                self.deck.focus_number(number).ok();
            }
            Action::Kill(number) => {
                self.deck.kill_number(number).ok();
            }
            Action::Forward(bytes) => {
                if let Some(channel) = self.focused_channel() {
                    if let Err(e) = self.deck.host_mut().write(channel, &bytes) {
                        debug!(channel = %channel, error = %e, "dropped input for terminal");
                    }
                }
            }
            Action::ToggleComposer => {
                self.deck.toggle_composer().ok();
            }
            Action::CloseComposer => {
                self.deck.close_composer().ok();
            }
            Action::NewTab => {
                self.deck.new_tab().ok();
            }
            Action::NextTab => {
                self.deck.next_tab().ok();
            }
            Action::PrevTab => {
                self.deck.prev_tab().ok();
            }
            Action::DeleteTab => {
                self.deck.delete_tab().ok();
            }
            Action::EnterInsert { append } => {
                if append {
                    self.edit(EditOp::Right);
                }
                self.deck.host_mut().set_insert_mode(true);
            }
            Action::LeaveInsert => self.deck.host_mut().set_insert_mode(false),
            Action::Edit(op) => self.edit(op),
            Action::SendDraft => {
                if let Ok(menu) = self.deck.send_prompt() {
                    self.picker = Some(SessionPickerState::new(menu));
                }
            }
            Action::PickerUp => {
                if let Some(picker) = self.picker.as_mut() {
                    picker.select_previous();
                }
            }
            Action::PickerDown => {
                if let Some(picker) = self.picker.as_mut() {
                    picker.select_next();
                }
            }
            Action::PickerNumber(number) => {
                let valid = self
                    .picker
                    .as_mut()
                    .is_some_and(|p| p.select_number(number));
                if valid {
                    self.finish_picker(true);
                }
            }
            Action::PickerConfirm => self.finish_picker(true),
            Action::PickerCancel => self.finish_picker(false),
            Action::ToggleStatus => {
                self.deck.toggle_status();
            }
            Action::DebugDump => {
                self.deck.show_debug_dump().ok();
            }
            Action::Quit => {
                info!("quit requested");
                self.should_quit = true;
            }
        }
    }

    fn edit(&mut self, op: EditOp) {
        let Some(surface) = self.deck.state().prompt_surface else {
            return;
        };
        if let Err(e) = editor::apply(self.deck.host_mut(), surface, &op) {
            warn!(error = %e, ?op, "edit failed");
        }
    }

    fn finish_picker(&mut self, confirm: bool) {
        let Some(picker) = self.picker.take() else {
            return;
        };
        let choice = confirm.then_some(picker.selected);
        if let Ok(Some(session)) = self.deck.complete_send(picker.menu(), choice) {
            debug!(channel = %session.channel, "draft sent");
        }
    }

    fn draw(&self, f: &mut Frame) {
        let area = f.area();
        let main_area = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        let message_area = Rect {
            y: area.y + main_area.height,
            height: area.height.min(1),
            ..area
        };

        let host = self.deck.host();
        let current = host.current_surface();
        let main = host.main_surface();
        let mut cursor = None;

        if let Some(buffer) = host.surface_buffer(main) {
            if let Some(screen) = host.screen(buffer) {
                let pane = TerminalPane::new(screen);
                if current == main {
                    cursor = pane.cursor(main_area);
                }
                f.render_widget(pane, main_area);
            } else if let Ok(lines) = host.lines(buffer) {
                f.render_widget(BufferView::new(&lines), main_area);
            }
        }

        for (surface, buffer, config) in host.floating_surfaces() {
            let rect = Rect::new(config.col, config.row, config.width, config.height)
                .intersection(main_area);
            let Ok(lines) = host.lines(buffer) else {
                continue;
            };

            if self.deck.state().status_buffer == Some(buffer) {
                let regions = host.styles(buffer);
                let text = lines.first().map(String::as_str).unwrap_or_default();
                f.render_widget(StatusSummary::new(text, &regions), rect);
                continue;
            }

            let focused = surface == current;
            let mut view = BufferView::new(&lines)
                .title(config.title.as_deref())
                .cursor(if focused { host.cursor(surface) } else { None });
            if config.border {
                let color = if focused {
                    BORDER_FOCUSED
                } else {
                    BORDER_UNFOCUSED
                };
                view = view.border(Style::default().fg(color));
            }
            if focused {
                cursor = view.cursor_position(rect);
            }
            f.render_widget(view, rect);
        }

        if let Some(picker) = &self.picker {
            SessionPicker::render(main_area, f.buffer_mut(), picker);
            cursor = None;
        }

        let message = host
            .notification_since(self.seen_notifications)
            .map(|(level, text)| (*level, text.as_str()));
        let pending = match self.mode {
            InputMode::Normal => None,
            InputMode::Prefix => Some(format!("{} ", self.keymap.prefix())),
            InputMode::KillPending => Some(format!("{} x ", self.keymap.prefix())),
        };
        f.render_widget(
            MessageLine::new(message).pending(pending.as_deref()),
            message_area,
        );

        if let Some(position) = cursor {
            f.set_cursor_position(position);
        }
    }
}
