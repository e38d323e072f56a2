//! Terminal lifecycle controller
//!
//! Spawns agent processes into terminal buffers, focuses and kills them, and
//! turns process exits into registry updates. Per session the states are
//! `absent -> spawning -> live -> (exited | killed) -> absent`; every path
//! back to `absent` goes through [`Lifecycle::unregister`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::DeckError;
use crate::host::{BufferId, BufferOptions, ChannelId, SpawnCommand, Host, Level, SurfaceId};
use crate::registry::Session;
use crate::state::State;

/// How a session's conversation starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnVariant {
    /// New conversation
    Fresh,
    /// Reopen the last conversation
    Resume,
    /// Extend the last conversation
    Continue,
}

impl SpawnVariant {
    /// Declared order, used wherever variants are listed
    pub const ALL: [SpawnVariant; 3] = [
        SpawnVariant::Fresh,
        SpawnVariant::Resume,
        SpawnVariant::Continue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpawnVariant::Fresh => "fresh",
            SpawnVariant::Resume => "resume",
            SpawnVariant::Continue => "continue",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SpawnVariant::Fresh => "New session",
            SpawnVariant::Resume => "Resume last session",
            SpawnVariant::Continue => "Continue last session",
        }
    }

    /// Agent arguments selecting this variant
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            SpawnVariant::Fresh => &[],
            SpawnVariant::Resume => &["--resume"],
            SpawnVariant::Continue => &["--continue"],
        }
    }
}

impl fmt::Display for SpawnVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpawnVariant {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpawnVariant::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DeckError::InvalidVariant(s.to_string()))
    }
}

/// Lifecycle operations over a borrowed host and state
pub struct Lifecycle<'a, H: Host> {
    pub host: &'a mut H,
    pub state: &'a mut State,
    pub config: &'a Config,
}

impl<'a, H: Host> Lifecycle<'a, H> {
    pub fn new(host: &'a mut H, state: &'a mut State, config: &'a Config) -> Self {
        Self {
            host,
            state,
            config,
        }
    }

    /// Spawn a session from a variant name
    pub fn spawn(&mut self, variant: &str) -> Result<Session, DeckError> {
        let variant = variant.parse()?;
        self.spawn_variant(variant)
    }

    /// Start the agent in a new terminal buffer shown in the working surface
    ///
    /// On failure nothing is registered and the surface shows what it showed
    /// before the attempt.
    pub fn spawn_variant(&mut self, variant: SpawnVariant) -> Result<Session, DeckError> {
        let executable = &self.config.executable;
        let program = self
            .host
            .resolve_executable(executable)
            .ok_or_else(|| DeckError::ExecutableNotFound(executable.clone()))?;

        let command = SpawnCommand {
            program,
            args: self
                .config
                .extra_args
                .iter()
                .cloned()
                .chain(variant.args().iter().map(|a| a.to_string()))
                .collect(),
            cwd: self.state.cwd.clone(),
        };

        let target = self.target_surface();
        let previous = self.host.surface_buffer(target);
        let buffer = self.host.create_buffer(BufferOptions::listed());

        let opened = self
            .host
            .show_buffer(target, buffer)
            .and_then(|()| self.host.open_terminal(buffer, &command));
        let channel = match opened {
            Ok(channel) => channel,
            Err(e) => {
                warn!(variant = %variant, error = %e, "failed to open terminal");
                self.revert(target, previous, buffer);
                return Err(DeckError::SpawnFailed(e.to_string()));
            }
        };

        self.host.set_current_surface(target)?;
        self.host.set_insert_mode(true);

        let session = self
            .state
            .registry
            .register(channel, buffer, &self.state.cwd, variant);
        self.state.last_focused = Some(channel);

        info!(
            channel = %channel,
            variant = %variant,
            color = %session.color,
            cwd = %session.cwd.display(),
            "session spawned"
        );
        Ok(session)
    }

    fn revert(&mut self, surface: SurfaceId, previous: Option<BufferId>, buffer: BufferId) {
        if let Some(previous) = previous.filter(|b| self.host.buffer_valid(*b)) {
            if let Err(e) = self.host.show_buffer(surface, previous) {
                debug!(surface = %surface, error = %e, "could not restore surface");
            }
        }
        self.host.delete_buffer(buffer);
    }

    /// Surface sessions are shown in: the current one unless it is floating
    fn target_surface(&self) -> SurfaceId {
        let current = self.host.current_surface();
        if self.host.surface_config(current).is_some() {
            self.host.main_surface()
        } else {
            current
        }
    }

    /// Bring a session to the front, ready for typing
    pub fn focus(&mut self, session: &Session) -> Result<(), DeckError> {
        if self.host.terminal_channel(session.buffer) != Some(session.channel) {
            return Err(DeckError::TerminalGone(session.channel));
        }

        let current = self.host.current_surface();
        let showing = if self.host.surface_buffer(current) == Some(session.buffer) {
            Some(current)
        } else {
            self.host
                .surfaces()
                .into_iter()
                .find(|(_, buffer)| *buffer == session.buffer)
                .map(|(surface, _)| surface)
        };

        let surface = match showing {
            Some(surface) => surface,
            None => {
                let target = self.target_surface();
                self.host.show_buffer(target, session.buffer)?;
                target
            }
        };

        self.host.set_current_surface(surface)?;
        self.host.set_insert_mode(true);
        self.state.last_focused = Some(session.channel);
        debug!(channel = %session.channel, surface = %surface, "session focused");
        Ok(())
    }

    /// Stop a session and delete its buffer
    ///
    /// Registry removal happens when the exit or buffer-removal signal comes
    /// back, except when the buffer is already gone.
    pub fn kill(&mut self, session: &Session) {
        if !self.host.buffer_valid(session.buffer) {
            debug!(channel = %session.channel, "buffer already gone, unregistering");
            self.unregister(session.channel);
            return;
        }

        self.state.stopping.insert(session.channel);
        if let Err(e) = self.host.stop(session.channel) {
            debug!(channel = %session.channel, error = %e, "stop failed, process likely exited");
        }
        self.host.delete_buffer(session.buffer);
        info!(channel = %session.channel, color = %session.color, "session killed");
    }

    /// Exit callback: warn about abnormal exits the user did not ask for
    ///
    /// Leaves unregistration to [`Lifecycle::unregister`].
    pub fn on_exit(&mut self, channel: ChannelId, code: i32) {
        let Some(session) = self.state.registry.find_by_channel(channel) else {
            debug!(channel = %channel, code, "exit for unknown channel");
            return;
        };

        let requested = self.state.stopping.contains(&channel);
        if code != 0 && !requested {
            let message = format!(
                "{} session ({}) exited with code {}",
                session.color, session.variant, code
            );
            warn!(channel = %channel, code, "session exited abnormally");
            self.host.notify(Level::Warn, &message);
        } else {
            info!(channel = %channel, code, requested, "session exited");
        }
    }

    /// Remove a session from the registry; safe to call more than once
    pub fn unregister(&mut self, channel: ChannelId) -> bool {
        self.state.stopping.remove(&channel);
        if self.state.last_focused == Some(channel) {
            self.state.last_focused = None;
        }
        self.state.registry.unregister(channel)
    }
}
