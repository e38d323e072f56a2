//! State store
//!
//! One record owning every piece of mutable deck state. Components borrow it
//! for the duration of a single operation and re-derive anything host-related
//! (surfaces, liveness) on each call.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

use serde::Serialize;

use crate::host::{BufferId, ChannelId, SurfaceId};
use crate::prompt::PromptTabs;
use crate::registry::Registry;

/// User-toggled visibility flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UiFlags {
    /// Whether the user wants the status summary (it still hides with no sessions)
    pub status_visible: bool,
}

/// Work postponed to the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Deferred {
    /// Unregister whichever session was backed by this buffer
    UnregisterBuffer(BufferId),
}

#[derive(Debug, Clone)]
pub struct State {
    /// Working directory new sessions are spawned in and queries are scoped to
    pub cwd: PathBuf,
    pub registry: Registry,
    pub prompt: PromptTabs,
    pub ui: UiFlags,
    /// Floating surface and buffer of the status summary
    pub status_surface: Option<SurfaceId>,
    pub status_buffer: Option<BufferId>,
    /// Floating surface of the composer while it is open
    pub prompt_surface: Option<SurfaceId>,
    /// Session most recently focused, kept across composer focus
    pub last_focused: Option<ChannelId>,
    /// Channels stopped on purpose; their exit code is not reported
    pub stopping: HashSet<ChannelId>,
    pub deferred: VecDeque<Deferred>,
    initial_ui: UiFlags,
}

impl State {
    pub fn init(cwd: PathBuf, ui: UiFlags) -> Self {
        Self {
            cwd,
            registry: Registry::new(),
            prompt: PromptTabs::default(),
            ui,
            status_surface: None,
            status_buffer: None,
            prompt_surface: None,
            last_focused: None,
            stopping: HashSet::new(),
            deferred: VecDeque::new(),
            initial_ui: ui,
        }
    }

    /// Forget everything, including the color counter; keeps the working directory
    pub fn reset(&mut self) {
        *self = State::init(std::mem::take(&mut self.cwd), self.initial_ui);
    }
}
