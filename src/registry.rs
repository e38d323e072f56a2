//! Instance registry
//!
//! Tracks live sessions in spawn order. Display numbers are never stored:
//! every query numbers its result 1..k by position, so deleting a session
//! never leaves a gap the user can see.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::host::{BufferId, ChannelId, SurfaceId, Surfaces};
use crate::lifecycle::SpawnVariant;

const COLOR_NAMES: [&str; 8] = [
    "blue", "green", "yellow", "magenta", "cyan", "red", "orange", "purple",
];

/// Visual identity of a session, in 1..=8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColorIndex(u8);

impl ColorIndex {
    pub const COUNT: u8 = 8;
    pub const FIRST: ColorIndex = ColorIndex(1);

    pub fn new(index: u8) -> Option<Self> {
        (1..=Self::COUNT).contains(&index).then_some(Self(index))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Round-robin successor, wrapping from 8 back to 1
    pub fn next(self) -> Self {
        Self(self.0 % Self::COUNT + 1)
    }

    pub fn name(self) -> &'static str {
        COLOR_NAMES[usize::from(self.0 - 1)]
    }
}

impl fmt::Display for ColorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One spawned agent process bound to a terminal buffer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub channel: ChannelId,
    pub buffer: BufferId,
    pub color: ColorIndex,
    pub cwd: PathBuf,
    pub variant: SpawnVariant,
    pub created_at: DateTime<Utc>,
}

/// A session as returned by a query: numbered and located
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEntry {
    /// 1-based position within the queried list
    pub number: usize,
    pub session: Session,
    /// Surface currently showing the session, if any
    pub surface: Option<SurfaceId>,
}

/// Live sessions plus the color assignment counter
#[derive(Debug, Clone)]
pub struct Registry {
    sessions: Vec<Session>,
    next_color: ColorIndex,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            next_color: ColorIndex::FIRST,
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new session; registering a known channel returns it unchanged
    pub fn register(
        &mut self,
        channel: ChannelId,
        buffer: BufferId,
        cwd: &Path,
        variant: SpawnVariant,
    ) -> Session {
        if let Some(existing) = self.find_by_channel(channel) {
            return existing.clone();
        }

        let session = Session {
            channel,
            buffer,
            color: self.next_color,
            cwd: cwd.to_path_buf(),
            variant,
            created_at: Utc::now(),
        };
        self.next_color = self.next_color.next();
        self.sessions.push(session.clone());

        debug!(
            channel = %channel,
            color = %session.color,
            count = self.sessions.len(),
            "session registered"
        );
        session
    }

    /// Remove the session on `channel`; false if it was not registered
    pub fn unregister(&mut self, channel: ChannelId) -> bool {
        match self.sessions.iter().position(|s| s.channel == channel) {
            Some(index) => {
                self.sessions.remove(index);
                debug!(channel = %channel, count = self.sessions.len(), "session unregistered");
                true
            }
            None => false,
        }
    }

    pub fn find_by_channel(&self, channel: ChannelId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.channel == channel)
    }

    pub fn find_by_buffer(&self, buffer: BufferId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.buffer == buffer)
    }

    /// Sessions in spawn order
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Color the next registration will receive
    pub fn next_color(&self) -> ColorIndex {
        self.next_color
    }

    pub fn count_all(&self) -> usize {
        self.sessions.len()
    }

    pub fn count_scoped(&self, cwd: &Path) -> usize {
        self.sessions.iter().filter(|s| s.cwd == cwd).count()
    }

    /// Every session, numbered by position in the full list
    pub fn query_all<S: Surfaces + ?Sized>(&self, host: &S) -> Vec<SessionEntry> {
        self.query(host, |_| true)
    }

    /// Sessions spawned in `cwd`, numbered 1..k within that subset
    pub fn query_scoped<S: Surfaces + ?Sized>(&self, host: &S, cwd: &Path) -> Vec<SessionEntry> {
        self.query(host, |s| s.cwd == cwd)
    }

    fn query<S, F>(&self, host: &S, keep: F) -> Vec<SessionEntry>
    where
        S: Surfaces + ?Sized,
        F: Fn(&Session) -> bool,
    {
        let index = surface_index(host);
        self.sessions
            .iter()
            .filter(|s| keep(s))
            .enumerate()
            .map(|(i, session)| SessionEntry {
                number: i + 1,
                surface: index.get(&session.buffer).copied(),
                session: session.clone(),
            })
            .collect()
    }
}

/// Buffer to showing surface, built with one pass over the host's surfaces
///
/// When several surfaces show the same buffer, the current one wins.
fn surface_index<S: Surfaces + ?Sized>(host: &S) -> HashMap<BufferId, SurfaceId> {
    let current = host.current_surface();
    let mut index = HashMap::new();
    for (surface, buffer) in host.surfaces() {
        if surface == current {
            index.insert(buffer, surface);
        } else {
            index.entry(buffer).or_insert(surface);
        }
    }
    index
}
