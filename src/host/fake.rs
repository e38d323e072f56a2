//! Fake host for deterministic testing
//!
//! Surfaces and buffers behave exactly like the native host; processes are
//! simulated. Every spawn and every byte written is captured so tests can
//! assert on what would have reached a real terminal.
//!
//! # Example
//! ```
//! use sessiondeck::host::fake::FakeHost;
//! use sessiondeck::host::Channels;
//!
//! let host = FakeHost::new().missing_executable("claude");
//! assert!(host.resolve_executable("claude").is_none());
//! ```

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::error::HostError;
use crate::host::memory::{MemoryHost, Terminals};
use crate::host::{ChannelId, SpawnCommand, Geometry};

/// Exit code reported for processes stopped through [`Terminals::stop`]
pub const STOPPED_EXIT_CODE: i32 = 143;

const DEFAULT_GEOMETRY: Geometry = Geometry {
    columns: 120,
    lines: 40,
};

/// Simulated process backend
#[derive(Debug, Default)]
pub struct FakeTerminals {
    /// Programs that do not resolve
    missing: HashSet<String>,
    /// Number of upcoming spawns that should fail
    failing_spawns: usize,
    /// Captured spawn commands, in order
    spawned: Vec<(ChannelId, SpawnCommand)>,
    /// Captured writes per channel
    written: HashMap<ChannelId, Vec<u8>>,
    running: HashSet<ChannelId>,
    /// Channels whose buffer was deleted
    released: HashSet<ChannelId>,
    pending_exits: Vec<(ChannelId, i32)>,
}

impl FakeTerminals {
    /// Captured spawn commands
    pub fn spawned(&self) -> &[(ChannelId, SpawnCommand)] {
        &self.spawned
    }

    /// Everything written to `channel`, decoded lossily
    pub fn written(&self, channel: ChannelId) -> String {
        self.written
            .get(&channel)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }

    /// Simulate the process behind `channel` exiting on its own
    pub fn exit(&mut self, channel: ChannelId, code: i32) {
        if self.running.remove(&channel) {
            self.pending_exits.push((channel, code));
        }
    }

    pub fn is_released(&self, channel: ChannelId) -> bool {
        self.released.contains(&channel)
    }

    /// Simulate the process dying without the exit being observed yet
    pub fn vanish(&mut self, channel: ChannelId) {
        self.running.remove(&channel);
    }
}

impl Terminals for FakeTerminals {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        if self.missing.contains(program) {
            None
        } else {
            Some(PathBuf::from("/usr/local/bin").join(program))
        }
    }

    fn spawn(
        &mut self,
        channel: ChannelId,
        command: &SpawnCommand,
        _size: Geometry,
    ) -> Result<(), HostError> {
        if self.failing_spawns > 0 {
            self.failing_spawns -= 1;
            return Err(HostError::Pty("simulated spawn failure".into()));
        }
        self.spawned.push((channel, command.clone()));
        self.running.insert(channel);
        Ok(())
    }

    fn write(&mut self, channel: ChannelId, bytes: &[u8]) -> Result<(), HostError> {
        if !self.running.contains(&channel) {
            return Err(HostError::UnknownChannel(channel));
        }
        self.written.entry(channel).or_default().extend_from_slice(bytes);
        Ok(())
    }

    fn is_running(&mut self, channel: ChannelId) -> bool {
        self.running.contains(&channel)
    }

    fn stop(&mut self, channel: ChannelId) -> Result<(), HostError> {
        if !self.running.remove(&channel) {
            return Err(HostError::UnknownChannel(channel));
        }
        self.pending_exits.push((channel, STOPPED_EXIT_CODE));
        Ok(())
    }

    fn release(&mut self, channel: ChannelId) {
        self.released.insert(channel);
    }

    fn poll_exits(&mut self) -> Vec<(ChannelId, i32)> {
        std::mem::take(&mut self.pending_exits)
    }
}

/// In-memory host with simulated processes
pub type FakeHost = MemoryHost<FakeTerminals>;

impl FakeHost {
    pub fn new() -> Self {
        MemoryHost::with_terminals(FakeTerminals::default(), DEFAULT_GEOMETRY)
    }

    pub fn with_geometry(geometry: Geometry) -> Self {
        MemoryHost::with_terminals(FakeTerminals::default(), geometry)
    }

    /// Make `program` unresolvable
    pub fn missing_executable(mut self, program: &str) -> Self {
        self.terminals_mut().missing.insert(program.to_string());
        self
    }

    /// Make the next spawn fail when the channel is opened
    pub fn fail_next_spawn(&mut self) {
        self.terminals_mut().failing_spawns += 1;
    }

    /// Text written to `channel` so far
    pub fn written(&self, channel: ChannelId) -> String {
        self.terminals().written(channel)
    }

    /// Simulate an organic process exit
    pub fn exit(&mut self, channel: ChannelId, code: i32) {
        self.terminals_mut().exit(channel, code);
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}
