//! Host ports
//!
//! Everything the deck needs from its surroundings goes through the narrow
//! traits in this module: display surfaces, text buffers, process channels
//! and a notification sink. Components never talk to a concrete host; the
//! terminal front-end plugs in [`native::NativeHost`] and tests plug in
//! [`fake::FakeHost`]; both keep surfaces and buffers in a
//! [`memory::MemoryHost`] and differ only in how they run processes.

pub mod fake;
pub mod memory;
pub mod native;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::HostError;
use crate::status::StyleRegion;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Opaque handle of a text or terminal buffer
    BufferId,
    "buf:"
);
id_type!(
    /// Opaque handle of a display surface
    SurfaceId,
    "surface:"
);
id_type!(
    /// Opaque handle of a subprocess channel, unique per process
    ChannelId,
    "chan:"
);

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Cursor or mark position: 1-based line, 0-based column in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const START: Position = Position { line: 1, col: 0 };

    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Options for creating a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferOptions {
    /// Whether the buffer shows up in the host's buffer list
    pub listed: bool,
    /// Scratch buffers are never written anywhere
    pub scratch: bool,
}

impl BufferOptions {
    pub fn scratch() -> Self {
        Self {
            listed: false,
            scratch: true,
        }
    }

    pub fn listed() -> Self {
        Self {
            listed: true,
            scratch: false,
        }
    }
}

/// Geometry and decoration of a floating surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub row: u16,
    pub col: u16,
    pub width: u16,
    pub height: u16,
    pub title: Option<String>,
    pub border: bool,
    pub focusable: bool,
}

/// Size of the whole host display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub columns: u16,
    pub lines: u16,
}

/// Program, arguments and working directory for a terminal channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

/// Lifecycle signals delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A channel's process terminated
    ProcessExited { channel: ChannelId, code: i32 },
    /// A buffer was deleted
    BufferRemoved(BufferId),
    /// The display was resized
    Resized(Geometry),
    /// Focus moved between surfaces
    FocusChanged {
        from: Option<SurfaceId>,
        to: SurfaceId,
    },
}

/// Display surfaces and input focus
pub trait Surfaces {
    /// Open a floating surface showing `buffer`; `enter` moves focus to it
    fn open_surface(
        &mut self,
        buffer: BufferId,
        config: SurfaceConfig,
        enter: bool,
    ) -> Result<SurfaceId, HostError>;

    fn close_surface(&mut self, surface: SurfaceId);

    fn surface_valid(&self, surface: SurfaceId) -> bool;

    fn configure_surface(
        &mut self,
        surface: SurfaceId,
        config: SurfaceConfig,
    ) -> Result<(), HostError>;

    fn surface_config(&self, surface: SurfaceId) -> Option<SurfaceConfig>;

    /// Every open surface together with the buffer it shows
    fn surfaces(&self) -> Vec<(SurfaceId, BufferId)>;

    /// Buffer currently shown in `surface`
    fn surface_buffer(&self, surface: SurfaceId) -> Option<BufferId>;

    /// The full-screen surface, which always exists and cannot be closed
    fn main_surface(&self) -> SurfaceId;

    fn current_surface(&self) -> SurfaceId;

    fn set_current_surface(&mut self, surface: SurfaceId) -> Result<(), HostError>;

    /// Replace the buffer shown in `surface`
    fn show_buffer(&mut self, surface: SurfaceId, buffer: BufferId) -> Result<(), HostError>;

    fn geometry(&self) -> Geometry;

    fn cursor(&self, surface: SurfaceId) -> Option<Position>;

    fn set_cursor(&mut self, surface: SurfaceId, position: Position) -> Result<(), HostError>;

    /// Whether keystrokes currently insert text (or go to the terminal)
    fn insert_mode(&self) -> bool;

    fn set_insert_mode(&mut self, insert: bool);
}

/// Text buffers with per-buffer marks and flags
pub trait Buffers {
    fn create_buffer(&mut self, options: BufferOptions) -> BufferId;

    fn buffer_valid(&self, buffer: BufferId) -> bool;

    fn lines(&self, buffer: BufferId) -> Result<Vec<String>, HostError>;

    fn set_lines(&mut self, buffer: BufferId, lines: Vec<String>) -> Result<(), HostError>;

    /// Replace the style regions of the buffer's first line
    fn set_styles(&mut self, buffer: BufferId, regions: Vec<StyleRegion>)
        -> Result<(), HostError>;

    fn mark(&self, buffer: BufferId, name: &str) -> Option<Position>;

    fn set_mark(&mut self, buffer: BufferId, name: &str, position: Position)
        -> Result<(), HostError>;

    fn flag(&self, buffer: BufferId, name: &str) -> Option<bool>;

    fn set_flag(&mut self, buffer: BufferId, name: &str, value: bool) -> Result<(), HostError>;

    /// Delete a buffer; surfaces showing it fall back to another buffer
    fn delete_buffer(&mut self, buffer: BufferId);
}

/// Subprocess channels attached to pseudo-terminals
pub trait Channels {
    /// Look up an executable the way a shell would
    fn resolve_executable(&self, program: &str) -> Option<PathBuf>;

    /// Start `command` in a pseudo-terminal backing `buffer`
    fn open_terminal(
        &mut self,
        buffer: BufferId,
        command: &SpawnCommand,
    ) -> Result<ChannelId, HostError>;

    fn write(&mut self, channel: ChannelId, bytes: &[u8]) -> Result<(), HostError>;

    /// Non-blocking liveness query
    fn is_running(&mut self, channel: ChannelId) -> bool;

    fn stop(&mut self, channel: ChannelId) -> Result<(), HostError>;

    /// Channel backing a terminal buffer, if the buffer is still a live terminal
    fn terminal_channel(&self, buffer: BufferId) -> Option<ChannelId>;
}

/// User-visible leveled messages
pub trait Notifier {
    fn notify(&mut self, level: Level, message: &str);
}

/// A complete host: all ports plus its queue of lifecycle signals
pub trait Host: Surfaces + Buffers + Channels + Notifier {
    /// Drain lifecycle signals raised since the last call
    fn poll_events(&mut self) -> Vec<HostEvent>;
}
