//! In-memory surfaces and buffers shared by the native and fake hosts
//!
//! The display model is small: one main surface that always exists, plus
//! any number of floating surfaces layered over it. Process channels are
//! delegated to a [`Terminals`] backend.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::HostError;
use crate::host::{
    BufferId, BufferOptions, Buffers, ChannelId, Channels, SpawnCommand, Geometry, Host,
    HostEvent, Level, Notifier, Position, SurfaceConfig, SurfaceId, Surfaces,
};
use crate::status::StyleRegion;

/// Notifications kept for display; older ones are dropped
pub const NOTIFICATION_HISTORY: usize = 64;

/// Backend that actually runs processes for terminal buffers
pub trait Terminals {
    fn resolve(&self, program: &str) -> Option<PathBuf>;

    fn spawn(
        &mut self,
        channel: ChannelId,
        command: &SpawnCommand,
        size: Geometry,
    ) -> Result<(), HostError>;

    fn write(&mut self, channel: ChannelId, bytes: &[u8]) -> Result<(), HostError>;

    fn is_running(&mut self, channel: ChannelId) -> bool;

    fn stop(&mut self, channel: ChannelId) -> Result<(), HostError>;

    /// The buffer showing `channel` is gone; its resources can be dropped
    /// once the exit has been reported
    fn release(&mut self, channel: ChannelId);

    /// Channels whose process ended since the last call, with exit codes
    fn poll_exits(&mut self) -> Vec<(ChannelId, i32)>;

    fn resize(&mut self, _size: Geometry) {}
}

#[derive(Debug, Clone)]
struct BufferData {
    options: BufferOptions,
    lines: Vec<String>,
    styles: Vec<StyleRegion>,
    marks: HashMap<String, Position>,
    flags: HashMap<String, bool>,
    channel: Option<ChannelId>,
}

impl BufferData {
    fn new(options: BufferOptions) -> Self {
        Self {
            options,
            lines: vec![String::new()],
            styles: Vec::new(),
            marks: HashMap::new(),
            flags: HashMap::new(),
            channel: None,
        }
    }
}

#[derive(Debug, Clone)]
struct SurfaceData {
    buffer: BufferId,
    /// `None` for the main surface
    config: Option<SurfaceConfig>,
    cursor: Position,
}

/// Host keeping all display state in memory
pub struct MemoryHost<T> {
    buffers: BTreeMap<BufferId, BufferData>,
    surfaces: BTreeMap<SurfaceId, SurfaceData>,
    main: SurfaceId,
    current: SurfaceId,
    insert: bool,
    geometry: Geometry,
    next_id: u32,
    events: Vec<HostEvent>,
    messages: VecDeque<(Level, String)>,
    /// Notifications sent over the host's lifetime, including dropped ones
    notified: usize,
    terminals: T,
}

impl<T: Terminals> MemoryHost<T> {
    pub fn with_terminals(terminals: T, geometry: Geometry) -> Self {
        let main_buffer = BufferId(1);
        let main = SurfaceId(2);
        let mut buffers = BTreeMap::new();
        buffers.insert(main_buffer, BufferData::new(BufferOptions::listed()));
        let mut surfaces = BTreeMap::new();
        surfaces.insert(
            main,
            SurfaceData {
                buffer: main_buffer,
                config: None,
                cursor: Position::START,
            },
        );

        Self {
            buffers,
            surfaces,
            main,
            current: main,
            insert: false,
            geometry,
            next_id: 3,
            events: Vec::new(),
            messages: VecDeque::new(),
            notified: 0,
            terminals,
        }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Floating surfaces in stacking order
    pub fn floating_surfaces(&self) -> Vec<(SurfaceId, BufferId, SurfaceConfig)> {
        self.surfaces
            .iter()
            .filter_map(|(id, s)| s.config.clone().map(|c| (*id, s.buffer, c)))
            .collect()
    }

    /// Recent messages sent through the notification sink, oldest first
    pub fn notifications(&self) -> &VecDeque<(Level, String)> {
        &self.messages
    }

    pub fn last_notification(&self) -> Option<&(Level, String)> {
        self.messages.back()
    }

    /// Total number of notifications ever sent
    pub fn notification_count(&self) -> usize {
        self.notified
    }

    /// Latest notification, if any arrived after the first `seen`
    pub fn notification_since(&self, seen: usize) -> Option<&(Level, String)> {
        if self.notified > seen {
            self.messages.back()
        } else {
            None
        }
    }

    pub fn styles(&self, buffer: BufferId) -> Vec<StyleRegion> {
        self.buffers
            .get(&buffer)
            .map(|b| b.styles.clone())
            .unwrap_or_default()
    }

    pub fn terminals(&self) -> &T {
        &self.terminals
    }

    pub fn terminals_mut(&mut self) -> &mut T {
        &mut self.terminals
    }

    /// Record a new display size and queue a resize signal
    pub fn resize(&mut self, geometry: Geometry) {
        if geometry == self.geometry {
            return;
        }
        self.geometry = geometry;
        self.terminals.resize(geometry);
        self.events.push(HostEvent::Resized(geometry));
    }

    fn focus(&mut self, surface: SurfaceId) {
        if surface != self.current {
            let from = Some(self.current);
            self.current = surface;
            self.events.push(HostEvent::FocusChanged { from, to: surface });
        }
    }

    fn buffer_mut(&mut self, buffer: BufferId) -> Result<&mut BufferData, HostError> {
        self.buffers
            .get_mut(&buffer)
            .ok_or(HostError::UnknownBuffer(buffer))
    }
}

impl<T: Terminals> Surfaces for MemoryHost<T> {
    fn open_surface(
        &mut self,
        buffer: BufferId,
        config: SurfaceConfig,
        enter: bool,
    ) -> Result<SurfaceId, HostError> {
        if !self.buffers.contains_key(&buffer) {
            return Err(HostError::UnknownBuffer(buffer));
        }
        let id = SurfaceId(self.allocate());
        self.surfaces.insert(
            id,
            SurfaceData {
                buffer,
                config: Some(config),
                cursor: Position::START,
            },
        );
        if enter {
            self.focus(id);
        }
        Ok(id)
    }

    fn close_surface(&mut self, surface: SurfaceId) {
        if surface == self.main {
            return;
        }
        if self.surfaces.remove(&surface).is_some() && self.current == surface {
            self.focus(self.main);
        }
    }

    fn surface_valid(&self, surface: SurfaceId) -> bool {
        self.surfaces.contains_key(&surface)
    }

    fn configure_surface(
        &mut self,
        surface: SurfaceId,
        config: SurfaceConfig,
    ) -> Result<(), HostError> {
        let data = self
            .surfaces
            .get_mut(&surface)
            .ok_or(HostError::UnknownSurface(surface))?;
        if data.config.is_some() {
            data.config = Some(config);
        }
        Ok(())
    }

    fn surface_config(&self, surface: SurfaceId) -> Option<SurfaceConfig> {
        self.surfaces.get(&surface).and_then(|s| s.config.clone())
    }

    fn surfaces(&self) -> Vec<(SurfaceId, BufferId)> {
        self.surfaces.iter().map(|(id, s)| (*id, s.buffer)).collect()
    }

    fn surface_buffer(&self, surface: SurfaceId) -> Option<BufferId> {
        self.surfaces.get(&surface).map(|s| s.buffer)
    }

    fn main_surface(&self) -> SurfaceId {
        self.main
    }

    fn current_surface(&self) -> SurfaceId {
        self.current
    }

    fn set_current_surface(&mut self, surface: SurfaceId) -> Result<(), HostError> {
        if !self.surfaces.contains_key(&surface) {
            return Err(HostError::UnknownSurface(surface));
        }
        self.focus(surface);
        Ok(())
    }

    fn show_buffer(&mut self, surface: SurfaceId, buffer: BufferId) -> Result<(), HostError> {
        if !self.buffers.contains_key(&buffer) {
            return Err(HostError::UnknownBuffer(buffer));
        }
        let data = self
            .surfaces
            .get_mut(&surface)
            .ok_or(HostError::UnknownSurface(surface))?;
        data.buffer = buffer;
        data.cursor = Position::START;
        Ok(())
    }

    fn geometry(&self) -> Geometry {
        self.geometry
    }

    fn cursor(&self, surface: SurfaceId) -> Option<Position> {
        self.surfaces.get(&surface).map(|s| s.cursor)
    }

    fn set_cursor(&mut self, surface: SurfaceId, position: Position) -> Result<(), HostError> {
        let data = self
            .surfaces
            .get_mut(&surface)
            .ok_or(HostError::UnknownSurface(surface))?;
        data.cursor = position;
        Ok(())
    }

    fn insert_mode(&self) -> bool {
        self.insert
    }

    fn set_insert_mode(&mut self, insert: bool) {
        self.insert = insert;
    }
}

impl<T: Terminals> Buffers for MemoryHost<T> {
    fn create_buffer(&mut self, options: BufferOptions) -> BufferId {
        let id = BufferId(self.allocate());
        self.buffers.insert(id, BufferData::new(options));
        id
    }

    fn buffer_valid(&self, buffer: BufferId) -> bool {
        self.buffers.contains_key(&buffer)
    }

    fn lines(&self, buffer: BufferId) -> Result<Vec<String>, HostError> {
        self.buffers
            .get(&buffer)
            .map(|b| b.lines.clone())
            .ok_or(HostError::UnknownBuffer(buffer))
    }

    fn set_lines(&mut self, buffer: BufferId, lines: Vec<String>) -> Result<(), HostError> {
        let data = self.buffer_mut(buffer)?;
        data.lines = if lines.is_empty() {
            vec![String::new()]
        } else {
            lines
        };
        Ok(())
    }

    fn set_styles(
        &mut self,
        buffer: BufferId,
        regions: Vec<StyleRegion>,
    ) -> Result<(), HostError> {
        self.buffer_mut(buffer)?.styles = regions;
        Ok(())
    }

    fn mark(&self, buffer: BufferId, name: &str) -> Option<Position> {
        self.buffers.get(&buffer)?.marks.get(name).copied()
    }

    fn set_mark(
        &mut self,
        buffer: BufferId,
        name: &str,
        position: Position,
    ) -> Result<(), HostError> {
        self.buffer_mut(buffer)?
            .marks
            .insert(name.to_string(), position);
        Ok(())
    }

    fn flag(&self, buffer: BufferId, name: &str) -> Option<bool> {
        self.buffers.get(&buffer)?.flags.get(name).copied()
    }

    fn set_flag(&mut self, buffer: BufferId, name: &str, value: bool) -> Result<(), HostError> {
        self.buffer_mut(buffer)?.flags.insert(name.to_string(), value);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        let Some(data) = self.buffers.remove(&buffer) else {
            return;
        };
        debug!(buffer = %buffer, listed = data.options.listed, "buffer deleted");

        if let Some(channel) = data.channel {
            if let Err(e) = self.terminals.stop(channel) {
                debug!(channel = %channel, error = %e, "terminal already stopped");
            }
            self.terminals.release(channel);
        }

        let showing: Vec<SurfaceId> = self
            .surfaces
            .iter()
            .filter(|(_, s)| s.buffer == buffer)
            .map(|(id, _)| *id)
            .collect();
        for surface in showing {
            if surface == self.main {
                let replacement = self.create_buffer(BufferOptions::listed());
                if let Some(main) = self.surfaces.get_mut(&surface) {
                    main.buffer = replacement;
                    main.cursor = Position::START;
                }
            } else {
                self.close_surface(surface);
            }
        }

        self.events.push(HostEvent::BufferRemoved(buffer));
    }
}

impl<T: Terminals> Channels for MemoryHost<T> {
    fn resolve_executable(&self, program: &str) -> Option<PathBuf> {
        self.terminals.resolve(program)
    }

    fn open_terminal(
        &mut self,
        buffer: BufferId,
        command: &SpawnCommand,
    ) -> Result<ChannelId, HostError> {
        if !self.buffers.contains_key(&buffer) {
            return Err(HostError::UnknownBuffer(buffer));
        }
        let channel = ChannelId(self.allocate());
        self.terminals.spawn(channel, command, self.geometry)?;
        self.buffer_mut(buffer)?.channel = Some(channel);
        Ok(channel)
    }

    fn write(&mut self, channel: ChannelId, bytes: &[u8]) -> Result<(), HostError> {
        self.terminals.write(channel, bytes)
    }

    fn is_running(&mut self, channel: ChannelId) -> bool {
        self.terminals.is_running(channel)
    }

    fn stop(&mut self, channel: ChannelId) -> Result<(), HostError> {
        self.terminals.stop(channel)
    }

    fn terminal_channel(&self, buffer: BufferId) -> Option<ChannelId> {
        self.buffers.get(&buffer).and_then(|b| b.channel)
    }
}

impl<T: Terminals> Notifier for MemoryHost<T> {
    fn notify(&mut self, level: Level, message: &str) {
        if level == Level::Error {
            warn!(notification = %message, "error surfaced to user");
        }
        if self.messages.len() == NOTIFICATION_HISTORY {
            self.messages.pop_front();
        }
        self.messages.push_back((level, message.to_string()));
        self.notified += 1;
    }
}

impl<T: Terminals> Host for MemoryHost<T> {
    fn poll_events(&mut self) -> Vec<HostEvent> {
        for (channel, code) in self.terminals.poll_exits() {
            self.events.push(HostEvent::ProcessExited { channel, code });
        }
        std::mem::take(&mut self.events)
    }
}
