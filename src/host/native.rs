//! Native host: real processes in pseudo-terminals
//!
//! Each terminal channel owns a PTY pair, a child process and a `vt100`
//! parser holding the emulated screen. A reader thread per channel forwards
//! raw output to the UI loop, which feeds it back through
//! [`NativeHost::feed`]. Exits are discovered with a non-blocking
//! `try_wait` whenever the host is polled.
//!
//! A channel is dropped, closing its PTY and freeing its screen, once its
//! exit has been reported and its buffer has been deleted.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;

use portable_pty::{native_pty_system, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::HostError;
use crate::host::memory::{MemoryHost, Terminals};
use crate::host::{BufferId, Channels, ChannelId, SpawnCommand, Geometry};

/// Raw output forwarded from a PTY reader thread
#[derive(Debug)]
pub enum PtyMessage {
    Output { channel: ChannelId, bytes: Vec<u8> },
    Eof(ChannelId),
}

struct PtyChannel {
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn portable_pty::Child + Send + Sync>,
    parser: vt100::Parser,
    exited: bool,
    /// Buffer deleted; drop as soon as the exit is reported
    released: bool,
}

/// Rows left for terminal content once the message line is reserved
fn pane_size(size: Geometry) -> PtySize {
    PtySize {
        rows: size.lines.saturating_sub(1).max(1),
        cols: size.columns.max(1),
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// PTY-backed process backend
pub struct PtyTerminals {
    channels: HashMap<ChannelId, PtyChannel>,
    output_tx: mpsc::UnboundedSender<PtyMessage>,
}

impl PtyTerminals {
    pub fn new(output_tx: mpsc::UnboundedSender<PtyMessage>) -> Self {
        Self {
            channels: HashMap::new(),
            output_tx,
        }
    }

    fn channel_mut(&mut self, channel: ChannelId) -> Result<&mut PtyChannel, HostError> {
        self.channels
            .get_mut(&channel)
            .ok_or(HostError::UnknownChannel(channel))
    }

    pub fn screen(&self, channel: ChannelId) -> Option<&vt100::Screen> {
        self.channels.get(&channel).map(|c| c.parser.screen())
    }

    fn feed(&mut self, message: PtyMessage) {
        match message {
            PtyMessage::Output { channel, bytes } => {
                if let Some(pty) = self.channels.get_mut(&channel) {
                    pty.parser.process(&bytes);
                }
            }
            PtyMessage::Eof(channel) => {
                debug!(channel = %channel, "pty reached end of output");
            }
        }
    }
}

impl Terminals for PtyTerminals {
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }

    fn spawn(
        &mut self,
        channel: ChannelId,
        command: &SpawnCommand,
        size: Geometry,
    ) -> Result<(), HostError> {
        let pty_size = pane_size(size);
        let pair = native_pty_system()
            .openpty(pty_size)
            .map_err(|e| HostError::Pty(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&command.program);
        cmd.args(&command.args);
        cmd.cwd(&command.cwd);
        cmd.env("TERM", "xterm-256color");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| HostError::Pty(e.to_string()))?;
        // Only the master side stays open in this process
        drop(pair.slave);

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| HostError::Pty(e.to_string()))?;
        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| HostError::Pty(e.to_string()))?;

        let tx = self.output_tx.clone();
        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        let bytes = buf[..n].to_vec();
                        if tx.send(PtyMessage::Output { channel, bytes }).is_err() {
                            return;
                        }
                    }
                }
            }
            let _ = tx.send(PtyMessage::Eof(channel));
        });

        info!(
            channel = %channel,
            program = %command.program.display(),
            cwd = %command.cwd.display(),
            "terminal started"
        );

        self.channels.insert(
            channel,
            PtyChannel {
                master: pair.master,
                writer,
                child,
                parser: vt100::Parser::new(pty_size.rows, pty_size.cols, 0),
                exited: false,
                released: false,
            },
        );
        Ok(())
    }

    fn write(&mut self, channel: ChannelId, bytes: &[u8]) -> Result<(), HostError> {
        let pty = self.channel_mut(channel)?;
        pty.writer.write_all(bytes)?;
        pty.writer.flush()?;
        Ok(())
    }

    fn is_running(&mut self, channel: ChannelId) -> bool {
        self.channels
            .get_mut(&channel)
            .map(|pty| !pty.exited && matches!(pty.child.try_wait(), Ok(None)))
            .unwrap_or(false)
    }

    fn stop(&mut self, channel: ChannelId) -> Result<(), HostError> {
        let pty = self.channel_mut(channel)?;
        pty.child.kill()?;
        Ok(())
    }

    fn release(&mut self, channel: ChannelId) {
        let Some(pty) = self.channels.get_mut(&channel) else {
            return;
        };
        if pty.exited {
            self.channels.remove(&channel);
            debug!(channel = %channel, "terminal released");
        } else {
            pty.released = true;
        }
    }

    fn poll_exits(&mut self) -> Vec<(ChannelId, i32)> {
        let mut exits = Vec::new();
        for (channel, pty) in self.channels.iter_mut() {
            if pty.exited {
                continue;
            }
            match pty.child.try_wait() {
                Ok(Some(status)) => {
                    pty.exited = true;
                    exits.push((*channel, status.exit_code() as i32));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(channel = %channel, error = %e, "failed to query process status");
                }
            }
        }
        self.channels.retain(|channel, pty| {
            let done = pty.exited && pty.released;
            if done {
                debug!(channel = %channel, "terminal released");
            }
            !done
        });
        exits
    }

    fn resize(&mut self, size: Geometry) {
        let pty_size = pane_size(size);
        for (channel, pty) in self.channels.iter_mut() {
            pty.parser
                .screen_mut()
                .set_size(pty_size.rows, pty_size.cols);
            if let Err(e) = pty.master.resize(pty_size) {
                debug!(channel = %channel, error = %e, "failed to resize pty");
            }
        }
    }
}

/// In-memory display backed by real pseudo-terminals
pub type NativeHost = MemoryHost<PtyTerminals>;

impl NativeHost {
    pub fn new(geometry: Geometry, output_tx: mpsc::UnboundedSender<PtyMessage>) -> Self {
        MemoryHost::with_terminals(PtyTerminals::new(output_tx), geometry)
    }

    /// Apply output forwarded by a reader thread
    pub fn feed(&mut self, message: PtyMessage) {
        self.terminals_mut().feed(message);
    }

    /// Emulated screen of a terminal buffer
    pub fn screen(&self, buffer: BufferId) -> Option<&vt100::Screen> {
        let channel = self.terminal_channel(buffer)?;
        self.terminals().screen(channel)
    }
}
