use thiserror::Error;

use crate::host::{BufferId, ChannelId, Level, SurfaceId};

/// Failures reported by a host port
#[derive(Error, Debug)]
pub enum HostError {
    #[error("unknown buffer: {0}")]
    UnknownBuffer(BufferId),

    #[error("unknown surface: {0}")]
    UnknownSurface(SurfaceId),

    #[error("unknown channel: {0}")]
    UnknownChannel(ChannelId),

    #[error("pty error: {0}")]
    Pty(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// User-facing failures of deck operations
///
/// Every variant is reported through the notification sink at the point
/// where it is detected; none of them is fatal to the process.
#[derive(Error, Debug)]
pub enum DeckError {
    #[error("invalid spawn variant '{0}' (expected fresh, resume or continue)")]
    InvalidVariant(String),

    #[error("executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("failed to start session: {0}")]
    SpawnFailed(String),

    #[error("terminal for session {0} is gone")]
    TerminalGone(ChannelId),

    #[error("nothing to send: the prompt is empty")]
    EmptyComposition,

    #[error("no sessions in {0}")]
    NoSessionsInScope(String),

    #[error("no session number {index} (have {count})")]
    InvalidSelector { index: usize, count: usize },

    #[error("failed to serialize deck state: {0}")]
    Dump(#[from] serde_json::Error),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl DeckError {
    /// Notification level used when the error is surfaced to the user
    pub fn level(&self) -> Level {
        match self {
            DeckError::EmptyComposition
            | DeckError::NoSessionsInScope(_)
            | DeckError::InvalidSelector { .. }
            | DeckError::TerminalGone(_) => Level::Warn,
            DeckError::InvalidVariant(_)
            | DeckError::ExecutableNotFound(_)
            | DeckError::SpawnFailed(_)
            | DeckError::Dump(_)
            | DeckError::Host(_) => Level::Error,
        }
    }
}
