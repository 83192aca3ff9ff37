//! Error types for cadenza-player
//!
//! Every failure a command can hit maps to exactly one variant here. All of
//! them are recoverable: they are reported back to the command layer for
//! display and never leave a session half-mutated.

use thiserror::Error;

/// Why a query could not be turned into a playable track
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Resolver answered but found nothing playable
    #[error("no match for '{0}'")]
    NoMatch(String),

    /// Resolver could not be reached or failed mid-request
    #[error("network failure: {0}")]
    Network(String),

    /// Resolver did not answer within the configured timeout
    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Main error type for cadenza-player
#[derive(Error, Debug)]
pub enum Error {
    /// Operation not legal in the current playback state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Loop or now-playing requested with nothing playing
    #[error("No track is playing right now")]
    NoActiveTrack,

    /// 1-based queue index outside `[1, len]`
    #[error("Invalid index {index}: queue has {len} entries")]
    InvalidIndex { index: i64, len: usize },

    /// Query could not be resolved
    #[error("Could not resolve '{query}': {source}")]
    Resolution {
        query: String,
        #[source]
        source: ResolutionError,
    },

    /// No session/voice connection for this channel
    #[error("Not connected to a voice channel")]
    NotConnected,

    /// Volume must be a finite percentage >= 0
    #[error("Invalid volume: {0}")]
    InvalidVolume(f32),

    /// Text did not name a known command
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Command argument missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Audio backend rejected a call
    #[error("Audio sink error: {0}")]
    Sink(String),

    /// Messaging transport failure
    #[error("Messaging error: {0}")]
    Messaging(String),

    /// Configuration errors from cadenza-common
    #[error(transparent)]
    Common(#[from] cadenza_common::Error),
}

impl Error {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState(message.into())
    }

    pub fn resolution(query: &str, source: ResolutionError) -> Self {
        Error::Resolution {
            query: query.to_string(),
            source,
        }
    }

    /// Short user-facing title for error replies
    pub fn title(&self) -> &'static str {
        match self {
            Error::InvalidState(_) => "Error",
            Error::NoActiveTrack => "Nothing Playing",
            Error::InvalidIndex { .. } => "Invalid Index",
            Error::Resolution { .. } => "Not Found",
            Error::NotConnected => "Not Connected",
            Error::InvalidVolume(_) => "Invalid Volume",
            Error::UnknownCommand(_) | Error::InvalidArgument(_) => "Usage",
            Error::Sink(_) | Error::Messaging(_) | Error::Common(_) => "Error",
        }
    }
}

/// Convenience Result type using cadenza-player Error
pub type Result<T> = std::result::Result<T, Error>;
