//! Playback-related type definitions

use serde::{Deserialize, Serialize};

/// Observable playback state of a session
///
/// A session that is resolving the next track reports `Idle` until the
/// stream has actually started.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing is streaming
    #[default]
    Idle,
    /// A stream is running
    Playing,
    /// A stream exists but is paused
    Paused,
}

impl PlaybackState {
    /// True while a stream exists (Playing or Paused)
    pub fn has_stream(self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_stream() {
        assert!(!PlaybackState::Idle.has_stream());
        assert!(PlaybackState::Playing.has_stream());
        assert!(PlaybackState::Paused.has_stream());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&PlaybackState::Paused).unwrap();
        assert_eq!(json, "\"paused\"");
        let back: PlaybackState = serde_json::from_str("\"idle\"").unwrap();
        assert_eq!(back, PlaybackState::Idle);
    }
}
