//! # Cadenza Player Library (cadenza-player)
//!
//! Playback orchestration core for chat-bot music sessions.
//!
//! **Purpose:** Keep one authoritative playback state per session while
//! user commands and asynchronous "track finished" notifications arrive
//! concurrently, and browse long listings through an interactive,
//! timeout-bounded paginator.
//!
//! **Architecture:** `SessionManager` → per-session `PlaybackController`
//! (queue, resolver, audio sink) with a completion task feeding sink
//! notifications back in. Chat transport, media backend and track
//! resolution are traits implemented outside the core; `adapters` holds
//! in-process implementations used by the console harness.

pub mod adapters;
pub mod commands;
pub mod error;
pub mod messaging;
pub mod paginator;
pub mod playback;
pub mod session;

pub use commands::{Command, CommandContext, CommandRouter, Reply};
pub use error::{Error, ResolutionError, Result};
pub use paginator::{InteractivePaginator, PaginationOutcome, Termination};
pub use playback::{PlaybackController, ResolvedTrack, Track};
pub use session::{Session, SessionKey, SessionManager};
