//! Internal playback events (sink → controller)
//!
//! These never leave the crate as-is; the controller turns the ones that
//! matter into `CadenzaEvent`s on the EventBus.

/// Identifier of one started stream within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u64);

/// How a stream ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// Reached the end of the media
    Finished,
    /// Stopped on request (stop, skip, leave); never triggers advance
    Stopped,
    /// Transport failure mid-stream; handled like `Finished`
    Failed(String),
}

/// Completion message delivered into the session's serialized context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEnded {
    pub stream_id: StreamId,
    pub end: StreamEnd,
}
