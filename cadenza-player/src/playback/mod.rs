//! Playback engine: tracks, queue, resolution, sink interface and the
//! per-session controller

pub mod controller;
pub mod events;
pub mod queue;
pub mod resolver;
pub mod sink;
pub mod track;

pub use controller::{AdvanceOutcome, PlayOutcome, PlaybackController, SessionSnapshot};
pub use events::{StreamEnd, StreamEnded, StreamId};
pub use queue::QueueStore;
pub use resolver::{BoundedResolver, TrackResolver};
pub use sink::{AudioSink, AudioSinkFactory, CompletionNotifier, StreamOptions, StreamRequest};
pub use track::{ResolvedTrack, Track};
