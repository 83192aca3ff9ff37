//! Audio sink interface
//!
//! The sink is the media backend that actually streams audio into a voice
//! connection. It runs in its own execution context, so the end of a stream
//! is never reported by calling back into the controller directly: every
//! started stream receives a `CompletionNotifier` that posts exactly one
//! `StreamEnded` message into the owning session's channel.

use crate::error::Result;
use crate::playback::events::{StreamEnd, StreamEnded, StreamId};
use crate::session::SessionKey;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Backend options for one stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOptions {
    /// Gain as a fraction (1.0 = unity)
    pub volume: f32,
    /// Reconnect dropped network streams
    pub reconnect: bool,
    /// Maximum reconnect back-off
    pub reconnect_delay_max: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            reconnect: true,
            reconnect_delay_max: Duration::from_secs(5),
        }
    }
}

/// Everything the sink needs to start streaming
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub stream_id: StreamId,
    pub url: String,
    pub title: String,
    pub options: StreamOptions,
}

/// One-shot completion handle for a started stream
///
/// `notify` consumes the handle, so a stream can only ever report one end.
#[derive(Debug)]
pub struct CompletionNotifier {
    stream_id: StreamId,
    tx: mpsc::UnboundedSender<StreamEnded>,
}

impl CompletionNotifier {
    pub(crate) fn new(stream_id: StreamId, tx: mpsc::UnboundedSender<StreamEnded>) -> Self {
        Self { stream_id, tx }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Report how the stream ended. Callable from any thread.
    pub fn notify(self, end: StreamEnd) {
        debug!(stream_id = self.stream_id.0, ?end, "Stream end reported");
        // Session already torn down when the receiver is gone
        let _ = self.tx.send(StreamEnded {
            stream_id: self.stream_id,
            end,
        });
    }
}

/// Media backend for one voice connection
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Start streaming; the notifier must be used once when the stream ends
    async fn start(&self, request: StreamRequest, notifier: CompletionNotifier) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    /// Stop the current stream; its notifier reports `StreamEnd::Stopped`
    async fn stop(&self) -> Result<()>;

    /// Gain as a fraction; the sink may clamp
    async fn set_volume(&self, fraction: f32) -> Result<()>;

    fn is_playing(&self) -> bool;

    fn is_paused(&self) -> bool;

    /// Close the voice connection
    async fn disconnect(&self) -> Result<()>;
}

/// Opens sink connections for new sessions
#[async_trait]
pub trait AudioSinkFactory: Send + Sync {
    async fn connect(&self, key: &SessionKey) -> Result<Arc<dyn AudioSink>>;
}
