//! Controller wired to mocks
//!
//! The harness keeps the completion receiver instead of spawning a
//! completion task, so tests decide exactly when a stream end is handled.

use cadenza_common::config::PlaybackConfig;
use cadenza_common::events::{CadenzaEvent, EventBus};
use cadenza_player::error::Result;
use cadenza_player::playback::{
    AdvanceOutcome, BoundedResolver, PlaybackController, ResolvedTrack, StreamEnded,
};
use cadenza_player::SessionKey;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use super::mock_resolver::MockResolver;
use super::mock_sink::MockSink;

/// Track a `MockResolver` produces for `query`
pub fn track_for(query: &str) -> ResolvedTrack {
    ResolvedTrack::new(format!("https://media.example/{}", query), query)
}

pub struct Harness {
    pub controller: Arc<PlaybackController>,
    pub completions: mpsc::UnboundedReceiver<StreamEnded>,
    pub sink: Arc<MockSink>,
    pub resolver: Arc<MockResolver>,
    pub events: broadcast::Receiver<CadenzaEvent>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(PlaybackConfig::default())
    }

    pub fn with_settings(settings: PlaybackConfig) -> Self {
        let sink = Arc::new(MockSink::new());
        let resolver = Arc::new(MockResolver::new());
        let bus = EventBus::new(64);
        let events = bus.subscribe();
        let (controller, completions) = PlaybackController::new(
            SessionKey::from("guild-1"),
            sink.clone(),
            BoundedResolver::new(resolver.clone(), Duration::from_secs(5)),
            bus,
            settings,
        );
        Self {
            controller,
            completions,
            sink,
            resolver,
            events,
        }
    }

    /// Hand the next completion message to the controller
    pub async fn deliver_next(&mut self) -> Result<AdvanceOutcome> {
        let ended = tokio::time::timeout(Duration::from_secs(1), self.completions.recv())
            .await
            .expect("no completion message arrived")
            .expect("completion channel closed");
        self.controller.on_stream_ended(ended).await
    }

    /// Hand over every pending completion message, returning the outcomes
    pub async fn deliver_pending(&mut self) -> Vec<AdvanceOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(ended) = self.completions.try_recv() {
            outcomes.push(self.controller.on_stream_ended(ended).await.unwrap());
        }
        outcomes
    }

    /// Events published so far
    pub fn drain_events(&mut self) -> Vec<CadenzaEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
