//! Deterministic resolver
//!
//! Every query resolves to `track_for(query)` unless a failure was
//! registered for it. Closing the gate parks resolutions until it opens
//! again, which lets tests issue commands while a resolution is in flight.

use async_trait::async_trait;
use cadenza_player::error::ResolutionError;
use cadenza_player::playback::{ResolvedTrack, TrackResolver};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{watch, Notify};

use super::harness::track_for;

pub struct MockResolver {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, ResolutionError>>,
    gate: watch::Sender<bool>,
    entered: Notify,
}

impl MockResolver {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            gate,
            entered: Notify::new(),
        }
    }

    pub fn fail_on(&self, query: &str, error: ResolutionError) {
        self.failures
            .lock()
            .unwrap()
            .insert(query.to_string(), error);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    /// Wait until a resolution has started
    pub async fn entered(&self) {
        self.entered.notified().await;
    }
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackResolver for MockResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack, ResolutionError> {
        self.calls.lock().unwrap().push(query.to_string());
        self.entered.notify_one();

        let mut gate = self.gate.subscribe();
        while !*gate.borrow_and_update() {
            if gate.changed().await.is_err() {
                break;
            }
        }

        let failure = self.failures.lock().unwrap().get(query).cloned();
        match failure {
            Some(error) => Err(error),
            None => Ok(track_for(query)),
        }
    }
}
