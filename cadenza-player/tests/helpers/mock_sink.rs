//! Recording audio sink
//!
//! Streams never end on their own; tests end them with `finish`, `fail`
//! or `backend_stop`. A commanded `stop` reports `Stopped` immediately,
//! like a real backend would.

use async_trait::async_trait;
use cadenza_player::error::{Error, Result};
use cadenza_player::playback::{
    AudioSink, AudioSinkFactory, CompletionNotifier, StreamEnd, StreamRequest,
};
use cadenza_player::SessionKey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Start { title: String, volume: f32 },
    Pause,
    Resume,
    Stop,
    SetVolume(f32),
    Disconnect,
}

#[derive(Default)]
pub struct MockSink {
    calls: Mutex<Vec<SinkCall>>,
    current: Mutex<Option<CompletionNotifier>>,
    paused: AtomicBool,
    fail_next_start: AtomicBool,
    disconnected: AtomicBool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Titles of every started stream, in order
    pub fn started_titles(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Start { title, .. } => Some(title),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &SinkCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    pub fn fail_next_start(&self) {
        self.fail_next_start.store(true, Ordering::SeqCst);
    }

    /// Current stream reaches its end
    pub fn finish(&self) -> bool {
        self.end_current(StreamEnd::Finished)
    }

    /// Current stream breaks mid-way
    pub fn fail(&self, reason: &str) -> bool {
        self.end_current(StreamEnd::Failed(reason.to_string()))
    }

    /// Backend stops the stream without being asked
    pub fn backend_stop(&self) -> bool {
        self.end_current(StreamEnd::Stopped)
    }

    /// Take the current notifier so a test can fire it late
    pub fn take_notifier(&self) -> Option<CompletionNotifier> {
        self.current.lock().unwrap().take()
    }

    fn end_current(&self, end: StreamEnd) -> bool {
        match self.take_notifier() {
            Some(notifier) => {
                notifier.notify(end);
                true
            }
            None => false,
        }
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioSink for MockSink {
    async fn start(&self, request: StreamRequest, notifier: CompletionNotifier) -> Result<()> {
        if self.fail_next_start.swap(false, Ordering::SeqCst) {
            return Err(Error::Sink("device unavailable".to_string()));
        }
        self.record(SinkCall::Start {
            title: request.title,
            volume: request.options.volume,
        });
        self.paused.store(false, Ordering::SeqCst);
        *self.current.lock().unwrap() = Some(notifier);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record(SinkCall::Pause);
        self.paused.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.record(SinkCall::Resume);
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.record(SinkCall::Stop);
        self.paused.store(false, Ordering::SeqCst);
        self.end_current(StreamEnd::Stopped);
        Ok(())
    }

    async fn set_volume(&self, fraction: f32) -> Result<()> {
        self.record(SinkCall::SetVolume(fraction));
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.current.lock().unwrap().is_some() && !self.paused.load(Ordering::SeqCst)
    }

    fn is_paused(&self) -> bool {
        self.current.lock().unwrap().is_some() && self.paused.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<()> {
        self.record(SinkCall::Disconnect);
        self.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one `MockSink` per session key and keeps them for inspection
#[derive(Default)]
pub struct MockSinkFactory {
    sinks: Mutex<HashMap<String, Arc<MockSink>>>,
    connects: AtomicUsize,
    connect_delay: Option<Duration>,
    fail_next_connect: AtomicBool,
}

impl MockSinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slow connects widen the window for creation races
    pub fn with_connect_delay(delay: Duration) -> Self {
        Self {
            connect_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn sink(&self, key: &str) -> Option<Arc<MockSink>> {
        self.sinks.lock().unwrap().get(key).cloned()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn fail_next_connect(&self) {
        self.fail_next_connect.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioSinkFactory for MockSinkFactory {
    async fn connect(&self, key: &SessionKey) -> Result<Arc<dyn AudioSink>> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next_connect.swap(false, Ordering::SeqCst) {
            return Err(Error::Sink("voice connect refused".to_string()));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        let sink = Arc::new(MockSink::new());
        self.sinks
            .lock()
            .unwrap()
            .insert(key.to_string(), Arc::clone(&sink));
        Ok(sink)
    }
}
