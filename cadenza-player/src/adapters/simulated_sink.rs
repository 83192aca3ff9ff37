//! Timer-driven audio sink
//!
//! Plays nothing. Each stream is a task that sleeps for the configured
//! track length (minus time spent paused) and then reports `Finished`.
//! Stopping reports `Stopped` through the same notifier.

use crate::error::{Error, Result};
use crate::playback::events::StreamEnd;
use crate::playback::sink::{AudioSink, AudioSinkFactory, CompletionNotifier, StreamRequest};
use crate::session::SessionKey;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Playing,
    Paused,
    Stopped,
}

const STATUS_IDLE: u8 = 0;
const STATUS_PLAYING: u8 = 1;
const STATUS_PAUSED: u8 = 2;

struct ActiveStream {
    control: watch::Sender<Control>,
    task: JoinHandle<()>,
}

pub struct SimulatedSink {
    key: SessionKey,
    track_length: Duration,
    current: Mutex<Option<ActiveStream>>,
    status: Arc<AtomicU8>,
    /// f32 bits
    volume: AtomicU32,
    disconnected: AtomicBool,
}

impl SimulatedSink {
    pub fn new(key: SessionKey, track_length: Duration) -> Self {
        Self {
            key,
            track_length,
            current: Mutex::new(None),
            status: Arc::new(AtomicU8::new(STATUS_IDLE)),
            volume: AtomicU32::new(1.0f32.to_bits()),
            disconnected: AtomicBool::new(false),
        }
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    async fn signal(&self, control: Control) -> Result<()> {
        let current = self.current.lock().await;
        let stream = current
            .as_ref()
            .filter(|s| !s.task.is_finished())
            .ok_or_else(|| Error::Sink("no active stream".to_string()))?;
        stream.control.send_replace(control);
        Ok(())
    }
}

#[async_trait]
impl AudioSink for SimulatedSink {
    async fn start(&self, request: StreamRequest, notifier: CompletionNotifier) -> Result<()> {
        if self.disconnected.load(Ordering::Acquire) {
            return Err(Error::Sink(format!("{} is disconnected", self.key)));
        }

        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            previous.control.send_replace(Control::Stopped);
        }

        info!(
            session = %self.key,
            stream_id = request.stream_id.0,
            title = request.title.as_str(),
            volume = request.options.volume,
            reconnect = request.options.reconnect,
            "Simulated stream started"
        );
        self.volume
            .store(request.options.volume.to_bits(), Ordering::Relaxed);

        let (control, rx) = watch::channel(Control::Playing);
        self.status.store(STATUS_PLAYING, Ordering::Release);
        let task = tokio::spawn(run_stream(
            self.track_length,
            rx,
            notifier,
            Arc::clone(&self.status),
        ));
        *current = Some(ActiveStream { control, task });
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.signal(Control::Paused).await?;
        self.status.store(STATUS_PAUSED, Ordering::Release);
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        self.signal(Control::Playing).await?;
        self.status.store(STATUS_PLAYING, Ordering::Release);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(stream) = self.current.lock().await.take() {
            stream.control.send_replace(Control::Stopped);
        }
        self.status.store(STATUS_IDLE, Ordering::Release);
        Ok(())
    }

    async fn set_volume(&self, fraction: f32) -> Result<()> {
        self.volume.store(fraction.to_bits(), Ordering::Relaxed);
        debug!(session = %self.key, fraction, "Simulated volume set");
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.status.load(Ordering::Acquire) == STATUS_PLAYING
    }

    fn is_paused(&self) -> bool {
        self.status.load(Ordering::Acquire) == STATUS_PAUSED
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnected.store(true, Ordering::Release);
        self.stop().await?;
        info!(session = %self.key, "Simulated sink disconnected");
        Ok(())
    }
}

async fn run_stream(
    length: Duration,
    mut control: watch::Receiver<Control>,
    notifier: CompletionNotifier,
    status: Arc<AtomicU8>,
) {
    let mut remaining = length;
    let end = loop {
        let state = *control.borrow_and_update();
        match state {
            Control::Stopped => break StreamEnd::Stopped,
            Control::Paused => {
                if control.changed().await.is_err() {
                    break StreamEnd::Stopped;
                }
            }
            Control::Playing => {
                let started = Instant::now();
                tokio::select! {
                    _ = tokio::time::sleep(remaining) => {
                        status.store(STATUS_IDLE, Ordering::Release);
                        break StreamEnd::Finished;
                    }
                    changed = control.changed() => {
                        remaining = remaining.saturating_sub(started.elapsed());
                        if changed.is_err() {
                            break StreamEnd::Stopped;
                        }
                    }
                }
            }
        }
    };
    notifier.notify(end);
}

/// Opens a `SimulatedSink` per session
pub struct SimulatedSinkFactory {
    track_length: Duration,
}

impl SimulatedSinkFactory {
    pub fn new(track_length: Duration) -> Self {
        Self { track_length }
    }
}

#[async_trait]
impl AudioSinkFactory for SimulatedSinkFactory {
    async fn connect(&self, key: &SessionKey) -> Result<Arc<dyn AudioSink>> {
        debug!(session = %key, "Opening simulated sink");
        Ok(Arc::new(SimulatedSink::new(key.clone(), self.track_length)))
    }
}
