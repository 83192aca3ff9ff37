//! Playback controller - per-session state machine
//!
//! **Responsibilities:**
//! - Own the session's queue, current track, loop flag and playback state
//! - Drive the audio sink (start, pause, resume, stop, volume)
//! - Run the advance algorithm on skip and on stream completion
//!
//! All state sits behind one async mutex, so user commands and the
//! completion path never interleave partial mutations. Track resolution is
//! the exception: it runs with the lock released, and its result is only
//! committed if no stop/skip/leave happened in the meantime (tracked by
//! `generation`).

use crate::error::{Error, Result};
use crate::playback::events::{StreamEnd, StreamEnded, StreamId};
use crate::playback::queue::QueueStore;
use crate::playback::resolver::BoundedResolver;
use crate::playback::sink::{AudioSink, CompletionNotifier, StreamOptions, StreamRequest};
use crate::playback::track::{ResolvedTrack, Track};
use crate::session::SessionKey;
use cadenza_common::config::{EnqueuePosition, PlaybackConfig};
use cadenza_common::events::{CadenzaEvent, EventBus, PlaybackState, QueueChangeTrigger};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Result of a `play` command
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// Session was idle; the track is now streaming
    Started(ResolvedTrack),
    /// Something was already playing; the track was queued at this 1-based position
    Queued { track: Track, position: usize },
    /// A stop, skip or leave arrived while the track was being resolved
    Cancelled,
}

/// Result of the advance algorithm
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Next queue entry is now streaming
    Started(ResolvedTrack),
    /// Loop flag replayed the current track
    Replayed(ResolvedTrack),
    /// Nothing left to play; session is idle
    QueueEmpty,
    /// A later stop/skip/leave made this advance obsolete
    Superseded,
    /// Completion for a stream that is no longer current
    Ignored,
}

/// Consistent read of a session's playback state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub current: Option<ResolvedTrack>,
    pub loop_flag: bool,
    /// Volume in percent
    pub volume_pct: f32,
    pub queue_len: usize,
}

struct ControllerState {
    queue: QueueStore,
    current: Option<ResolvedTrack>,
    loop_flag: bool,
    state: PlaybackState,
    /// Bumped by stop, skip and leave; stale resolutions are discarded
    generation: u64,
    /// Generation of the advance currently resolving its next track
    advancing: Option<u64>,
    /// Resolutions in flight (play or advance)
    resolving: usize,
    next_stream_id: u64,
    active_stream: Option<StreamId>,
    /// Gain fraction applied to new streams
    volume: f32,
    closed: bool,
}

/// Per-session playback state machine
pub struct PlaybackController {
    key: SessionKey,
    sink: Arc<dyn AudioSink>,
    resolver: BoundedResolver,
    events: EventBus,
    settings: PlaybackConfig,
    completion_tx: mpsc::UnboundedSender<StreamEnded>,
    inner: Mutex<ControllerState>,
}

impl PlaybackController {
    /// Create a controller and the receiving end of its completion channel
    ///
    /// The caller owns the receiver and must feed every message back into
    /// `on_stream_ended`.
    pub fn new(
        key: SessionKey,
        sink: Arc<dyn AudioSink>,
        resolver: BoundedResolver,
        events: EventBus,
        settings: PlaybackConfig,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<StreamEnded>) {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let volume = settings.default_volume_pct / 100.0;
        let controller = Arc::new(Self {
            key,
            sink,
            resolver,
            events,
            settings,
            completion_tx,
            inner: Mutex::new(ControllerState {
                queue: QueueStore::new(),
                current: None,
                loop_flag: false,
                state: PlaybackState::Idle,
                generation: 0,
                advancing: None,
                resolving: 0,
                next_stream_id: 0,
                active_stream: None,
                volume,
                closed: false,
            }),
        });
        (controller, completion_rx)
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Play a track, or queue it if something is already playing
    pub async fn play(&self, track: Track) -> Result<PlayOutcome> {
        info!(session = %self.key, track = track.label(), "Play command received");
        let mut st = self.lock_open().await?;

        if st.state.has_stream() || st.advancing.is_some() {
            return Ok(self.enqueue_locked(&mut st, track));
        }

        let resolved = match track {
            Track::Resolved(resolved) => resolved,
            Track::Unresolved { query } => {
                let generation = st.generation;
                st.resolving += 1;
                drop(st);

                let result = self
                    .resolver
                    .resolve_track(Track::Unresolved { query })
                    .await;

                st = self.inner.lock().await;
                st.resolving -= 1;
                let resolved = result?;

                if st.closed || st.generation != generation {
                    info!(
                        session = %self.key,
                        title = resolved.title.as_str(),
                        "Play cancelled while resolving"
                    );
                    return Ok(PlayOutcome::Cancelled);
                }
                if st.state.has_stream() || st.advancing.is_some() {
                    return Ok(self.enqueue_locked(&mut st, resolved.into()));
                }
                resolved
            }
        };

        self.start_stream(&mut st, resolved.clone(), false).await?;
        Ok(PlayOutcome::Started(resolved))
    }

    /// Playing → Paused
    pub async fn pause(&self) -> Result<()> {
        info!(session = %self.key, "Pause command received");
        let mut st = self.lock_open().await?;
        if st.state != PlaybackState::Playing {
            return Err(Error::invalid_state(format!(
                "cannot pause while {}",
                st.state
            )));
        }

        self.sink.pause().await?;
        self.set_state(&mut st, PlaybackState::Paused);
        Ok(())
    }

    /// Paused → Playing
    pub async fn resume(&self) -> Result<()> {
        info!(session = %self.key, "Resume command received");
        let mut st = self.lock_open().await?;
        if st.state != PlaybackState::Paused {
            return Err(Error::invalid_state(format!(
                "cannot resume while {}",
                st.state
            )));
        }

        self.sink.resume().await?;
        self.set_state(&mut st, PlaybackState::Playing);
        Ok(())
    }

    /// Stop playback and clear the queue, current track and loop flag
    pub async fn stop(&self) -> Result<()> {
        info!(session = %self.key, "Stop command received");
        let mut st = self.lock_open().await?;

        if !st.state.has_stream() {
            if st.resolving == 0 && st.advancing.is_none() {
                return Err(Error::invalid_state("nothing is playing or paused"));
            }
            debug!(session = %self.key, "Stop cancels pending resolution");
        }

        st.generation += 1;
        st.advancing = None;
        self.stop_stream(&mut st).await;
        self.reset_locked(&mut st);
        Ok(())
    }

    /// Skip the current track (clearing loop) and advance
    ///
    /// From idle this starts playback from the queue.
    pub async fn skip(&self) -> Result<AdvanceOutcome> {
        info!(session = %self.key, "Skip command received");
        let mut st = self.lock_open().await?;

        st.generation += 1;
        st.advancing = None;
        st.loop_flag = false;
        self.stop_stream(&mut st).await;

        self.advance(st).await
    }

    /// Flip the loop flag; returns the new value
    pub async fn toggle_loop(&self) -> Result<bool> {
        let mut st = self.lock_open().await?;
        if st.current.is_none() {
            return Err(Error::NoActiveTrack);
        }

        st.loop_flag = !st.loop_flag;
        info!(session = %self.key, loop_flag = st.loop_flag, "Loop toggled");
        Ok(st.loop_flag)
    }

    /// Set volume in percent (100 = unity); only while a stream exists
    ///
    /// Returns the gain fraction handed to the sink.
    pub async fn set_volume(&self, pct: f32) -> Result<f32> {
        if !pct.is_finite() || pct < 0.0 {
            return Err(Error::InvalidVolume(pct));
        }

        let mut st = self.lock_open().await?;
        if !st.state.has_stream() {
            return Err(Error::invalid_state("volume needs an active stream"));
        }

        let fraction = pct / 100.0;
        self.sink.set_volume(fraction).await?;
        st.volume = fraction;
        debug!(session = %self.key, fraction, "Volume changed");
        Ok(fraction)
    }

    pub async fn now_playing(&self) -> Result<ResolvedTrack> {
        let st = self.inner.lock().await;
        st.current.clone().ok_or(Error::NoActiveTrack)
    }

    // ========================================================================
    // Queue operations
    // ========================================================================

    /// Queue a track without touching playback; returns its 1-based position
    pub async fn enqueue(&self, track: Track) -> Result<usize> {
        let mut st = self.lock_open().await?;
        match self.enqueue_locked(&mut st, track) {
            PlayOutcome::Queued { position, .. } => Ok(position),
            _ => Ok(st.queue.len()),
        }
    }

    /// Remove a queue entry by 1-based position
    pub async fn remove(&self, index: i64) -> Result<Track> {
        let mut st = self.lock_open().await?;
        let removed = st.queue.remove_at(index)?;
        info!(session = %self.key, index, track = removed.label(), "Removed from queue");
        self.emit_queue_changed(&st, QueueChangeTrigger::UserRemove);
        Ok(removed)
    }

    pub async fn shuffle(&self) -> Result<usize> {
        let mut st = self.lock_open().await?;
        st.queue.shuffle();
        self.emit_queue_changed(&st, QueueChangeTrigger::Shuffle);
        Ok(st.queue.len())
    }

    /// Empty the queue; the current track keeps playing
    pub async fn clear_queue(&self) -> Result<usize> {
        let mut st = self.lock_open().await?;
        let removed = st.queue.len();
        st.queue.clear();
        self.emit_queue_changed(&st, QueueChangeTrigger::Cleared);
        Ok(removed)
    }

    /// Copy of a window of the queue for display
    pub async fn queue_page(&self, offset: usize, count: usize) -> Vec<Track> {
        self.inner.lock().await.queue.snapshot_page(offset, count)
    }

    /// Whole queue split into display pages, read under one lock
    pub async fn queue_pages(&self, page_size: usize) -> Vec<Vec<Track>> {
        let page_size = page_size.max(1);
        let st = self.inner.lock().await;
        (0..st.queue.page_count(page_size))
            .map(|page| st.queue.snapshot_page(page * page_size, page_size))
            .filter(|entries| !entries.is_empty())
            .collect()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let st = self.inner.lock().await;
        SessionSnapshot {
            state: st.state,
            current: st.current.clone(),
            loop_flag: st.loop_flag,
            volume_pct: st.volume * 100.0,
            queue_len: st.queue.len(),
        }
    }

    // ========================================================================
    // Completion path and teardown
    // ========================================================================

    /// Handle a stream end delivered through the completion channel
    pub async fn on_stream_ended(&self, event: StreamEnded) -> Result<AdvanceOutcome> {
        let mut st = self.inner.lock().await;

        if st.closed || st.active_stream != Some(event.stream_id) {
            debug!(
                session = %self.key,
                stream_id = event.stream_id.0,
                "Ignoring end of stale stream"
            );
            return Ok(AdvanceOutcome::Ignored);
        }
        st.active_stream = None;

        match event.end {
            StreamEnd::Stopped => {
                // Stopped by the backend itself, not through this controller
                warn!(session = %self.key, "Stream stopped by audio backend");
                self.reset_current(&mut st);
                return Ok(AdvanceOutcome::QueueEmpty);
            }
            StreamEnd::Failed(reason) => {
                let title = st
                    .current
                    .as_ref()
                    .map(|t| t.title.clone())
                    .unwrap_or_default();
                warn!(
                    session = %self.key,
                    title = title.as_str(),
                    "Stream failed, advancing as if finished: {}",
                    reason
                );
                self.events.emit_lossy(CadenzaEvent::StreamFailed {
                    session: self.key.to_string(),
                    title,
                    reason,
                    timestamp: Utc::now(),
                });
            }
            StreamEnd::Finished => {
                debug!(session = %self.key, stream_id = event.stream_id.0, "Stream finished");
            }
        }

        self.advance(st).await
    }

    /// Stop everything and close the sink connection (leave)
    ///
    /// State is cleared even if the sink fails to disconnect.
    pub async fn shutdown(&self) -> Result<()> {
        let mut st = self.inner.lock().await;
        if st.closed {
            return Ok(());
        }

        info!(session = %self.key, "Shutting down session");
        st.closed = true;
        st.generation += 1;
        st.advancing = None;
        self.stop_stream(&mut st).await;
        self.reset_locked(&mut st);
        drop(st);

        self.sink.disconnect().await.map_err(|e| {
            error!(session = %self.key, "Failed to disconnect audio sink: {}", e);
            e
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn lock_open(&self) -> Result<MutexGuard<'_, ControllerState>> {
        let st = self.inner.lock().await;
        if st.closed {
            return Err(Error::NotConnected);
        }
        Ok(st)
    }

    /// Advance algorithm; takes the guard so it can release it while resolving
    async fn advance(&self, mut st: MutexGuard<'_, ControllerState>) -> Result<AdvanceOutcome> {
        if st.loop_flag {
            if let Some(track) = st.current.clone() {
                debug!(session = %self.key, title = track.title.as_str(), "Loop replay");
                self.start_stream(&mut st, track.clone(), true).await?;
                return Ok(AdvanceOutcome::Replayed(track));
            }
        }

        let next = match st.queue.dequeue_front() {
            Some(next) => next,
            None => {
                info!(session = %self.key, "Queue empty");
                self.reset_current(&mut st);
                self.events.emit_lossy(CadenzaEvent::QueueExhausted {
                    session: self.key.to_string(),
                    timestamp: Utc::now(),
                });
                return Ok(AdvanceOutcome::QueueEmpty);
            }
        };
        self.emit_queue_changed(&st, QueueChangeTrigger::Advance);

        // The old track is gone; a resolved head takes over under the lock
        st.current = None;
        st.loop_flag = false;

        let resolved = match next {
            Track::Resolved(resolved) => resolved,
            Track::Unresolved { query } => {
                // Idle is observable while the lock is released
                self.set_state(&mut st, PlaybackState::Idle);
                let generation = st.generation;
                st.advancing = Some(generation);
                st.resolving += 1;
                drop(st);

                let result = self
                    .resolver
                    .resolve_track(Track::Unresolved {
                        query: query.clone(),
                    })
                    .await;

                st = self.inner.lock().await;
                st.resolving -= 1;
                if st.closed || st.generation != generation {
                    debug!(session = %self.key, query = query.as_str(), "Advance superseded");
                    return Ok(AdvanceOutcome::Superseded);
                }
                st.advancing = None;

                match result {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        // Remainder of the queue stays for a manual retry
                        warn!(
                            session = %self.key,
                            remaining = st.queue.len(),
                            "Advance stopped on resolution failure: {}",
                            e
                        );
                        self.events.emit_lossy(CadenzaEvent::ResolutionFailed {
                            session: self.key.to_string(),
                            query,
                            reason: e.to_string(),
                            timestamp: Utc::now(),
                        });
                        return Err(e);
                    }
                }
            }
        };

        self.start_stream(&mut st, resolved.clone(), false).await?;
        Ok(AdvanceOutcome::Started(resolved))
    }

    async fn start_stream(
        &self,
        st: &mut ControllerState,
        track: ResolvedTrack,
        replay: bool,
    ) -> Result<()> {
        st.next_stream_id += 1;
        let stream_id = StreamId(st.next_stream_id);
        st.active_stream = Some(stream_id);

        let request = StreamRequest {
            stream_id,
            url: track.url.clone(),
            title: track.title.clone(),
            options: StreamOptions {
                volume: st.volume,
                reconnect: self.settings.reconnect,
                reconnect_delay_max: self.settings.reconnect_delay_max(),
            },
        };
        let notifier = CompletionNotifier::new(stream_id, self.completion_tx.clone());

        if let Err(e) = self.sink.start(request, notifier).await {
            error!(session = %self.key, title = track.title.as_str(), "Failed to start stream: {}", e);
            st.active_stream = None;
            self.reset_current(st);
            return Err(e);
        }

        info!(
            session = %self.key,
            stream_id = stream_id.0,
            title = track.title.as_str(),
            replay,
            "Now playing"
        );
        self.events.emit_lossy(CadenzaEvent::TrackStarted {
            session: self.key.to_string(),
            title: track.title.clone(),
            url: track.url.clone(),
            thumbnail: track.thumbnail.clone(),
            replay,
            timestamp: Utc::now(),
        });
        st.current = Some(track);
        self.set_state(st, PlaybackState::Playing);
        Ok(())
    }

    /// Stop the active stream, if any. Its `Stopped` report becomes stale.
    async fn stop_stream(&self, st: &mut ControllerState) {
        if let Some(stream_id) = st.active_stream.take() {
            debug!(session = %self.key, stream_id = stream_id.0, "Stopping stream");
            if let Err(e) = self.sink.stop().await {
                warn!(session = %self.key, "Audio sink failed to stop: {}", e);
            }
        }
    }

    fn enqueue_locked(&self, st: &mut ControllerState, track: Track) -> PlayOutcome {
        let at_front = self.settings.enqueue_position == EnqueuePosition::Front;
        st.queue.enqueue(track.clone(), at_front);
        let position = if at_front { 1 } else { st.queue.len() };
        info!(session = %self.key, track = track.label(), position, "Added to queue");
        self.emit_queue_changed(st, QueueChangeTrigger::UserEnqueue);
        PlayOutcome::Queued { track, position }
    }

    /// Clear current track, loop flag and go idle; queue untouched
    fn reset_current(&self, st: &mut ControllerState) {
        st.current = None;
        st.loop_flag = false;
        self.set_state(st, PlaybackState::Idle);
    }

    /// Clear queue, current track and loop flag together
    fn reset_locked(&self, st: &mut ControllerState) {
        let had_queue = !st.queue.is_empty();
        st.queue.clear();
        self.reset_current(st);
        if had_queue {
            self.emit_queue_changed(st, QueueChangeTrigger::Cleared);
        }
    }

    fn set_state(&self, st: &mut ControllerState, new_state: PlaybackState) {
        let old_state = st.state;
        if old_state == new_state {
            return;
        }
        st.state = new_state;
        debug!(session = %self.key, %old_state, %new_state, "Playback state changed");
        self.events.emit_lossy(CadenzaEvent::PlaybackStateChanged {
            session: self.key.to_string(),
            old_state,
            new_state,
            timestamp: Utc::now(),
        });
    }

    fn emit_queue_changed(&self, st: &ControllerState, trigger: QueueChangeTrigger) {
        self.events.emit_lossy(CadenzaEvent::QueueChanged {
            session: self.key.to_string(),
            length: st.queue.len(),
            trigger,
            timestamp: Utc::now(),
        });
    }
}
