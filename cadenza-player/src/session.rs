//! Session registry
//!
//! One session per channel key. A session bundles the playback controller
//! with the task that feeds sink completion messages back into it.
//! Sessions are created lazily and only destroyed by an explicit leave (or
//! process shutdown).

use crate::error::{Error, Result};
use crate::playback::controller::PlaybackController;
use crate::playback::events::StreamEnded;
use crate::playback::resolver::BoundedResolver;
use crate::playback::sink::AudioSinkFactory;
use cadenza_common::config::PlaybackConfig;
use cadenza_common::events::{CadenzaEvent, EventBus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, OnceCell, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Channel/guild identity a session is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Active playback session
pub struct Session {
    controller: Arc<PlaybackController>,
    completion_task: JoinHandle<()>,
    created_at: DateTime<Utc>,
}

impl Session {
    fn spawn(controller: Arc<PlaybackController>, rx: mpsc::UnboundedReceiver<StreamEnded>) -> Self {
        let completion_task = tokio::spawn(completion_loop(Arc::downgrade(&controller), rx));
        Self {
            controller,
            completion_task,
            created_at: Utc::now(),
        }
    }

    pub fn controller(&self) -> &Arc<PlaybackController> {
        &self.controller
    }

    pub fn key(&self) -> &SessionKey {
        self.controller.key()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    async fn close(&self) -> Result<()> {
        let result = self.controller.shutdown().await;
        self.completion_task.abort();
        result
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.completion_task.abort();
    }
}

/// Re-dispatches sink completions into the controller's serialized path
async fn completion_loop(
    weak: Weak<PlaybackController>,
    mut rx: mpsc::UnboundedReceiver<StreamEnded>,
) {
    while let Some(event) = rx.recv().await {
        let Some(controller) = weak.upgrade() else {
            break;
        };

        match controller.on_stream_ended(event).await {
            Ok(outcome) => {
                debug!(session = %controller.key(), ?outcome, "Completion handled");
            }
            Err(e) => {
                warn!(session = %controller.key(), "Auto-advance failed: {}", e);
            }
        }
    }
}

/// Registry slot; stays empty while the first caller is connecting
type SessionSlot = Arc<OnceCell<Arc<Session>>>;

/// Keyed registry of active sessions
///
/// The map lock is only held for lookups and inserts. Connecting a new
/// session happens inside the key's slot, so a slow connect for one key
/// never stalls readers of another.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionKey, SessionSlot>>,
    sink_factory: Arc<dyn AudioSinkFactory>,
    resolver: BoundedResolver,
    events: EventBus,
    settings: PlaybackConfig,
}

impl SessionManager {
    pub fn new(
        sink_factory: Arc<dyn AudioSinkFactory>,
        resolver: BoundedResolver,
        events: EventBus,
        settings: PlaybackConfig,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            sink_factory,
            resolver,
            events,
            settings,
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Return the session for `key`, connecting a new one if needed
    ///
    /// Racing callers for the same key share one slot, so exactly one of
    /// them connects and all get the same session.
    pub async fn get_or_create(&self, key: &SessionKey) -> Result<Arc<Session>> {
        let slot = self.slot(key).await;

        let result = slot
            .get_or_try_init(|| self.connect_session(key))
            .await
            .map(Arc::clone);

        let session = match result {
            Ok(session) => session,
            Err(e) => {
                self.discard_slot(key, &slot).await;
                return Err(e);
            }
        };

        // Destroyed or shut down while connecting
        if !self.holds_slot(key, &slot).await {
            warn!(session = %key, "Session closed while connecting");
            if let Err(e) = session.close().await {
                warn!(session = %key, "Error while closing session: {}", e);
            }
            return Err(Error::NotConnected);
        }

        Ok(session)
    }

    async fn slot(&self, key: &SessionKey) -> SessionSlot {
        if let Some(slot) = self.sessions.read().await.get(key) {
            return Arc::clone(slot);
        }
        Arc::clone(
            self.sessions
                .write()
                .await
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    async fn holds_slot(&self, key: &SessionKey, slot: &SessionSlot) -> bool {
        self.sessions
            .read()
            .await
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot))
    }

    /// Drop a slot whose connect failed so the next caller retries
    async fn discard_slot(&self, key: &SessionKey, slot: &SessionSlot) {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && current.get().is_none())
        {
            sessions.remove(key);
        }
    }

    async fn connect_session(&self, key: &SessionKey) -> Result<Arc<Session>> {
        let sink = self.sink_factory.connect(key).await?;
        let (controller, rx) = PlaybackController::new(
            key.clone(),
            sink,
            self.resolver.clone(),
            self.events.clone(),
            self.settings.clone(),
        );
        let session = Arc::new(Session::spawn(controller, rx));

        info!(session = %key, "Session created");
        self.events.emit_lossy(CadenzaEvent::SessionCreated {
            session: key.to_string(),
            timestamp: Utc::now(),
        });
        Ok(session)
    }

    pub async fn get(&self, key: &SessionKey) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .await
            .get(key)
            .and_then(|slot| slot.get().cloned())
    }

    /// Like `get`, but a missing session is `NotConnected`
    pub async fn require(&self, key: &SessionKey) -> Result<Arc<Session>> {
        self.get(key).await.ok_or(Error::NotConnected)
    }

    /// Tear down a session: stop playback, clear state, disconnect the sink
    ///
    /// A session still connecting is `NotConnected`, as it has not been
    /// handed to anyone yet.
    pub async fn destroy(&self, key: &SessionKey) -> Result<()> {
        let session = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get(key)
                .and_then(|slot| slot.get().cloned())
                .ok_or(Error::NotConnected)?;
            sessions.remove(key);
            session
        };

        info!(session = %key, "Session destroyed");
        self.events.emit_lossy(CadenzaEvent::SessionDestroyed {
            session: key.to_string(),
            timestamp: Utc::now(),
        });
        session.close().await
    }

    /// Destroy every session concurrently
    ///
    /// Sessions still connecting close themselves once their connect
    /// finishes.
    pub async fn shutdown_all(&self) {
        let sessions: Vec<Arc<Session>> = self
            .sessions
            .write()
            .await
            .drain()
            .filter_map(|(_, slot)| slot.get().cloned())
            .collect();

        info!("Closing {} session(s)", sessions.len());
        let results = futures::future::join_all(sessions.iter().map(|s| s.close())).await;
        for (session, result) in sessions.iter().zip(results) {
            if let Err(e) = result {
                warn!(session = %session.key(), "Error while closing session: {}", e);
            }
        }
    }

    pub async fn keys(&self) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
