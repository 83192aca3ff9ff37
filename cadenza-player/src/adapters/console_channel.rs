//! Messaging channel that renders pages on stdout
//!
//! Markers cannot be clicked in a terminal, so the harness injects them
//! with `inject_marker`, aimed at the most recently posted message.

use crate::error::{Error, Result};
use crate::messaging::{MarkerEvent, MessageHandle, MessagingChannel, UserId};
use crate::paginator::page::Page;
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

const MARKER_CAPACITY: usize = 64;

pub struct ConsoleChannel {
    markers: broadcast::Sender<MarkerEvent>,
    live: Mutex<Vec<MessageHandle>>,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        let (markers, _) = broadcast::channel(MARKER_CAPACITY);
        Self {
            markers,
            live: Mutex::new(Vec::new()),
        }
    }

    /// Simulate `user` adding `marker` to the newest live message
    pub async fn inject_marker(&self, marker: &str, user: &UserId) -> Result<()> {
        let message = self
            .live
            .lock()
            .await
            .last()
            .copied()
            .ok_or_else(|| Error::Messaging("no message to react to".to_string()))?;

        // No subscriber just means nobody is paginating right now
        let _ = self.markers.send(MarkerEvent {
            marker: marker.to_string(),
            user: user.clone(),
            message,
        });
        Ok(())
    }

    async fn require_live(&self, handle: MessageHandle) -> Result<()> {
        if self.live.lock().await.contains(&handle) {
            Ok(())
        } else {
            Err(Error::Messaging(format!("unknown message {}", handle.0)))
        }
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingChannel for ConsoleChannel {
    async fn send(&self, page: &Page) -> Result<MessageHandle> {
        let handle = MessageHandle::new();
        self.live.lock().await.push(handle);
        println!("{}", page.render_text());
        Ok(handle)
    }

    async fn edit(&self, handle: MessageHandle, page: &Page) -> Result<()> {
        self.require_live(handle).await?;
        println!("(edited)\n{}", page.render_text());
        Ok(())
    }

    async fn delete(&self, handle: MessageHandle) -> Result<()> {
        let mut live = self.live.lock().await;
        let before = live.len();
        live.retain(|h| *h != handle);
        if live.len() == before {
            return Err(Error::Messaging(format!("unknown message {}", handle.0)));
        }
        println!("(message closed)");
        Ok(())
    }

    async fn add_marker(&self, handle: MessageHandle, marker: &str) -> Result<()> {
        self.require_live(handle).await?;
        debug!(message = %handle.0, marker, "Marker added");
        Ok(())
    }

    async fn remove_marker(&self, handle: MessageHandle, marker: &str, user: &UserId) -> Result<()> {
        self.require_live(handle).await?;
        debug!(message = %handle.0, marker, user = %user, "Marker removed");
        Ok(())
    }

    fn subscribe_markers(&self) -> broadcast::Receiver<MarkerEvent> {
        self.markers.subscribe()
    }
}
