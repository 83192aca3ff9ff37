//! Messaging channel interface
//!
//! The chat transport is external. The core needs to post pages, edit and
//! delete them, manage reaction-style markers, and observe markers that
//! users add.

use crate::error::Result;
use crate::paginator::page::Page;
use async_trait::async_trait;
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Handle of a message posted through a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle(pub Uuid);

impl MessageHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat user identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user added a marker (reaction) to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerEvent {
    pub marker: String,
    pub user: UserId,
    pub message: MessageHandle,
}

/// Chat transport used for replies and interactive listings
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn send(&self, page: &Page) -> Result<MessageHandle>;

    async fn edit(&self, handle: MessageHandle, page: &Page) -> Result<()>;

    async fn delete(&self, handle: MessageHandle) -> Result<()>;

    async fn add_marker(&self, handle: MessageHandle, marker: &str) -> Result<()>;

    async fn remove_marker(&self, handle: MessageHandle, marker: &str, user: &UserId) -> Result<()>;

    /// Stream of marker-added events for all messages of this channel
    fn subscribe_markers(&self) -> broadcast::Receiver<MarkerEvent>;
}
