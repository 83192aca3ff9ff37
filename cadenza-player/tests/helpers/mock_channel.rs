//! Recording messaging channel with injectable marker events

use async_trait::async_trait;
use cadenza_player::error::{Error, Result};
use cadenza_player::messaging::{MarkerEvent, MessageHandle, MessagingChannel, UserId};
use cadenza_player::paginator::Page;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::{broadcast, Notify};

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelCall {
    Send(MessageHandle, Page),
    Edit(MessageHandle, Page),
    Delete(MessageHandle),
    AddMarker(MessageHandle, String),
    RemoveMarker(MessageHandle, String, UserId),
}

pub struct MockChannel {
    calls: Mutex<Vec<ChannelCall>>,
    markers: Mutex<Option<broadcast::Sender<MarkerEvent>>>,
    sent: Notify,
    fail_edits: AtomicBool,
    fail_next_send: AtomicBool,
}

impl MockChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(32);
        Self {
            calls: Mutex::new(Vec::new()),
            markers: Mutex::new(Some(tx)),
            sent: Notify::new(),
            fail_edits: AtomicBool::new(false),
            fail_next_send: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> Vec<ChannelCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_pages(&self) -> Vec<Page> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Send(_, page) => Some(page),
                _ => None,
            })
            .collect()
    }

    pub fn edited_pages(&self) -> Vec<Page> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Edit(_, page) => Some(page),
                _ => None,
            })
            .collect()
    }

    pub fn deleted(&self) -> Vec<MessageHandle> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Delete(handle) => Some(handle),
                _ => None,
            })
            .collect()
    }

    /// Wait for the next `send`, returning the newest handle
    pub async fn next_sent(&self) -> MessageHandle {
        loop {
            let notified = self.sent.notified();
            if let Some(handle) = self.last_sent() {
                return handle;
            }
            notified.await;
        }
    }

    pub fn last_sent(&self) -> Option<MessageHandle> {
        self.calls().into_iter().rev().find_map(|call| match call {
            ChannelCall::Send(handle, _) => Some(handle),
            _ => None,
        })
    }

    /// Simulate `user` adding `marker` to `message`
    pub fn press(&self, marker: &str, user: &str, message: MessageHandle) {
        if let Some(tx) = self.markers.lock().unwrap().as_ref() {
            let _ = tx.send(MarkerEvent {
                marker: marker.to_string(),
                user: UserId::new(user),
                message,
            });
        }
    }

    /// Drop the marker stream; current subscribers see it closed
    pub fn close_markers(&self) {
        self.markers.lock().unwrap().take();
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_send(&self) {
        self.fail_next_send.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: ChannelCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingChannel for MockChannel {
    async fn send(&self, page: &Page) -> Result<MessageHandle> {
        if self.fail_next_send.swap(false, Ordering::SeqCst) {
            return Err(Error::Messaging("send rejected".to_string()));
        }
        let handle = MessageHandle::new();
        self.record(ChannelCall::Send(handle, page.clone()));
        self.sent.notify_waiters();
        Ok(handle)
    }

    async fn edit(&self, handle: MessageHandle, page: &Page) -> Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(Error::Messaging("edit rejected".to_string()));
        }
        self.record(ChannelCall::Edit(handle, page.clone()));
        Ok(())
    }

    async fn delete(&self, handle: MessageHandle) -> Result<()> {
        self.record(ChannelCall::Delete(handle));
        Ok(())
    }

    async fn add_marker(&self, handle: MessageHandle, marker: &str) -> Result<()> {
        self.record(ChannelCall::AddMarker(handle, marker.to_string()));
        Ok(())
    }

    async fn remove_marker(&self, handle: MessageHandle, marker: &str, user: &UserId) -> Result<()> {
        self.record(ChannelCall::RemoveMarker(
            handle,
            marker.to_string(),
            user.clone(),
        ));
        Ok(())
    }

    fn subscribe_markers(&self) -> broadcast::Receiver<MarkerEvent> {
        match self.markers.lock().unwrap().as_ref() {
            Some(tx) => tx.subscribe(),
            None => {
                // Receiver of a dropped sender reports Closed right away
                let (tx, rx) = broadcast::channel(1);
                drop(tx);
                rx
            }
        }
    }
}
