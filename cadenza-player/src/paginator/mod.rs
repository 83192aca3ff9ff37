//! Interactive paginated browser
//!
//! Posts the first page of a listing, attaches navigation markers and then
//! follows marker events from the initiating user until they cancel or the
//! listing goes quiet for `timeout`. The timeout slides: every qualifying
//! event restarts it. Every way out of the loop (cancel, timeout, a
//! transport failure) ends in the same cleanup, which deletes the message.

pub mod navigation;
pub mod page;

pub use navigation::Navigation;
pub use page::{number_pages, Block, Page, PageBuilder, Tone};

use crate::error::{Error, Result};
use crate::messaging::{MarkerEvent, MessageHandle, MessagingChannel, UserId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

/// Why a pagination loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Initiator pressed cancel
    Cancelled,
    /// No qualifying event within the timeout
    TimedOut,
    /// Transport failure while waiting or rendering; handled like cancel
    Failed(String),
}

/// Final state of a pagination run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOutcome {
    pub termination: Termination,
    /// Page shown when the loop ended
    pub cursor: usize,
}

/// Reusable page browser bound to one messaging channel
pub struct InteractivePaginator {
    channel: Arc<dyn MessagingChannel>,
    active: AtomicBool,
}

/// Clears the active flag however `run` exits
struct ActiveGuard<'a>(&'a AtomicBool);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl InteractivePaginator {
    pub fn new(channel: Arc<dyn MessagingChannel>) -> Self {
        Self {
            channel,
            active: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Show `pages` and follow `initiator`'s navigation until terminal
    ///
    /// Errors only if the run cannot start (empty listing, already running,
    /// first message could not be sent). Once the message is up, every
    /// failure ends the loop through the normal cleanup path.
    pub async fn run(
        &self,
        pages: Vec<Page>,
        initiator: &UserId,
        timeout: Duration,
    ) -> Result<PaginationOutcome> {
        if pages.is_empty() {
            return Err(Error::InvalidArgument("nothing to paginate".to_string()));
        }
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::invalid_state("paginator is already running"));
        }
        let _guard = ActiveGuard(&self.active);

        // Subscribe before sending so no early marker is missed
        let mut markers = self.channel.subscribe_markers();
        let handle = self.channel.send(&pages[0]).await?;
        debug!(pages = pages.len(), user = %initiator, "Paginator started");

        for nav in Navigation::ALL {
            if let Err(e) = self.channel.add_marker(handle, nav.marker()).await {
                warn!("Failed to add paginator marker {}: {}", nav.marker(), e);
            }
        }

        let last = pages.len() - 1;
        let mut cursor = 0;
        let termination = loop {
            let nav = match tokio::time::timeout(
                timeout,
                next_navigation(&mut markers, handle, initiator),
            )
            .await
            {
                Err(_) => break Termination::TimedOut,
                Ok(Err(e)) => {
                    warn!("Paginator wait failed, closing listing: {}", e);
                    break Termination::Failed(e.to_string());
                }
                Ok(Ok(nav)) => nav,
            };

            match nav {
                Navigation::Cancel => break Termination::Cancelled,
                Navigation::Next => cursor = (cursor + 1).min(last),
                Navigation::Prev => cursor = cursor.saturating_sub(1),
            }

            if let Err(e) = self.channel.edit(handle, &pages[cursor]).await {
                warn!("Paginator failed to render page {}: {}", cursor + 1, e);
                break Termination::Failed(e.to_string());
            }
            if let Err(e) = self
                .channel
                .remove_marker(handle, nav.marker(), initiator)
                .await
            {
                debug!("Could not remove marker {}: {}", nav.marker(), e);
            }
        };

        if let Err(e) = self.channel.delete(handle).await {
            warn!("Failed to delete paginated message: {}", e);
        }
        info!(?termination, cursor, "Paginator finished");

        Ok(PaginationOutcome {
            termination,
            cursor,
        })
    }
}

/// Wait for the next marker from `initiator` on `handle` that maps to a
/// navigation action
async fn next_navigation(
    markers: &mut broadcast::Receiver<MarkerEvent>,
    handle: MessageHandle,
    initiator: &UserId,
) -> Result<Navigation> {
    loop {
        match markers.recv().await {
            Ok(event) => {
                if event.message != handle || &event.user != initiator {
                    continue;
                }
                if let Some(nav) = Navigation::from_marker(&event.marker) {
                    return Ok(nav);
                }
            }
            Err(RecvError::Lagged(missed)) => {
                warn!("Paginator missed {} marker events", missed);
            }
            Err(RecvError::Closed) => {
                return Err(Error::Messaging("marker stream closed".to_string()));
            }
        }
    }
}
