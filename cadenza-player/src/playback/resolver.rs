//! Track resolution
//!
//! The resolver itself is an external service (search, playlist expansion,
//! stream URL extraction). The core only needs the trait below plus a
//! timeout-bounded wrapper, since resolution runs while a session is
//! waiting on it.

use crate::error::{Error, ResolutionError, Result};
use crate::playback::track::{ResolvedTrack, Track};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Maps a text query to a playable track
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resolve a query; may suspend on network I/O
    async fn resolve(&self, query: &str) -> std::result::Result<ResolvedTrack, ResolutionError>;
}

/// Resolver wrapper applying the configured timeout and error mapping
#[derive(Clone)]
pub struct BoundedResolver {
    inner: Arc<dyn TrackResolver>,
    timeout: Duration,
}

impl BoundedResolver {
    pub fn new(inner: Arc<dyn TrackResolver>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Turn any track into a resolved one
    ///
    /// Already-resolved tracks are returned as-is without calling the
    /// resolver.
    pub async fn resolve_track(&self, track: Track) -> Result<ResolvedTrack> {
        let query = match track {
            Track::Resolved(resolved) => return Ok(resolved),
            Track::Unresolved { query } => query,
        };

        debug!(query = query.as_str(), "Resolving track");
        match tokio::time::timeout(self.timeout, self.inner.resolve(&query)).await {
            Ok(Ok(resolved)) => {
                debug!(query = query.as_str(), title = resolved.title.as_str(), "Resolved");
                Ok(resolved)
            }
            Ok(Err(e)) => {
                warn!(query = query.as_str(), "Resolution failed: {}", e);
                Err(Error::resolution(&query, e))
            }
            Err(_) => {
                warn!(
                    query = query.as_str(),
                    timeout_secs = self.timeout.as_secs(),
                    "Resolution timed out"
                );
                Err(Error::resolution(
                    &query,
                    ResolutionError::Timeout(self.timeout.as_secs()),
                ))
            }
        }
    }
}
