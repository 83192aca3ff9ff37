//! Queue store
//!
//! Ordered collection of upcoming tracks in play order. The store knows
//! nothing about playback: the controller pops from the front when it
//! advances, and a popped track is no longer part of the store.

use crate::error::{Error, Result};
use crate::playback::track::Track;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

/// Upcoming tracks for one session
#[derive(Debug, Clone, Default)]
pub struct QueueStore {
    entries: VecDeque<Track>,
}

impl QueueStore {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a track at the back, or at the front to play it next
    pub fn enqueue(&mut self, track: Track, at_front: bool) {
        if at_front {
            self.entries.push_front(track);
        } else {
            self.entries.push_back(track);
        }
    }

    /// Take the next track to play
    pub fn dequeue_front(&mut self) -> Option<Track> {
        self.entries.pop_front()
    }

    /// Remove the entry at a 1-based position
    ///
    /// Out-of-range positions leave the queue untouched.
    pub fn remove_at(&mut self, index: i64) -> Result<Track> {
        let len = self.entries.len();
        if index < 1 || index as u64 > len as u64 {
            return Err(Error::InvalidIndex { index, len });
        }

        // Checked above: 1 <= index <= len
        self.entries
            .remove((index - 1) as usize)
            .ok_or(Error::InvalidIndex { index, len })
    }

    /// Uniform random permutation of the remaining entries
    pub fn shuffle(&mut self) {
        let mut rng = rand::thread_rng();
        self.entries.make_contiguous().shuffle(&mut rng);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Read-only copy of up to `count` entries starting at `offset` (0-based)
    pub fn snapshot_page(&self, offset: usize, count: usize) -> Vec<Track> {
        self.entries.iter().skip(offset).take(count).cloned().collect()
    }

    /// Number of pages needed to list the queue, at least one
    pub fn page_count(&self, page_size: usize) -> usize {
        let page_size = page_size.max(1);
        self.entries.len().div_ceil(page_size).max(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.entries.iter()
    }
}
