//! Track model
//!
//! A queue entry is either a raw query waiting to be resolved or a fully
//! resolved, playable descriptor. Resolution never mutates an entry: it
//! produces a new `ResolvedTrack` which then replaces the query.

use serde::{Deserialize, Serialize};

/// Playable track descriptor returned by a resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    /// Direct stream URL handed to the audio sink
    pub url: String,
    /// Human readable title
    pub title: String,
    /// Thumbnail image URL, when the source has one
    pub thumbnail: Option<String>,
}

impl ResolvedTrack {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            thumbnail: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }
}

/// Queue entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Track {
    /// Search text or link not yet resolved
    Unresolved { query: String },
    /// Ready to stream
    Resolved(ResolvedTrack),
}

impl Track {
    pub fn query(query: impl Into<String>) -> Self {
        Track::Unresolved {
            query: query.into(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Track::Resolved(_))
    }

    /// Text shown in listings: the title when resolved, the query otherwise
    pub fn label(&self) -> &str {
        match self {
            Track::Unresolved { query } => query,
            Track::Resolved(resolved) => &resolved.title,
        }
    }
}

impl From<ResolvedTrack> for Track {
    fn from(resolved: ResolvedTrack) -> Self {
        Track::Resolved(resolved)
    }
}
