//! Resolver for direct stream links
//!
//! Accepts `http://` and `https://` URLs as-is and names the track after
//! the last path segment. Anything else is not a link and has no match.

use crate::error::ResolutionError;
use crate::playback::resolver::TrackResolver;
use crate::playback::track::ResolvedTrack;
use async_trait::async_trait;

#[derive(Debug, Default, Clone)]
pub struct DirectUrlResolver;

impl DirectUrlResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TrackResolver for DirectUrlResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedTrack, ResolutionError> {
        let url = query.trim();
        let Some(rest) = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
        else {
            return Err(ResolutionError::NoMatch(query.to_string()));
        };

        let path = rest.split(['?', '#']).next().unwrap_or(rest);
        let title = path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(path);
        if title.is_empty() {
            return Err(ResolutionError::NoMatch(query.to_string()));
        }

        Ok(ResolvedTrack::new(url, title))
    }
}
