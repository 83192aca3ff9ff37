//! Command dispatch
//!
//! Maps parsed commands onto the session registry and renders every
//! outcome, including errors, as a page for the messaging channel.

use crate::commands::{help, Command};
use crate::error::{Error, Result};
use crate::messaging::{MessagingChannel, UserId};
use crate::paginator::page::{number_pages, Page, Tone};
use crate::paginator::{InteractivePaginator, PaginationOutcome};
use crate::playback::controller::{AdvanceOutcome, PlayOutcome, PlaybackController};
use crate::playback::track::{ResolvedTrack, Track};
use crate::session::{SessionKey, SessionManager};
use cadenza_common::config::TomlConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Who issued a command, and for which session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub session: SessionKey,
    pub user: UserId,
}

impl CommandContext {
    pub fn new(session: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            session: SessionKey::new(session),
            user: UserId::new(user),
        }
    }
}

/// What a command wants shown
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Single message
    Page(Page),
    /// Interactive listing, driven by the paginator
    Listing(Vec<Page>),
}

pub struct CommandRouter {
    sessions: Arc<SessionManager>,
    channel: Arc<dyn MessagingChannel>,
    prefix: String,
    page_size: usize,
    listing_timeout: Duration,
}

impl CommandRouter {
    pub fn new(
        sessions: Arc<SessionManager>,
        channel: Arc<dyn MessagingChannel>,
        config: &TomlConfig,
    ) -> Self {
        Self {
            sessions,
            channel,
            prefix: config.commands.prefix.clone(),
            page_size: config.paginator.queue_page_size.max(1),
            listing_timeout: config.paginator.timeout(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Parse and handle one chat line; non-command text is ignored
    pub async fn handle_text(&self, ctx: &CommandContext, text: &str) -> Result<()> {
        match Command::parse(text, &self.prefix) {
            Ok(Some(command)) => self.handle(ctx, command).await,
            Ok(None) => Ok(()),
            Err(e) => {
                debug!(user = %ctx.user, "Rejected command text: {}", e);
                self.channel.send(&error_page(&e)).await.map(|_| ())
            }
        }
    }

    /// Run a command and deliver its reply
    ///
    /// Command failures are shown to the user; only a failure to deliver
    /// the reply itself is returned.
    pub async fn handle(&self, ctx: &CommandContext, command: Command) -> Result<()> {
        let reply = match self.dispatch(ctx, command).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session = %ctx.session, user = %ctx.user, "Command failed: {}", e);
                Reply::Page(error_page(&e))
            }
        };

        match reply {
            Reply::Page(page) => {
                if let Err(e) = self.channel.send(&page).await {
                    warn!(session = %ctx.session, user = %ctx.user, "Failed to send reply: {}", e);
                    return Err(e);
                }
            }
            Reply::Listing(pages) => match self.browse(pages, &ctx.user).await {
                Ok(outcome) => {
                    debug!(session = %ctx.session, ?outcome, "Listing closed");
                }
                Err(e) => {
                    warn!(session = %ctx.session, user = %ctx.user, "Listing failed to start: {}", e);
                    self.channel.send(&error_page(&e)).await?;
                }
            },
        }
        Ok(())
    }

    /// Run a command and return its reply without delivering it
    pub async fn dispatch(&self, ctx: &CommandContext, command: Command) -> Result<Reply> {
        info!(
            session = %ctx.session,
            user = %ctx.user,
            command = command.name(),
            "Command received"
        );
        let key = &ctx.session;

        let page = match command {
            Command::Join => {
                self.sessions.get_or_create(key).await?;
                success("Voice", format!("Joined {}.", key))
            }
            Command::Play { query } => {
                let session = self.sessions.get_or_create(key).await?;
                match session.controller().play(Track::query(query.as_str())).await? {
                    PlayOutcome::Started(track) => now_playing_page(&track),
                    PlayOutcome::Queued { track, position } => {
                        Page::builder("Added to Queue")
                            .text(format!("Added {} to the queue.", track.label()))
                            .field("Position", position.to_string())
                            .build()
                    }
                    PlayOutcome::Cancelled => failure(
                        "Play Cancelled",
                        format!("Playback was stopped before {} could start.", query),
                    ),
                }
            }
            Command::Pause => {
                self.controller(key).await?.pause().await?;
                success("Voice", "Music Paused!")
            }
            Command::Resume => {
                self.controller(key).await?.resume().await?;
                success("Voice", "Music Resumed!")
            }
            Command::Stop => {
                self.controller(key).await?.stop().await?;
                success("Voice", "Music Stopped!")
            }
            Command::Next => match self.controller(key).await?.skip().await? {
                AdvanceOutcome::Started(track) | AdvanceOutcome::Replayed(track) => {
                    now_playing_page(&track)
                }
                AdvanceOutcome::QueueEmpty => {
                    failure("Queue Empty", "There are no more songs in the queue.")
                }
                AdvanceOutcome::Superseded | AdvanceOutcome::Ignored => {
                    success("Skipped", "Skipped the current song.")
                }
            },
            Command::Queue => return self.queue_listing(key).await,
            Command::Clear => {
                self.controller(key).await?.clear_queue().await?;
                success("Queue Cleared", "The queue has been cleared.")
            }
            Command::Shuffle => {
                self.controller(key).await?.shuffle().await?;
                success("Queue Shuffled", "The queue has been shuffled.")
            }
            Command::Remove { index } => {
                let removed = self.controller(key).await?.remove(index).await?;
                success(
                    "Song Removed",
                    format!("Removed {} from the queue.", removed.label()),
                )
            }
            Command::Loop => {
                if self.controller(key).await?.toggle_loop().await? {
                    success("Loop", "Looping the current song.")
                } else {
                    failure("Loop", "Stopped looping the current song.")
                }
            }
            Command::Volume { pct } => {
                self.controller(key).await?.set_volume(pct).await?;
                success("Volume", format!("Changed volume to {}%", pct))
            }
            Command::NowPlaying => {
                let track = self.controller(key).await?.now_playing().await?;
                Page::builder(format!("Now Playing: {}", track.title))
                    .thumbnail(track.thumbnail.as_deref())
                    .build()
            }
            Command::Leave => {
                self.sessions.destroy(key).await?;
                success("Voice", "Left the voice channel.")
            }
            Command::Help => return Ok(Reply::Listing(help::help_pages(&self.prefix))),
        };

        Ok(Reply::Page(page))
    }

    /// Show pages through a fresh paginator bound to this router's channel
    pub async fn browse(&self, pages: Vec<Page>, user: &UserId) -> Result<PaginationOutcome> {
        InteractivePaginator::new(Arc::clone(&self.channel))
            .run(pages, user, self.listing_timeout)
            .await
    }

    async fn controller(&self, key: &SessionKey) -> Result<Arc<PlaybackController>> {
        let session = self.sessions.require(key).await?;
        Ok(Arc::clone(session.controller()))
    }

    async fn queue_listing(&self, key: &SessionKey) -> Result<Reply> {
        let listing = self.controller(key).await?.queue_pages(self.page_size).await;
        if listing.is_empty() {
            return Ok(Reply::Page(failure("Queue", "There are no songs in the queue.")));
        }

        let pages = listing
            .iter()
            .enumerate()
            .map(|(page, entries)| {
                let offset = page * self.page_size;
                entries
                    .iter()
                    .enumerate()
                    .fold(Page::builder("Queue"), |builder, (i, track)| {
                        builder.field(format!("{}.", offset + i + 1), track.label())
                    })
                    .build()
            })
            .collect();
        Ok(Reply::Listing(number_pages(pages)))
    }
}

/// Error reply: short title from the error class, detail from its message
pub fn error_page(err: &Error) -> Page {
    failure(err.title(), err.to_string())
}

fn now_playing_page(track: &ResolvedTrack) -> Page {
    Page::builder("Now Playing")
        .text(format!("Playing {}", track.title))
        .thumbnail(track.thumbnail.as_deref())
        .build()
}

fn success(title: &str, text: impl Into<String>) -> Page {
    Page::message(title, text, Tone::Success)
}

fn failure(title: &str, text: impl Into<String>) -> Page {
    Page::message(title, text, Tone::Error)
}
