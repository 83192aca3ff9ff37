//! Command routing integration tests

mod helpers;

use cadenza_common::config::TomlConfig;
use cadenza_common::events::EventBus;
use cadenza_player::error::Error;
use cadenza_player::paginator::{Block, Tone};
use cadenza_player::playback::BoundedResolver;
use cadenza_player::{Command, CommandContext, CommandRouter, Reply, SessionKey, SessionManager};
use helpers::{MockChannel, MockResolver, MockSinkFactory};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    router: Arc<CommandRouter>,
    channel: Arc<MockChannel>,
    factory: Arc<MockSinkFactory>,
    ctx: CommandContext,
}

fn fixture() -> Fixture {
    let config = TomlConfig::default();
    let factory = Arc::new(MockSinkFactory::new());
    let channel = Arc::new(MockChannel::new());
    let sessions = Arc::new(SessionManager::new(
        factory.clone(),
        BoundedResolver::new(Arc::new(MockResolver::new()), Duration::from_secs(5)),
        EventBus::new(64),
        config.playback.clone(),
    ));
    let router = Arc::new(CommandRouter::new(sessions, channel.clone(), &config));
    Fixture {
        router,
        channel,
        factory,
        ctx: CommandContext::new("guild-1", "alice"),
    }
}

fn page_of(reply: Reply) -> cadenza_player::paginator::Page {
    match reply {
        Reply::Page(page) => page,
        Reply::Listing(pages) => panic!("expected a single page, got {} pages", pages.len()),
    }
}

fn play(query: &str) -> Command {
    Command::Play {
        query: query.to_string(),
    }
}

#[tokio::test]
async fn test_play_then_queue_replies() {
    let f = fixture();

    let first = page_of(f.router.dispatch(&f.ctx, play("song a")).await.unwrap());
    assert_eq!(first.title(), Some("Now Playing"));
    assert!(first.render_text().contains("Playing song a"));

    let second = page_of(f.router.dispatch(&f.ctx, play("song b")).await.unwrap());
    assert_eq!(second.title(), Some("Added to Queue"));
    assert!(second.blocks().contains(&Block::Field {
        name: "Position".to_string(),
        value: "1".to_string()
    }));
}

#[tokio::test]
async fn test_commands_without_session_are_not_connected() {
    let f = fixture();

    for command in [Command::Pause, Command::Next, Command::Queue, Command::Leave] {
        let err = f.router.dispatch(&f.ctx, command).await.unwrap_err();
        assert_eq!(err.title(), "Not Connected");
    }

    f.router.handle(&f.ctx, Command::Stop).await.unwrap();
    let sent = f.channel.sent_pages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title(), Some("Not Connected"));
    assert_eq!(sent[0].tone(), Tone::Error);
}

#[tokio::test]
async fn test_join_then_next_on_empty_queue() {
    let f = fixture();
    f.router.dispatch(&f.ctx, Command::Join).await.unwrap();

    let page = page_of(f.router.dispatch(&f.ctx, Command::Next).await.unwrap());
    assert_eq!(page.title(), Some("Queue Empty"));
    assert_eq!(page.tone(), Tone::Error);
}

#[tokio::test]
async fn test_queue_listing_is_paged() {
    let f = fixture();
    f.router.dispatch(&f.ctx, play("current")).await.unwrap();
    for i in 1..=12 {
        f.router
            .dispatch(&f.ctx, play(&format!("song {}", i)))
            .await
            .unwrap();
    }

    let Reply::Listing(pages) = f.router.dispatch(&f.ctx, Command::Queue).await.unwrap() else {
        panic!("queue should be a listing");
    };
    assert_eq!(pages.len(), 2);
    let first = pages[0].render_text();
    assert!(first.contains("1.: song 1"));
    assert!(first.contains("-- Page 1/2 --"));
    assert!(pages[1].render_text().contains("12.: song 12"));
}

#[tokio::test]
async fn test_empty_queue_listing_is_a_message() {
    let f = fixture();
    f.router.dispatch(&f.ctx, Command::Join).await.unwrap();

    let page = page_of(f.router.dispatch(&f.ctx, Command::Queue).await.unwrap());
    assert_eq!(page.title(), Some("Queue"));
    assert!(page.render_text().contains("There are no songs in the queue."));
}

#[tokio::test]
async fn test_remove_loop_volume_replies() {
    let f = fixture();
    f.router.dispatch(&f.ctx, play("a")).await.unwrap();
    f.router.dispatch(&f.ctx, play("b")).await.unwrap();

    let err = f
        .router
        .dispatch(&f.ctx, Command::Remove { index: 5 })
        .await
        .unwrap_err();
    assert_eq!(err.title(), "Invalid Index");

    let removed = page_of(
        f.router
            .dispatch(&f.ctx, Command::Remove { index: 1 })
            .await
            .unwrap(),
    );
    assert!(removed.render_text().contains("Removed b from the queue."));

    let looped = page_of(f.router.dispatch(&f.ctx, Command::Loop).await.unwrap());
    assert!(looped.render_text().contains("Looping the current song."));
    let unlooped = page_of(f.router.dispatch(&f.ctx, Command::Loop).await.unwrap());
    assert_eq!(unlooped.tone(), Tone::Error);

    let volume = page_of(
        f.router
            .dispatch(&f.ctx, Command::Volume { pct: 40.0 })
            .await
            .unwrap(),
    );
    assert!(volume.render_text().contains("Changed volume to 40%"));
}

#[tokio::test]
async fn test_leave_disconnects() {
    let f = fixture();
    f.router.dispatch(&f.ctx, play("a")).await.unwrap();

    f.router.dispatch(&f.ctx, Command::Leave).await.unwrap();

    assert!(f.factory.sink("guild-1").unwrap().is_disconnected());
    assert!(f
        .router
        .sessions()
        .get(&SessionKey::from("guild-1"))
        .await
        .is_none());
}

#[tokio::test]
async fn test_handle_text_ignores_chatter_and_reports_usage() {
    let f = fixture();

    f.router.handle_text(&f.ctx, "just talking").await.unwrap();
    assert!(f.channel.calls().is_empty());

    f.router.handle_text(&f.ctx, "$dance").await.unwrap();
    let sent = f.channel.sent_pages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title(), Some("Usage"));
}

#[tokio::test]
async fn test_help_runs_the_paginator() {
    let f = fixture();
    let router = Arc::clone(&f.router);
    let ctx = f.ctx.clone();
    let help = tokio::spawn(async move { router.handle_text(&ctx, "$help").await });

    let handle = f.channel.next_sent().await;
    f.channel.press("▶️", "alice", handle);
    f.channel.press("❌", "alice", handle);
    help.await.unwrap().unwrap();

    assert_eq!(f.channel.sent_pages()[0].title(), Some("music Commands"));
    assert_eq!(f.channel.edited_pages()[0].title(), Some("help Commands"));
    assert_eq!(f.channel.deleted(), vec![handle]);
}

#[tokio::test]
async fn test_listing_that_cannot_start_reports_an_error_page() {
    let f = fixture();
    f.channel.fail_next_send();

    f.router.handle(&f.ctx, Command::Help).await.unwrap();

    let sent = f.channel.sent_pages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].tone(), Tone::Error);
    assert!(sent[0].render_text().contains("send rejected"));
    assert!(f.channel.deleted().is_empty());
}

#[tokio::test]
async fn test_undeliverable_reply_is_returned() {
    let f = fixture();
    f.channel.fail_next_send();

    let result = f.router.handle(&f.ctx, Command::Join).await;

    assert!(matches!(result, Err(Error::Messaging(_))));
    assert!(f.channel.sent_pages().is_empty());
}
