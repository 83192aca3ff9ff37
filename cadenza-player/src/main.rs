//! Cadenza console harness - Main entry point
//!
//! Wires the playback core to in-process collaborators: pages are printed
//! to stdout, links are resolved as-is, and audio is a timer. Commands are
//! read line by line from stdin using the configured prefix; the lines
//! `<`, `>` and `x` press the paginator markers on the newest message.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cadenza_common::config::{resolve_config_path, TomlConfig};
use cadenza_common::events::{CadenzaEvent, EventBus};
use cadenza_player::adapters::{ConsoleChannel, DirectUrlResolver, SimulatedSinkFactory};
use cadenza_player::paginator::Navigation;
use cadenza_player::playback::BoundedResolver;
use cadenza_player::{CommandContext, CommandRouter, SessionManager};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cadenza-player
#[derive(Parser, Debug)]
#[command(name = "cadenza-player")]
#[command(about = "Console harness for the Cadenza playback core")]
#[command(version)]
struct Args {
    /// Path to config file (overrides CADENZA_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session key commands are issued against
    #[arg(long, default_value = "console", env = "CADENZA_CHANNEL")]
    channel: String,

    /// User id commands are issued as
    #[arg(long, default_value = "console-user", env = "CADENZA_USER")]
    user: String,

    /// Print session events as JSON lines
    #[arg(long)]
    json_events: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Cadenza console harness v{}", env!("CARGO_PKG_VERSION"));
    match resolve_config_path(args.config.as_deref()) {
        Some(path) if path.exists() => info!("Configuration: {}", path.display()),
        _ => info!("Configuration: built-in defaults"),
    }

    let events = EventBus::new(config.playback.event_capacity);
    let resolver = BoundedResolver::new(
        Arc::new(DirectUrlResolver::new()),
        config.playback.resolve_timeout(),
    );
    let sink_factory = Arc::new(SimulatedSinkFactory::new(Duration::from_secs(
        config.console.simulated_track_secs,
    )));
    let sessions = Arc::new(SessionManager::new(
        sink_factory,
        resolver,
        events.clone(),
        config.playback.clone(),
    ));
    let channel = Arc::new(ConsoleChannel::new());
    let router = Arc::new(CommandRouter::new(
        Arc::clone(&sessions),
        channel.clone(),
        &config,
    ));

    let printer = tokio::spawn(print_events(events.clone(), args.json_events));

    let ctx = CommandContext::new(args.channel, args.user);
    info!(
        session = %ctx.session,
        user = %ctx.user,
        "Ready. Type {}help for commands",
        router.prefix()
    );

    tokio::select! {
        result = read_commands(Arc::clone(&router), channel, ctx) => {
            result.context("Failed to read commands from stdin")?;
            info!("Input closed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    sessions.shutdown_all().await;
    printer.abort();
    info!("Cadenza console harness stopped");

    Ok(())
}

async fn read_commands(
    router: Arc<CommandRouter>,
    channel: Arc<ConsoleChannel>,
    ctx: CommandContext,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let marker = match line {
            "" => continue,
            "quit" | "exit" => break,
            "<" => Some(Navigation::Prev),
            ">" => Some(Navigation::Next),
            "x" => Some(Navigation::Cancel),
            _ => None,
        };

        if let Some(nav) = marker {
            if let Err(e) = channel.inject_marker(nav.marker(), &ctx.user).await {
                warn!("Could not press {}: {}", nav.marker(), e);
            }
            continue;
        }

        // Listings block until closed, so every command runs on its own task
        let router = Arc::clone(&router);
        let ctx = ctx.clone();
        let text = line.to_string();
        tokio::spawn(async move {
            if let Err(e) = router.handle_text(&ctx, &text).await {
                warn!("Failed to deliver reply: {}", e);
            }
        });
    }
    Ok(())
}

async fn print_events(events: EventBus, json: bool) {
    let mut rx = events.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => {
                if json {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("Failed to encode event: {}", e),
                    }
                } else {
                    println!("[event] {}", describe(&event));
                }
            }
            Err(RecvError::Lagged(missed)) => warn!("Event printer missed {} events", missed),
            Err(RecvError::Closed) => break,
        }
    }
}

fn describe(event: &CadenzaEvent) -> String {
    let detail = match event {
        CadenzaEvent::PlaybackStateChanged {
            old_state,
            new_state,
            ..
        } => format!("{} -> {}", old_state, new_state),
        CadenzaEvent::TrackStarted { title, replay, .. } => {
            if *replay {
                format!("{} (loop)", title)
            } else {
                title.clone()
            }
        }
        CadenzaEvent::QueueChanged {
            length, trigger, ..
        } => format!("{} entries ({})", length, trigger),
        CadenzaEvent::ResolutionFailed { query, reason, .. } => {
            format!("{}: {}", query, reason)
        }
        CadenzaEvent::StreamFailed { title, reason, .. } => format!("{}: {}", title, reason),
        CadenzaEvent::SessionCreated { .. }
        | CadenzaEvent::SessionDestroyed { .. }
        | CadenzaEvent::QueueExhausted { .. } => String::new(),
    };
    format!("{} [{}] {}", event.event_type(), event.session(), detail)
        .trim_end()
        .to_string()
}
