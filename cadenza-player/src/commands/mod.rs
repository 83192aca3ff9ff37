//! Command surface
//!
//! Text commands are parsed into `Command` values with a configurable
//! prefix. `CommandRouter` maps them onto sessions and renders replies.

pub mod help;
pub mod router;

pub use router::{CommandContext, CommandRouter, Reply};

use crate::error::{Error, Result};

/// One parsed user command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Join,
    Play { query: String },
    Pause,
    Resume,
    Stop,
    Next,
    Queue,
    Clear,
    Shuffle,
    /// 1-based queue position, validated by the queue
    Remove { index: i64 },
    Loop,
    /// Percent, validated by the controller
    Volume { pct: f32 },
    NowPlaying,
    Leave,
    Help,
}

impl Command {
    /// Parse a chat line
    ///
    /// Returns `Ok(None)` for lines that do not start with `prefix`, so
    /// ordinary chatter is not reported as an error.
    pub fn parse(input: &str, prefix: &str) -> Result<Option<Command>> {
        let Some(rest) = input.trim().strip_prefix(prefix) else {
            return Ok(None);
        };

        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        if name.is_empty() {
            return Err(Error::UnknownCommand(input.trim().to_string()));
        }

        let command = match name.to_lowercase().as_str() {
            "join" => Command::Join,
            "play" => {
                if args.is_empty() {
                    return Err(usage(prefix, "play <query>"));
                }
                Command::Play {
                    query: args.to_string(),
                }
            }
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "stop" => Command::Stop,
            "next" | "skip" => Command::Next,
            "queue" | "q" => Command::Queue,
            "clear" => Command::Clear,
            "shuffle" => Command::Shuffle,
            "remove" => {
                let index = args
                    .parse::<i64>()
                    .map_err(|_| usage(prefix, "remove <position>"))?;
                Command::Remove { index }
            }
            "loop" => Command::Loop,
            "volume" => {
                let pct = args
                    .trim_end_matches('%')
                    .parse::<f32>()
                    .map_err(|_| usage(prefix, "volume <percent>"))?;
                Command::Volume { pct }
            }
            "now_playing" | "np" => Command::NowPlaying,
            "leave" => Command::Leave,
            "help" => Command::Help,
            _ => return Err(Error::UnknownCommand(name.to_string())),
        };
        Ok(Some(command))
    }

    /// Canonical command name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Join => "join",
            Command::Play { .. } => "play",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
            Command::Next => "next",
            Command::Queue => "queue",
            Command::Clear => "clear",
            Command::Shuffle => "shuffle",
            Command::Remove { .. } => "remove",
            Command::Loop => "loop",
            Command::Volume { .. } => "volume",
            Command::NowPlaying => "now_playing",
            Command::Leave => "leave",
            Command::Help => "help",
        }
    }
}

fn usage(prefix: &str, form: &str) -> Error {
    Error::InvalidArgument(format!("usage: {}{}", prefix, form))
}
