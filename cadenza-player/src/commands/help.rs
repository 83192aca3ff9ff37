//! Command catalogue and help listing

use crate::paginator::page::{number_pages, Page};

/// Catalogue entry for one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    /// Argument form shown after the name, empty for none
    pub args: &'static str,
    pub description: &'static str,
    pub group: &'static str,
}

/// Help groups in listing order
pub const GROUPS: [&str; 2] = ["music", "help"];

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo {
        name: "join",
        aliases: &[],
        args: "",
        description: "Join the voice channel.",
        group: "music",
    },
    CommandInfo {
        name: "play",
        aliases: &[],
        args: "<query>",
        description: "Play a song from YouTube.",
        group: "music",
    },
    CommandInfo {
        name: "next",
        aliases: &["skip"],
        args: "",
        description: "Play the next song in the queue.",
        group: "music",
    },
    CommandInfo {
        name: "pause",
        aliases: &[],
        args: "",
        description: "Pause the currently playing song.",
        group: "music",
    },
    CommandInfo {
        name: "resume",
        aliases: &[],
        args: "",
        description: "Resume the currently paused song.",
        group: "music",
    },
    CommandInfo {
        name: "stop",
        aliases: &[],
        args: "",
        description: "Stop the currently playing song.",
        group: "music",
    },
    CommandInfo {
        name: "volume",
        aliases: &[],
        args: "<percent>",
        description: "Set the volume of the music.",
        group: "music",
    },
    CommandInfo {
        name: "now_playing",
        aliases: &["np"],
        args: "",
        description: "Show the currently playing song.",
        group: "music",
    },
    CommandInfo {
        name: "leave",
        aliases: &[],
        args: "",
        description: "Leave the voice channel.",
        group: "music",
    },
    CommandInfo {
        name: "queue",
        aliases: &["q"],
        args: "",
        description: "Show the current queue.",
        group: "music",
    },
    CommandInfo {
        name: "clear",
        aliases: &[],
        args: "",
        description: "Clear the queue.",
        group: "music",
    },
    CommandInfo {
        name: "shuffle",
        aliases: &[],
        args: "",
        description: "Shuffle the queue.",
        group: "music",
    },
    CommandInfo {
        name: "remove",
        aliases: &[],
        args: "<position>",
        description: "Remove a song from the queue.",
        group: "music",
    },
    CommandInfo {
        name: "loop",
        aliases: &[],
        args: "",
        description: "Loop the current song.",
        group: "music",
    },
    CommandInfo {
        name: "help",
        aliases: &[],
        args: "",
        description: "List all commands.",
        group: "help",
    },
];

pub fn lookup(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS
        .iter()
        .find(|info| info.name == name || info.aliases.contains(&name))
}

/// One page per group, numbered
pub fn help_pages(prefix: &str) -> Vec<Page> {
    let pages = GROUPS
        .iter()
        .filter_map(|group| {
            let entries: Vec<&CommandInfo> =
                COMMANDS.iter().filter(|info| info.group == *group).collect();
            if entries.is_empty() {
                return None;
            }

            let mut builder = Page::builder(format!("{} Commands", group))
                .text(format!("List of available commands in {}:", group));
            for info in entries {
                builder = builder.field(signature(prefix, info), describe(prefix, info));
            }
            Some(builder.build())
        })
        .collect();
    number_pages(pages)
}

fn signature(prefix: &str, info: &CommandInfo) -> String {
    if info.args.is_empty() {
        format!("`{}{}`", prefix, info.name)
    } else {
        format!("`{}{} {}`", prefix, info.name, info.args)
    }
}

fn describe(prefix: &str, info: &CommandInfo) -> String {
    if info.aliases.is_empty() {
        return info.description.to_string();
    }
    let aliases: Vec<String> = info
        .aliases
        .iter()
        .map(|alias| format!("`{}{}`", prefix, alias))
        .collect();
    format!("{} (alias {})", info.description, aliases.join(", "))
}
