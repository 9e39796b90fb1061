//! Console chat adapter
//!
//! Lets the tracker run in a terminal: each stdin line is one chat event and
//! every post is printed to stdout. Line syntax:
//!
//! ```text
//! alice: Spellcheck #12\n🟩🟥\n🟩🟩     a chat message (\n starts a new line)
//! /register alice
//! /deregister alice
//! /attach alice shot.png caption...  a spoilered screenshot
//! /tick                              check day boundaries now
//! /status
//! /quit
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use spellcheck_core::{
    AttachmentHandle, ChannelId, IdentityResolver, MessageRef, OutputChannel, OutputError,
    PlayerName, SessionStatus,
};
use tracing::debug;

// ----------------------------------------------------------------------------
// Input Lines
// ----------------------------------------------------------------------------

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Message { author: String, text: String },
    Register(String),
    Deregister(String),
    Attach {
        author: String,
        path: String,
        caption: String,
    },
    Tick,
    Status,
    Help,
    Quit,
    Empty,
}

impl ConsoleLine {
    /// Parse one line of console input
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(ConsoleLine::Empty);
        }

        if let Some(command) = line.strip_prefix('/') {
            let mut parts = command.splitn(2, char::is_whitespace);
            let verb = parts.next().unwrap_or_default();
            let rest = parts.next().unwrap_or_default().trim();

            return match verb {
                "register" => single_user(rest, "register").map(ConsoleLine::Register),
                "deregister" => single_user(rest, "deregister").map(ConsoleLine::Deregister),
                "attach" => {
                    let mut args = rest.splitn(3, char::is_whitespace);
                    match (args.next(), args.next()) {
                        (Some(author), Some(path)) if !author.is_empty() && !path.is_empty() => {
                            Ok(ConsoleLine::Attach {
                                author: author.to_string(),
                                path: path.to_string(),
                                caption: args.next().unwrap_or_default().trim().to_string(),
                            })
                        }
                        _ => Err("usage: /attach <user> <path> [caption]".to_string()),
                    }
                }
                "tick" => Ok(ConsoleLine::Tick),
                "status" => Ok(ConsoleLine::Status),
                "help" => Ok(ConsoleLine::Help),
                "quit" | "exit" => Ok(ConsoleLine::Quit),
                other => Err(format!("unknown command /{}", other)),
            };
        }

        match line.split_once(':') {
            Some((author, text)) if !author.trim().is_empty() => Ok(ConsoleLine::Message {
                author: author.trim().to_string(),
                text: text.trim().replace("\\n", "\n"),
            }),
            _ => Err("expected `<user>: <message>` or a /command".to_string()),
        }
    }
}

fn single_user(rest: &str, verb: &str) -> std::result::Result<String, String> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        Err(format!("usage: /{} <user>", verb))
    } else {
        Ok(rest.to_string())
    }
}

pub const HELP: &str = "\
<user>: <text>                     send a chat message (\\n for new lines)
/register <user>                   register for tracking
/deregister <user>                 opt out (twice deletes saved data)
/attach <user> <path> [caption]    send a spoilered screenshot
/tick                              check day boundaries now
/status                            show the session
/quit                              stop the tracker";

// ----------------------------------------------------------------------------
// Console Output
// ----------------------------------------------------------------------------

/// Output channel that prints every post to stdout
#[derive(Debug, Default)]
pub struct ConsoleChannel {
    posted: AtomicU64,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of posts printed so far
    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }

    fn print(&self, channel: &ChannelId, text: &str) {
        self.posted.fetch_add(1, Ordering::Relaxed);
        let mut stdout = std::io::stdout().lock();
        for line in text.lines() {
            let _ = writeln!(stdout, "[#{}] {}", channel, line);
        }
        let _ = stdout.flush();
    }
}

#[async_trait]
impl OutputChannel for ConsoleChannel {
    async fn post(&self, channel: &ChannelId, text: &str) -> Result<(), OutputError> {
        self.print(channel, text);
        Ok(())
    }

    async fn post_with_attachment(
        &self,
        channel: &ChannelId,
        text: &str,
        handle: &AttachmentHandle,
        bytes: &[u8],
    ) -> Result<(), OutputError> {
        self.print(channel, text);
        self.print(
            channel,
            &format!("<attachment {} ({} bytes)>", handle, bytes.len()),
        );
        Ok(())
    }

    fn mention(&self, user: &PlayerName) -> String {
        format!("@{}", user)
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), OutputError> {
        debug!("Console message {} removed from history", message);
        Ok(())
    }
}

/// Everyone typing at the console is a known user
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleDirectory;

impl IdentityResolver for ConsoleDirectory {
    fn resolve_user(&self, name: &PlayerName) -> Option<String> {
        Some(format!("@{}", name))
    }
}

// ----------------------------------------------------------------------------
// Status Display
// ----------------------------------------------------------------------------

/// Render a session status for the terminal
pub fn format_status(puzzle: &str, status: &SessionStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} #{} ({:?})\n", puzzle, status.round, status.phase));
    out.push_str(&format!(
        "Channel: {}\n",
        status
            .channel
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string())
    ));

    if status.players.is_empty() {
        out.push_str("Players: none\n");
        return out;
    }

    out.push_str("Players:\n");
    for player in &status.players {
        let state = match (player.is_registered(), player.has_completed()) {
            (false, _) => "opted out".to_string(),
            (true, true) if player.has_attachment() => format!("done, score {}", player.score()),
            (true, true) => format!("score {}, screenshot missing", player.score()),
            (true, false) => "pending".to_string(),
        };
        out.push_str(&format!(
            "  {} - {} wins - {}\n",
            player.name(),
            player.win_count(),
            state
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_line() {
        assert_eq!(
            ConsoleLine::parse("alice: Spellcheck #3\\n🟩🟥").unwrap(),
            ConsoleLine::Message {
                author: "alice".to_string(),
                text: "Spellcheck #3\n🟩🟥".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            ConsoleLine::parse("/register bob").unwrap(),
            ConsoleLine::Register("bob".to_string())
        );
        assert_eq!(
            ConsoleLine::parse("/attach bob ./shot.png nailed it").unwrap(),
            ConsoleLine::Attach {
                author: "bob".to_string(),
                path: "./shot.png".to_string(),
                caption: "nailed it".to_string(),
            }
        );
        assert_eq!(ConsoleLine::parse("  ").unwrap(), ConsoleLine::Empty);
        assert_eq!(ConsoleLine::parse("/quit").unwrap(), ConsoleLine::Quit);
    }

    #[test]
    fn test_parse_errors() {
        assert!(ConsoleLine::parse("/register").is_err());
        assert!(ConsoleLine::parse("/register two names").is_err());
        assert!(ConsoleLine::parse("/attach bob").is_err());
        assert!(ConsoleLine::parse("/dance").is_err());
        assert!(ConsoleLine::parse("no colon here").is_err());
    }
}
