//! Command handlers for the Spellcheck CLI

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use spellcheck_core::{
    notices, ChannelId, InboundMessage, MessageRef, PlayerName, Session, SessionStatus,
    SnapshotStore,
};
use spellcheck_runtime::{
    FileAttachmentStore, JsonSnapshotStore, RuntimeError, TrackerBuilder, TrackerHandle,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::console::{format_status, ConsoleChannel, ConsoleDirectory, ConsoleLine, HELP};
use crate::error::{CliError, Result};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(cli: Cli, config: AppConfig) -> Result<()> {
        match cli.command {
            Commands::Run { channel } => {
                let channel = channel.unwrap_or_else(|| config.console.channel.clone());
                Self::handle_run_command(config, ChannelId::new(channel)).await
            }
            Commands::Status => Self::handle_status_command(&config).await,
            Commands::InitConfig { output, force } => {
                Self::handle_init_config_command(output.as_deref(), force)
            }
        }
    }

    /// Run the tracker against the console until /quit, EOF or Ctrl+C
    async fn handle_run_command(config: AppConfig, channel: ChannelId) -> Result<()> {
        let snapshot_path = config.snapshot_path();
        let attachment_path = config.attachment_path();
        info!("Session snapshot: {}", snapshot_path.display());
        info!("Screenshots: {}", attachment_path.display());

        let mut tracker = TrackerBuilder::new(
            Arc::new(JsonSnapshotStore::new(snapshot_path)),
            Arc::new(FileAttachmentStore::new(attachment_path)),
            Arc::new(ConsoleChannel::new()),
            Arc::new(ConsoleDirectory),
        )
        .with_config(config.tracker.clone())
        .build_and_start()
        .await?;

        println!(
            "{} tracker running in #{}. Type /help for commands.",
            config.tracker.puzzle_name, channel
        );

        let mut session = ConsoleSession::new(&config, channel);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !session.handle_line(&tracker, &line).await {
                                break;
                            }
                        }
                        None => {
                            info!("Console input closed");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        tracker.shutdown().await?;
        Ok(())
    }

    /// Print the saved session without starting the tracker
    async fn handle_status_command(config: &AppConfig) -> Result<()> {
        let store = JsonSnapshotStore::new(config.snapshot_path());
        let Some(snapshot) = store.load().await? else {
            println!("No saved session at {}", store.path().display());
            return Ok(());
        };

        let status = SessionStatus::from(&Session::from_snapshot(&snapshot));
        print!("{}", format_status(&config.tracker.puzzle_name, &status));
        Ok(())
    }

    fn handle_init_config_command(output: Option<&str>, force: bool) -> Result<()> {
        let content = AppConfig::example_config();
        match output {
            None => {
                println!("{}", content);
                Ok(())
            }
            Some(path) => {
                let path = Path::new(path);
                if path.exists() && !force {
                    return Err(CliError::Config(format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    )));
                }
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, content)?;
                println!("Wrote example configuration to {}", path.display());
                Ok(())
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Console Session
// ----------------------------------------------------------------------------

/// Translates console lines into tracker commands
pub struct ConsoleSession {
    puzzle_name: String,
    channel: ChannelId,
    next_message: u64,
}

impl ConsoleSession {
    pub fn new(config: &AppConfig, channel: ChannelId) -> Self {
        Self {
            puzzle_name: config.tracker.puzzle_name.clone(),
            channel,
            next_message: 0,
        }
    }

    fn message_ref(&mut self) -> MessageRef {
        self.next_message += 1;
        MessageRef::new(format!("console-{}", self.next_message))
    }

    /// Handle one line; returns false when the console should stop
    pub async fn handle_line(&mut self, tracker: &TrackerHandle, line: &str) -> bool {
        let parsed = match ConsoleLine::parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                println!("{}", e);
                return true;
            }
        };

        match self.dispatch(tracker, parsed).await {
            Ok(keep_going) => keep_going,
            Err(e) => {
                // Rejections have already been answered in the channel
                let answered = matches!(
                    &e,
                    CliError::Runtime(RuntimeError::Tracker(t)) if t.is_recoverable()
                );
                if !answered {
                    warn!("{}", e);
                }
                true
            }
        }
    }

    async fn dispatch(&mut self, tracker: &TrackerHandle, line: ConsoleLine) -> Result<bool> {
        match line {
            ConsoleLine::Empty => {}
            ConsoleLine::Help => println!("{}", HELP),
            ConsoleLine::Quit => return Ok(false),
            ConsoleLine::Message { author, text } => {
                let message = InboundMessage::text(
                    author.as_str(),
                    self.channel.clone(),
                    self.message_ref(),
                    text,
                );
                tracker.message(message).await?;
            }
            ConsoleLine::Register(user) => {
                let outcome = tracker
                    .register(PlayerName::new(&user), self.channel.clone())
                    .await?;
                self.reply(&user, &notices::register_reply(&self.puzzle_name, outcome));
            }
            ConsoleLine::Deregister(user) => {
                let outcome = tracker
                    .deregister(PlayerName::new(&user), self.channel.clone())
                    .await?;
                self.reply(&user, &notices::deregister_reply(&self.puzzle_name, &outcome));
            }
            ConsoleLine::Attach {
                author,
                path,
                caption,
            } => {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read screenshot {}", path))?;
                let message = InboundMessage::text(
                    author.as_str(),
                    self.channel.clone(),
                    self.message_ref(),
                    caption,
                )
                .with_attachment(bytes, true);
                tracker.message(message).await?;
            }
            ConsoleLine::Tick => {
                let reports = tracker.tick(chrono::Local::now().naive_local()).await?;
                if reports.is_empty() {
                    println!("No boundary due");
                }
            }
            ConsoleLine::Status => {
                let status = tracker.status().await?;
                print!("{}", format_status(&self.puzzle_name, &status));
            }
        }
        Ok(true)
    }

    fn reply(&self, user: &str, text: &str) {
        println!("[#{}] @{}: {}", self.channel, user, text);
    }
}
