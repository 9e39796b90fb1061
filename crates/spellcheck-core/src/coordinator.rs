//! Session Coordinator
//!
//! The top-level state machine. It owns the [`Session`] and reaches the
//! outside world only through the collaborator traits, so it can be driven
//! by the tokio runtime or directly from tests.
//!
//! Every state change follows the same discipline: clone the session, apply
//! the change to the clone, save the clone's snapshot, then swap it in. A
//! failed save leaves the in-memory state exactly as it was. Chat output
//! happens only after the swap and its failures are logged, never rolled
//! back.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, error, info, warn};

use crate::channel::{IdentityResolver, InboundMessage, OutputChannel};
use crate::config::TrackerConfig;
use crate::errors::{TrackerError, TrackerResult};
use crate::notices;
use crate::player::Player;
use crate::registry::{DeregisterOutcome, RegisterOutcome};
use crate::schedule::{DailyBoundary, DaySchedule};
use crate::session::{PendingAttachment, RoundPhase, Session};
use crate::storage::{AttachmentStore, SnapshotStore};
use crate::submission::SubmissionParser;
use crate::tally::Scoreboard;
use crate::types::{ChannelId, PlayerName, RoundNumber};

// ----------------------------------------------------------------------------
// Collaborators
// ----------------------------------------------------------------------------

/// External services the coordinator depends on
#[derive(Clone)]
pub struct Collaborators {
    pub snapshots: Arc<dyn SnapshotStore>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub output: Arc<dyn OutputChannel>,
    pub directory: Arc<dyn IdentityResolver>,
}

// ----------------------------------------------------------------------------
// Results
// ----------------------------------------------------------------------------

/// Accepted result submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub player: PlayerName,
    pub score: u32,
    pub awaiting_attachment: bool,
    /// Present when this submission completed the round
    pub scoreboard: Option<Scoreboard>,
}

/// Stored screenshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentReceipt {
    pub player: PlayerName,
    pub replaced: bool,
    /// Present when this attachment completed the round
    pub scoreboard: Option<Scoreboard>,
}

/// What happened to an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDisposition {
    Submitted(SubmissionReceipt),
    AttachmentStored(AttachmentReceipt),
    Ignored,
}

/// A boundary that fired during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryReport {
    Warning {
        round: RoundNumber,
        mentioned: usize,
    },
    Rollover {
        closed: RoundNumber,
        opened: RoundNumber,
        /// Present when the closing round had to be force-tallied
        scoreboard: Option<Scoreboard>,
        shamed: usize,
    },
}

/// Read-only view of the session for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub round: RoundNumber,
    pub phase: RoundPhase,
    pub channel: Option<ChannelId>,
    pub players: Vec<Player>,
}

impl From<&Session> for SessionStatus {
    fn from(session: &Session) -> Self {
        Self {
            round: session.round(),
            phase: session.phase(),
            channel: session.channel().cloned(),
            players: session.registry().all().to_vec(),
        }
    }
}

// ----------------------------------------------------------------------------
// Session Coordinator
// ----------------------------------------------------------------------------

pub struct SessionCoordinator {
    config: TrackerConfig,
    parser: SubmissionParser,
    schedule: DaySchedule,
    session: Session,
    io: Collaborators,
}

impl SessionCoordinator {
    /// Create a coordinator around an existing session
    pub fn new(config: TrackerConfig, session: Session, io: Collaborators) -> TrackerResult<Self> {
        config.validate()?;
        let schedule = DaySchedule::from_config(&config.schedule)?;
        let parser = SubmissionParser::from_config(&config);

        Ok(Self {
            config,
            parser,
            schedule,
            session,
            io,
        })
    }

    /// Load the last snapshot (or start fresh) and recover stored attachments
    pub async fn start(config: TrackerConfig, io: Collaborators) -> TrackerResult<Self> {
        let session = match io.snapshots.load().await? {
            Some(snapshot) => {
                info!(
                    "Loaded snapshot: round {}, scored: {}, {} player(s)",
                    snapshot.round_number,
                    snapshot.scored_today,
                    snapshot.players.len()
                );
                Session::from_snapshot(&snapshot)
            }
            None => {
                info!("No snapshot found, starting a fresh session");
                Session::default()
            }
        };

        let mut coordinator = Self::new(config, session, io)?;
        coordinator.recover_attachments().await;
        Ok(coordinator)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn schedule(&self) -> &DaySchedule {
        &self.schedule
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from(&self.session)
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register `user`; the command's channel becomes the active channel
    pub async fn register(
        &mut self,
        user: &PlayerName,
        channel: &ChannelId,
    ) -> TrackerResult<RegisterOutcome> {
        let mut staged = self.session.clone();
        staged.set_channel(channel.clone());
        let outcome = staged.register(user);
        self.commit(staged).await?;

        match outcome {
            RegisterOutcome::AlreadyRegistered => {
                info!("User {} attempted to re-register for tracking", user)
            }
            _ => info!("Registering user {} for tracking", user),
        }
        Ok(outcome)
    }

    /// Opt `user` out, or purge their data if they already opted out
    pub async fn deregister(
        &mut self,
        user: &PlayerName,
        channel: &ChannelId,
    ) -> TrackerResult<DeregisterOutcome> {
        let mut staged = self.session.clone();
        staged.set_channel(channel.clone());
        let outcome = staged.deregister(user);
        self.commit(staged).await?;

        match &outcome {
            DeregisterOutcome::Deregistered => info!("Deregistered user {}", user),
            DeregisterOutcome::DataDeleted { removed } => {
                info!("Deleted data for user {}", user);
                if let Some(handle) = removed.attachment() {
                    if let Err(e) = self.io.attachments.delete(handle).await {
                        warn!("Failed to delete attachment {}: {}", handle, e);
                    }
                }
            }
            DeregisterOutcome::NotFound => {
                info!("Non-existent user {} attempted to deregister", user)
            }
        }
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Inbound messages
    // ------------------------------------------------------------------

    /// Classify and process one chat message
    ///
    /// Rejected submissions are answered in the chat and returned as the
    /// error that caused them.
    pub async fn handle_message(
        &mut self,
        message: InboundMessage,
    ) -> TrackerResult<MessageDisposition> {
        if self.parser.looks_like_result(&message.content) {
            return self
                .handle_submission(&message)
                .await
                .map(MessageDisposition::Submitted);
        }

        if self.accepts_attachment(&message) {
            return self
                .handle_attachment(&message)
                .await
                .map(MessageDisposition::AttachmentStored);
        }

        Ok(MessageDisposition::Ignored)
    }

    fn accepts_attachment(&self, message: &InboundMessage) -> bool {
        let Some(attachment) = &message.attachment else {
            return false;
        };
        attachment.spoiler
            && !self.session.is_scored()
            && self.session.channel() == Some(&message.channel)
            && self.session.registry().find(&message.author).is_some()
    }

    async fn handle_submission(&mut self, message: &InboundMessage) -> TrackerResult<SubmissionReceipt> {
        // Raw results never stay visible, accepted or not
        if let Err(e) = self.io.output.delete_message(&message.message).await {
            warn!("Failed to delete result message {}: {}", message.message, e);
        }

        match self.record_submission(message).await {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                if e.is_recoverable() {
                    info!("Rejected submission from {}: {}", message.author, e);
                } else {
                    error!("Failed to record submission from {}: {}", message.author, e);
                }
                let mention = self.io.output.mention(&message.author);
                let reply = notices::rejection(&self.config.puzzle_name, &mention, &e);
                self.post(&message.channel, &reply).await;
                Err(e)
            }
        }
    }

    async fn record_submission(&mut self, message: &InboundMessage) -> TrackerResult<SubmissionReceipt> {
        let author = &message.author;
        self.session.check_can_submit(author)?;
        let submission = self
            .parser
            .parse_for_round(&message.content, self.session.round())?;

        let mut staged = self.session.clone();
        staged.set_channel(message.channel.clone());
        let (score, awaiting_attachment) = staged.accept_submission(author, &submission)?;
        self.commit(staged).await?;

        info!("Player {} - score: {}", author, score);
        let ack = notices::score_ack(author, score, awaiting_attachment);
        self.post(&message.channel, &ack).await;

        let scoreboard = self.complete_if_ready().await;
        Ok(SubmissionReceipt {
            player: author.clone(),
            score,
            awaiting_attachment,
            scoreboard,
        })
    }

    async fn handle_attachment(&mut self, message: &InboundMessage) -> TrackerResult<AttachmentReceipt> {
        let author = &message.author;
        let bytes = message
            .attachment
            .as_ref()
            .map(|a| a.bytes.as_slice())
            .unwrap_or_default();

        let handle = self.io.attachments.put(author, bytes).await?;
        if let Err(e) = self.io.output.delete_message(&message.message).await {
            warn!("Failed to delete attachment message {}: {}", message.message, e);
        }

        let caption = Some(message.content.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let replaced = self.session.attach(author, handle, caption)?;
        let completed = self
            .session
            .registry()
            .find(author)
            .map(Player::has_completed)
            .unwrap_or(false);
        info!("Stored attachment from {} (replacement: {})", author, replaced);

        let ack = notices::attachment_ack(&self.config.puzzle_name, author, replaced, completed);
        self.post(&message.channel, &ack).await;

        let scoreboard = self.complete_if_ready().await;
        Ok(AttachmentReceipt {
            player: author.clone(),
            replaced,
            scoreboard,
        })
    }

    // ------------------------------------------------------------------
    // Completion
    // ------------------------------------------------------------------

    /// Tally and publish the round if every registered player is in
    pub async fn evaluate_completion(&mut self) -> TrackerResult<Option<Scoreboard>> {
        if self.session.is_scored() || !self.session.registry().has_registered() {
            return Ok(None);
        }

        if !self.session.all_reported() {
            for player in self.session.registry().registered().filter(|p| !p.is_ready()) {
                debug!("Waiting for {}", player.name());
            }
            return Ok(None);
        }

        let mut staged = self.session.clone();
        let board = staged.tally()?;
        let attachments = staged.take_attachments();
        self.commit(staged).await?;

        self.publish_results(&board, attachments).await;
        Ok(Some(board))
    }

    async fn complete_if_ready(&mut self) -> Option<Scoreboard> {
        match self.evaluate_completion().await {
            Ok(board) => board,
            Err(e) => {
                // Still ready on the next event, so completion is retried then
                error!("Failed to complete round {}: {}", self.session.round(), e);
                None
            }
        }
    }

    async fn publish_results(&self, board: &Scoreboard, attachments: Vec<PendingAttachment>) {
        let channel = self.session.channel().cloned();
        match &channel {
            Some(channel) => {
                self.post(channel, &board.render(&self.config.puzzle_name)).await;
            }
            None => warn!("No active channel; scoreboard for round {} not posted", board.round),
        }
        self.publish_attachments(channel.as_ref(), attachments).await;
    }

    async fn publish_attachments(
        &self,
        channel: Option<&ChannelId>,
        attachments: Vec<PendingAttachment>,
    ) {
        for pending in attachments {
            if let (true, Some(channel)) = (pending.publish, channel) {
                match self.io.attachments.get(&pending.handle).await {
                    Ok(bytes) => {
                        let text =
                            notices::attachment_caption(&pending.player, pending.caption.as_deref());
                        if let Err(e) = self
                            .io
                            .output
                            .post_with_attachment(channel, &text, &pending.handle, &bytes)
                            .await
                        {
                            warn!("Failed to post attachment of {}: {}", pending.player, e);
                        }
                    }
                    Err(e) => warn!("Failed to read attachment of {}: {}", pending.player, e),
                }
            }

            if let Err(e) = self.io.attachments.delete(&pending.handle).await {
                warn!("Error deleting {}: {}", pending.handle, e);
            }
        }
    }

    // ------------------------------------------------------------------
    // Day boundaries
    // ------------------------------------------------------------------

    /// Fire every boundary whose window contains `now` and has not fired yet
    ///
    /// Failures are logged and leave the boundary armed, so a later tick in
    /// the same window retries it.
    pub async fn tick(&mut self, now: NaiveDateTime) -> Vec<BoundaryReport> {
        let mut reports = Vec::new();

        for (boundary, date) in self.armed_due(now) {
            let result = match boundary {
                DailyBoundary::Warning => self.send_warning(date).await,
                DailyBoundary::Rollover => self.rollover(date).await,
            };

            match result {
                Ok(report) => reports.push(report),
                Err(e) => error!("{:?} boundary for {} failed: {}", boundary, date, e),
            }
        }

        reports
    }

    /// Boundaries whose window contains `now` and that have not fired yet
    pub fn armed_due(&self, now: NaiveDateTime) -> Vec<(DailyBoundary, NaiveDate)> {
        self.schedule
            .due(now)
            .into_iter()
            .filter(|(boundary, date)| self.session.guard(*boundary).is_armed(*date))
            .collect()
    }

    async fn send_warning(&mut self, date: NaiveDate) -> TrackerResult<BoundaryReport> {
        let round = self.session.round();
        let mut staged = self.session.clone();
        staged.fire_guard(DailyBoundary::Warning, date);
        self.commit(staged).await?;

        if self.session.is_scored() {
            return Ok(BoundaryReport::Warning {
                round,
                mentioned: 0,
            });
        }

        let mentions = self.mentions(self.session.registry().pending());
        if !mentions.is_empty() {
            let text = notices::warning(&self.config.puzzle_name, &mentions, round);
            self.post_to_active(&text).await;
        }
        info!("Sent warning for round {} to {} player(s)", round, mentions.len());

        Ok(BoundaryReport::Warning {
            round,
            mentioned: mentions.len(),
        })
    }

    async fn rollover(&mut self, date: NaiveDate) -> TrackerResult<BoundaryReport> {
        info!("Rollover: sending daily scoreboard if unscored, then opening the next round");
        let closed = self.session.round();

        let mut staged = self.session.clone();
        let mut shamed = Vec::new();
        let mut scoreboard = None;
        if !staged.is_scored() && staged.registry().has_registered() {
            shamed = self.mentions(staged.registry().pending());
            scoreboard = Some(staged.tally()?);
        }
        let attachments = staged.take_attachments();
        staged.advance_round();
        staged.fire_guard(DailyBoundary::Rollover, date);
        let opened = staged.round();
        self.commit(staged).await?;

        let puzzle = self.config.puzzle_name.clone();
        if let Some(board) = &scoreboard {
            if !shamed.is_empty() {
                self.post_to_active(&notices::shame(&puzzle, &shamed, closed))
                    .await;
            }
            self.publish_results(board, attachments).await;
        } else {
            self.publish_attachments(None, attachments).await;
        }

        if self.session.registry().has_registered() {
            let everyone = self.mentions(self.session.registry().registered());
            let text = notices::new_round(&puzzle, &self.config.puzzle_url, &everyone, opened);
            self.post_to_active(&text).await;
        }

        Ok(BoundaryReport::Rollover {
            closed,
            opened,
            scoreboard,
            shamed: shamed.len(),
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Make `staged` the session once its snapshot is durable
    async fn commit(&mut self, staged: Session) -> TrackerResult<()> {
        if let Err(e) = self.io.snapshots.save(&staged.snapshot()).await {
            error!("Failed to persist session snapshot: {}", e);
            return Err(e.into());
        }
        self.session = staged;
        Ok(())
    }

    async fn recover_attachments(&mut self) {
        if self.session.is_scored() {
            return;
        }

        let completed: Vec<PlayerName> = self
            .session
            .registry()
            .registered()
            .filter(|p| p.has_completed())
            .map(|p| p.name().clone())
            .collect();

        for name in completed {
            match self.io.attachments.find(&name).await {
                Ok(Some(handle)) => {
                    info!("Found {}'s answers as {}", name, handle);
                    if let Err(e) = self.session.attach(&name, handle, None) {
                        warn!("Could not restore attachment for {}: {}", name, e);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to look up attachment for {}: {}", name, e),
            }
        }
    }

    fn mentions<'a>(&self, players: impl Iterator<Item = &'a Player>) -> Vec<String> {
        players
            .filter_map(|player| {
                let token = self.io.directory.resolve_user(player.name());
                if token.is_none() {
                    warn!("Failed to mention user {}", player.name());
                }
                token
            })
            .collect()
    }

    async fn post(&self, channel: &ChannelId, text: &str) {
        if let Err(e) = self.io.output.post(channel, text).await {
            warn!("Failed to post to {}: {}", channel, e);
        }
    }

    async fn post_to_active(&self, text: &str) {
        match self.session.channel() {
            Some(channel) => self.post(channel, text).await,
            None => warn!("No active channel; dropping message: {}", text),
        }
    }
}
