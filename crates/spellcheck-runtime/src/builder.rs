//! Tracker Builder API
//!
//! Wires the collaborators into a `SessionCoordinator`, starts the tracker
//! task and the boundary timer, and hands back a `TrackerHandle` that
//! front-ends (CLI, tests) use to feed it.

use std::sync::Arc;
use std::time::Duration;

use spellcheck_core::{
    AttachmentStore, BoundaryReport, ChannelId, Collaborators, DaySchedule, DeregisterOutcome,
    IdentityResolver, InboundMessage, MessageDisposition, OutputChannel, PlayerName,
    RegisterOutcome, SessionCoordinator, SessionStatus, SnapshotStore, SystemTimeSource,
    TimeSource, TrackerConfig, TrackerResult,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{RuntimeError, RuntimeResult};
use crate::scheduler::{BoundaryTimer, DEFAULT_RETRY_INTERVAL};
use crate::tracker::{TrackerCommand, TrackerSender, TrackerTask};

const DEFAULT_CHANNEL_BUFFER: usize = 64;

// ----------------------------------------------------------------------------
// Tracker Builder
// ----------------------------------------------------------------------------

/// Builder for a running tracker
pub struct TrackerBuilder {
    config: TrackerConfig,
    io: Collaborators,
    clock: Arc<dyn TimeSource>,
    enable_timer: bool,
    retry_interval: Duration,
    channel_buffer_size: usize,
}

impl TrackerBuilder {
    pub fn new(
        snapshots: Arc<dyn SnapshotStore>,
        attachments: Arc<dyn AttachmentStore>,
        output: Arc<dyn OutputChannel>,
        directory: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            config: TrackerConfig::default(),
            io: Collaborators {
                snapshots,
                attachments,
                output,
                directory,
            },
            clock: Arc::new(SystemTimeSource),
            enable_timer: true,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            channel_buffer_size: DEFAULT_CHANNEL_BUFFER,
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a different wall clock for the boundary timer
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Run without the boundary timer; boundaries then only fire on
    /// explicit [`TrackerHandle::tick`] calls
    pub fn without_timer(mut self) -> Self {
        self.enable_timer = false;
        self
    }

    /// How soon a failed boundary is retried inside its window
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size.max(1);
        self
    }

    /// Load state, then start the tracker task and the boundary timer
    pub async fn build_and_start(self) -> RuntimeResult<TrackerHandle> {
        info!("Starting {} tracker", self.config.puzzle_name);

        let schedule = DaySchedule::from_config(&self.config.schedule)?;
        let max_sleep = Duration::from_secs(self.config.schedule.max_sleep_secs);
        let retry_interval = self.retry_interval;
        let coordinator = SessionCoordinator::start(self.config, self.io).await?;

        let (sender, receiver) = mpsc::channel(self.channel_buffer_size);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let tracker = TrackerTask::new(coordinator, receiver);
        let tracker_handle = tokio::spawn(tracker.run());

        let timer_handle = self.enable_timer.then(|| {
            let timer = BoundaryTimer::new(
                self.clock.clone(),
                schedule,
                max_sleep,
                sender.clone(),
                shutdown_rx,
            )
            .with_retry_interval(retry_interval);
            tokio::spawn(timer.run())
        });

        info!("Tracker started");

        Ok(TrackerHandle {
            sender,
            shutdown_signal: shutdown_tx,
            tracker_handle: Some(tracker_handle),
            timer_handle,
        })
    }
}

// ----------------------------------------------------------------------------
// Tracker Handle
// ----------------------------------------------------------------------------

/// Handle to a running tracker
pub struct TrackerHandle {
    sender: TrackerSender,
    shutdown_signal: watch::Sender<bool>,
    tracker_handle: Option<JoinHandle<SessionCoordinator>>,
    timer_handle: Option<JoinHandle<()>>,
}

impl TrackerHandle {
    pub fn command_sender(&self) -> TrackerSender {
        self.sender.clone()
    }

    pub fn is_running(&self) -> bool {
        self.tracker_handle
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    async fn send(&self, command: TrackerCommand) -> RuntimeResult<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RuntimeError::ChannelClosed)
    }

    async fn request<T>(
        &self,
        command: TrackerCommand,
        reply: oneshot::Receiver<TrackerResult<T>>,
    ) -> RuntimeResult<T> {
        self.send(command).await?;
        let result = reply.await.map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(result?)
    }

    /// Feed a chat message and wait for its disposition
    pub async fn message(&self, message: InboundMessage) -> RuntimeResult<MessageDisposition> {
        let (reply, rx) = oneshot::channel();
        self.request(
            TrackerCommand::Message {
                message,
                reply: Some(reply),
            },
            rx,
        )
        .await
    }

    pub async fn register(
        &self,
        user: PlayerName,
        channel: ChannelId,
    ) -> RuntimeResult<RegisterOutcome> {
        let (reply, rx) = oneshot::channel();
        self.request(
            TrackerCommand::Register {
                user,
                channel,
                reply: Some(reply),
            },
            rx,
        )
        .await
    }

    pub async fn deregister(
        &self,
        user: PlayerName,
        channel: ChannelId,
    ) -> RuntimeResult<DeregisterOutcome> {
        let (reply, rx) = oneshot::channel();
        self.request(
            TrackerCommand::Deregister {
                user,
                channel,
                reply: Some(reply),
            },
            rx,
        )
        .await
    }

    /// Fire any boundary due at `now`
    pub async fn tick(&self, now: chrono::NaiveDateTime) -> RuntimeResult<Vec<BoundaryReport>> {
        let (reply, rx) = oneshot::channel();
        self.send(TrackerCommand::Tick {
            now,
            reply: Some(reply),
        })
        .await?;
        let outcome = rx.await.map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(outcome.reports)
    }

    pub async fn status(&self) -> RuntimeResult<SessionStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(TrackerCommand::Status { reply }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stop the timer and the tracker task, returning the final coordinator
    pub async fn shutdown(&mut self) -> RuntimeResult<Option<SessionCoordinator>> {
        info!("Shutting down tracker");

        let _ = self.shutdown_signal.send(true);
        if let Some(timer) = self.timer_handle.take() {
            timer
                .await
                .map_err(|e| RuntimeError::TaskJoin(e.to_string()))?;
        }

        let _ = self.send(TrackerCommand::Shutdown).await;
        let coordinator = match self.tracker_handle.take() {
            Some(handle) => Some(
                handle
                    .await
                    .map_err(|e| RuntimeError::TaskJoin(e.to_string()))?,
            ),
            None => None,
        };

        info!("Tracker shut down");
        Ok(coordinator)
    }
}
