//! Tracker Task
//!
//! Owns the `SessionCoordinator` and applies commands one at a time, so
//! inbound messages, registrations and boundary ticks never interleave.

use chrono::{NaiveDate, NaiveDateTime};
use spellcheck_core::{
    BoundaryReport, ChannelId, DailyBoundary, DeregisterOutcome, InboundMessage, MessageDisposition, PlayerName,
    RegisterOutcome, SessionCoordinator, SessionStatus, TrackerResult,
};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

// ----------------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------------

/// Work items for the tracker task
///
/// Reply senders are optional so callers may fire and forget.
#[derive(Debug)]
pub enum TrackerCommand {
    Message {
        message: InboundMessage,
        reply: Option<oneshot::Sender<TrackerResult<MessageDisposition>>>,
    },
    Register {
        user: PlayerName,
        channel: ChannelId,
        reply: Option<oneshot::Sender<TrackerResult<RegisterOutcome>>>,
    },
    Deregister {
        user: PlayerName,
        channel: ChannelId,
        reply: Option<oneshot::Sender<TrackerResult<DeregisterOutcome>>>,
    },
    Tick {
        now: NaiveDateTime,
        reply: Option<oneshot::Sender<TickOutcome>>,
    },
    Status {
        reply: oneshot::Sender<SessionStatus>,
    },
    Shutdown,
}

/// What a boundary tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Boundaries that fired
    pub reports: Vec<BoundaryReport>,
    /// Boundaries still due and armed after the tick; they failed and should
    /// be retried before their window closes
    pub pending: Vec<(DailyBoundary, NaiveDate)>,
}

pub type TrackerSender = mpsc::Sender<TrackerCommand>;
pub type TrackerReceiver = mpsc::Receiver<TrackerCommand>;

fn respond<T>(reply: Option<oneshot::Sender<T>>, value: T) {
    if let Some(reply) = reply {
        // Caller may have stopped waiting
        let _ = reply.send(value);
    }
}

// ----------------------------------------------------------------------------
// Tracker Task
// ----------------------------------------------------------------------------

pub struct TrackerTask {
    coordinator: SessionCoordinator,
    receiver: TrackerReceiver,
    running: bool,
}

impl TrackerTask {
    pub fn new(coordinator: SessionCoordinator, receiver: TrackerReceiver) -> Self {
        Self {
            coordinator,
            receiver,
            running: true,
        }
    }

    /// Process commands until shutdown or until every sender is gone
    pub async fn run(mut self) -> SessionCoordinator {
        info!(
            "Tracker task starting at round {}",
            self.coordinator.session().round()
        );

        while self.running {
            match self.receiver.recv().await {
                Some(command) => self.process(command).await,
                None => {
                    info!("Command channel closed, shutting down");
                    break;
                }
            }
        }

        info!("Tracker task stopped");
        self.coordinator
    }

    async fn process(&mut self, command: TrackerCommand) {
        match command {
            TrackerCommand::Message { message, reply } => {
                debug!("Message from {} in {}", message.author, message.channel);
                let result = self.coordinator.handle_message(message).await;
                respond(reply, result);
            }
            TrackerCommand::Register {
                user,
                channel,
                reply,
            } => {
                let result = self.coordinator.register(&user, &channel).await;
                if let Err(e) = &result {
                    warn!("Registration of {} failed: {}", user, e);
                }
                respond(reply, result);
            }
            TrackerCommand::Deregister {
                user,
                channel,
                reply,
            } => {
                let result = self.coordinator.deregister(&user, &channel).await;
                if let Err(e) = &result {
                    warn!("Deregistration of {} failed: {}", user, e);
                }
                respond(reply, result);
            }
            TrackerCommand::Tick { now, reply } => {
                let reports = self.coordinator.tick(now).await;
                for report in &reports {
                    info!("Boundary fired: {:?}", report);
                }
                let pending = self.coordinator.armed_due(now);
                if !pending.is_empty() {
                    warn!("Boundaries still pending after tick: {:?}", pending);
                }
                respond(reply, TickOutcome { reports, pending });
            }
            TrackerCommand::Status { reply } => {
                let _ = reply.send(self.coordinator.status());
            }
            TrackerCommand::Shutdown => {
                info!("Shutdown requested");
                self.running = false;
            }
        }
    }
}
