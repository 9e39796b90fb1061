//! Session aggregate
//!
//! The single owned piece of mutable game state: active round, scored flag,
//! boundary guards, active channel and the roster. Every mutation goes
//! through a method here; the coordinator applies them to a staged clone
//! and swaps it in only once the snapshot is durable.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::errors::{TrackerError, TrackerResult};
use crate::player::Player;
use crate::registry::{DeregisterOutcome, PlayerRegistry, RegisterOutcome};
use crate::schedule::{BoundaryGuard, DailyBoundary};
use crate::snapshot::{SessionSnapshot, SNAPSHOT_VERSION};
use crate::submission::Submission;
use crate::tally::{Scoreboard, TallyEngine};
use crate::types::{AttachmentHandle, ChannelId, PlayerName, RoundNumber};

/// Where the current round stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    AwaitingSubmissions,
    Scored,
}

/// Attachment taken off a player, to be published and then deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    pub player: PlayerName,
    pub handle: AttachmentHandle,
    pub caption: Option<String>,
    /// False for opted-out players, whose blobs are only deleted
    pub publish: bool,
}

/// Process-wide game state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    channel: Option<ChannelId>,
    round: RoundNumber,
    scored_today: bool,
    warning_sent: BoundaryGuard,
    rollover_handled: BoundaryGuard,
    registry: PlayerRegistry,
}

impl Session {
    /// A fresh session starting at `round`
    pub fn new(round: RoundNumber) -> Self {
        Self {
            round,
            ..Self::default()
        }
    }

    /// Rebuild the session from a persisted snapshot
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let players = snapshot.players.iter().map(Player::restore).collect();
        Self {
            channel: snapshot.channel.clone(),
            round: snapshot.round_number,
            scored_today: snapshot.scored_today,
            warning_sent: BoundaryGuard::fired(snapshot.last_warning),
            rollover_handled: BoundaryGuard::fired(snapshot.last_rollover),
            registry: PlayerRegistry::from_players(players),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            channel: self.channel.clone(),
            round_number: self.round,
            scored_today: self.scored_today,
            last_warning: self.warning_sent.fired_on(),
            last_rollover: self.rollover_handled.fired_on(),
            players: self.registry.all().iter().map(Player::record).collect(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn round(&self) -> RoundNumber {
        self.round
    }

    pub fn is_scored(&self) -> bool {
        self.scored_today
    }

    pub fn phase(&self) -> RoundPhase {
        if self.scored_today {
            RoundPhase::Scored
        } else {
            RoundPhase::AwaitingSubmissions
        }
    }

    pub fn channel(&self) -> Option<&ChannelId> {
        self.channel.as_ref()
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn guard(&self, boundary: DailyBoundary) -> &BoundaryGuard {
        match boundary {
            DailyBoundary::Warning => &self.warning_sent,
            DailyBoundary::Rollover => &self.rollover_handled,
        }
    }

    /// Every registered player has reported and attached a screenshot
    ///
    /// False with nobody registered, so an empty roster never completes.
    pub fn all_reported(&self) -> bool {
        self.registry.has_registered() && self.registry.registered().all(Player::is_ready)
    }

    /// Round is open and everyone is in
    pub fn ready_to_tally(&self) -> bool {
        !self.scored_today && self.all_reported()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub fn set_channel(&mut self, channel: ChannelId) {
        self.channel = Some(channel);
    }

    pub fn register(&mut self, name: &PlayerName) -> RegisterOutcome {
        self.registry.register(name)
    }

    pub fn deregister(&mut self, name: &PlayerName) -> DeregisterOutcome {
        self.registry.deregister(name)
    }

    /// Check that `name` may submit for the current round
    pub fn check_can_submit(&self, name: &PlayerName) -> TrackerResult<()> {
        if self.scored_today {
            return Err(TrackerError::RoundClosed { round: self.round });
        }
        if !self.registry.has_registered() {
            return Err(TrackerError::NoRegisteredPlayers);
        }
        match self.registry.find(name) {
            Some(player) if !player.is_registered() => Err(TrackerError::NotRegistered {
                player: name.clone(),
            }),
            Some(player) if player.has_completed() => Err(TrackerError::AlreadyCompleted {
                player: name.clone(),
            }),
            Some(_) => Ok(()),
            None => Err(TrackerError::NotRegistered {
                player: name.clone(),
            }),
        }
    }

    /// Record a parsed submission, overwriting any earlier score
    ///
    /// Returns the score and whether the player still owes a screenshot.
    pub fn accept_submission(
        &mut self,
        name: &PlayerName,
        submission: &Submission,
    ) -> TrackerResult<(u32, bool)> {
        self.check_can_submit(name)?;
        if submission.round() != self.round {
            return Err(TrackerError::RoundMismatch {
                expected: self.round,
                declared: submission.round(),
            });
        }

        let score = submission.score();
        let player = self
            .registry
            .find_mut(name)
            .ok_or_else(|| TrackerError::NotRegistered {
                player: name.clone(),
            })?;
        player.record_score(score);
        debug!("Player {} - score: {}", name, score);

        Ok((score, !player.has_attachment()))
    }

    /// Remember a stored screenshot for a known player
    ///
    /// Returns whether it replaced an earlier one.
    pub fn attach(
        &mut self,
        name: &PlayerName,
        handle: AttachmentHandle,
        caption: Option<String>,
    ) -> TrackerResult<bool> {
        let player = self
            .registry
            .find_mut(name)
            .ok_or_else(|| TrackerError::NotRegistered {
                player: name.clone(),
            })?;
        let replaced = player.has_attachment();
        player.attach(handle, caption);
        Ok(replaced)
    }

    /// Rank the round and close it
    pub fn tally(&mut self) -> TrackerResult<Scoreboard> {
        let board = TallyEngine.tally(&mut self.registry, self.round)?;
        self.scored_today = true;
        Ok(board)
    }

    /// Take every stored screenshot; registered players' are for publication
    pub fn take_attachments(&mut self) -> Vec<PendingAttachment> {
        self.registry
            .iter_mut()
            .filter_map(|p| {
                let player = p.name().clone();
                let publish = p.is_registered();
                p.take_attachment().map(|(handle, caption)| PendingAttachment {
                    player,
                    handle,
                    caption,
                    publish,
                })
            })
            .collect()
    }

    /// Clear round state for every player and open the next round
    pub fn advance_round(&mut self) {
        for player in self.registry.iter_mut() {
            player.reset_for_new_round();
        }
        self.scored_today = false;
        self.round = self.round.next();
        info!("Advanced to round {}", self.round);
    }

    pub fn fire_guard(&mut self, boundary: DailyBoundary, date: NaiveDate) {
        match boundary {
            DailyBoundary::Warning => self.warning_sent.fire(date),
            DailyBoundary::Rollover => self.rollover_handled.fire(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::submission::SubmissionParser;

    fn name(s: &str) -> PlayerName {
        PlayerName::new(s)
    }

    fn submission(text: &str) -> Submission {
        SubmissionParser::from_config(&TrackerConfig::default())
            .parse(text)
            .unwrap()
    }

    #[test]
    fn test_accept_submission_flow() {
        let mut session = Session::new(RoundNumber::new(4));
        session.register(&name("alice"));

        let (score, awaiting) = session
            .accept_submission(&name("alice"), &submission("Spellcheck #4\n🟩🟩"))
            .unwrap();
        assert_eq!(score, 2);
        assert!(awaiting);

        let err = session
            .accept_submission(&name("alice"), &submission("Spellcheck #4\n🟥🟥"))
            .unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyCompleted { .. }));
        assert_eq!(session.registry().find(&name("alice")).unwrap().score(), 2);
    }

    #[test]
    fn test_stale_round_never_mutates() {
        let mut session = Session::new(RoundNumber::new(4));
        session.register(&name("alice"));

        let err = session
            .accept_submission(&name("alice"), &submission("Spellcheck #3\n🟩🟩"))
            .unwrap_err();
        assert!(matches!(err, TrackerError::RoundMismatch { .. }));
        let alice = session.registry().find(&name("alice")).unwrap();
        assert_eq!(alice.score(), 0);
        assert!(!alice.has_completed());
    }

    #[test]
    fn test_submission_rejections() {
        let mut session = Session::new(RoundNumber::new(1));
        assert!(matches!(
            session.check_can_submit(&name("alice")),
            Err(TrackerError::NoRegisteredPlayers)
        ));

        session.register(&name("alice"));
        assert!(matches!(
            session.check_can_submit(&name("bob")),
            Err(TrackerError::NotRegistered { .. })
        ));

        session.register(&name("bob"));
        session.deregister(&name("bob"));
        assert!(matches!(
            session.check_can_submit(&name("bob")),
            Err(TrackerError::NotRegistered { .. })
        ));

        session.tally().unwrap();
        assert!(matches!(
            session.check_can_submit(&name("alice")),
            Err(TrackerError::RoundClosed { .. })
        ));
    }

    #[test]
    fn test_all_reported_requires_attachment() {
        let mut session = Session::new(RoundNumber::new(1));
        assert!(!session.all_reported());

        session.register(&name("alice"));
        session
            .accept_submission(&name("alice"), &submission("Spellcheck #1\n🟩"))
            .unwrap();
        assert!(!session.ready_to_tally());

        session
            .attach(&name("alice"), AttachmentHandle::new("alice.png"), None)
            .unwrap();
        assert!(session.ready_to_tally());

        session.tally().unwrap();
        assert_eq!(session.phase(), RoundPhase::Scored);
        assert!(!session.ready_to_tally());
    }

    #[test]
    fn test_advance_round_resets_players() {
        let mut session = Session::new(RoundNumber::new(9));
        session.register(&name("alice"));
        session
            .accept_submission(&name("alice"), &submission("Spellcheck #9\n🟩"))
            .unwrap();
        session.tally().unwrap();

        session.advance_round();
        assert_eq!(session.round(), RoundNumber::new(10));
        assert!(!session.is_scored());
        let alice = session.registry().find(&name("alice")).unwrap();
        assert_eq!(alice.score(), 0);
        assert!(!alice.has_completed());
        assert_eq!(alice.win_count(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut session = Session::new(RoundNumber::new(2));
        session.set_channel(ChannelId::new("general"));
        session.register(&name("alice"));
        session.register(&name("bob"));
        session.deregister(&name("bob"));
        session
            .accept_submission(&name("alice"), &submission("Spellcheck #2\n🟩🟥"))
            .unwrap();

        let midnight = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        session.fire_guard(DailyBoundary::Rollover, midnight);

        let restored = Session::from_snapshot(&session.snapshot());
        assert_eq!(restored.snapshot(), session.snapshot());
        assert_eq!(restored.channel().map(|c| c.as_str()), Some("general"));
        assert!(!restored.guard(DailyBoundary::Rollover).is_armed(midnight));
        assert!(restored.guard(DailyBoundary::Warning).is_armed(midnight));
    }

    #[test]
    fn test_take_attachments_publishes_only_registered() {
        let mut session = Session::new(RoundNumber::new(1));
        session.register(&name("alice"));
        session.register(&name("bob"));
        session
            .attach(&name("alice"), AttachmentHandle::new("a"), Some("cap".into()))
            .unwrap();
        session.attach(&name("bob"), AttachmentHandle::new("b"), None).unwrap();
        session.deregister(&name("bob"));

        let taken = session.take_attachments();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].player.as_str(), "alice");
        assert!(taken[0].publish);
        assert_eq!(taken[0].caption.as_deref(), Some("cap"));
        assert!(!taken[1].publish);
        assert!(!session
            .registry()
            .find(&name("alice"))
            .unwrap()
            .has_attachment());
    }
}
