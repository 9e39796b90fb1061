//! Player records
//!
//! A `Player` is read-only outside the crate; the registry, the session and
//! the tally engine mutate it through crate-private methods.

use crate::snapshot::PlayerRecord;
use crate::types::{AttachmentHandle, PlayerName};

/// One roster entry and its state for the active round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    name: PlayerName,
    score: u32,
    win_count: u32,
    registered: bool,
    completed_today: bool,
    attachment: Option<AttachmentHandle>,
    caption: Option<String>,
}

impl Player {
    /// Create a freshly registered player
    pub(crate) fn new(name: PlayerName) -> Self {
        Self {
            name,
            score: 0,
            win_count: 0,
            registered: true,
            completed_today: false,
            attachment: None,
            caption: None,
        }
    }

    /// Rebuild a player from its persisted record
    pub(crate) fn restore(record: &PlayerRecord) -> Self {
        Self {
            name: record.name.clone(),
            score: record.score,
            win_count: record.win_count,
            registered: record.registered,
            completed_today: record.completed_today,
            attachment: None,
            caption: None,
        }
    }

    pub(crate) fn record(&self) -> PlayerRecord {
        PlayerRecord {
            name: self.name.clone(),
            win_count: self.win_count,
            score: self.score,
            registered: self.registered,
            completed_today: self.completed_today,
        }
    }

    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    /// Score for the active round; lower is better
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn win_count(&self) -> u32 {
        self.win_count
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn has_completed(&self) -> bool {
        self.completed_today
    }

    pub fn attachment(&self) -> Option<&AttachmentHandle> {
        self.attachment.as_ref()
    }

    /// Text posted alongside the attachment, re-displayed with it
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    /// Registered but has not reported this round
    pub fn is_pending(&self) -> bool {
        self.registered && !self.completed_today
    }

    /// Registered, reported and screenshot received
    pub fn is_ready(&self) -> bool {
        self.registered && self.completed_today && self.attachment.is_some()
    }

    pub(crate) fn set_registered(&mut self, registered: bool) {
        self.registered = registered;
    }

    /// Overwrite the round score and mark the round as completed
    pub(crate) fn record_score(&mut self, score: u32) {
        self.score = score;
        self.completed_today = true;
    }

    pub(crate) fn record_win(&mut self) {
        self.win_count = self.win_count.saturating_add(1);
    }

    pub(crate) fn attach(&mut self, handle: AttachmentHandle, caption: Option<String>) {
        self.attachment = Some(handle);
        self.caption = caption;
    }

    pub(crate) fn take_attachment(&mut self) -> Option<(AttachmentHandle, Option<String>)> {
        let handle = self.attachment.take()?;
        Some((handle, self.caption.take()))
    }

    pub(crate) fn reset_for_new_round(&mut self) {
        self.score = 0;
        self.completed_today = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_is_registered_and_pending() {
        let player = Player::new(PlayerName::new("alice"));
        assert!(player.is_registered());
        assert!(player.is_pending());
        assert!(!player.is_ready());
        assert_eq!(player.win_count(), 0);
    }

    #[test]
    fn test_record_score_overwrites() {
        let mut player = Player::new(PlayerName::new("alice"));
        player.record_score(9);
        player.record_score(4);
        assert_eq!(player.score(), 4);
        assert!(player.has_completed());
        assert!(!player.is_ready());

        player.attach(AttachmentHandle::new("alice.png"), Some("||spoiler||".into()));
        assert!(player.is_ready());

        let (handle, caption) = player.take_attachment().unwrap();
        assert_eq!(handle.as_str(), "alice.png");
        assert_eq!(caption.as_deref(), Some("||spoiler||"));
        assert!(player.caption().is_none());
    }

    #[test]
    fn test_record_round_trip_drops_attachment() {
        let mut player = Player::new(PlayerName::new("bob"));
        player.record_score(3);
        player.record_win();
        player.attach(AttachmentHandle::new("bob.png"), None);

        let restored = Player::restore(&player.record());
        assert_eq!(restored.score(), 3);
        assert_eq!(restored.win_count(), 1);
        assert!(restored.has_completed());
        assert!(!restored.has_attachment());
    }
}
