//! Persisted session layout
//!
//! The snapshot is format-agnostic; the runtime's file store encodes it as
//! JSON. Attachment references and captions are not stored; they are
//! rebuilt after a restart. The date each boundary last fired is stored so a
//! restart inside a boundary window does not fire it again.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, PlayerName, RoundNumber};

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 2;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Everything needed to resume a session after a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Channel scoreboards are posted to
    pub channel: Option<ChannelId>,
    pub round_number: RoundNumber,
    pub scored_today: bool,
    /// Date the last warning went out
    #[serde(default)]
    pub last_warning: Option<NaiveDate>,
    /// Date the last rollover ran
    #[serde(default)]
    pub last_rollover: Option<NaiveDate>,
    /// Player records in registration order
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
}

/// Persisted fields of one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: PlayerName,
    pub win_count: u32,
    pub score: u32,
    pub registered: bool,
    pub completed_today: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            channel: None,
            round_number: RoundNumber::default(),
            scored_today: false,
            last_warning: None,
            last_rollover: None,
            players: Vec::new(),
        }
    }
}
