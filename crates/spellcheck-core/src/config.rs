//! Tracker Configuration
//!
//! Game-level settings shared by the coordinator and the day-boundary
//! schedule. Loading from files is the CLI's job; this module only defines
//! the structures, their defaults and validation.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::errors::{TrackerError, TrackerResult};

/// Format used for boundary times in configuration
pub const TIME_FORMAT: &str = "%H:%M";

// ----------------------------------------------------------------------------
// Tracker Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the session coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Puzzle name as it appears in shared result headers ("Spellcheck #12")
    pub puzzle_name: String,
    /// Link posted with every new-round announcement
    pub puzzle_url: String,
    /// Marker for a correctly spelled word
    pub success_marker: char,
    /// Marker for a misspelled word
    pub failure_marker: char,
    /// Day-boundary timing
    pub schedule: ScheduleConfig,
}

/// Timing of the daily warning and rollover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local time of the one-hour reminder (HH:MM)
    pub warning_time: String,
    /// Local time at which the round closes and the next opens (HH:MM)
    pub rollover_time: String,
    /// How long after a boundary it may still fire, in seconds
    pub window_secs: u64,
    /// Upper bound on a single scheduler sleep, in seconds
    pub max_sleep_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            puzzle_name: "Spellcheck".to_string(),
            puzzle_url: "https://spellcheck.xyz/".to_string(),
            success_marker: '🟩',
            failure_marker: '🟥',
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            warning_time: "23:00".to_string(),
            rollover_time: "00:00".to_string(),
            window_secs: 60,
            max_sleep_secs: 60,
        }
    }
}

impl TrackerConfig {
    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> TrackerResult<()> {
        if self.puzzle_name.trim().is_empty() {
            return Err(TrackerError::config_error("Puzzle name must not be empty"));
        }

        if self.puzzle_name.contains('#') {
            return Err(TrackerError::config_error(
                "Puzzle name must not contain '#'",
            ));
        }

        if self.success_marker == self.failure_marker {
            return Err(TrackerError::config_error(
                "Success and failure markers must differ",
            ));
        }

        if self.success_marker.is_whitespace() || self.failure_marker.is_whitespace() {
            return Err(TrackerError::config_error(
                "Result markers must not be whitespace",
            ));
        }

        self.schedule.validate()
    }
}

impl ScheduleConfig {
    /// Validate the schedule and reject unparsable times
    pub fn validate(&self) -> TrackerResult<()> {
        let warning = self.warning_at()?;
        let rollover = self.rollover_at()?;

        if warning == rollover {
            return Err(TrackerError::config_error(
                "Warning and rollover times must differ",
            ));
        }

        if self.window_secs == 0 {
            return Err(TrackerError::config_error(
                "Boundary window must be greater than 0",
            ));
        }

        if self.max_sleep_secs == 0 {
            return Err(TrackerError::config_error(
                "Maximum scheduler sleep must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn warning_at(&self) -> TrackerResult<NaiveTime> {
        parse_time("warning_time", &self.warning_time)
    }

    pub fn rollover_at(&self) -> TrackerResult<NaiveTime> {
        parse_time("rollover_time", &self.rollover_time)
    }
}

fn parse_time(field: &str, value: &str) -> TrackerResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|e| {
        TrackerError::config_error(format!("Invalid {} {:?}: {}", field, value, e))
    })
}
