//! Day-boundary schedule
//!
//! Two local-time boundaries drive the day: the one-hour warning and the
//! rollover that closes the round. Each occurrence is a window
//! `[boundary, boundary + window)`; a date-keyed [`BoundaryGuard`] makes it
//! fire exactly once per day however many ticks land inside the window.
//! A guard re-arms by itself when the date changes, so there is no
//! separate "clear" step.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::ScheduleConfig;
use crate::errors::TrackerResult;

/// The daily boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DailyBoundary {
    /// Reminder to players who have not reported yet
    Warning,
    /// Close the round and open the next
    Rollover,
}

impl DailyBoundary {
    pub const ALL: [DailyBoundary; 2] = [DailyBoundary::Rollover, DailyBoundary::Warning];
}

// ----------------------------------------------------------------------------
// Boundary Guard
// ----------------------------------------------------------------------------

/// Armed/fired latch for one boundary, keyed by the occurrence date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryGuard {
    fired_on: Option<NaiveDate>,
}

impl BoundaryGuard {
    /// A guard that last fired on `fired_on`
    pub fn fired(fired_on: Option<NaiveDate>) -> Self {
        Self { fired_on }
    }

    /// Whether the occurrence on `date` may still fire
    pub fn is_armed(&self, date: NaiveDate) -> bool {
        self.fired_on != Some(date)
    }

    pub fn fire(&mut self, date: NaiveDate) {
        self.fired_on = Some(date);
    }

    pub fn fired_on(&self) -> Option<NaiveDate> {
        self.fired_on
    }
}

// ----------------------------------------------------------------------------
// Day Schedule
// ----------------------------------------------------------------------------

/// Boundary times and firing window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    warning_at: NaiveTime,
    rollover_at: NaiveTime,
    window: Duration,
}

impl DaySchedule {
    pub fn new(warning_at: NaiveTime, rollover_at: NaiveTime, window: Duration) -> Self {
        Self {
            warning_at,
            rollover_at,
            window,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> TrackerResult<Self> {
        config.validate()?;
        Ok(Self::new(
            config.warning_at()?,
            config.rollover_at()?,
            Duration::seconds(config.window_secs as i64),
        ))
    }

    pub fn time_of(&self, boundary: DailyBoundary) -> NaiveTime {
        match boundary {
            DailyBoundary::Warning => self.warning_at,
            DailyBoundary::Rollover => self.rollover_at,
        }
    }

    /// Occurrence of `boundary` whose window contains `now`, as the date the
    /// occurrence started on
    pub fn occurrence(&self, boundary: DailyBoundary, now: NaiveDateTime) -> Option<NaiveDate> {
        let today = now.date();
        // A window may straddle midnight, so yesterday's occurrence can still be open
        let yesterday = today - Duration::days(1);

        [today, yesterday].into_iter().find(|date| {
            let start = date.and_time(self.time_of(boundary));
            start <= now && now < start + self.window
        })
    }

    /// First instant after the occurrence of `boundary` on `date`
    pub fn window_end(&self, boundary: DailyBoundary, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.time_of(boundary)) + self.window
    }

    /// Boundaries whose window contains `now`, rollover first
    pub fn due(&self, now: NaiveDateTime) -> Vec<(DailyBoundary, NaiveDate)> {
        DailyBoundary::ALL
            .into_iter()
            .filter_map(|b| self.occurrence(b, now).map(|date| (b, date)))
            .collect()
    }

    /// Start of the next boundary strictly after `now`
    pub fn next_boundary(&self, now: NaiveDateTime) -> (DailyBoundary, NaiveDateTime) {
        DailyBoundary::ALL
            .into_iter()
            .map(|b| {
                let mut at = now.date().and_time(self.time_of(b));
                if at <= now {
                    at += Duration::days(1);
                }
                (b, at)
            })
            .min_by_key(|(_, at)| *at)
            .unwrap_or((DailyBoundary::Rollover, now + Duration::days(1)))
    }

    /// How long to sleep from `now` until the next boundary starts
    pub fn until_next(&self, now: NaiveDateTime) -> std::time::Duration {
        let (_, at) = self.next_boundary(now);
        (at - now).to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    fn schedule() -> DaySchedule {
        DaySchedule::from_config(&ScheduleConfig::default()).unwrap()
    }

    #[test]
    fn test_due_inside_window_only() {
        let schedule = schedule();
        assert!(schedule.due(at(10, 22, 59, 59)).is_empty());
        assert_eq!(
            schedule.due(at(10, 23, 0, 0)),
            vec![(DailyBoundary::Warning, at(10, 0, 0, 0).date())]
        );
        assert_eq!(schedule.due(at(10, 23, 0, 59)).len(), 1);
        assert!(schedule.due(at(10, 23, 1, 0)).is_empty());
        assert_eq!(
            schedule.due(at(11, 0, 0, 30)),
            vec![(DailyBoundary::Rollover, at(11, 0, 0, 0).date())]
        );
    }

    #[test]
    fn test_window_straddling_midnight() {
        let schedule = DaySchedule::new(
            NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 30).unwrap(),
            Duration::seconds(60),
        );
        let due = schedule.due(at(11, 0, 0, 10));
        assert_eq!(due, vec![(DailyBoundary::Rollover, at(10, 0, 0, 0).date())]);
    }

    #[test]
    fn test_guard_fires_once_per_date() {
        let schedule = schedule();
        let mut guard = BoundaryGuard::default();
        let mut fired = 0;

        for second in 0..60 {
            for (boundary, date) in schedule.due(at(11, 0, 0, second)) {
                assert_eq!(boundary, DailyBoundary::Rollover);
                if guard.is_armed(date) {
                    guard.fire(date);
                    fired += 1;
                }
            }
        }
        assert_eq!(fired, 1);

        // Next night re-arms without an explicit clear
        let (_, date) = schedule.due(at(12, 0, 0, 5))[0];
        assert!(guard.is_armed(date));
    }

    #[test]
    fn test_window_end() {
        let schedule = schedule();
        let date = at(11, 0, 0, 0).date();
        assert_eq!(
            schedule.window_end(DailyBoundary::Rollover, date),
            at(11, 0, 1, 0)
        );
        assert_eq!(
            schedule.window_end(DailyBoundary::Warning, date),
            at(11, 23, 1, 0)
        );
    }

    #[test]
    fn test_next_boundary() {
        let schedule = schedule();
        assert_eq!(
            schedule.next_boundary(at(10, 12, 0, 0)),
            (DailyBoundary::Warning, at(10, 23, 0, 0))
        );
        assert_eq!(
            schedule.next_boundary(at(10, 23, 0, 0)),
            (DailyBoundary::Rollover, at(11, 0, 0, 0))
        );
        assert_eq!(
            schedule.until_next(at(10, 23, 59, 0)),
            std::time::Duration::from_secs(60)
        );
    }
}
