//! Day-boundary timer
//!
//! Instead of polling every second, the timer sleeps until the next
//! boundary starts (capped at `max_sleep`, so wall-clock jumps and DST
//! changes are picked up) and then sends a tick to the tracker task. The
//! coordinator's boundary guards make extra ticks harmless.
//!
//! A boundary that fails stays armed. While its window is still open the
//! timer ticks again after `retry_interval` instead of sleeping to the next
//! boundary, so a transient failure does not cost a whole day.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use spellcheck_core::{DailyBoundary, DaySchedule, TimeSource};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use crate::tracker::{TickOutcome, TrackerCommand, TrackerSender};

/// Default wait before retrying a failed boundary
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

pub struct BoundaryTimer {
    clock: Arc<dyn TimeSource>,
    schedule: DaySchedule,
    max_sleep: Duration,
    retry_interval: Duration,
    sender: TrackerSender,
    shutdown: watch::Receiver<bool>,
}

impl BoundaryTimer {
    pub fn new(
        clock: Arc<dyn TimeSource>,
        schedule: DaySchedule,
        max_sleep: Duration,
        sender: TrackerSender,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            clock,
            schedule,
            max_sleep,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            sender,
            shutdown,
        }
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// How long to wait before the next tick
    pub fn next_delay(&self) -> Duration {
        let until = self.schedule.until_next(self.clock.now());
        until.min(self.max_sleep)
    }

    /// How long to wait after a tick that left `pending` boundaries armed
    ///
    /// The retry always lands before the earliest pending window closes.
    pub fn delay_after(&self, pending: &[(DailyBoundary, NaiveDate)]) -> Duration {
        let now = self.clock.now();
        match self.window_left(now, pending) {
            Some(left) if left > self.retry_interval => self.retry_interval,
            Some(left) if !left.is_zero() => left / 2,
            _ => self.next_delay(),
        }
    }

    fn window_left(
        &self,
        now: NaiveDateTime,
        pending: &[(DailyBoundary, NaiveDate)],
    ) -> Option<Duration> {
        pending
            .iter()
            .filter_map(|(boundary, date)| {
                (self.schedule.window_end(*boundary, *date) - now).to_std().ok()
            })
            .min()
    }

    /// Tick the tracker until shutdown is signalled or the tracker goes away
    pub async fn run(mut self) {
        info!("Boundary timer starting");

        loop {
            if *self.shutdown.borrow() {
                info!("Boundary timer stopping");
                break;
            }

            // The tick at startup catches a boundary window we were restarted into
            let now = self.clock.now();
            let (reply_tx, reply_rx) = oneshot::channel();
            let tick = TrackerCommand::Tick {
                now,
                reply: Some(reply_tx),
            };
            if self.sender.send(tick).await.is_err() {
                info!("Tracker task gone, stopping boundary timer");
                break;
            }
            // Wait for the tick to be processed so ticks never pile up
            let outcome = match reply_rx.await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("Tracker task dropped a tick");
                    TickOutcome::default()
                }
            };

            let delay = self.delay_after(&outcome.pending);
            debug!("Next boundary check in {:?}", delay);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown signal dropped, stopping boundary timer");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use spellcheck_core::ScheduleConfig;
    use tokio::sync::mpsc;

    struct FixedClock(NaiveDateTime);

    impl TimeSource for FixedClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    fn timer_at(hour: u32, minute: u32, second: u32) -> BoundaryTimer {
        let now = NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap();
        let (sender, _receiver) = mpsc::channel(1);
        let (_tx, shutdown) = watch::channel(false);
        BoundaryTimer::new(
            Arc::new(FixedClock(now)),
            DaySchedule::from_config(&ScheduleConfig::default()).unwrap(),
            Duration::from_secs(60),
            sender,
            shutdown,
        )
    }

    #[test]
    fn test_delay_is_capped() {
        assert_eq!(timer_at(12, 0, 0).next_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_delay_lands_on_boundary() {
        assert_eq!(timer_at(22, 59, 45).next_delay(), Duration::from_secs(15));
        assert_eq!(timer_at(23, 59, 59).next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_pending_boundary_retries_inside_window() {
        let midnight = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let pending = [(DailyBoundary::Rollover, midnight)];

        // Nothing pending: sleep on to the next boundary
        assert_eq!(timer_at(0, 0, 0).delay_after(&[]), Duration::from_secs(60));

        let timer = timer_at(0, 0, 0);
        assert_eq!(timer.delay_after(&pending), DEFAULT_RETRY_INTERVAL);

        // Close to the end of the window the retry still lands inside it
        let timer = timer_at(0, 0, 59).with_retry_interval(Duration::from_secs(5));
        assert_eq!(timer.delay_after(&pending), Duration::from_millis(500));

        // Window already closed: back to the regular schedule
        assert_eq!(
            timer_at(0, 1, 0).delay_after(&pending),
            Duration::from_secs(60)
        );
    }
}
