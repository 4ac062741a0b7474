//! Cancellable repeating schedules for the session's periodic callbacks.
//!
//! Both the one-second elapsed tick and the waveform frame loop are a
//! [`Repeating`]. The event loop awaits [`Repeating::next`] inside
//! `tokio::select!`; a disarmed schedule never resolves, so its branch simply
//! stays idle.

use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A repeating callback source with at most one outstanding instance.
#[derive(Debug)]
pub struct Repeating {
    period: Duration,
    interval: Option<Interval>,
}

impl Repeating {
    /// Creates a disarmed schedule firing every `period` once started.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Creates a disarmed schedule firing `per_second` times a second.
    pub fn per_second(per_second: u32) -> Self {
        let per_second = per_second.max(1);
        Self::new(Duration::from_secs(1) / per_second)
    }

    /// Arms the schedule. The first firing happens one period from now.
    ///
    /// Starting an armed schedule restarts it rather than adding a second one.
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    /// Disarms the schedule. Returns `true` only if it was running.
    pub fn cancel(&mut self) -> bool {
        self.interval.take().is_some()
    }

    /// Returns whether the schedule is armed.
    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Returns the configured period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Waits for the next firing. Pending forever while disarmed.
    pub async fn next(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
