//! Once-per-day reset gate.
//!
//! The reset is due when the local date has moved past the last reset date
//! and the local hour is 0. A process that is down for all of hour 0 skips
//! that day's reset until the next midnight it sees.

use chrono::{DateTime, NaiveDate, Timelike};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    /// Today's reset has not happened yet.
    Armed,
    /// Today's reset already ran.
    Done,
}

#[derive(Debug, Clone)]
pub struct DailyResetScheduler {
    last_reset: NaiveDate,
}

impl DailyResetScheduler {
    /// Start in `Done` for `today`: the first reset happens at the next midnight.
    pub fn new(today: NaiveDate) -> Self {
        Self { last_reset: today }
    }

    pub fn last_reset(&self) -> NaiveDate {
        self.last_reset
    }

    pub fn state(&self, now: &DateTime<Tz>) -> ResetState {
        if now.date_naive() > self.last_reset {
            ResetState::Armed
        } else {
            ResetState::Done
        }
    }

    pub fn is_due(&self, now: &DateTime<Tz>) -> bool {
        self.state(now) == ResetState::Armed && now.hour() == 0
    }

    /// Record a completed reset. The stored date never moves backwards.
    pub fn mark_reset(&mut self, date: NaiveDate) {
        if date > self.last_reset {
            self.last_reset = date;
        }
    }
}
