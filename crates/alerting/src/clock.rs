//! Wall-clock access in the bot's configured time zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use common::Error;

/// Source of "now" for the day boundary and log timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }
}

/// Resolve an IANA zone name such as `Europe/Prague`.
pub fn parse_timezone(name: &str) -> Result<Tz, Error> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| Error::Config(format!("unknown time zone {name:?}: {e}")))
}
