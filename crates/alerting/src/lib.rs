//! Alerting engine: signal log, per-day alert dedup, daily reset, chat
//! notifications, command handling and the supervised duty cycles.

pub mod clock;
pub mod commands;
pub mod listener;
pub mod notifier;
pub mod poll;
pub mod scheduler;
pub mod sink;
pub mod supervisor;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{parse_timezone, Clock, SystemClock};
pub use commands::{CommandRouter, Reply, GREETING};
pub use listener::CommandListener;
pub use notifier::{format_alert, Notifier, UploadOutcome};
pub use poll::{AlertState, CycleReport, PollCycle, SharedAlertState};
pub use scheduler::{DailyResetScheduler, ResetState};
pub use sink::SignalLog;
pub use supervisor::Supervisor;
pub use tracker::AlertTracker;
