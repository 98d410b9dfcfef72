//! Fetch → decide → notify duty cycle.
//!
//! Each cycle first checks the daily reset gate, then fetches readings,
//! filters them through the alert tracker and notifies. Failures are logged
//! and the cycle finishes normally; the fixed sleep between cycles is the
//! only retry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use common::VolatilitySource;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::notifier::Notifier;
use crate::scheduler::DailyResetScheduler;
use crate::sink::SignalLog;
use crate::tracker::AlertTracker;

/// Dedup state owned by the poll cycle. Kept behind a shared handle so a
/// restarted cycle resumes with today's alerts intact.
#[derive(Debug, Clone)]
pub struct AlertState {
    pub tracker: AlertTracker,
    pub scheduler: DailyResetScheduler,
}

impl AlertState {
    pub fn new(threshold: f64, today: NaiveDate) -> Self {
        Self {
            tracker: AlertTracker::new(threshold),
            scheduler: DailyResetScheduler::new(today),
        }
    }
}

pub type SharedAlertState = Arc<Mutex<AlertState>>;

/// Outcome of a single cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub alerted: usize,
    pub failed: usize,
    /// Below threshold, already alerted today, or without a symbol.
    pub ignored: usize,
    pub reset: bool,
    pub fetch_failed: bool,
}

pub struct PollCycle {
    source: Arc<dyn VolatilitySource>,
    notifier: Notifier,
    log: SignalLog,
    clock: Arc<dyn Clock>,
    state: SharedAlertState,
    interval: Duration,
}

impl PollCycle {
    pub fn new(
        source: Arc<dyn VolatilitySource>,
        notifier: Notifier,
        log: SignalLog,
        clock: Arc<dyn Clock>,
        state: SharedAlertState,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            notifier,
            log,
            clock,
            state,
            interval,
        }
    }

    pub fn state(&self) -> &SharedAlertState {
        &self.state
    }

    /// Run one reset-check / fetch / decide / notify pass.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        let mut state = self.state.lock().await;

        let now = self.clock.now();
        if state.scheduler.is_due(&now) {
            self.daily_reset(&mut state, &now).await;
            report.reset = true;
        }

        let records = match self.source.fetch().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Volatility fetch failed: {}", e);
                self.log.append(&format!("API error: {e}"));
                report.fetch_failed = true;
                return report;
            }
        };
        report.fetched = records.len();

        for record in &records {
            if !state.tracker.should_alert(&record.symbol, record.volatility) {
                report.ignored += 1;
                continue;
            }
            state.tracker.mark_alerted(&record.symbol);
            if self.notifier.notify(&record.symbol, record.volatility).await {
                report.alerted += 1;
            } else {
                report.failed += 1;
            }
        }

        debug!(
            "Cycle done: fetched={} alerted={} failed={} ignored={} alerted_today={}",
            report.fetched,
            report.alerted,
            report.failed,
            report.ignored,
            state.tracker.len()
        );
        report
    }

    async fn daily_reset(&self, state: &mut AlertState, now: &DateTime<Tz>) {
        info!("Daily reset for {}", now.date_naive());

        self.notifier.upload_log().await;
        let cleared = state.tracker.clear();
        state.scheduler.mark_reset(now.date_naive());

        debug!("Cleared {} alerted symbols", cleared);
        let text = format!("♻️ Daily signals reset - {}", now.format("%d.%m.%Y"));
        self.notifier.announce(&text).await;
    }

    /// Cycle forever with a fixed sleep between passes, until cancelled.
    pub async fn run(&self, token: CancellationToken) {
        info!("Poll loop started (interval={:?})", self.interval);

        loop {
            let report = self.run_cycle().await;
            if report.alerted > 0 || report.failed > 0 || report.reset {
                info!(
                    "Cycle: {} records, {} alerts sent, {} failed, reset={}",
                    report.fetched, report.alerted, report.failed, report.reset
                );
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = sleep(self.interval) => {}
            }
        }

        info!("Poll loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::manual::ManualClock;
    use crate::testing::{RecordingTransport, ScriptedSource};
    use chrono::Duration as ChronoDuration;
    use chrono_tz::Europe::Prague;
    use common::{Error, VolatilityRecord};
    use std::sync::atomic::Ordering;

    struct Harness {
        cycle: PollCycle,
        transport: Arc<RecordingTransport>,
        clock: Arc<ManualClock>,
        log: SignalLog,
        _dir: tempfile::TempDir,
    }

    fn harness(source: ScriptedSource, clock: ManualClock) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(clock);
        let log = SignalLog::new(dir.path().join("signals_log.txt"), clock.clone());
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), "-100", log.clone());
        let today = clock.now().date_naive();
        let state = Arc::new(Mutex::new(AlertState::new(10.0, today)));
        let cycle = PollCycle::new(
            Arc::new(source),
            notifier,
            log.clone(),
            clock.clone(),
            state,
            Duration::from_secs(60),
        );
        Harness {
            cycle,
            transport,
            clock,
            log,
            _dir: dir,
        }
    }

    fn log_lines(log: &SignalLog) -> Vec<String> {
        std::fs::read_to_string(log.path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn qualifying_symbol_alerts_once_per_day() {
        let h = harness(
            ScriptedSource::repeating(vec![VolatilityRecord::new("BTC", 12.5)]),
            ManualClock::at(Prague, 2026, 10, 19, 14, 0),
        );

        let first = h.cycle.run_cycle().await;
        assert_eq!(first.alerted, 1);
        assert_eq!(h.transport.texts(), vec!["⚡ BTC: volatility 12.50%"]);
        assert!(h.cycle.state().lock().await.tracker.contains("BTC"));

        let second = h.cycle.run_cycle().await;
        assert_eq!(second.alerted, 0);
        assert_eq!(second.ignored, 1);
        assert_eq!(h.transport.texts().len(), 1);
    }

    #[tokio::test]
    async fn boundary_and_malformed_records() {
        let h = harness(
            ScriptedSource::repeating(vec![
                VolatilityRecord::new("AT", 10.0),
                VolatilityRecord::new("BELOW", 9.999999),
                VolatilityRecord::new("", 99.0),
                VolatilityRecord::new("ZERO", 0.0),
            ]),
            ManualClock::at(Prague, 2026, 10, 19, 14, 0),
        );

        let report = h.cycle.run_cycle().await;
        assert_eq!(report.fetched, 4);
        assert_eq!(report.alerted, 1);
        assert_eq!(report.ignored, 3);
        assert_eq!(h.transport.texts(), vec!["⚡ AT: volatility 10.00%"]);
    }

    #[tokio::test]
    async fn fetch_failure_produces_one_diagnostic_line() {
        let h = harness(
            ScriptedSource::new(vec![Err(Error::Http("operation timed out".into()))]),
            ManualClock::at(Prague, 2026, 10, 19, 14, 0),
        );

        let report = h.cycle.run_cycle().await;
        assert!(report.fetch_failed);
        assert_eq!(report.alerted, 0);
        assert!(h.transport.texts().is_empty());

        let lines = log_lines(&h.log);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("API error: HTTP request failed: operation timed out"));
    }

    #[tokio::test]
    async fn failed_send_still_counts_as_todays_alert() {
        let h = harness(
            ScriptedSource::repeating(vec![VolatilityRecord::new("ETH", 15.0)]),
            ManualClock::at(Prague, 2026, 10, 19, 14, 0),
        );
        h.transport.fail_sends.store(true, Ordering::SeqCst);

        let first = h.cycle.run_cycle().await;
        assert_eq!(first.failed, 1);
        assert!(h.cycle.state().lock().await.tracker.contains("ETH"));

        h.transport.fail_sends.store(false, Ordering::SeqCst);
        let second = h.cycle.run_cycle().await;
        assert_eq!(second.alerted, 0);
        assert!(h.transport.texts().is_empty());
    }

    #[tokio::test]
    async fn midnight_resets_exactly_once() {
        let h = harness(
            ScriptedSource::repeating(vec![VolatilityRecord::new("BTC", 12.5)]),
            ManualClock::at(Prague, 2026, 10, 19, 23, 59),
        );

        let before = h.cycle.run_cycle().await;
        assert!(!before.reset);
        assert_eq!(before.alerted, 1);

        h.clock.set(Prague, 2026, 10, 20, 0, 0);
        let mut resets = 0;
        for _ in 0..10 {
            let report = h.cycle.run_cycle().await;
            if report.reset {
                resets += 1;
            }
            h.clock.advance(ChronoDuration::minutes(5));
        }
        assert_eq!(resets, 1);

        let texts = h.transport.texts();
        let announcements: Vec<_> = texts
            .iter()
            .filter(|t| t.starts_with("♻️ Daily signals reset"))
            .collect();
        assert_eq!(announcements, vec!["♻️ Daily signals reset - 20.10.2026"]);

        // BTC alerted again after the reset, then suppressed for the rest of the day.
        assert_eq!(texts.iter().filter(|t| t.contains("BTC")).count(), 2);

        let state = h.cycle.state().lock().await;
        assert_eq!(
            state.scheduler.last_reset(),
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
        );
        drop(state);

        // The log existed before midnight, so it was uploaded.
        assert_eq!(h.transport.documents.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reset_clears_alerted_set_before_fetching() {
        let h = harness(
            ScriptedSource::new(vec![
                Ok(vec![VolatilityRecord::new("SOL", 20.0)]),
                Ok(Vec::new()),
            ]),
            ManualClock::at(Prague, 2026, 10, 19, 22, 0),
        );

        h.cycle.run_cycle().await;
        assert_eq!(h.cycle.state().lock().await.tracker.len(), 1);

        h.clock.set(Prague, 2026, 10, 20, 0, 15);
        let report = h.cycle.run_cycle().await;
        assert!(report.reset);
        assert!(h.cycle.state().lock().await.tracker.is_empty());
    }

    #[tokio::test]
    async fn reset_without_log_file_still_announces() {
        let h = harness(
            ScriptedSource::repeating(Vec::new()),
            ManualClock::at(Prague, 2026, 10, 20, 0, 1),
        );
        {
            let mut state = h.cycle.state().lock().await;
            *state = AlertState::new(10.0, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        }

        let report = h.cycle.run_cycle().await;
        assert!(report.reset);
        assert!(h.transport.documents.lock().unwrap().is_empty());
        assert_eq!(h.transport.texts(), vec!["♻️ Daily signals reset - 20.10.2026"]);
        assert!(log_lines(&h.log)[0].ends_with("♻️ Daily signals reset - 20.10.2026"));
    }

    #[tokio::test]
    async fn restart_after_hour_zero_skips_the_reset() {
        let h = harness(
            ScriptedSource::repeating(Vec::new()),
            ManualClock::at(Prague, 2026, 10, 20, 7, 0),
        );
        {
            let mut state = h.cycle.state().lock().await;
            *state = AlertState::new(10.0, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        }

        assert!(!h.cycle.run_cycle().await.reset);
        h.clock.set(Prague, 2026, 10, 21, 0, 0);
        assert!(h.cycle.run_cycle().await.reset);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_when_cancelled() {
        let h = harness(
            ScriptedSource::repeating(Vec::new()),
            ManualClock::at(Prague, 2026, 10, 19, 12, 0),
        );
        let source_calls = Arc::new(ScriptedSource::repeating(Vec::new()));
        let cycle = Arc::new(PollCycle::new(
            source_calls.clone(),
            h.cycle.notifier.clone(),
            h.log.clone(),
            h.clock.clone(),
            h.cycle.state.clone(),
            Duration::from_secs(60),
        ));

        let token = CancellationToken::new();
        let task = {
            let cycle = cycle.clone();
            let token = token.clone();
            tokio::spawn(async move { cycle.run(token).await })
        };

        tokio::time::sleep(Duration::from_secs(150)).await;
        token.cancel();
        task.await.unwrap();

        // Cycles at t=0, 60 and 120.
        assert_eq!(source_calls.calls.load(Ordering::SeqCst), 3);
    }
}
