//! Append-only signal log (`signals_log.txt`).
//!
//! Lines look like `[2026-10-19 14:03:00] message`, stamped in the bot's
//! time zone. The file is never truncated; the daily reset only uploads it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::clock::Clock;

/// Cheaply cloneable handle shared by both duty cycles.
#[derive(Clone)]
pub struct SignalLog {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl SignalLog {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                clock,
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Render one log line, newline included.
    pub fn format_line(&self, message: &str) -> String {
        let ts = self.inner.clock.now().format("%Y-%m-%d %H:%M:%S");
        let flat = message.replace(['\r', '\n'], " ");
        format!("[{ts}] {flat}\n")
    }

    /// Append a line. Failures are reported and swallowed.
    pub fn append(&self, message: &str) {
        let line = self.format_line(message);

        let result = (|| -> std::io::Result<()> {
            let _guard = self
                .inner
                .write_lock
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.inner.path)?;
            // One write per line keeps concurrent appends from splitting it.
            file.write_all(line.as_bytes())?;
            Ok(())
        })();

        if let Err(e) = result {
            warn!("Signal log write failed ({}): {}", self.inner.path.display(), e);
        }
    }
}

impl std::fmt::Debug for SignalLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalLog")
            .field("path", &self.inner.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::manual::ManualClock;
    use chrono_tz::Europe::Prague;

    fn log_in(dir: &tempfile::TempDir) -> (SignalLog, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::at(Prague, 2026, 10, 19, 14, 3));
        let log = SignalLog::new(dir.path().join("signals_log.txt"), clock.clone());
        (log, clock)
    }

    #[test]
    fn appends_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let (log, clock) = log_in(&dir);

        log.append("first");
        clock.advance(chrono::Duration::seconds(61));
        log.append("second");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(
            contents,
            "[2026-10-19 14:03:00] first\n[2026-10-19 14:04:01] second\n"
        );
    }

    #[test]
    fn embedded_newlines_stay_on_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let (log, _) = log_in(&dir);
        assert_eq!(log.format_line("a\nb\r\nc"), "[2026-10-19 14:03:00] a b  c\n");
    }

    #[test]
    fn reopening_never_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals_log.txt");
        std::fs::write(&path, "[2026-10-18 10:00:00] old\n").unwrap();

        let (log, _) = log_in(&dir);
        log.append("new");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("[2026-10-18 10:00:00] old\n"));
        assert!(contents.ends_with("] new\n"));
    }

    #[test]
    fn write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::at(Prague, 2026, 10, 19, 0, 0));
        let log = SignalLog::new(dir.path().join("missing-dir").join("log.txt"), clock);
        log.append("goes nowhere");
        assert!(!log.path().exists());
    }

    #[test]
    fn concurrent_appends_keep_lines_whole() {
        let dir = tempfile::tempdir().unwrap();
        let (log, _) = log_in(&dir);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        log.append(&format!("thread-{t} line-{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 200);
        assert!(lines
            .iter()
            .all(|l| l.starts_with("[2026-10-19 14:03:00] thread-") && l.contains(" line-")));
    }
}
