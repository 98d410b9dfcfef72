//! Per-day alert deduplication.

use std::collections::HashSet;

/// Symbols already alerted since the last daily reset.
#[derive(Debug, Clone)]
pub struct AlertTracker {
    threshold: f64,
    alerted: HashSet<String>,
}

impl AlertTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            alerted: HashSet::new(),
        }
    }

    /// True iff the reading reaches the threshold (inclusive), the symbol is
    /// non-empty and it has not been alerted today.
    ///
    /// Callers must `mark_alerted` before sending; there is no undo, so a
    /// failed send still counts as today's alert.
    pub fn should_alert(&self, symbol: &str, volatility: f64) -> bool {
        volatility >= self.threshold && !symbol.is_empty() && !self.alerted.contains(symbol)
    }

    /// Returns false if the symbol was already present.
    pub fn mark_alerted(&mut self, symbol: &str) -> bool {
        self.alerted.insert(symbol.to_string())
    }

    /// Forget every alerted symbol; returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let n = self.alerted.len();
        self.alerted.clear();
        n
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.alerted.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.alerted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerted.is_empty()
    }
}
