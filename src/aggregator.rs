//! Run-wide accumulation of outcomes
//!
//! Single writer: only the coordinating task calls `accept`. The cap is
//! enforced here as well as by the pagination driver's truncation.

use serde::Serialize;

use crate::record::JobOutcome;

/// Snapshot published after every page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Progress {
    pub accepted: usize,
    pub failed: usize,
    /// Denominator used for `fraction`
    pub expected: usize,
    /// In `[0, 1]`, never decreases over a run
    pub fraction: f64,
}

#[derive(Debug)]
pub struct Aggregator {
    outcomes: Vec<JobOutcome>,
    cap: Option<usize>,
    results_total: Option<usize>,
    failed: usize,
    refused: usize,
    high_water: f64,
}

impl Aggregator {
    pub fn new(cap: Option<usize>) -> Self {
        Self {
            outcomes: Vec::new(),
            cap,
            results_total: None,
            failed: 0,
            refused: 0,
            high_water: 0.0,
        }
    }

    /// Store one outcome. Returns `false` once the cap has been reached.
    pub fn accept(&mut self, outcome: JobOutcome) -> bool {
        if self.is_full() {
            self.refused += 1;
            return false;
        }
        if outcome.is_failure() {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
        true
    }

    /// Latest `resultsTotal` reported by the listing endpoint.
    pub fn set_results_total(&mut self, total: Option<usize>) {
        if total.is_some() {
            self.results_total = total;
        }
    }

    pub fn refused(&self) -> usize {
        self.refused
    }

    /// Room left under the cap, `None` when unbounded.
    pub fn remaining(&self) -> Option<usize> {
        self.cap.map(|cap| cap.saturating_sub(self.outcomes.len()))
    }

    pub fn is_full(&self) -> bool {
        self.remaining() == Some(0)
    }

    /// `accepted / max(cap or resultsTotal, 1)`, clamped to 1.0.
    pub fn progress_fraction(&self) -> f64 {
        let expected = self.expected().max(1);
        (self.outcomes.len() as f64 / expected as f64).min(1.0)
    }

    /// Progress snapshot, kept monotonic even if `resultsTotal` grows.
    pub fn progress(&mut self) -> Progress {
        self.high_water = self.high_water.max(self.progress_fraction());
        Progress {
            accepted: self.outcomes.len(),
            failed: self.failed,
            expected: self.expected(),
            fraction: self.high_water,
        }
    }

    pub fn finalize(self) -> Vec<JobOutcome> {
        self.outcomes
    }

    fn expected(&self) -> usize {
        self.cap.or(self.results_total).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FailureRecord;

    fn failure(name: &str) -> JobOutcome {
        JobOutcome::Failure(FailureRecord {
            name: name.to_string(),
            error: "Failed after 3 attempts: timed out after 10s".to_string(),
        })
    }

    #[test]
    fn test_refuses_past_cap() {
        let mut aggregator = Aggregator::new(Some(2));
        assert!(aggregator.accept(failure("a")));
        assert!(aggregator.accept(failure("b")));
        assert!(!aggregator.accept(failure("c")));

        assert_eq!(aggregator.progress().accepted, 2);
        assert_eq!(aggregator.refused(), 1);
        assert!(aggregator.is_full());
        assert_eq!(aggregator.remaining(), Some(0));
        assert_eq!(aggregator.finalize().len(), 2);
    }

    #[test]
    fn test_progress_uses_cap_before_total() {
        let mut aggregator = Aggregator::new(Some(4));
        aggregator.set_results_total(Some(100));
        aggregator.accept(failure("a"));
        assert_eq!(aggregator.progress_fraction(), 0.25);
        assert_eq!(aggregator.progress().failed, 1);
    }

    #[test]
    fn test_progress_uses_total_when_unbounded() {
        let mut aggregator = Aggregator::new(None);
        assert_eq!(aggregator.remaining(), None);
        assert_eq!(aggregator.progress_fraction(), 0.0);

        aggregator.set_results_total(Some(10));
        for name in ["a", "b", "c", "d", "e"] {
            aggregator.accept(failure(name));
        }
        assert_eq!(aggregator.progress_fraction(), 0.5);

        // a missing total keeps the previous one
        aggregator.set_results_total(None);
        assert_eq!(aggregator.progress_fraction(), 0.5);
    }

    #[test]
    fn test_fraction_is_clamped_and_monotonic() {
        let mut aggregator = Aggregator::new(None);
        aggregator.set_results_total(Some(2));
        for name in ["a", "b", "c"] {
            aggregator.accept(failure(name));
        }
        assert_eq!(aggregator.progress().fraction, 1.0);

        // the endpoint later reports a larger total
        aggregator.set_results_total(Some(30));
        let progress = aggregator.progress();
        assert_eq!(progress.fraction, 1.0);
        assert_eq!(progress.expected, 30);
    }
}
