//! Rolling per-circuit sample buffer feeding the trend line

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Maximum samples kept per circuit. Plenty for the 2 minute sparkline
/// window even with a low update latency.
pub const MAX_SAMPLES: usize = 200;

/// One point of a trend line. Field names match the `graphValues` wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Value (requests/sec)
    pub v: f64,
    /// Epoch milliseconds
    pub t: i64,
}

impl Sample {
    pub fn new(v: f64, t: i64) -> Self {
        Self { v, t }
    }
}

/// Bounded FIFO of samples in arrival order
#[derive(Debug, Clone, Default)]
pub struct RollingSeries {
    samples: VecDeque<Sample>,
}

impl RollingSeries {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(MAX_SAMPLES + 1),
        }
    }

    /// Push a sample, evicting the oldest past capacity
    pub fn append(&mut self, value: f64, timestamp: i64) {
        self.samples.push_back(Sample::new(value, timestamp));
        self.trim();
        trace!(value, timestamp, len = self.samples.len(), "Sample appended");
    }

    /// Replace the whole buffer with a seed series
    pub fn replace_all(&mut self, samples: impl IntoIterator<Item = Sample>) {
        self.samples.clear();
        self.samples.extend(samples);
        self.trim();
        trace!(len = self.samples.len(), "Series replaced");
    }

    fn trim(&mut self) {
        while self.samples.len() > MAX_SAMPLES {
            self.samples.pop_front();
        }
    }

    /// A lone zero sample is not worth drawing
    pub fn should_suppress(&self) -> bool {
        self.samples.len() == 1 && self.samples[0].v == 0.0
    }

    /// Drop a leading zero once a non-zero sample follows it
    pub fn apply_leading_zero_rule(&mut self) {
        if self.samples.len() >= 2 && self.samples[0].v == 0.0 && self.samples[1].v != 0.0 {
            self.samples.pop_front();
        }
    }

    pub fn samples(&self) -> &VecDeque<Sample> {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Observed (min, max) of the values
    pub fn value_extent(&self) -> Option<(f64, f64)> {
        self.samples.iter().fold(None, |acc, s| match acc {
            None => Some((s.v, s.v)),
            Some((lo, hi)) => Some((lo.min(s.v), hi.max(s.v))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(series: &RollingSeries) -> Vec<f64> {
        series.samples().iter().map(|s| s.v).collect()
    }

    #[test]
    fn test_fifo_eviction() {
        let mut series = RollingSeries::new();
        for i in 0..=MAX_SAMPLES {
            series.append(i as f64, i as i64);
        }
        assert_eq!(series.len(), MAX_SAMPLES);
        // Sample 0 was evicted first
        assert_eq!(series.samples().front().map(|s| s.v), Some(1.0));
        assert_eq!(series.samples().back().map(|s| s.v), Some(MAX_SAMPLES as f64));
    }

    #[test]
    fn test_replace_all_trims() {
        let mut series = RollingSeries::new();
        series.append(42.0, 1);
        series.replace_all((0..250).map(|i| Sample::new(i as f64, i)));
        assert_eq!(series.len(), MAX_SAMPLES);
        assert_eq!(series.samples().front().map(|s| s.t), Some(50));
    }

    #[test]
    fn test_single_zero_suppressed() {
        let mut series = RollingSeries::new();
        series.append(0.0, 1);
        assert!(series.should_suppress());

        series.append(0.0, 2);
        assert!(!series.should_suppress());
    }

    #[test]
    fn test_leading_zero_rule() {
        let mut series = RollingSeries::new();
        series.append(0.0, 1);
        series.append(5.0, 2);
        series.apply_leading_zero_rule();
        assert_eq!(values(&series), vec![5.0]);

        let mut series = RollingSeries::new();
        series.append(0.0, 1);
        series.append(0.0, 2);
        series.apply_leading_zero_rule();
        assert_eq!(values(&series), vec![0.0, 0.0]);
    }

    #[test]
    fn test_value_extent() {
        let mut series = RollingSeries::new();
        assert_eq!(series.value_extent(), None);
        series.append(3.0, 1);
        series.append(-1.0, 2);
        series.append(7.5, 3);
        assert_eq!(series.value_extent(), Some((-1.0, 7.5)));
    }
}
