//! Sort controller: user-selected ordering of circuit elements
//!
//! Every non-alphabetical key changes as snapshots arrive, so the current
//! state is re-applied on a fixed schedule as well as after each new
//! element.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use super::reconciler::VisualElement;

/// Interval between unconditional re-sorts
pub const RESORT_INTERVAL_MS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMetric {
    Alphabetical,
    Volume,
    Error,
    ErrorThenVolume,
    Latency90,
    Latency99,
    Latency995,
    LatencyMean,
    LatencyMedian,
}

impl SortMetric {
    pub const ALL: &'static [SortMetric] = &[
        SortMetric::Alphabetical,
        SortMetric::Volume,
        SortMetric::Error,
        SortMetric::ErrorThenVolume,
        SortMetric::Latency90,
        SortMetric::Latency99,
        SortMetric::Latency995,
        SortMetric::LatencyMean,
        SortMetric::LatencyMedian,
    ];

    /// Direction a fresh sort command starts with
    pub fn default_direction(self) -> SortDirection {
        match self {
            SortMetric::Alphabetical => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMetric::Alphabetical => "Alphabetical",
            SortMetric::Volume => "Volume",
            SortMetric::Error => "Error",
            SortMetric::ErrorThenVolume => "Error then Volume",
            SortMetric::Latency90 => "90",
            SortMetric::Latency99 => "99",
            SortMetric::Latency995 => "99.5",
            SortMetric::LatencyMean => "Mean",
            SortMetric::LatencyMedian => "Median",
        }
    }

    /// Compare two elements ascending on this metric
    fn compare(self, a: &VisualElement, b: &VisualElement) -> Ordering {
        let (sa, sb) = (&a.snapshot, &b.snapshot);
        match self {
            SortMetric::Alphabetical => sa
                .name
                .to_lowercase()
                .cmp(&sb.name.to_lowercase())
                .then_with(|| sa.name.cmp(&sb.name)),
            SortMetric::Volume => a.sort_keys.rate_value.total_cmp(&b.sort_keys.rate_value),
            SortMetric::Error => sa.error_percentage.total_cmp(&sb.error_percentage),
            SortMetric::ErrorThenVolume => a
                .sort_keys
                .error_then_volume
                .total_cmp(&b.sort_keys.error_then_volume),
            SortMetric::Latency90 => cmp_missing_low(sa.latency.p90, sb.latency.p90),
            SortMetric::Latency99 => cmp_missing_low(sa.latency.p99, sb.latency.p99),
            SortMetric::Latency995 => cmp_missing_low(sa.latency.p995, sb.latency.p995),
            SortMetric::LatencyMean => cmp_missing_low(sa.latency.mean, sb.latency.mean),
            SortMetric::LatencyMedian => cmp_missing_low(sa.latency.median, sb.latency.median),
        }
    }
}

/// Missing values sort below every present value
fn cmp_missing_low(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Current (metric, direction) of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub metric: SortMetric,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            metric: SortMetric::Alphabetical,
            direction: SortDirection::Ascending,
        }
    }
}

impl SortState {
    /// State after issuing the sort command for `metric`.
    ///
    /// Repeating the command while it sits at its default direction flips
    /// it; anything else starts at the default.
    pub fn toggled(self, metric: SortMetric) -> Self {
        let default = metric.default_direction();
        let direction = if self.metric == metric && self.direction == default {
            default.reversed()
        } else {
            default
        };
        Self { metric, direction }
    }
}

/// Stable in-place sort of `order` by `state`, reading keys from `elements`.
///
/// Ties keep their previous relative order. Keys without an element sink
/// to the end.
pub fn apply(state: SortState, order: &mut [String], elements: &HashMap<String, VisualElement>) {
    order.sort_by(|ka, kb| match (elements.get(ka), elements.get(kb)) {
        (Some(a), Some(b)) => {
            let ord = state.metric.compare(a, b);
            match state.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Owns the sort state and the periodic re-sort deadline
#[derive(Debug, Clone)]
pub struct SortController {
    state: SortState,
    schedule: ResortSchedule,
}

impl Default for SortController {
    fn default() -> Self {
        Self::new(RESORT_INTERVAL_MS)
    }
}

impl SortController {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            state: SortState::default(),
            schedule: ResortSchedule::new(interval_ms),
        }
    }

    pub fn state(&self) -> SortState {
        self.state
    }

    /// Handle a user sort command and return the resulting state
    pub fn command(&mut self, metric: SortMetric) -> SortState {
        self.state = self.state.toggled(metric);
        debug!(metric = ?self.state.metric, direction = ?self.state.direction, "Sort command");
        self.state
    }

    /// Force a specific state
    pub fn set(&mut self, metric: SortMetric, direction: SortDirection) {
        self.state = SortState { metric, direction };
    }

    /// True when the periodic re-sort is due at `now_ms`
    pub fn poll(&mut self, now_ms: i64) -> bool {
        self.schedule.poll(now_ms)
    }

    /// Stop the periodic re-sort for good
    pub fn cancel(&mut self) {
        self.schedule.cancel();
    }

    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_active()
    }
}

/// Fixed-period deadline polled from the owning event loop
#[derive(Debug, Clone)]
pub struct ResortSchedule {
    interval_ms: i64,
    next_due: Option<i64>,
    cancelled: bool,
}

impl ResortSchedule {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval_ms,
            next_due: None,
            cancelled: false,
        }
    }

    /// The first poll arms the timer; later polls fire once per elapsed interval
    pub fn poll(&mut self, now_ms: i64) -> bool {
        if self.cancelled {
            return false;
        }
        match self.next_due {
            None => {
                self.next_due = Some(now_ms + self.interval_ms);
                false
            }
            Some(due) if now_ms >= due => {
                self.next_due = Some(now_ms + self.interval_ms);
                true
            }
            Some(_) => false,
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        !self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reconciler::Reconciler;
    use crate::core::snapshot::{preprocess, tests::raw};

    fn sorted(rec: &mut Reconciler, state: SortState) -> Vec<String> {
        let (order, elements) = rec.order_and_elements();
        apply(state, order, elements);
        rec.order().to_vec()
    }

    fn fixture() -> Reconciler {
        let mut rec = Reconciler::new(false);
        for (name, rate, error) in [("beta", 50.0, 1.0), ("alpha", 5.0, 30.0), ("gamma", 500.0, 1.0)] {
            rec.upsert(preprocess(raw(name, rate, error)).unwrap(), 1_000);
        }
        rec
    }

    #[test]
    fn test_toggle_direction() {
        let mut ctl = SortController::default();
        assert_eq!(ctl.state(), SortState::default());

        let first = ctl.command(SortMetric::Volume);
        assert_eq!(first.direction, SortDirection::Descending);
        let second = ctl.command(SortMetric::Volume);
        assert_eq!(second.direction, SortDirection::Ascending);
        let third = ctl.command(SortMetric::Volume);
        assert_eq!(third, first);

        // Default state is alphabetical ascending, so the first command flips it
        let mut ctl = SortController::default();
        assert_eq!(ctl.command(SortMetric::Alphabetical).direction, SortDirection::Descending);

        // Switching metric starts at that metric's default
        assert_eq!(ctl.command(SortMetric::Error).direction, SortDirection::Descending);
    }

    #[test]
    fn test_alphabetical_and_volume() {
        let mut rec = fixture();
        assert_eq!(sorted(&mut rec, SortState::default()), ["alpha", "beta", "gamma"]);

        let by_volume = SortState {
            metric: SortMetric::Volume,
            direction: SortDirection::Descending,
        };
        assert_eq!(sorted(&mut rec, by_volume), ["gamma", "beta", "alpha"]);
    }

    #[test]
    fn test_alphabetical_ignores_case() {
        let mut rec = Reconciler::new(false);
        for name in ["alpha", "Zeta", "beta", "Beta"] {
            rec.upsert(preprocess(raw(name, 1.0, 0.0)).unwrap(), 1_000);
        }
        assert_eq!(sorted(&mut rec, SortState::default()), ["alpha", "Beta", "beta", "Zeta"]);
    }

    #[test]
    fn test_error_then_volume() {
        let mut rec = fixture();
        let state = SortState {
            metric: SortMetric::ErrorThenVolume,
            direction: SortDirection::Descending,
        };
        // alpha has the highest error; gamma beats beta on volume
        assert_eq!(sorted(&mut rec, state), ["alpha", "gamma", "beta"]);
    }

    #[test]
    fn test_ties_are_stable() {
        let mut rec = fixture();
        let state = SortState {
            metric: SortMetric::Error,
            direction: SortDirection::Ascending,
        };
        // beta and gamma tie at 1%; insertion order kept
        assert_eq!(sorted(&mut rec, state), ["beta", "gamma", "alpha"]);
    }

    #[test]
    fn test_missing_latency_sorts_low() {
        let mut rec = fixture();
        let mut record = raw("delta", 1.0, 0.0);
        record.latency_execute = Some([("90".to_string(), 25.0)].into_iter().collect());
        rec.upsert(preprocess(record).unwrap(), 1_000);

        let state = SortState {
            metric: SortMetric::Latency90,
            direction: SortDirection::Descending,
        };
        assert_eq!(sorted(&mut rec, state)[0], "delta");
    }

    #[test]
    fn test_resort_schedule() {
        let mut schedule = ResortSchedule::new(RESORT_INTERVAL_MS);
        assert!(!schedule.poll(0));
        assert!(!schedule.poll(9_999));
        assert!(schedule.poll(10_000));
        assert!(!schedule.poll(10_001));
        assert!(schedule.poll(20_000));

        schedule.cancel();
        assert!(!schedule.poll(60_000));
        assert!(!schedule.is_active());
    }
}
