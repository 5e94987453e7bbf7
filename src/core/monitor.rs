//! Cluster monitor: one dashboard instance bound to a container
//!
//! Owns the reconciler, the sort controller and its re-sort schedule, and
//! exposes the command surface the host page drives.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::parser::{parse_event, StreamEvent};
use super::reconciler::{Reconciler, Transition, VisualElement};
use super::snapshot::{preprocess, RawSnapshot};
use super::sort::{self, SortController, SortDirection, SortMetric, SortState};
use super::template::ElementTemplate;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid monitor args: {0}")]
    Json(#[from] serde_json::Error),
}

/// Display options passed by the host page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    /// Render a detail-link affordance per circuit
    pub include_detail_icon: bool,
}

impl MonitorConfig {
    /// Parse a JSON args object; unknown keys are ignored
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What a stream message did to the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Created(String),
    Updated(String),
    Deleted(String),
    /// Delete for a circuit that was not live
    Absent(String),
    /// Malformed, filtered or invalid payload
    Dropped,
}

pub struct ClusterMonitor {
    container_id: String,
    config: MonitorConfig,
    reconciler: Reconciler,
    sorter: SortController,
    torn_down: bool,
}

impl ClusterMonitor {
    pub fn new(container_id: impl Into<String>, config: MonitorConfig) -> Self {
        let reconciler = Reconciler::new(config.include_detail_icon);
        Self::from_parts(container_id.into(), config, reconciler)
    }

    /// Monitor rendering element bodies with a custom template
    pub fn with_template(
        container_id: impl Into<String>,
        config: MonitorConfig,
        template: Box<dyn ElementTemplate>,
    ) -> Self {
        let reconciler = Reconciler::with_template(config.include_detail_icon, template);
        Self::from_parts(container_id.into(), config, reconciler)
    }

    fn from_parts(container_id: String, config: MonitorConfig, reconciler: Reconciler) -> Self {
        info!(container = %container_id, ?config, "Cluster monitor created");
        Self {
            container_id,
            config,
            reconciler,
            sorter: SortController::default(),
            torn_down: false,
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Single entry point for the stream transport
    pub fn event_source_message_listener(&mut self, data: &str, now_ms: i64) -> Dispatch {
        if self.torn_down {
            trace!("Message after teardown ignored");
            return Dispatch::Dropped;
        }
        match parse_event(data) {
            Some(StreamEvent::Upsert(record)) => self.display_circuit(record, now_ms),
            Some(StreamEvent::Delete(key)) => self.delete_circuit(key),
            None => Dispatch::Dropped,
        }
    }

    fn display_circuit(&mut self, record: RawSnapshot, now_ms: i64) -> Dispatch {
        let snapshot = match preprocess(record) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Failed preprocessing, snapshot dropped");
                return Dispatch::Dropped;
            }
        };
        let key = snapshot.sanitized_key.clone();
        match self.reconciler.upsert(snapshot, now_ms) {
            Transition::Created => {
                // New element lands in place immediately
                self.sort_same_as_last();
                Dispatch::Created(key)
            }
            Transition::Updated => Dispatch::Updated(key),
        }
    }

    fn delete_circuit(&mut self, key: String) -> Dispatch {
        if self.reconciler.delete(&key) {
            Dispatch::Deleted(key)
        } else {
            Dispatch::Absent(key)
        }
    }

    /// Periodic driver: re-applies the current sort every interval
    pub fn tick(&mut self, now_ms: i64) -> bool {
        if self.torn_down || !self.sorter.poll(now_ms) {
            return false;
        }
        trace!(circuits = self.reconciler.len(), "Periodic re-sort");
        self.sort_same_as_last();
        true
    }

    /// Issue the sort command for `metric` (toggles on repeat)
    pub fn sort(&mut self, metric: SortMetric) -> SortState {
        let state = self.sorter.command(metric);
        self.reorder(state);
        state
    }

    /// Sort by `metric` in an explicit direction
    pub fn sort_in_direction(&mut self, metric: SortMetric, direction: SortDirection) {
        self.sorter.set(metric, direction);
        self.reorder(self.sorter.state());
    }

    /// Re-apply whatever sort was chosen last
    pub fn sort_same_as_last(&mut self) {
        self.reorder(self.sorter.state());
    }

    fn reorder(&mut self, state: SortState) {
        let (order, elements) = self.reconciler.order_and_elements();
        sort::apply(state, order, elements);
        debug!(metric = ?state.metric, direction = ?state.direction, circuits = order.len(), "Circuits sorted");
    }

    pub fn sort_by_volume(&mut self) -> SortState {
        self.sort(SortMetric::Volume)
    }

    pub fn sort_alphabetically(&mut self) -> SortState {
        self.sort(SortMetric::Alphabetical)
    }

    pub fn sort_by_error(&mut self) -> SortState {
        self.sort(SortMetric::Error)
    }

    pub fn sort_by_error_then_volume(&mut self) -> SortState {
        self.sort(SortMetric::ErrorThenVolume)
    }

    pub fn sort_by_latency_90(&mut self) -> SortState {
        self.sort(SortMetric::Latency90)
    }

    pub fn sort_by_latency_99(&mut self) -> SortState {
        self.sort(SortMetric::Latency99)
    }

    pub fn sort_by_latency_995(&mut self) -> SortState {
        self.sort(SortMetric::Latency995)
    }

    pub fn sort_by_latency_mean(&mut self) -> SortState {
        self.sort(SortMetric::LatencyMean)
    }

    pub fn sort_by_latency_median(&mut self) -> SortState {
        self.sort(SortMetric::LatencyMedian)
    }

    pub fn sort_state(&self) -> SortState {
        self.sorter.state()
    }

    /// Elements in display order
    pub fn elements(&self) -> impl Iterator<Item = &VisualElement> {
        self.reconciler.iter()
    }

    pub fn element(&self, key: &str) -> Option<&VisualElement> {
        self.reconciler.get(key)
    }

    pub fn circuit_count(&self) -> usize {
        self.reconciler.len()
    }

    /// No circuit has arrived yet
    pub fn is_loading(&self) -> bool {
        self.reconciler.is_loading()
    }

    /// Cancel the re-sort schedule and drop every element; later events are ignored
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.sorter.cancel();
        self.reconciler.clear();
        info!(container = %self.container_id, "Cluster monitor torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_msg(name: &str, rate: f64, error: f64) -> String {
        serde_json::json!({
            "type": "CLUSTER",
            "clusterName": name,
            "reportingHosts": 2,
            "requestCount": 100,
            "successCount": 95,
            "failCount": 5,
            "timeoutCount": 0,
            "shortCircuitedCount": 0,
            "rejectedCount": 0,
            "requestRate": rate,
            "errorPercentage": error,
        })
        .to_string()
    }

    fn delete_msg(name: &str) -> String {
        serde_json::json!({"type": "CLUSTER", "clusterName": name, "deleteData": "true"}).to_string()
    }

    fn names(monitor: &ClusterMonitor) -> Vec<String> {
        monitor.elements().map(|e| e.snapshot.name.clone()).collect()
    }

    #[test]
    fn test_upsert_then_delete() {
        let mut monitor = ClusterMonitor::new("dependencies", MonitorConfig::default());
        assert!(monitor.is_loading());

        assert_eq!(
            monitor.event_source_message_listener(&cluster_msg("A", 10.0, 0.0), 1_000),
            Dispatch::Created("A".to_string())
        );
        assert_eq!(monitor.circuit_count(), 1);

        assert_eq!(
            monitor.event_source_message_listener(&delete_msg("A"), 2_000),
            Dispatch::Deleted("A".to_string())
        );
        assert_eq!(monitor.circuit_count(), 0);

        assert_eq!(
            monitor.event_source_message_listener(&delete_msg("B"), 3_000),
            Dispatch::Absent("B".to_string())
        );
        assert_eq!(monitor.circuit_count(), 0);
    }

    #[test]
    fn test_invalid_snapshot_creates_nothing() {
        let mut monitor = ClusterMonitor::new("dependencies", MonitorConfig::default());
        let msg = r#"{"type": "CLUSTER", "clusterName": "A", "requestCount": 1}"#;
        assert_eq!(monitor.event_source_message_listener(msg, 1_000), Dispatch::Dropped);
        assert_eq!(monitor.event_source_message_listener("{oops", 1_000), Dispatch::Dropped);
        assert_eq!(monitor.circuit_count(), 0);
        assert!(monitor.is_loading());
    }

    #[test]
    fn test_invalid_snapshot_leaves_live_circuit_untouched() {
        let mut monitor = ClusterMonitor::new("dependencies", MonitorConfig::default());
        monitor.event_source_message_listener(&cluster_msg("A", 10.0, 2.0), 1_000);
        let before = monitor.element("A").cloned().unwrap();

        let mut invalid: serde_json::Value = serde_json::from_str(&cluster_msg("A", 99.0, 40.0)).unwrap();
        invalid.as_object_mut().unwrap().remove("failCount");
        assert_eq!(
            monitor.event_source_message_listener(&invalid.to_string(), 2_000),
            Dispatch::Dropped
        );

        let after = monitor.element("A").unwrap();
        assert_eq!(after.snapshot, before.snapshot);
        assert_eq!(after.sort_keys, before.sort_keys);
        assert_eq!(after.series().len(), before.series().len());
        assert_eq!(monitor.circuit_count(), 1);
    }

    #[test]
    fn test_new_circuit_lands_in_sorted_position() {
        let mut monitor = ClusterMonitor::new("dependencies", MonitorConfig::default());
        monitor.event_source_message_listener(&cluster_msg("m", 1.0, 0.0), 1_000);
        monitor.event_source_message_listener(&cluster_msg("z", 1.0, 0.0), 1_000);
        monitor.event_source_message_listener(&cluster_msg("a", 1.0, 0.0), 1_000);
        assert_eq!(names(&monitor), ["a", "m", "z"]);
    }

    #[test]
    fn test_periodic_resort_follows_churn() {
        let mut monitor = ClusterMonitor::new("dependencies", MonitorConfig::default());
        monitor.event_source_message_listener(&cluster_msg("a", 10.0, 0.0), 0);
        monitor.event_source_message_listener(&cluster_msg("b", 20.0, 0.0), 0);
        monitor.sort_by_volume();
        assert_eq!(names(&monitor), ["b", "a"]);

        // Updates alone do not reorder
        monitor.event_source_message_listener(&cluster_msg("a", 90.0, 0.0), 1_000);
        assert_eq!(names(&monitor), ["b", "a"]);

        assert!(!monitor.tick(1_000));
        assert!(monitor.tick(11_000));
        assert_eq!(names(&monitor), ["a", "b"]);
    }

    #[test]
    fn test_sort_commands_toggle() {
        let mut monitor = ClusterMonitor::new("dependencies", MonitorConfig::default());
        let first = monitor.sort_by_error_then_volume();
        let second = monitor.sort_by_error_then_volume();
        let third = monitor.sort_by_error_then_volume();
        assert_ne!(first, second);
        assert_eq!(first, third);
        assert_eq!(monitor.sort_by_latency_median().metric, SortMetric::LatencyMedian);
    }

    #[test]
    fn test_teardown_stops_everything() {
        let mut monitor = ClusterMonitor::new("dependencies", MonitorConfig::default());
        monitor.event_source_message_listener(&cluster_msg("a", 10.0, 0.0), 0);
        monitor.tick(0);
        monitor.teardown();

        assert!(monitor.is_torn_down());
        assert_eq!(monitor.circuit_count(), 0);
        assert!(!monitor.tick(60_000));
        assert_eq!(
            monitor.event_source_message_listener(&cluster_msg("b", 1.0, 0.0), 60_000),
            Dispatch::Dropped
        );
    }

    #[test]
    fn test_config_from_json() {
        let config = MonitorConfig::from_json(r#"{"includeDetailIcon": true, "other": 1}"#).unwrap();
        assert!(config.include_detail_icon);
        assert_eq!(MonitorConfig::from_json("{}").unwrap(), MonitorConfig::default());
        assert!(MonitorConfig::from_json("[").is_err());
    }
}
