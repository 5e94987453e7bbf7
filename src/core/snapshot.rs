//! Cluster metric snapshots: wire record, validation and derived fields

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::format::{round1, round_number};
use super::series::Sample;

/// `type` tag of cluster aggregate records
pub const CLUSTER_TYPE: &str = "CLUSTER";

/// Characters escaped in selector-safe keys
const RESERVED: &str = " !\"#$%&'()*+,./:;<=>?@[\\]^`{|}~";

/// A snapshot was missing a required field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Key Missing: {field} for {}", .entity.as_deref().unwrap_or("<unnamed>"))]
    MissingField {
        field: &'static str,
        entity: Option<String>,
    },
}

impl ValidationError {
    /// Wire name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field, .. } => field,
        }
    }
}

/// Inbound stream record as sent by the aggregating server.
///
/// Every field is optional at this layer; [`preprocess`] enforces which are
/// required. Counts are signed so negative values survive parsing and get
/// clamped instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub cluster_name: Option<String>,
    pub reporting_hosts: Option<i64>,
    pub request_count: Option<i64>,
    pub success_count: Option<i64>,
    pub fail_count: Option<i64>,
    pub timeout_count: Option<i64>,
    pub short_circuited_count: Option<i64>,
    pub rejected_count: Option<i64>,
    pub request_rate: Option<f64>,
    pub error_percentage: Option<f64>,
    pub command_count: Option<i64>,
    pub dashboard_url: Option<String>,
    pub stream_url: Option<String>,
    /// `"true"` requests removal of the circuit
    pub delete_data: Option<serde_json::Value>,
    pub graph_values: Option<Vec<Sample>>,
    /// Percentile label ("50", "90", "99", "99.5") -> millis
    pub latency_execute: Option<BTreeMap<String, f64>>,
    #[serde(rename = "latencyExecute_mean")]
    pub latency_execute_mean: Option<f64>,
}

impl RawSnapshot {
    /// Cluster aggregate record (as opposed to a single command)
    pub fn is_cluster(&self) -> bool {
        self.kind.as_deref() == Some(CLUSTER_TYPE)
    }

    /// Only the string sentinel `"true"` marks a deletion
    pub fn is_delete(&self) -> bool {
        matches!(&self.delete_data, Some(serde_json::Value::String(s)) if s == "true")
    }

    /// Missing or zero reporting hosts means a single host
    pub fn default_reporting_hosts(&mut self) {
        if matches!(self.reporting_hosts, None | Some(0)) {
            self.reporting_hosts = Some(1);
        }
    }
}

/// Latency figures used by the latency sort commands
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencySummary {
    pub p90: Option<f64>,
    pub p99: Option<f64>,
    pub p995: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl LatencySummary {
    fn from_raw(percentiles: Option<&BTreeMap<String, f64>>, mean: Option<f64>) -> Self {
        let pick = |label: &str| percentiles.and_then(|p| p.get(label).copied());
        Self {
            p90: pick("90"),
            p99: pick("99"),
            p995: pick("99.5"),
            mean,
            median: pick("50"),
        }
    }
}

/// A validated snapshot plus everything the reconciler derives from it
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSnapshot {
    pub name: String,
    /// Selector-safe key; identifies the visual element
    pub sanitized_key: String,
    pub reporting_hosts: u32,
    pub request_count: u64,
    pub success_count: u64,
    pub fail_count: u64,
    pub timeout_count: u64,
    pub short_circuited_count: u64,
    pub rejected_count: u64,
    /// Raw rate as reported
    pub request_rate: f64,
    /// Error percentage as reported
    pub error_percentage: f64,
    pub rounded_error_percentage: String,
    pub rate_per_second: f64,
    pub rate_per_second_per_host: f64,
    pub error_volume_composite_key: f64,
    pub command_count: Option<u64>,
    pub dashboard_url: Option<String>,
    pub stream_url: Option<String>,
    pub latency: LatencySummary,
    pub seed_series: Option<Vec<Sample>>,
}

fn require<T>(value: Option<T>, field: &'static str, entity: Option<&str>) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingField {
        field,
        entity: entity.map(str::to_string),
    })
}

#[inline]
fn clamp_count(n: i64) -> u64 {
    n.max(0) as u64
}

/// Composite sort key: error percentage dominates, volume breaks ties
pub fn error_volume_composite_key(error_percentage: f64, rate_per_second: f64) -> f64 {
    error_percentage * 100_000_000.0 + rate_per_second
}

/// Backslash-escape every selector-reserved character
pub fn sanitize_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if RESERVED.contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Validate a raw record and compute derived fields
pub fn preprocess(raw: RawSnapshot) -> Result<DerivedSnapshot, ValidationError> {
    let entity = raw.cluster_name.as_deref();

    let reporting_hosts = require(raw.reporting_hosts, "reportingHosts", entity)?;
    require(raw.kind.as_ref(), "type", entity)?;
    let name = require(raw.cluster_name.clone(), "clusterName", entity)?;
    let request_count = require(raw.request_count, "requestCount", entity)?;
    let success_count = require(raw.success_count, "successCount", entity)?;
    let fail_count = require(raw.fail_count, "failCount", entity)?;
    let timeout_count = require(raw.timeout_count, "timeoutCount", entity)?;
    let short_circuited_count = require(raw.short_circuited_count, "shortCircuitedCount", entity)?;
    let rejected_count = require(raw.rejected_count, "rejectedCount", entity)?;
    let request_rate = require(raw.request_rate, "requestRate", entity)?;

    let reporting_hosts = u32::try_from(reporting_hosts.max(1)).unwrap_or(u32::MAX);
    let request_count = clamp_count(request_count);

    let (rate_per_second, rate_per_second_per_host) = if request_count == 0 {
        (0.0, 0.0)
    } else {
        (round1(request_rate), round1(request_rate / reporting_hosts as f64))
    };

    let error_percentage = raw.error_percentage.unwrap_or(0.0);
    let latency = LatencySummary::from_raw(raw.latency_execute.as_ref(), raw.latency_execute_mean);

    Ok(DerivedSnapshot {
        sanitized_key: sanitize_key(&name),
        name,
        reporting_hosts,
        request_count,
        success_count: clamp_count(success_count),
        fail_count: clamp_count(fail_count),
        timeout_count: clamp_count(timeout_count),
        short_circuited_count: clamp_count(short_circuited_count),
        rejected_count: clamp_count(rejected_count),
        request_rate,
        error_percentage,
        rounded_error_percentage: round_number(error_percentage),
        rate_per_second,
        rate_per_second_per_host,
        error_volume_composite_key: error_volume_composite_key(error_percentage, rate_per_second),
        command_count: raw.command_count.map(clamp_count),
        dashboard_url: raw.dashboard_url,
        stream_url: raw.stream_url,
        latency,
        seed_series: raw.graph_values,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn raw(name: &str, rate: f64, error: f64) -> RawSnapshot {
        RawSnapshot {
            kind: Some(CLUSTER_TYPE.to_string()),
            cluster_name: Some(name.to_string()),
            reporting_hosts: Some(1),
            request_count: Some(100),
            success_count: Some(90),
            fail_count: Some(10),
            timeout_count: Some(0),
            short_circuited_count: Some(0),
            rejected_count: Some(0),
            request_rate: Some(rate),
            error_percentage: Some(error),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_fields_named() {
        let cases: [(&str, fn(&mut RawSnapshot)); 10] = [
            ("reportingHosts", |r| r.reporting_hosts = None),
            ("type", |r| r.kind = None),
            ("clusterName", |r| r.cluster_name = None),
            ("requestCount", |r| r.request_count = None),
            ("successCount", |r| r.success_count = None),
            ("failCount", |r| r.fail_count = None),
            ("timeoutCount", |r| r.timeout_count = None),
            ("shortCircuitedCount", |r| r.short_circuited_count = None),
            ("rejectedCount", |r| r.rejected_count = None),
            ("requestRate", |r| r.request_rate = None),
        ];
        for (field, strip) in cases {
            let mut record = raw("orders", 10.0, 0.0);
            strip(&mut record);
            let err = preprocess(record).unwrap_err();
            assert_eq!(err.field(), field);
        }
    }

    #[test]
    fn test_error_message() {
        let mut record = raw("orders", 10.0, 0.0);
        record.fail_count = None;
        let err = preprocess(record).unwrap_err();
        assert_eq!(err.to_string(), "Key Missing: failCount for orders");
    }

    #[test]
    fn test_negative_request_count_zero_rate() {
        let mut record = raw("orders", 218.375, 0.0);
        record.request_count = Some(-5);
        let snap = preprocess(record).unwrap();
        assert_eq!(snap.request_count, 0);
        assert_eq!(snap.rate_per_second, 0.0);
        assert_eq!(snap.rate_per_second_per_host, 0.0);
    }

    #[test]
    fn test_rates_per_host() {
        let mut record = raw("orders", 218.375, 0.0);
        record.reporting_hosts = Some(4);
        let snap = preprocess(record).unwrap();
        assert_eq!(snap.rate_per_second, 218.4);
        assert_eq!(snap.rate_per_second_per_host, 54.6);
        assert_eq!(snap.reporting_hosts, 4);

        // Per-host rate is rounded once, from the reported rate
        let mut record = raw("orders", 1.45, 0.0);
        record.reporting_hosts = Some(10);
        let snap = preprocess(record).unwrap();
        assert_eq!(snap.rate_per_second, 1.5);
        assert_eq!(snap.rate_per_second_per_host, 0.1);
    }

    #[test]
    fn test_error_percentage_rounding() {
        let snap = preprocess(raw("orders", 1.0, 12.34)).unwrap();
        assert_eq!(snap.rounded_error_percentage, "12.3");
        let snap = preprocess(raw("orders", 1.0, 12.0)).unwrap();
        assert_eq!(snap.rounded_error_percentage, "12.0");

        let mut record = raw("orders", 1.0, 0.0);
        record.error_percentage = None;
        assert_eq!(preprocess(record).unwrap().rounded_error_percentage, "0.0");
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("my cluster!"), "my\\ cluster\\!");
        assert_eq!(sanitize_key("a.b:c"), "a\\.b\\:c");
        assert_eq!(sanitize_key("plain-name_1"), "plain-name_1");
    }

    #[test]
    fn test_composite_key_error_dominates() {
        let high = preprocess(raw("a", 5.0, 10.0)).unwrap();
        assert_eq!(high.error_volume_composite_key, 1_000_000_005.0);

        let low = preprocess(raw("b", 1_000_000.0, 9.99)).unwrap();
        assert!(high.error_volume_composite_key > low.error_volume_composite_key);
    }

    #[test]
    fn test_reporting_hosts_default() {
        let mut record = raw("orders", 1.0, 0.0);
        record.reporting_hosts = Some(0);
        record.default_reporting_hosts();
        assert_eq!(record.reporting_hosts, Some(1));

        record.reporting_hosts = None;
        record.default_reporting_hosts();
        assert_eq!(record.reporting_hosts, Some(1));
    }

    #[test]
    fn test_latency_summary() {
        let json = r#"{
            "type": "CLUSTER",
            "clusterName": "search",
            "latencyExecute": {"50": 4.0, "90": 12.0, "99": 40.0, "99.5": 55.0},
            "latencyExecute_mean": 6.5
        }"#;
        let record: RawSnapshot = serde_json::from_str(json).unwrap();
        let latency = LatencySummary::from_raw(record.latency_execute.as_ref(), record.latency_execute_mean);
        assert_eq!(latency.median, Some(4.0));
        assert_eq!(latency.p90, Some(12.0));
        assert_eq!(latency.p995, Some(55.0));
        assert_eq!(latency.mean, Some(6.5));
    }
}
