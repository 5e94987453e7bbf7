//! Stream message parser for cluster metric events
//!
//! Turns one raw stream payload into an upsert or delete. Anything that is
//! not a cluster aggregate record, or not JSON at all, is dropped.

use serde_json::Value;
use tracing::{trace, warn};

use super::snapshot::{sanitize_key, RawSnapshot};

/// Routed stream event
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Create or refresh a circuit
    Upsert(RawSnapshot),
    /// Remove the circuit with this sanitized key
    Delete(String),
}

/// Parse a stream payload
///
/// Returns None for malformed payloads and for records that are not cluster
/// aggregates.
pub fn parse_event(msg: &str) -> Option<StreamEvent> {
    trace!(len = msg.len(), "Parsing message");

    let json: Value = serde_json::from_str(msg)
        .map_err(|e| {
            warn!(error = %e, "Failed to parse JSON");
        })
        .ok()?;

    let mut record: RawSnapshot = serde_json::from_value(json)
        .map_err(|e| {
            warn!(error = %e, "Malformed metrics record");
        })
        .ok()?;

    record.default_reporting_hosts();

    if !record.is_cluster() {
        trace!(kind = ?record.kind, "Non-cluster record ignored");
        return None;
    }

    if record.is_delete() {
        let Some(name) = record.cluster_name.as_deref() else {
            warn!("Delete without clusterName ignored");
            return None;
        };
        return Some(StreamEvent::Delete(sanitize_key(name)));
    }

    Some(StreamEvent::Upsert(record))
}
