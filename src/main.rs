//! Standalone CLI tailing the cluster metrics stream
//!
//! Connects to a WebSocket relay of the metrics stream, reconciles every
//! message into the dashboard model and periodically logs the display order.
//!
//! Run with: cargo run --features cli --bin circuit-cli

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use circuit_vis::core::{ClusterMonitor, Dispatch, MonitorConfig};
    use circuit_vis::time::now_millis;
    use futures_util::StreamExt;
    use std::time::Duration;
    use tokio_tungstenite::{connect_async, tungstenite::Message};
    use tracing::{debug, error, info, warn};
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,circuit_vis=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let url = std::env::var("CIRCUIT_STREAM_WS")
        .unwrap_or_else(|_| "ws://127.0.0.1:8080/cluster.stream".to_string());
    let config = match std::env::var("CIRCUIT_MONITOR_ARGS") {
        Ok(json) => MonitorConfig::from_json(&json)?,
        Err(_) => MonitorConfig::default(),
    };

    let mut monitor = ClusterMonitor::new("cli", config);

    info!(url = %url, "Connecting to metrics stream");
    let (mut ws_stream, _) = connect_async(&url).await?;
    info!("Connected, waiting for snapshots...");

    let mut messages = 0u64;
    let mut dropped = 0u64;
    let mut resort_tick = tokio::time::interval(Duration::from_secs(1));
    let mut stats_interval = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        messages += 1;
                        match monitor.event_source_message_listener(&text, now_millis()) {
                            Dispatch::Created(key) => info!(cluster = %key, "Circuit added"),
                            Dispatch::Deleted(key) => info!(cluster = %key, "Circuit removed"),
                            Dispatch::Dropped => dropped += 1,
                            other => debug!(?other, "Message applied"),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        warn!("Stream closed");
                        break;
                    }
                    Some(Err(e)) => error!(error = %e, "WebSocket error"),
                    _ => {}
                }
            }
            _ = resort_tick.tick() => {
                monitor.tick(now_millis());
            }
            _ = stats_interval.tick() => {
                let state = monitor.sort_state();
                let order: Vec<String> = monitor
                    .elements()
                    .take(10)
                    .map(|e| format!(
                        "{} ({} rps, {}%)",
                        e.snapshot.name, e.snapshot.rate_per_second, e.snapshot.rounded_error_percentage
                    ))
                    .collect();
                info!(
                    circuits = monitor.circuit_count(),
                    messages,
                    dropped,
                    sort = ?state.metric,
                    direction = ?state.direction,
                    top = ?order,
                    "stats"
                );
            }
        }
    }

    monitor.teardown();
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
