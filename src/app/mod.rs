//! Cluster dashboard app (WASM)
//!
//! Stream callbacks only buffer raw payloads; everything else happens in
//! `update()` on the UI thread.

mod circuits;
mod header;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use eframe::egui;
use tracing::{info, warn};

use crate::core::{ClusterMonitor, MonitorConfig};
use crate::eventsource_wasm::{EventSourceClient, MessageBuffer};
use crate::stream_state::StreamState;
use crate::theme::{colors, minimal_visuals};
use crate::time::now_millis;

/// Default SSE endpoint (override with `window.__circuit_stream_url`)
pub const DEFAULT_STREAM_URL: &str = "cluster.stream";

/// Container the monitor is bound to
const CONTAINER_ID: &str = "dependencies";

/// Upper bound on stream messages handled per frame
const MAX_MESSAGES_PER_FRAME: usize = 2_000;

pub struct CircuitApp {
    pub(crate) monitor: ClusterMonitor,
    pub(crate) stream_state: Rc<RefCell<StreamState>>,
    /// Closes the stream when the app goes away
    #[allow(dead_code)]
    stream_client: Option<EventSourceClient>,
    msg_buffer: MessageBuffer,
    /// Messages handled since start
    pub(crate) messages_total: u64,
}

/// Read a string global set by the host page
fn page_global(name: &str) -> Option<String> {
    js_sys::eval(&format!("window.{name}"))
        .ok()
        .and_then(|v| v.as_string())
}

impl CircuitApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(minimal_visuals());

        let config = match page_global("__circuit_monitor_args") {
            Some(json) => MonitorConfig::from_json(&json).unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring monitor args");
                MonitorConfig::default()
            }),
            None => MonitorConfig::default(),
        };
        let monitor = ClusterMonitor::new(CONTAINER_ID, config);

        let stream_state = Rc::new(RefCell::new(StreamState::Connecting));
        let msg_buffer: MessageBuffer = Rc::new(RefCell::new(VecDeque::new()));

        let url = page_global("__circuit_stream_url").unwrap_or_else(|| DEFAULT_STREAM_URL.to_string());
        info!(url = %url, "Stream URL resolved");
        let stream_client = EventSourceClient::connect(&url, msg_buffer.clone(), stream_state.clone())
            .map_err(|e| {
                warn!(error = ?e, "Failed to open metrics stream");
                *stream_state.borrow_mut() = StreamState::Error(format!("{e:?}"));
            })
            .ok();

        Self {
            monitor,
            stream_state,
            stream_client,
            msg_buffer,
            messages_total: 0,
        }
    }

    /// Feed buffered stream payloads into the monitor
    fn drain_messages(&mut self, now: i64) {
        let mut handled = 0;
        while handled < MAX_MESSAGES_PER_FRAME {
            let Some(msg) = self.msg_buffer.borrow_mut().pop_front() else {
                break;
            };
            self.monitor.event_source_message_listener(&msg, now);
            handled += 1;
        }
        self.messages_total += handled as u64;
    }
}

impl eframe::App for CircuitApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();

        let now = now_millis();
        self.drain_messages(now);
        self.monitor.tick(now);

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(8.0))
            .show(ctx, |ui| {
                self.render_header(ui);
                ui.add_space(8.0);
                self.render_circuits(ui);
            });
    }
}

impl Drop for CircuitApp {
    fn drop(&mut self) {
        self.monitor.teardown();
    }
}
