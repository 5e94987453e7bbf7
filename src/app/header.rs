//! Header bar: stream status, circuit count and sort commands

use eframe::egui;

use super::CircuitApp;
use crate::core::{SortDirection, SortMetric};
use crate::stream_state::StreamState;
use crate::theme::colors;

impl CircuitApp {
    pub(crate) fn render_header(&mut self, ui: &mut egui::Ui) {
        let state = self.stream_state.borrow().clone();
        let current = self.monitor.sort_state();

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Sort:").color(colors::TEXT_MUTED));

            for &metric in SortMetric::ALL {
                let active = current.metric == metric;
                let label = if active {
                    let arrow = match current.direction {
                        SortDirection::Ascending => "▲",
                        SortDirection::Descending => "▼",
                    };
                    format!("{} {}", metric.label(), arrow)
                } else {
                    metric.label().to_string()
                };
                let color = if active {
                    colors::TEXT_PRIMARY
                } else {
                    colors::TEXT_SECONDARY
                };
                if ui
                    .selectable_label(active, egui::RichText::new(label).color(color))
                    .clicked()
                {
                    self.monitor.sort(metric);
                }
            }

            // RIGHT: status and stats (right-to-left order)
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let (status_color, status_text) = match &state {
                    StreamState::Connected => (colors::STATUS_OK, "Connected"),
                    StreamState::Connecting => (colors::STATUS_PENDING, "Connecting..."),
                    StreamState::Disconnected => (colors::STATUS_ERROR, "Disconnected"),
                    StreamState::Error(_) => (colors::STATUS_ERROR, "Error"),
                };
                let status = ui.colored_label(status_color, status_text);
                if let StreamState::Error(reason) = &state {
                    status.on_hover_text(reason.as_str());
                }

                ui.label(egui::RichText::new("/").color(colors::TEXT_MUTED));
                ui.label(
                    egui::RichText::new(format!("{} msgs", self.messages_total))
                        .color(colors::TEXT_MUTED)
                        .monospace(),
                );
                ui.label(egui::RichText::new("/").color(colors::TEXT_MUTED));
                ui.label(
                    egui::RichText::new(format!("{} circuits", self.monitor.circuit_count()))
                        .color(colors::TEXT_MUTED)
                        .monospace(),
                );
                if !state.is_connected() && self.monitor.is_loading() {
                    ui.label(egui::RichText::new("waiting for stream").color(colors::TEXT_MUTED));
                }
            });
        });
    }
}
