//! Circuit grid: one panel per live circuit, in monitor display order

use eframe::egui;

use super::CircuitApp;
use crate::core::sparkline::{HEIGHT as SPARK_HEIGHT, WIDTH as SPARK_WIDTH};
use crate::core::VisualElement;
use crate::theme::{circle_fill, colors, to_color32};

const PANEL_WIDTH: f32 = 180.0;
const PANEL_HEIGHT: f32 = 190.0;
/// Top-left of the sparkline viewport inside a panel
const SPARK_ORIGIN: egui::Vec2 = egui::vec2(20.0, 70.0);
/// Points per bezier segment when flattening trend lines
const CURVE_STEPS: usize = 6;

impl CircuitApp {
    pub(crate) fn render_circuits(&self, ui: &mut egui::Ui) {
        if self.monitor.is_loading() {
            ui.label(egui::RichText::new("Loading ...").color(colors::TEXT_MUTED));
            return;
        }

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.spacing_mut().item_spacing = egui::vec2(6.0, 6.0);
                    for element in self.monitor.elements() {
                        render_panel(ui, element);
                    }
                });
            });
    }
}

fn render_panel(ui: &mut egui::Ui, element: &VisualElement) {
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(PANEL_WIDTH, PANEL_HEIGHT), egui::Sense::hover());
    let painter = ui.painter_at(rect);

    let fill = if response.hovered() {
        colors::BG_HOVER
    } else {
        colors::BG_ELEVATED
    };
    painter.rect_filled(rect, 4.0, fill);

    // Circle: position in percent of the panel, radius in pixels
    let circle = element.circle;
    let center = rect.min
        + egui::vec2(
            rect.width() * circle.cx as f32 / 100.0,
            rect.height() * circle.cy as f32 / 100.0,
        );
    painter.circle_filled(center, circle.radius as f32, circle_fill(circle.fill));

    // Trend line
    let origin = rect.min + SPARK_ORIGIN;
    let points: Vec<egui::Pos2> = element
        .trend
        .flatten(CURVE_STEPS)
        .into_iter()
        .map(|(x, y)| origin + egui::vec2(x as f32, y as f32))
        .collect();
    if points.len() >= 2 {
        painter.add(egui::Shape::line(
            points,
            egui::Stroke::new(1.0, colors::SPARKLINE),
        ));
    }
    painter.rect_stroke(
        egui::Rect::from_min_size(origin, egui::vec2(SPARK_WIDTH as f32, SPARK_HEIGHT as f32)),
        0.0,
        egui::Stroke::new(1.0, colors::BORDER),
        egui::StrokeKind::Inside,
    );

    // Labels
    let text_origin = rect.min + egui::vec2(6.0, 6.0);
    painter.text(
        text_origin,
        egui::Align2::LEFT_TOP,
        &element.header,
        egui::FontId::proportional(12.0),
        colors::TEXT_PRIMARY,
    );
    painter.text(
        rect.right_top() + egui::vec2(-6.0, 6.0),
        egui::Align2::RIGHT_TOP,
        format!("{}%", element.snapshot.rounded_error_percentage),
        egui::FontId::monospace(12.0),
        to_color32(element.error_color),
    );
    painter.text(
        rect.left_bottom() + egui::vec2(6.0, -6.0),
        egui::Align2::LEFT_BOTTOM,
        &element.body,
        egui::FontId::monospace(9.0),
        colors::TEXT_SECONDARY,
    );

    response.on_hover_text(format!(
        "{}\n{} rps  {}% errors",
        element.snapshot.name, element.snapshot.rate_per_second, element.snapshot.rounded_error_percentage
    ));
}
