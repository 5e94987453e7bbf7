//! Minimal dark theme; the only saturated colors come from the circuit scales

use egui::Color32;

use crate::core::Rgb;

pub mod colors {
    use super::Color32;

    // === Backgrounds ===
    pub const BG_PRIMARY: Color32 = Color32::from_rgb(0, 0, 0);           // #000000
    pub const BG_ELEVATED: Color32 = Color32::from_rgb(12, 12, 12);       // #0C0C0C - circuit panels
    pub const BG_HOVER: Color32 = Color32::from_rgb(24, 24, 24);          // #181818

    // === Text ===
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(255, 255, 255);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(160, 160, 160);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(80, 80, 80);

    // === Lines & Borders ===
    pub const BORDER: Color32 = Color32::from_rgb(40, 40, 40);

    // === Trend line ===
    pub const SPARKLINE: Color32 = Color32::from_rgb(200, 200, 200);

    // === Connection status ===
    pub const STATUS_OK: Color32 = Color32::from_rgb(100, 200, 100);
    pub const STATUS_PENDING: Color32 = Color32::from_rgb(200, 200, 100);
    pub const STATUS_ERROR: Color32 = Color32::from_rgb(200, 100, 100);
}

/// Scale color -> egui color
pub fn to_color32(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.r, rgb.g, rgb.b)
}

/// Circle fill with some transparency so overlapping trend lines stay visible
pub fn circle_fill(rgb: Rgb) -> Color32 {
    Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, 160)
}

/// Accent behind the active sort button; the scale's low-load blue, dimmed
pub const SORT_ACCENT: Color32 = Color32::from_rgb(0x15, 0x56, 0x72);

fn widget(
    base: egui::style::WidgetVisuals,
    fill: Color32,
    text: Color32,
    border: Color32,
) -> egui::style::WidgetVisuals {
    egui::style::WidgetVisuals {
        bg_fill: fill,
        weak_bg_fill: fill,
        bg_stroke: egui::Stroke::new(1.0, border),
        fg_stroke: egui::Stroke::new(1.0, text),
        ..base
    }
}

/// Dark visuals for the circuit dashboard.
///
/// Sort buttons are selectable labels: the active one gets the accent fill,
/// the rest stay flat until hovered.
pub fn minimal_visuals() -> egui::Visuals {
    use colors::*;

    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = BG_PRIMARY;
    visuals.window_fill = BG_PRIMARY;
    visuals.extreme_bg_color = BG_PRIMARY;
    visuals.faint_bg_color = BG_ELEVATED;
    visuals.override_text_color = Some(TEXT_PRIMARY);

    let w = &mut visuals.widgets;
    w.noninteractive = widget(w.noninteractive, BG_PRIMARY, TEXT_MUTED, BORDER);
    w.inactive = widget(w.inactive, BG_PRIMARY, TEXT_SECONDARY, BG_PRIMARY);
    w.hovered = widget(w.hovered, BG_HOVER, TEXT_PRIMARY, BORDER);
    w.active = widget(w.active, SORT_ACCENT, TEXT_PRIMARY, TEXT_SECONDARY);

    visuals.selection.bg_fill = SORT_ACCENT;
    visuals.selection.stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);

    // Detail links
    visuals.hyperlink_color = to_color32(crate::core::scale::palette::BLUE);

    visuals.window_shadow = egui::Shadow::NONE;
    visuals.popup_shadow = egui::Shadow::NONE;
    visuals
}
