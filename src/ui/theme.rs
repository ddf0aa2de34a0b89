use egui::{Color32, FontId, Rounding, Stroke, Visuals};
use egui_phosphor::regular as icons;

use crate::model::Status;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_COLUMN: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_CARD: Color32 = Color32::from_rgb(42, 44, 56);
pub const BG_CARD_HOVER: Color32 = Color32::from_rgb(50, 52, 66);
pub const BG_FIELD: Color32 = Color32::from_rgb(20, 20, 28);
pub const BG_DROP_TARGET: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 30);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);
pub const BORDER_ACCENT: Color32 = Color32::from_rgb(90, 140, 220);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const DANGER: Color32 = Color32::from_rgb(229, 57, 53);
pub const SUCCESS: Color32 = Color32::from_rgb(52, 168, 83);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const COLUMN_MIN_WIDTH: f32 = 240.0;
pub const COLUMN_GAP: f32 = 10.0;
pub const CARD_ROUNDING: f32 = 6.0;
pub const DIALOG_WIDTH: f32 = 380.0;
pub const STATUS_BAR_HEIGHT: f32 = 24.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_menu() -> FontId {
    FontId::proportional(13.0)
}

pub fn font_column_header() -> FontId {
    FontId::proportional(13.5)
}

pub fn font_card_title() -> FontId {
    FontId::proportional(13.0)
}

pub fn font_small() -> FontId {
    FontId::proportional(10.5)
}

// ── Status metadata ──────────────────────────────────────────────────────────

pub fn status_color(status: Status) -> Color32 {
    match status {
        Status::Planejado => Color32::from_rgb(66, 133, 244),
        Status::EmExecucao => Color32::from_rgb(251, 140, 0),
        Status::Abortado => Color32::from_rgb(229, 57, 53),
        Status::Finalizado => Color32::from_rgb(52, 168, 83),
    }
}

pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Planejado => icons::CLOCK,
        Status::EmExecucao => icons::PLAY_CIRCLE,
        Status::Abortado => icons::X_CIRCLE,
        Status::Finalizado => icons::CHECK_CIRCLE,
    }
}

/// Icon and label, e.g. for badges and menus.
pub fn status_text(status: Status) -> String {
    format!("{} {}", status_icon(status), status.label())
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = BG_FIELD; // TextEdit bg

    visuals.widgets.noninteractive.bg_fill = BG_PANEL;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.noninteractive.rounding = Rounding::same(4.0);

    visuals.widgets.inactive.bg_fill = BG_CARD;
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.inactive.rounding = Rounding::same(4.0);

    visuals.widgets.hovered.bg_fill = BG_CARD_HOVER;
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.rounding = Rounding::same(4.0);

    visuals.widgets.active.bg_fill = Color32::from_rgb(60, 62, 76);
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.active.fg_stroke = Stroke::new(2.0, Color32::WHITE);
    visuals.widgets.active.rounding = Rounding::same(4.0);

    visuals.selection.bg_fill = Color32::from_rgba_premultiplied(80, 140, 220, 45);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.striped = false;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}

/// Register the Phosphor icon font as a fallback so icons render inline.
pub fn install_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
    ctx.set_fonts(fonts);
}
