use eframe::egui;
use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

use crate::config::Config;

pub const ACCENT: Color32 = Color32::from_rgb(19, 152, 244);

/// Colors handed out to members without a configured color
const MEMBER_PALETTE: [Color32; 6] = [
    Color32::from_rgb(0x13, 0x98, 0xf4), // blue
    Color32::from_rgb(0xe8, 0x28, 0x71), // pink
    Color32::from_rgb(0x65, 0xba, 0x43), // green
    Color32::from_rgb(0xec, 0x71, 0x1b), // orange
    Color32::from_rgb(0x90, 0x4e, 0xe2), // purple
    Color32::from_rgb(0xe5, 0xaa, 0x00), // gold
];

/// Shared (whole family) activities
const SHARED_COLOR: Color32 = Color32::from_rgb(0x8a, 0x8a, 0x80);

pub fn setup_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    // Phosphor Regular icons as fallback in the Proportional family
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);

    ctx.set_fonts(fonts);
}

pub fn setup_theme(ctx: &egui::Context) {
    let mut style = Style::default();
    let mut visuals = Visuals::dark();

    let bg = Color32::BLACK;
    visuals.panel_fill = bg;
    visuals.window_fill = bg;
    visuals.faint_bg_color = Color32::from_rgb(20, 20, 18);
    visuals.extreme_bg_color = bg;

    // Warm grays (R=G > B)
    visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(40, 40, 38);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(176, 176, 168));
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(56, 56, 52);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(200, 200, 192));
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(80, 80, 74);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.widgets.active.bg_fill = ACCENT;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.selection.bg_fill = ACCENT;
    visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.hyperlink_color = ACCENT;

    visuals.widgets.noninteractive.rounding = Rounding::same(6.0);
    visuals.widgets.inactive.rounding = Rounding::same(6.0);
    visuals.widgets.hovered.rounding = Rounding::same(6.0);
    visuals.widgets.active.rounding = Rounding::same(6.0);
    visuals.window_rounding = Rounding::same(8.0);

    style.visuals = visuals;

    style.text_styles = [
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
    ]
    .into();

    style.spacing.item_spacing = egui::vec2(12.0, 10.0);
    style.spacing.button_padding = egui::vec2(18.0, 10.0);
    style.spacing.window_margin = egui::Margin::same(24.0);

    ctx.set_style(style);
}

/// Parse "#rrggbb" (leading '#' optional)
pub fn parse_hex_color(hex: &str) -> Option<Color32> {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

pub fn to_hex_color(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

/// Color for a member's activities: configured color first, then the palette
/// slot for the member's position in the family list
pub fn member_color(config: &Config, member_id: Option<&str>, member_index: Option<usize>) -> Color32 {
    let Some(member_id) = member_id else {
        return SHARED_COLOR;
    };
    config
        .member_color(member_id)
        .and_then(parse_hex_color)
        .unwrap_or_else(|| MEMBER_PALETTE[member_index.unwrap_or(0) % MEMBER_PALETTE.len()])
}

/// Returns (bg_color, text_color, secondary_text_color) for activity blocks
pub fn block_colors() -> (Color32, Color32, Color32) {
    (
        Color32::from_rgb(0x1c, 0x1c, 0x1a),
        Color32::WHITE,
        Color32::from_rgb(208, 208, 200),
    )
}

/// Returns (bg_color, text_color) for button-like elements
pub fn button_colors() -> (Color32, Color32) {
    (
        Color32::from_rgb(56, 56, 52),
        Color32::from_rgb(200, 200, 192),
    )
}

/// Returns (grid_line, hour_line, quarter_line) colors for the schedule grid
pub fn grid_colors() -> (Color32, Color32, Color32) {
    (
        Color32::from_rgb(0x40, 0x40, 0x3c),
        Color32::from_rgb(0x50, 0x50, 0x4a),
        Color32::from_rgb(0x24, 0x24, 0x22),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse_and_format() {
        assert_eq!(parse_hex_color("#ff8800"), Some(Color32::from_rgb(255, 136, 0)));
        assert_eq!(parse_hex_color("1398F4"), Some(ACCENT));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
        assert_eq!(to_hex_color(ACCENT), "#1398f4");
    }

    #[test]
    fn configured_color_beats_palette() {
        let mut config = Config::default();
        config.set_member_color("m1", "#00ff00");
        assert_eq!(member_color(&config, Some("m1"), Some(3)), Color32::from_rgb(0, 255, 0));
        assert_eq!(member_color(&config, Some("m2"), Some(1)), MEMBER_PALETTE[1]);
        assert_eq!(member_color(&config, Some("m2"), Some(7)), MEMBER_PALETTE[1]);
        assert_eq!(member_color(&config, None, None), SHARED_COLOR);
    }

    #[test]
    fn broken_configured_color_falls_back() {
        let mut config = Config::default();
        config.set_member_color("m1", "blue");
        assert_eq!(member_color(&config, Some("m1"), Some(0)), MEMBER_PALETTE[0]);
    }
}
