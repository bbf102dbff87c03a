//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter
//! can remain agnostic of Macroquad's UI types: the guide panel with its
//! spawn buttons, and the terminal overlay with its single action button.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};

use join_circuit_core::TableId;
use join_circuit_rendering::{GuidePanelView, StatusOverlayView};

const PANEL_BACKGROUND: Color = Color::new(0.06, 0.09, 0.16, 0.92);
const HINT_COLOR: Color = Color::new(0.58, 0.64, 0.72, 1.0);

/// Characters per wrapped description line; the panel font is close to
/// monospace at this size.
const WRAP_COLUMNS: usize = 40;

/// Snapshot of the guide panel's layout and data for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GuidePanelUiContext<'a> {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Panel dimensions in screen space.
    pub size: Vec2,
    /// Panel content produced by the session controller.
    pub panel: &'a GuidePanelView,
}

/// Outcome of rendering the guide panel UI for the current frame.
#[derive(Clone, Debug, Default)]
pub(crate) struct GuidePanelUiResult {
    /// Table source whose spawn button was pressed, if any.
    pub spawn: Option<TableId>,
}

/// Snapshot of the terminal overlay's layout for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct OverlayUiContext {
    /// Overlay variant selecting the headline, message, and action.
    pub overlay: StatusOverlayView,
    /// Current screen width in pixels.
    pub screen_width: f32,
    /// Current screen height in pixels.
    pub screen_height: f32,
}

/// Outcome of rendering the overlay UI for the current frame.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct OverlayUiResult {
    /// Whether the overlay's action button was pressed.
    pub action: bool,
}

fn push_panel_skin(ui: &mut Ui, background: Color) {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(background)
        .color_hovered(background)
        .color_clicked(background)
        .color_selected(background)
        .color_selected_hovered(background)
        .color_inactive(background)
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 12.0, 12.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 2.0, 2.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(30, 41, 59, 255))
        .color_hovered(Color::from_rgba(51, 65, 85, 255))
        .color_clicked(Color::from_rgba(15, 23, 42, 255))
        .color_selected(Color::from_rgba(30, 41, 59, 255))
        .color_selected_hovered(Color::from_rgba(51, 65, 85, 255))
        .color_inactive(Color::from_rgba(15, 23, 42, 200))
        .margin(RectOffset::new(8.0, 8.0, 6.0, 6.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);
}

/// Renders the guide panel's interactive elements for the current frame.
pub(crate) fn draw_guide_panel_ui(ui: &mut Ui, context: GuidePanelUiContext<'_>) -> GuidePanelUiResult {
    push_panel_skin(ui, PANEL_BACKGROUND);

    let mut result = GuidePanelUiResult::default();
    let panel = context.panel;
    let _ = ui.window(hash!("guide_panel"), context.origin, context.size, |ui| {
        ui.label(
            None,
            &format!("{}  [LVL {}]", panel.title, panel.level_number),
        );
        for line in wrap_text(&panel.description, WRAP_COLUMNS) {
            ui.label(None, &line);
        }
        ui.separator();

        ui.label(None, "DATA SOURCES");
        for source in &panel.sources {
            if source.placed {
                ui.label(None, &format!("  {} - placed", source.label));
            } else if ui.button(None, source.label.as_str()) {
                result.spawn = Some(source.id.clone());
            }
        }

        ui.separator();
        let hints = hint_skin(ui);
        ui.push_skin(&hints);
        ui.label(None, "Drag nodes to reposition.");
        ui.label(None, "Shift-drag (or right-drag) to connect.");
        ui.label(None, "Click a link's chip to toggle JOIN.");
        ui.pop_skin();
    });

    ui.pop_skin();
    result
}

/// Renders the terminal overlay's dialog for the current frame.
pub(crate) fn draw_overlay_ui(ui: &mut Ui, context: OverlayUiContext) -> OverlayUiResult {
    let overlay = context.overlay;
    let size = Vec2::new(420.0, 180.0);
    let origin = Vec2::new(
        (context.screen_width - size.x) * 0.5,
        (context.screen_height - size.y) * 0.5,
    );

    push_panel_skin(ui, Color::new(0.06, 0.09, 0.16, 0.98));

    let mut result = OverlayUiResult::default();
    let _ = ui.window(hash!("status_overlay"), origin, size, |ui| {
        ui.label(None, overlay.headline());
        for line in wrap_text(overlay.message(), 48) {
            ui.label(None, &line);
        }
        ui.separator();
        if ui.button(None, overlay.action_label()) {
            result.action = true;
        }
    });

    ui.pop_skin();
    result
}

fn hint_skin(ui: &mut Ui) -> macroquad::ui::Skin {
    let mut skin = ui.default_skin();
    let label_style = ui
        .style_builder()
        .text_color(HINT_COLOR)
        .text_color_hovered(HINT_COLOR)
        .text_color_clicked(HINT_COLOR)
        .margin(RectOffset::new(0.0, 0.0, 1.0, 1.0))
        .build();
    skin.label_style = label_style;
    skin
}

/// Greedy word wrap used because the immediate-mode labels do not wrap.
fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > columns {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::wrap_text;

    #[test]
    fn wraps_at_the_requested_column_count() {
        let lines = wrap_text("find users who have placed an order today", 16);
        assert!(lines.iter().all(|line| line.len() <= 16));
        assert_eq!(lines.join(" "), "find users who have placed an order today");
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(wrap_text("hello world", 40), vec!["hello world"]);
    }
}
