pub mod text;

use eframe::egui;

use crate::deck::{Deck, Fragment, FragmentContent};
use crate::theme::Palette;

/// Reference height the palette sizes are expressed at.
const REFERENCE_HEIGHT: f32 = 1080.0;

/// Scale factor from reference coordinates to the current viewport.
pub fn compute_scale(rect: egui::Rect) -> f32 {
    (rect.height() / REFERENCE_HEIGHT).clamp(0.25, 4.0)
}

/// Paint one fragment filling `rect`, coloured by its section.
pub fn render_fragment(
    ui: &egui::Ui,
    deck: &Deck,
    fragment: &Fragment,
    palette: &Palette,
    rect: egui::Rect,
    scale: f32,
) {
    let kind = deck.section_of(fragment).kind;
    let (background, foreground) = palette.section_colors(kind);
    ui.painter().rect_filled(rect, 0.0, background);

    let padding = 80.0 * scale;
    let max_width = (rect.width() - padding * 2.0).max(1.0);
    let font_size = palette.body_size * scale;

    match &fragment.content {
        FragmentContent::Text { lines } => {
            let galleys =
                text::lines_to_galleys(ui, lines, font_size, foreground, palette, max_width);
            text::draw_centered(ui, galleys, rect.center(), 12.0 * scale, foreground);
        }
        FragmentContent::Image { url } => {
            draw_image_frame(ui, url, palette, foreground, rect.shrink(padding), scale);
        }
    }
}

/// Image fragments are shown as a framed reference to the remote image.
fn draw_image_frame(
    ui: &egui::Ui,
    url: &str,
    palette: &Palette,
    color: egui::Color32,
    rect: egui::Rect,
    scale: f32,
) {
    let frame = egui::Rect::from_center_size(
        rect.center(),
        egui::vec2(rect.width().min(900.0 * scale), rect.height().min(500.0 * scale)),
    );
    ui.painter().rect_stroke(
        frame,
        8.0 * scale,
        egui::Stroke::new(2.0 * scale, Palette::with_opacity(palette.accent, 0.6)),
        egui::StrokeKind::Inside,
    );
    let label = ui.painter().layout(
        format!("Image\n{url}"),
        egui::FontId::proportional(20.0 * scale),
        Palette::with_opacity(color, 0.8),
        frame.width() - 32.0 * scale,
    );
    let pos = frame.center() - label.rect.size() / 2.0;
    ui.painter().galley(pos, label, color);
}
