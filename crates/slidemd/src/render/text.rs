use crate::deck::Inline;
use crate::theme::Palette;
use eframe::egui::{self, Color32, FontFamily, FontId, Pos2, Stroke};

/// Create a LayoutJob from inline elements.
pub fn inlines_to_job(
    inlines: &[Inline],
    font_size: f32,
    color: Color32,
    palette: &Palette,
    max_width: f32,
) -> egui::text::LayoutJob {
    let mut job = egui::text::LayoutJob::default();
    job.wrap.max_width = max_width;
    job.halign = egui::Align::Center;
    let style = InlineStyle {
        font_size,
        color,
        bold: false,
        italic: false,
    };
    append_inlines(&mut job, inlines, palette, style);
    job
}

#[derive(Clone, Copy)]
struct InlineStyle {
    font_size: f32,
    color: Color32,
    bold: bool,
    italic: bool,
}

fn append_inlines(
    job: &mut egui::text::LayoutJob,
    inlines: &[Inline],
    palette: &Palette,
    style: InlineStyle,
) {
    for inline in inlines {
        match inline {
            Inline::Text(s) => {
                let size = if style.bold {
                    style.font_size + 1.0
                } else {
                    style.font_size
                };
                let format = egui::text::TextFormat {
                    font_id: FontId::new(size, FontFamily::Proportional),
                    color: style.color,
                    italics: style.italic,
                    ..Default::default()
                };
                job.append(s, 0.0, format);
            }
            Inline::Bold(children) => {
                append_inlines(job, children, palette, InlineStyle { bold: true, ..style });
            }
            Inline::Italic(children) => {
                append_inlines(job, children, palette, InlineStyle { italic: true, ..style });
            }
            Inline::Strikethrough(children) => {
                let mut inner_job = egui::text::LayoutJob::default();
                append_inlines(&mut inner_job, children, palette, style);
                for section in &inner_job.sections {
                    let mut format = section.format.clone();
                    format.strikethrough = Stroke::new(1.0, style.color);
                    job.append(&inner_job.text[section.byte_range.clone()], 0.0, format);
                }
            }
            Inline::Code(s) => {
                let format = egui::text::TextFormat {
                    font_id: FontId::new(style.font_size * 0.85, FontFamily::Monospace),
                    color: style.color,
                    background: palette.code_background,
                    ..Default::default()
                };
                job.append(s, 0.0, format);
            }
            Inline::Link { text, .. } => {
                let mut inner_job = egui::text::LayoutJob::default();
                let link = InlineStyle {
                    color: palette.accent,
                    ..style
                };
                append_inlines(&mut inner_job, text, palette, link);
                for section in &inner_job.sections {
                    let mut format = section.format.clone();
                    format.underline = Stroke::new(1.0, palette.accent);
                    job.append(&inner_job.text[section.byte_range.clone()], 0.0, format);
                }
            }
            Inline::Image { alt, .. } => {
                let label = if alt.is_empty() { "Image" } else { alt };
                let format = egui::text::TextFormat {
                    font_id: FontId::new(style.font_size, FontFamily::Proportional),
                    color: palette.accent,
                    italics: true,
                    ..Default::default()
                };
                job.append(&format!("[{label}]"), 0.0, format);
            }
        }
    }
}

/// Lay out the lines of a text fragment, one paragraph per line.
pub fn lines_to_galleys(
    ui: &egui::Ui,
    lines: &[Vec<Inline>],
    font_size: f32,
    color: Color32,
    palette: &Palette,
    max_width: f32,
) -> Vec<std::sync::Arc<egui::Galley>> {
    lines
        .iter()
        .map(|line| {
            let job = inlines_to_job(line, font_size, color, palette, max_width);
            ui.painter().layout_job(job)
        })
        .collect()
}

/// Paint galleys stacked and centred on `center`. Returns the height used.
pub fn draw_centered(
    ui: &egui::Ui,
    galleys: Vec<std::sync::Arc<egui::Galley>>,
    center: Pos2,
    spacing: f32,
    color: Color32,
) -> f32 {
    let total: f32 = galleys.iter().map(|g| g.rect.height()).sum::<f32>()
        + spacing * galleys.len().saturating_sub(1) as f32;
    let mut y = center.y - total / 2.0;
    for galley in galleys {
        let height = galley.rect.height();
        // Centre-aligned jobs are laid out around x = 0.
        ui.painter().galley(Pos2::new(center.x, y), galley, color);
        y += height + spacing;
    }
    total
}

/// Collect the link targets in reading order.
pub fn link_targets(lines: &[Vec<Inline>]) -> Vec<&str> {
    fn walk<'a>(inlines: &'a [Inline], out: &mut Vec<&'a str>) {
        for inline in inlines {
            match inline {
                Inline::Link { url, .. } => out.push(url),
                Inline::Bold(c) | Inline::Italic(c) | Inline::Strikethrough(c) => walk(c, out),
                _ => {}
            }
        }
    }
    let mut out = Vec::new();
    for line in lines {
        walk(line, &mut out);
    }
    out
}
