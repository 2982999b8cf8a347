use eframe::egui::Color32;

use super::StyleVars;
use crate::deck::SectionKind;

/// Base font size one `em` stands for, at the 1080p reference height.
const EM: f32 = 22.0;

/// Colours and sizes the native viewer draws with, derived from the style
/// variables.
#[derive(Debug, Clone)]
pub struct Palette {
    pub background: Color32,
    pub foreground: Color32,
    pub accent: Color32,
    pub code_background: Color32,
    pub body_size: f32,
    sections: Vec<(String, Option<Color32>, Option<Color32>)>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color32::WHITE,
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            accent: Color32::from_rgb(0x0F, 0x34, 0x60),
            code_background: Color32::from_rgb(0xF5, 0xF5, 0xF5),
            body_size: 44.0,
            sections: Vec::new(),
        }
    }
}

impl Palette {
    pub fn from_vars(vars: &StyleVars) -> Self {
        let fallback = Self::default();
        let color = |name: &str, default: Color32| {
            vars.get(name).and_then(parse_color).unwrap_or(default)
        };

        let sections = (1..=6)
            .map(|level| SectionKind::Heading(level).class())
            .chain(std::iter::once(SectionKind::Lead.class()))
            .map(|class| {
                let bg = vars.get(&format!("{class}-background")).and_then(parse_color);
                let fg = vars.get(&format!("{class}-color")).and_then(parse_color);
                (class, bg, fg)
            })
            .filter(|(_, bg, fg)| bg.is_some() || fg.is_some())
            .collect();

        Self {
            background: color("background", fallback.background),
            foreground: color("color", fallback.foreground),
            accent: color("accent", fallback.accent),
            code_background: color("code-background", fallback.code_background),
            body_size: vars
                .get("font-size")
                .and_then(parse_size)
                .unwrap_or(fallback.body_size),
            sections,
        }
    }

    /// Background and text colour for a fragment in a section of `kind`.
    pub fn section_colors(&self, kind: SectionKind) -> (Color32, Color32) {
        let class = kind.class();
        self.sections
            .iter()
            .find(|(c, _, _)| *c == class)
            .map(|(_, bg, fg)| {
                (
                    bg.unwrap_or(self.background),
                    fg.unwrap_or(self.foreground),
                )
            })
            .unwrap_or((self.background, self.foreground))
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(
            color.r(),
            color.g(),
            color.b(),
            (opacity * color.a() as f32) as u8,
        )
    }
}

/// Parse the CSS colour forms the viewer understands.
pub fn parse_color(value: &str) -> Option<Color32> {
    let value = value.trim().to_ascii_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let channel = |s: &str| s.parse::<u8>().ok();
        return match parts[..] {
            [r, g, b] => Some(Color32::from_rgb(channel(r)?, channel(g)?, channel(b)?)),
            [r, g, b, a] => {
                let alpha = a.parse::<f32>().ok()?.clamp(0.0, 1.0);
                Some(Color32::from_rgba_unmultiplied(
                    channel(r)?,
                    channel(g)?,
                    channel(b)?,
                    (alpha * 255.0).round() as u8,
                ))
            }
            _ => None,
        };
    }
    let named = match value.as_str() {
        "black" => Color32::BLACK,
        "white" => Color32::WHITE,
        "red" => Color32::from_rgb(0xFF, 0x00, 0x00),
        "green" => Color32::from_rgb(0x00, 0x80, 0x00),
        "blue" => Color32::from_rgb(0x00, 0x00, 0xFF),
        "yellow" => Color32::from_rgb(0xFF, 0xFF, 0x00),
        "orange" => Color32::from_rgb(0xFF, 0xA5, 0x00),
        "purple" => Color32::from_rgb(0x80, 0x00, 0x80),
        "gray" | "grey" => Color32::from_rgb(0x80, 0x80, 0x80),
        "transparent" => Color32::TRANSPARENT,
        _ => return None,
    };
    Some(named)
}

fn parse_hex(hex: &str) -> Option<Color32> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
    match hex.len() {
        3 => Some(Color32::from_rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Color32::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)?,
        )),
        _ => None,
    }
}

/// `24px`, `2em`, `1.5rem` or a bare number, in points at the reference height.
pub fn parse_size(value: &str) -> Option<f32> {
    let value = value.trim();
    let (number, unit_scale) = if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, EM)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, EM)
    } else {
        (value, 1.0)
    };
    let size = number.trim().parse::<f32>().ok()? * unit_scale;
    (size.is_finite() && size > 0.0).then_some(size)
}
