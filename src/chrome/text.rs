use std::path::PathBuf;
use std::str::FromStr;

use fontdb::{Database, Family, Query};
use glyphon::cosmic_text::Align;
use glyphon::{
    Attrs, Buffer, Color, FamilyOwned, FontSystem, Metrics, Shaping, TextArea, TextBounds, Weight,
    Wrap,
};
use palette::{LinSrgba, Srgb, Srgba};
use tracing::warn;

use crate::layout::Rect;

const FALLBACK_FAMILY: &str = "DejaVu Sans";

pub fn new_font_system() -> FontSystem {
    let mut font_system = FontSystem::new();
    initialize_font_database(font_system.db_mut());
    font_system
}

fn initialize_font_database(db: &mut Database) {
    db.load_system_fonts();
    let bundled_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
    if bundled_path.exists() {
        db.load_fonts_dir(&bundled_path);
    }
}

pub fn resolve_font_family(font_system: &FontSystem, requested: Option<&str>) -> FamilyOwned {
    let db = font_system.db();
    if let Some(name) = requested.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }) {
        if font_available(db, name) {
            return FamilyOwned::Name(name.into());
        }
        warn!(font = %name, "requested font is not installed; using fallback");
    }

    if font_available(db, FALLBACK_FAMILY) {
        FamilyOwned::Name(FALLBACK_FAMILY.into())
    } else {
        FamilyOwned::SansSerif
    }
}

fn font_available(db: &Database, name: &str) -> bool {
    let query = Query {
        families: &[Family::Name(name)],
        ..Default::default()
    };
    db.query(&query).is_some()
}

/// One run of centred text laid out inside a rectangle.
pub struct TextBlock {
    buffer: Buffer,
    font_size: f32,
    bold: bool,
    text: String,
    /// Logical rectangle the text is centred in.
    rect: Rect,
    scale: f32,
    top_offset: f32,
    color: Color,
}

impl TextBlock {
    pub fn new(font_system: &mut FontSystem, font_size: f32, bold: bool, color: Color) -> Self {
        let mut buffer = Buffer::new(font_system, Metrics::new(font_size, font_size * 1.2));
        buffer.set_wrap(font_system, Wrap::WordOrGlyph);
        Self {
            buffer,
            font_size,
            bold,
            text: String::new(),
            rect: Rect::default(),
            scale: 0.0,
            top_offset: 0.0,
            color,
        }
    }

    /// Reshapes the text for `rect` at the given scale factor. Returns false
    /// when nothing changed.
    pub fn layout(
        &mut self,
        font_system: &mut FontSystem,
        family: &FamilyOwned,
        text: &str,
        rect: Rect,
        scale: f32,
    ) -> bool {
        if self.text == text && self.rect == rect && self.scale == scale {
            return false;
        }
        self.text = text.to_owned();
        self.rect = rect;
        self.scale = scale;

        let size = self.font_size * scale;
        let metrics = Metrics::new(size, size * 1.2);
        self.buffer.set_metrics_and_size(
            font_system,
            metrics,
            Some((rect.width * scale).max(1.0)),
            Some((rect.height * scale).max(metrics.line_height)),
        );
        let mut attrs = Attrs::new().family(family.as_family());
        if self.bold {
            attrs = attrs.weight(Weight::BOLD);
        }
        self.buffer
            .set_text(font_system, &self.text, &attrs, Shaping::Advanced);
        for line in &mut self.buffer.lines {
            line.set_align(Some(Align::Center));
        }
        self.buffer.shape_until_scroll(font_system, false);

        let mut min_top = f32::MAX;
        let mut max_bottom = f32::MIN;
        for run in self.buffer.layout_runs() {
            min_top = min_top.min(run.line_top);
            max_bottom = max_bottom.max(run.line_top + run.line_height);
        }
        self.top_offset = if min_top <= max_bottom {
            ((rect.height * scale - (max_bottom - min_top)) * 0.5 - min_top).max(0.0)
        } else {
            0.0
        };
        true
    }

    pub fn area(&self, scale: f32, clip: (u32, u32)) -> TextArea<'_> {
        TextArea {
            buffer: &self.buffer,
            left: self.rect.x * scale,
            top: self.rect.y * scale + self.top_offset,
            scale: 1.0,
            bounds: TextBounds {
                left: 0,
                top: 0,
                right: clip.0 as i32,
                bottom: clip.1 as i32,
            },
            default_color: self.color,
            custom_glyphs: &[],
        }
    }
}

pub fn parse_hex_color(input: &str) -> Option<LinSrgba<f32>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(rgba) = Srgba::<u8>::from_str(trimmed) {
        let rgba_f32: Srgba<f32> = rgba.into_format();
        return Some(rgba_f32.into_linear());
    }

    let rgb = Srgb::<u8>::from_str(trimmed).ok()?;
    let rgba = Srgba::new(rgb.red, rgb.green, rgb.blue, 255);
    let rgba_f32: Srgba<f32> = rgba.into_format();
    Some(rgba_f32.into_linear())
}

/// Parses `source`, falling back to `default` (which must be valid hex).
pub fn resolve_color(source: Option<&str>, default: &str) -> LinSrgba<f32> {
    if let Some(raw) = source {
        match parse_hex_color(raw) {
            Some(color) => return color,
            None => warn!(color = %raw, "ignoring unparseable colour"),
        }
    }
    parse_hex_color(default).unwrap_or(LinSrgba::new(0.0, 0.0, 0.0, 1.0))
}

pub fn to_text_color(color: LinSrgba<f32>) -> Color {
    let srgb: Srgba<f32> = Srgba::from_linear(color);
    let srgb_u8: Srgba<u8> = srgb.into_format();
    Color::rgba(srgb_u8.red, srgb_u8.green, srgb_u8.blue, srgb_u8.alpha)
}

pub fn to_linear_array(color: LinSrgba<f32>) -> [f32; 4] {
    [color.red, color.green, color.blue, color.alpha]
}

pub fn to_wgpu_color(color: LinSrgba<f32>) -> wgpu::Color {
    wgpu::Color {
        r: color.red as f64,
        g: color.green as f64,
        b: color.blue as f64,
        a: color.alpha as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_and_rgba_hex() {
        let white = parse_hex_color("#FFFFFF").unwrap();
        assert!((white.red - 1.0).abs() < 1e-6);
        assert!((white.alpha - 1.0).abs() < 1e-6);

        let translucent = parse_hex_color("#00000080").unwrap();
        assert!((translucent.alpha - 128.0 / 255.0).abs() < 1e-3);
    }

    #[test]
    fn invalid_colour_falls_back_to_default() {
        let resolved = resolve_color(Some("not-a-colour"), "#000000");
        assert_eq!(to_linear_array(resolved), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn text_colour_round_trips_through_srgb() {
        let color = to_text_color(parse_hex_color("#1F2937").unwrap());
        assert_eq!((color.r(), color.g(), color.b()), (0x1F, 0x29, 0x37));
    }
}
