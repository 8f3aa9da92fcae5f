//! Text measurement and rasterization.
//!
//! Both the on-screen text textures and the exported PNG are rasterized from
//! the same glyph outlines, so what the user sees is what gets downloaded.
//! Fonts are egui's bundled proportional family; characters the primary font
//! lacks (emoji) fall back to the next font in the family.

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use egui::{Color32, Pos2, Rect, Vec2};
use image::{Rgba, RgbaImage};
use log::debug;

use crate::element::TEXT_PADDING;
use crate::error::FontError;

/// Line height used when measuring, as a multiple of the font size
pub const MEASURE_LINE_HEIGHT: f64 = 1.2;
/// Horizontal padding added by [`TextMetrics::measure`]
pub const MEASURE_PADDING: f32 = 20.0;
/// Horizontal padding given to a freshly created text element
pub const INITIAL_TEXT_PADDING: f32 = 40.0;
/// Growth smaller than this is treated as remeasurement jitter
pub const GROWTH_THRESHOLD: f32 = 10.0;

/// Size a text string needs on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// Where each line of a text box goes, in the box's local coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<LineLayout>,
    /// Covers the box and every glyph
    pub bounds: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
}

/// Everything needed to rasterize one text box
#[derive(Debug, Clone)]
pub struct TextRaster<'a> {
    pub content: &'a str,
    pub box_size: Vec2,
    pub font_size: f32,
    pub color: Color32,
    /// Output pixels per scene unit
    pub scale: f32,
}

pub struct TextMetrics {
    fonts: Vec<FontArc>,
}

impl std::fmt::Debug for TextMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextMetrics")
            .field("fonts", &self.fonts.len())
            .finish()
    }
}

impl TextMetrics {
    /// Load egui's bundled proportional fonts, primary font first
    pub fn from_egui_defaults() -> Result<Self, FontError> {
        let definitions = egui::FontDefinitions::default();
        let family = definitions
            .families
            .get(&egui::FontFamily::Proportional)
            .cloned()
            .unwrap_or_default();

        let fonts = family
            .iter()
            .filter_map(|name| definitions.font_data.get(name))
            .filter_map(|data| FontArc::try_from_vec(data.font.to_vec()).ok())
            .collect();
        Self::from_fonts(fonts)
    }

    pub fn from_fonts(fonts: Vec<FontArc>) -> Result<Self, FontError> {
        if fonts.is_empty() {
            return Err(FontError::NoFonts);
        }
        debug!("Loaded {} fonts for text layout", fonts.len());
        Ok(Self { fonts })
    }

    /// `height = ceil(font_size * 1.2)`, `width = ceil(advance + 20)`
    pub fn measure(&self, text: &str, font_size: f32) -> TextSize {
        TextSize {
            width: (self.advance_width(text, font_size) + MEASURE_PADDING).ceil(),
            // In f64 so that 50 * 1.2 is exactly 60 before rounding up
            height: (f64::from(font_size) * MEASURE_LINE_HEIGHT).ceil() as f32,
        }
    }

    /// Advance width of the widest line
    pub fn advance_width(&self, text: &str, font_size: f32) -> f32 {
        text.split('\n')
            .map(|line| self.line_width(line, font_size))
            .fold(0.0, f32::max)
    }

    fn line_width(&self, line: &str, font_size: f32) -> f32 {
        let mut width = 0.0;
        let mut previous: Option<(usize, GlyphId)> = None;
        for ch in line.chars().filter(|ch| !ch.is_control()) {
            let (index, glyph) = self.glyph_for(ch);
            let scaled = self.fonts[index].as_scaled(self.px_scale(index, font_size));
            if let Some((prev_index, prev_glyph)) = previous {
                if prev_index == index {
                    width += scaled.kern(prev_glyph, glyph);
                }
            }
            width += scaled.h_advance(glyph);
            previous = Some((index, glyph));
        }
        width.max(0.0)
    }

    /// First font in the family that has a glyph for `ch`
    fn glyph_for(&self, ch: char) -> (usize, GlyphId) {
        self.fonts
            .iter()
            .enumerate()
            .map(|(index, font)| (index, font.glyph_id(ch)))
            .find(|(_, glyph)| glyph.0 != 0)
            .unwrap_or((0, self.fonts[0].glyph_id(ch)))
    }

    /// Scale so that one em equals `font_size` pixels, as browsers size fonts
    fn px_scale(&self, index: usize, font_size: f32) -> PxScale {
        let font = &self.fonts[index];
        let units_per_em = font.units_per_em().unwrap_or(1000.0);
        PxScale::from(font_size * font.height_unscaled() / units_per_em)
    }

    fn vertical_metrics(&self, font_size: f32) -> (f32, f32) {
        let scaled = self.fonts[0].as_scaled(self.px_scale(0, font_size));
        (scaled.ascent(), scaled.descent().abs())
    }

    /// Break one paragraph into lines no wider than `max_width`, at spaces
    /// where possible and between characters for words that do not fit alone
    fn wrap_paragraph(&self, paragraph: &str, font_size: f32, max_width: f32) -> Vec<String> {
        if max_width <= 0.0 || self.line_width(paragraph, font_size) <= max_width {
            return vec![paragraph.to_owned()];
        }

        let mut lines = Vec::new();
        let mut current = String::new();
        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_owned()
            } else {
                format!("{} {}", current, word)
            };
            if self.line_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for ch in word.chars() {
                current.push(ch);
                if current.chars().count() > 1 && self.line_width(&current, font_size) > max_width {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, ch.to_string()));
                }
            }
        }
        lines.push(current);
        lines
    }

    /// Split `content` into display lines: at every `\n`, then wrapped to
    /// the box width minus [`TEXT_PADDING`] on both sides
    pub fn wrap(&self, content: &str, box_width: f32, font_size: f32) -> Vec<String> {
        let max_width = box_width - 2.0 * TEXT_PADDING;
        content
            .split('\n')
            .flat_map(|paragraph| self.wrap_paragraph(paragraph, font_size, max_width))
            .collect()
    }

    /// Lay out `content` centered in a box of `box_size`.
    ///
    /// Lines come from [`Self::wrap`], one font size apart, centered
    /// horizontally and as a block vertically.
    pub fn layout(&self, content: &str, box_size: Vec2, font_size: f32) -> TextLayout {
        let (ascent, descent) = self.vertical_metrics(font_size);
        let line_height = font_size;
        let wrapped = self.wrap(content, box_size.x, font_size);
        let line_count = wrapped.len() as f32;
        let block_top = (box_size.y - line_count * line_height) / 2.0;

        let mut bounds = Rect::from_min_size(Pos2::ZERO, box_size);
        let lines = wrapped
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let width = self.line_width(line, font_size);
                let x = (box_size.x - width) / 2.0;
                let glyph_top = block_top + i as f32 * line_height + (line_height - ascent - descent) / 2.0;
                let glyphs = Rect::from_min_size(
                    Pos2::new(x, glyph_top),
                    Vec2::new(width, ascent + descent),
                );
                bounds = bounds.union(glyphs);
                LineLayout {
                    text: line.to_owned(),
                    x,
                    baseline: glyph_top + ascent,
                    width,
                }
            })
            .collect();

        TextLayout {
            lines,
            bounds: bounds.expand(1.0),
        }
    }

    /// Rasterize a text box. The image covers `layout(..).bounds` at
    /// `raster.scale` pixels per unit.
    pub fn rasterize(&self, raster: &TextRaster<'_>) -> (TextLayout, RgbaImage) {
        let layout = self.layout(raster.content, raster.box_size, raster.font_size);
        let scale = raster.scale.max(f32::EPSILON);
        let width = (layout.bounds.width() * scale).ceil().max(1.0) as u32;
        let height = (layout.bounds.height() * scale).ceil().max(1.0) as u32;
        let mut image = RgbaImage::new(width, height);
        let origin = layout.bounds.min;

        for line in &layout.lines {
            let mut cursor = line.x;
            let mut previous: Option<(usize, GlyphId)> = None;
            for ch in line.text.chars().filter(|ch| !ch.is_control()) {
                let (index, glyph_id) = self.glyph_for(ch);
                let font = &self.fonts[index];
                let layout_scale = font.as_scaled(self.px_scale(index, raster.font_size));
                if let Some((prev_index, prev_glyph)) = previous {
                    if prev_index == index {
                        cursor += layout_scale.kern(prev_glyph, glyph_id);
                    }
                }

                let glyph = glyph_id.with_scale_and_position(
                    self.px_scale(index, raster.font_size * scale),
                    point((cursor - origin.x) * scale, (line.baseline - origin.y) * scale),
                );
                if let Some(outline) = font.outline_glyph(glyph) {
                    let px = outline.px_bounds();
                    outline.draw(|x, y, coverage| {
                        let px_x = px.min.x as i64 + x as i64;
                        let px_y = px.min.y as i64 + y as i64;
                        if px_x >= 0 && px_y >= 0 && (px_x as u32) < width && (px_y as u32) < height {
                            blend_pixel(image.get_pixel_mut(px_x as u32, px_y as u32), raster.color, coverage);
                        }
                    });
                }

                cursor += layout_scale.h_advance(glyph_id);
                previous = Some((index, glyph_id));
            }
        }

        (layout, image)
    }
}

/// Source-over blend of `color` at `coverage` onto an unpremultiplied pixel
fn blend_pixel(pixel: &mut Rgba<u8>, color: Color32, coverage: f32) {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let src_a = (a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = pixel[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    let mix = |src: u8, dst: u8| {
        ((src as f32 * src_a + dst as f32 * dst_a * (1.0 - src_a)) / out_a).round() as u8
    };
    *pixel = Rgba([
        mix(r, pixel[0]),
        mix(g, pixel[1]),
        mix(b, pixel[2]),
        (out_a * 255.0).round() as u8,
    ]);
}
