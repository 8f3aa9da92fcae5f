//! Flattening the design into a PNG and handing it to the user.
//!
//! The flattened image is rendered by tiny-skia from the scene model rather
//! than read back from the screen, so selection decorations and the inline
//! editor overlay never appear in it.

use std::collections::HashMap;
use std::io::Cursor;

use egui::{Color32, Pos2, Rect, Vec2};
use image::{ImageFormat, RgbaImage};
use log::{debug, info};
use resvg::tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::element::{DesignElement, ElementId, ElementKind};
use crate::error::ExportError;
use crate::image_loader::{Bitmap, image_to_pixmap, pixmap_to_image};
use crate::scene::{Scene, background_rect};
use crate::text::{TextMetrics, TextRaster};

/// Everything the flattener reads
pub struct FlattenInput<'a> {
    pub scene: &'a Scene,
    pub background: Option<&'a RgbaImage>,
    pub bitmaps: &'a HashMap<ElementId, Bitmap>,
    pub fonts: &'a TextMetrics,
    pub text_color: Color32,
    pub overscan: f32,
    /// Output pixels per viewport unit
    pub pixel_ratio: f32,
}

/// Render background and elements, in paint order, into one bitmap of
/// `viewport * pixel_ratio` pixels
pub fn flatten(input: &FlattenInput<'_>) -> Result<RgbaImage, ExportError> {
    let viewport = input.scene.viewport();
    if viewport.x < 1.0 || viewport.y < 1.0 {
        return Err(ExportError::EmptyViewport {
            width: viewport.x,
            height: viewport.y,
        });
    }
    let scale = input.pixel_ratio.max(f32::EPSILON);
    let width = (viewport.x * scale).round() as u32;
    let height = (viewport.y * scale).round() as u32;
    let mut canvas = Pixmap::new(width, height).ok_or(ExportError::Allocation { width, height })?;

    if let Some(background) = input.background {
        let rect = background_rect(viewport, input.overscan);
        draw_bitmap(&mut canvas, background, rect, rect.center(), 0.0, scale);
    }

    for element in input.scene.elements() {
        match element.kind {
            ElementKind::Image => match input.bitmaps.get(&element.id) {
                Some(bitmap) => draw_bitmap(
                    &mut canvas,
                    bitmap,
                    element.rect(),
                    element.rect().center(),
                    element.rotation,
                    scale,
                ),
                None => debug!("Skipping image {} without a bitmap", element.id),
            },
            ElementKind::Text => draw_text(&mut canvas, element, input, scale),
        }
    }

    info!("Flattened {} elements into {}x{}", input.scene.len(), width, height);
    Ok(pixmap_to_image(&canvas))
}

fn draw_text(canvas: &mut Pixmap, element: &DesignElement, input: &FlattenInput<'_>, scale: f32) {
    let (layout, image) = input.fonts.rasterize(&TextRaster {
        content: &element.content,
        box_size: element.size(),
        font_size: element.font_size(),
        color: element.text_color(input.text_color),
        scale,
    });
    let dest = layout.bounds.translate(element.position().to_vec2());
    draw_bitmap(
        canvas,
        &image,
        dest,
        element.rect().center(),
        element.rotation,
        scale,
    );
}

/// Draw `image` stretched over `dest`, rotated by `degrees` about `pivot`
fn draw_bitmap(
    canvas: &mut Pixmap,
    image: &RgbaImage,
    dest: Rect,
    pivot: Pos2,
    degrees: f32,
    scale: f32,
) {
    let Some(source) = image_to_pixmap(image) else {
        return;
    };
    let stretch = Vec2::new(
        dest.width() / image.width() as f32,
        dest.height() / image.height() as f32,
    );
    let transform = Transform::from_scale(scale, scale)
        .pre_translate(pivot.x, pivot.y)
        .pre_rotate(degrees)
        .pre_translate(dest.min.x - pivot.x, dest.min.y - pivot.y)
        .pre_scale(stretch.x, stretch.y);
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..Default::default()
    };
    canvas.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Offer the PNG to the user under `file_name`
#[cfg(not(target_arch = "wasm32"))]
pub fn deliver_download(file_name: &str, png: &[u8]) -> Result<(), ExportError> {
    let Some(path) = rfd::FileDialog::new()
        .set_file_name(file_name)
        .add_filter("PNG image", &["png"])
        .save_file()
    else {
        info!("Download cancelled");
        return Ok(());
    };
    std::fs::write(&path, png).map_err(|e| ExportError::Delivery(e.to_string()))?;
    info!("Saved design to {}", path.display());
    Ok(())
}

/// Offer the PNG to the user under `file_name`
#[cfg(target_arch = "wasm32")]
pub fn deliver_download(file_name: &str, png: &[u8]) -> Result<(), ExportError> {
    use base64::Engine as _;
    use wasm_bindgen::JsCast as _;

    let href = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    );
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| ExportError::Delivery("no document".to_owned()))?;
    let anchor = document
        .create_element("a")
        .map_err(|e| ExportError::Delivery(format!("{:?}", e)))?
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(|_| ExportError::Delivery("anchor is not an HtmlElement".to_owned()))?;
    anchor
        .set_attribute("href", &href)
        .and_then(|_| anchor.set_attribute("download", file_name))
        .map_err(|e| ExportError::Delivery(format!("{:?}", e)))?;
    let body = document
        .body()
        .ok_or_else(|| ExportError::Delivery("no body".to_owned()))?;
    body.append_child(&anchor)
        .map_err(|e| ExportError::Delivery(format!("{:?}", e)))?;
    anchor.click();
    anchor.remove();
    info!("Started download of {}", file_name);
    Ok(())
}
