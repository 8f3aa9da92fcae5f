use egui::{Align2, Color32, FontId, Mesh, Painter, Pos2, Rect, Shape, Stroke, TextureId, Vec2, pos2};
use log::warn;

use crate::element::{DesignElement, ElementKind, rotated_corners, rotation};
use crate::gizmo::{self, HANDLE_SIZE};
use crate::scene::composer::BackgroundState;
use crate::scene::{SceneComposer, background_rect};
use crate::text::TextRaster;
use crate::texture_manager::{
    TextureGenerationError, TextureKey, TextureManager, color_image, texture_version,
};

const SELECTION_COLOR: Color32 = Color32::from_rgb(0, 161, 255);
const DELETE_GLYPH: &str = "×";
const DELETE_FONT_SIZE: f32 = 36.0;

/// Draws the scene onto the canvas: background, elements in paint order,
/// then the selection decorations
#[derive(Debug, Default)]
pub struct Renderer {
    textures: TextureManager,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the composer's scene with the scene origin at `canvas.min`.
    ///
    /// `preview` replaces the model element with the same id while a gesture
    /// is in progress.
    pub fn render(
        &mut self,
        painter: &Painter,
        canvas: Rect,
        composer: &SceneComposer,
        preview: Option<&DesignElement>,
    ) {
        self.textures.begin_frame();
        let painter = painter.with_clip_rect(canvas.intersect(painter.clip_rect()));
        let offset = canvas.min.to_vec2();
        let scene = composer.scene();

        if let BackgroundState::Ready(bitmap) = composer.background() {
            let version = texture_version(&composer.config().template);
            let rect = background_rect(scene.viewport(), composer.config().background_overscan);
            match self.textures.get_or_create_texture(
                TextureKey::Background,
                version,
                || color_image(bitmap),
                painter.ctx(),
            ) {
                Ok(texture) => draw_textured(&painter, texture, rect.translate(offset), None),
                Err(err) => warn!("Background texture failed: {}", err),
            }
        }

        for element in scene.elements() {
            if composer.edit_state().is_editing_element(element.id) {
                continue;
            }
            let element = preview.filter(|p| p.id == element.id).unwrap_or(element);
            self.render_element(&painter, offset, composer, element);
        }
        self.textures.retain_elements(|id| scene.contains(id));

        if !composer.edit_state().is_editing() {
            if let Some(selected) = scene.selected_element() {
                let selected = preview.filter(|p| p.id == selected.id).unwrap_or(selected);
                draw_decorations(&painter, offset, selected);
            }
        }
    }

    fn render_element(
        &mut self,
        painter: &Painter,
        offset: Vec2,
        composer: &SceneComposer,
        element: &DesignElement,
    ) {
        let key = TextureKey::Element(element.id);
        let pivot = element.rect().center() + offset;
        let result = match element.kind {
            ElementKind::Image => {
                let Some(bitmap) = composer.bitmap(element.id) else {
                    // Not loaded yet, or failed
                    return;
                };
                self.textures
                    .get_or_create_texture(
                        key,
                        texture_version(&element.content),
                        || color_image(bitmap),
                        painter.ctx(),
                    )
                    .map(|texture| (texture, element.rect()))
            }
            ElementKind::Text => {
                let fonts = composer.fonts();
                let color = element.text_color(composer.config().text_color());
                let scale = painter.ctx().pixels_per_point();
                let bounds = fonts
                    .layout(&element.content, element.size(), element.font_size())
                    .bounds;
                let version = texture_version((
                    &element.content,
                    element.width.to_bits(),
                    element.height.to_bits(),
                    color,
                    scale.to_bits(),
                ));
                self.textures
                    .get_or_create_texture(
                        key,
                        version,
                        || {
                            let (_, image) = fonts.rasterize(&TextRaster {
                                content: &element.content,
                                box_size: element.size(),
                                font_size: element.font_size(),
                                color,
                                scale,
                            });
                            color_image(&image)
                        },
                        painter.ctx(),
                    )
                    .map(|texture| (texture, bounds.translate(element.position().to_vec2())))
            }
        };

        match result {
            Ok((texture, rect)) => draw_textured(
                painter,
                texture,
                rect.translate(offset),
                Some((pivot, element.rotation)),
            ),
            Err(TextureGenerationError::NotReady) => {}
            Err(err) => warn!("Texture for {} failed: {}", element.id, err),
        }
    }
}

/// Draw a texture stretched over `rect`, optionally rotated about a pivot
fn draw_textured(painter: &Painter, texture: TextureId, rect: Rect, rotate: Option<(Pos2, f32)>) {
    let mut mesh = Mesh::with_texture(texture);
    let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
    mesh.add_rect_with_uv(rect, uv, Color32::WHITE);
    if let Some((pivot, degrees)) = rotate {
        if degrees != 0.0 {
            mesh.rotate(rotation(degrees), pivot);
        }
    }
    painter.add(Shape::mesh(mesh));
}

/// Outline, resize anchors, rotation handle and delete control
fn draw_decorations(painter: &Painter, offset: Vec2, element: &DesignElement) {
    let rect = element.frame();
    let degrees = element.rotation;
    let stroke = Stroke::new(1.0, SELECTION_COLOR);

    let corners = rotated_corners(rect, degrees).map(|corner| corner + offset);
    painter.add(Shape::closed_line(corners.to_vec(), stroke));

    let top_center = rect.center() + rotation(degrees) * Vec2::new(0.0, -rect.height() / 2.0) + offset;
    let handle = gizmo::rotation_handle_position(rect, degrees) + offset;
    painter.line_segment([top_center, handle], stroke);
    painter.circle(handle, HANDLE_SIZE / 2.0, Color32::WHITE, stroke);

    for (_, pos) in gizmo::anchor_positions(rect, degrees) {
        let square = Rect::from_center_size(pos + offset, Vec2::splat(HANDLE_SIZE));
        painter.rect_filled(square, 0.0, Color32::WHITE);
        painter.rect_stroke(square, 0.0, stroke);
    }

    let button = gizmo::delete_button_rect(rect, degrees).translate(offset);
    let font = FontId::proportional(DELETE_FONT_SIZE);
    for shadow in [Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0)] {
        painter.text(
            button.center() + shadow,
            Align2::CENTER_CENTER,
            DELETE_GLYPH,
            font.clone(),
            Color32::WHITE,
        );
    }
    painter.text(button.center(), Align2::CENTER_CENTER, DELETE_GLYPH, font, Color32::BLACK);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::image_loader::ImageLoader;
    use crate::text::TextMetrics;
    use std::sync::Arc;

    fn composer() -> SceneComposer {
        let fonts = Arc::new(TextMetrics::from_egui_defaults().unwrap());
        let mut composer = SceneComposer::new(EditorConfig::default(), ImageLoader::immediate(), fonts);
        composer.resize_viewport(Vec2::new(350.0, 450.0));
        composer.poll();
        composer
    }

    #[test]
    fn test_render_uploads_textures() {
        let ctx = egui::Context::default();
        let mut composer = composer();
        composer.add_text_element(None);

        let mut renderer = Renderer::new();
        let canvas = Rect::from_min_size(pos2(0.0, 0.0), Vec2::new(350.0, 450.0));
        let _ = ctx.run(Default::default(), |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            renderer.render(&painter, canvas, &composer, None);
        });

        // Background plus the text element
        assert_eq!(renderer.textures.cache_size(), 2);
    }

    #[test]
    fn test_edited_text_is_not_drawn() {
        let ctx = egui::Context::default();
        let mut composer = composer();
        let id = composer.add_text_element(None);
        composer.begin_text_edit(id).unwrap();

        let mut renderer = Renderer::new();
        let canvas = Rect::from_min_size(pos2(0.0, 0.0), Vec2::new(350.0, 450.0));
        let _ = ctx.run(Default::default(), |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            renderer.render(&painter, canvas, &composer, None);
        });

        assert_eq!(renderer.textures.cache_size(), 1);
    }
}
