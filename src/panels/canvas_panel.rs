use egui::{Align2, Color32, FontId, Rect, Sense, Vec2};

use super::text_overlay;
use crate::DesignerApp;
use crate::config::CANVAS_ASPECT_RATIO;
use crate::input::hover_cursor;
use crate::scene::composer::BackgroundState;

const STATUS_COLOR: Color32 = Color32::from_rgb(0x0B, 0x39, 0x54);

/// Largest rect of the canvas aspect ratio centered in `available`
pub fn fit_canvas(available: Rect) -> Rect {
    let mut size = Vec2::new(available.width(), available.width() / CANVAS_ASPECT_RATIO);
    if size.y > available.height() {
        size = Vec2::new(available.height() * CANVAS_ASPECT_RATIO, available.height());
    }
    Rect::from_center_size(available.center(), size.max(Vec2::ZERO))
}

pub fn canvas_panel(app: &mut DesignerApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::central_panel(&ctx.style()).fill(Color32::from_gray(245)))
        .show(ctx, |ui| {
            let canvas = fit_canvas(ui.available_rect_before_wrap());
            let response = ui.allocate_rect(canvas, Sense::click_and_drag());
            let painter = ui.painter_at(canvas);
            app.composer.resize_viewport(canvas.size());

            match app.composer.background() {
                BackgroundState::Loading => {
                    painter.text(
                        canvas.center(),
                        Align2::CENTER_CENTER,
                        "Loading t-shirt template...",
                        FontId::proportional(18.0),
                        STATUS_COLOR,
                    );
                    return;
                }
                BackgroundState::Failed(message) => {
                    painter.text(
                        canvas.center(),
                        Align2::CENTER_BOTTOM,
                        "Error loading t-shirt template. Please refresh the page.",
                        FontId::proportional(18.0),
                        Color32::DARK_RED,
                    );
                    painter.text(
                        canvas.center() + Vec2::new(0.0, 8.0),
                        Align2::CENTER_TOP,
                        message,
                        FontId::proportional(13.0),
                        Color32::GRAY,
                    );
                    return;
                }
                BackgroundState::Ready(_) => {}
            }

            for event in app.input.process_input(&response, canvas) {
                let composer = &app.composer;
                let intents = app.gestures.handle(event, composer.scene(), composer.edit_state());
                for intent in intents {
                    app.composer.apply_intent(intent);
                }
            }

            if let Some(pos) = response.hover_pos() {
                let scene_pos = (pos - canvas.min).to_pos2();
                let composer = &app.composer;
                if let Some(icon) = hover_cursor(composer.scene(), composer.edit_state(), scene_pos) {
                    ctx.set_cursor_icon(icon);
                }
            }

            let preview = app.gestures.preview(app.composer.scene());
            app.renderer
                .render(&painter, canvas, &app.composer, preview.as_ref());

            text_overlay(ctx, canvas, &mut app.composer);
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;

    #[test]
    fn test_canvas_fits_width_first() {
        let rect = fit_canvas(Rect::from_min_size(Pos2::ZERO, Vec2::new(700.0, 2000.0)));
        assert!((rect.size() - Vec2::new(700.0, 900.0)).length() < 0.01);
    }

    #[test]
    fn test_canvas_fits_height_when_short() {
        let rect = fit_canvas(Rect::from_min_size(Pos2::ZERO, Vec2::new(2000.0, 900.0)));
        assert!((rect.size() - Vec2::new(700.0, 900.0)).length() < 0.01);
        assert!((rect.center() - Pos2::new(1000.0, 450.0)).length() < 0.01);
    }
}
