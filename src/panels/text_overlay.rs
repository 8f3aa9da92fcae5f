use egui::{Align, Color32, Event, FontId, Id, Key, Margin, Modifiers, Order, Rect, Stroke, TextEdit};

use crate::element::TEXT_PADDING;
use crate::scene::SceneComposer;

/// Remove unhandled presses of `key` whose modifiers pass `accept`, so the
/// text field never sees them. Returns true if any were removed.
fn take_key(ctx: &egui::Context, key: Key, accept: impl Fn(&Modifiers) -> bool) -> bool {
    ctx.input_mut(|input| {
        let before = input.events.len();
        input.events.retain(|event| {
            !matches!(
                event,
                Event::Key { key: pressed_key, pressed: true, modifiers, .. }
                    if *pressed_key == key && accept(modifiers)
            )
        });
        input.events.len() != before
    })
}

/// The inline editor: a text field laid over the text element being
/// edited, present exactly while the composer is in the editing state.
///
/// Enter commits, Shift+Enter inserts a newline, Escape and losing focus
/// commit as well.
pub fn text_overlay(ctx: &egui::Context, canvas: Rect, composer: &mut SceneComposer) {
    let Some((id, mut buffer, needs_focus)) = composer
        .edit_state()
        .session()
        .map(|session| (session.id, session.buffer.clone(), !session.focused))
    else {
        return;
    };
    let Some(element) = composer.scene().get(id).cloned() else {
        composer.edit_state_mut().abandon();
        return;
    };

    let edit_id = Id::new("inline_text_editor").with(id);
    let mut finished = false;
    if ctx.memory(|memory| memory.has_focus(edit_id)) {
        finished |= take_key(ctx, Key::Enter, |modifiers| !modifiers.shift);
        finished |= take_key(ctx, Key::Escape, |_| true);
    }

    let rect = element.frame().translate(canvas.min.to_vec2());
    let color = element.text_color(composer.config().text_color());
    let rows = buffer.split('\n').count();

    let response = egui::Area::new(Id::new("inline_text_overlay"))
        .order(Order::Foreground)
        .fixed_pos(rect.min)
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(Color32::from_white_alpha(230))
                .stroke(Stroke::new(1.0, Color32::BLACK))
                .show(ui, |ui| {
                    let edit = TextEdit::multiline(&mut buffer)
                        .id(edit_id)
                        .font(FontId::proportional(element.font_size()))
                        .text_color(color)
                        .horizontal_align(Align::Center)
                        .margin(Margin::same(TEXT_PADDING))
                        .frame(false)
                        .desired_rows(rows)
                        .desired_width(rect.width());
                    ui.add_sized(rect.size(), edit)
                })
                .inner
        })
        .inner;

    if let Some(session) = composer.edit_state_mut().session_mut() {
        session.buffer = buffer;
        if needs_focus {
            response.request_focus();
            session.focused = true;
        }
    }

    if finished || response.lost_focus() {
        composer.commit_text_edit();
    }
}
