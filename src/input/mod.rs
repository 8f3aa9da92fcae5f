use egui::{Pos2, Rect, Response};

mod gestures;

pub use gestures::{GestureEvent, GestureRecognizer, hover_cursor, on_gesture};

/// Pointer input on the canvas, in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Pos2 },
    PointerMove { pos: Pos2 },
    PointerUp { pos: Pos2 },
    DoubleClick { pos: Pos2 },
}

/// Turns raw egui pointer state into canvas [`InputEvent`]s
#[derive(Debug, Default)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    /// A press started on the canvas and has not been released yet
    pressed: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect this frame's events. `canvas` is the screen rect the scene
    /// origin maps to and `response` the canvas' own interaction response,
    /// which is not hovered while a popup or the text overlay covers it.
    pub fn process_input(&mut self, response: &Response, canvas: Rect) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let to_scene = |pos: Pos2| (pos - canvas.min).to_pos2();

        response.ctx.input(|input| {
            let Some(pos) = input.pointer.interact_pos() else {
                return;
            };
            let scene_pos = to_scene(pos);

            if input.pointer.primary_pressed() && response.hovered() {
                self.pressed = true;
                events.push(InputEvent::PointerDown { pos: scene_pos });
            }

            if self.pressed && Some(pos) != self.last_pointer_pos {
                events.push(InputEvent::PointerMove { pos: scene_pos });
            }

            if input.pointer.primary_released() && self.pressed {
                self.pressed = false;
                events.push(InputEvent::PointerUp { pos: scene_pos });
                if input
                    .pointer
                    .button_double_clicked(egui::PointerButton::Primary)
                    && response.hovered()
                {
                    events.push(InputEvent::DoubleClick { pos: scene_pos });
                }
            }

            self.last_pointer_pos = Some(pos);
        });

        events
    }
}
