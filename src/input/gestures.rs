use egui::{CursorIcon, Pos2, Rect, Vec2};
use log::debug;

use super::InputEvent;
use crate::command::SceneIntent;
use crate::element::{DesignElement, ElementId, ElementPatch, MIN_FONT_SIZE, TEXT_PADDING};
use crate::gizmo::{self, Anchor, GizmoHandle};
use crate::scene::Scene;
use crate::state::TextEditState;

/// A completed direct-manipulation gesture on one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Move by a scene-space offset
    Drag { dx: f32, dy: f32 },
    /// Drag a resize anchor by a scene-space offset
    Resize { anchor: Anchor, dx: f32, dy: f32 },
    /// Turn about the element center by degrees, clockwise
    Rotate { angle_delta: f32 },
    /// Double-click or double-tap
    DoubleActivate,
}

/// Translate a gesture on `element` into the intent the scene should apply.
///
/// Resizing below the minimum element size and double-activating an image
/// produce nothing.
pub fn on_gesture(element: &DesignElement, gesture: GestureEvent) -> Option<SceneIntent> {
    let id = element.id;
    match gesture {
        GestureEvent::Drag { dx, dy } => Some(SceneIntent::update(
            id,
            ElementPatch::position(element.position() + Vec2::new(dx, dy)),
        )),
        GestureEvent::Resize { anchor, dx, dy } => {
            let frame = gizmo::resize_rect(element.frame(), element.rotation, anchor, Vec2::new(dx, dy))?;
            let rect = if element.is_text() {
                // Vertical scale changes the font size, horizontal the wrap width
                let font_size = (frame.height() - 2.0 * TEXT_PADDING).max(MIN_FONT_SIZE);
                Rect::from_center_size(frame.center(), Vec2::new(frame.width(), font_size))
            } else {
                frame
            };
            Some(SceneIntent::update(id, ElementPatch::transform(rect, element.rotation)))
        }
        GestureEvent::Rotate { angle_delta } => Some(SceneIntent::update(
            id,
            ElementPatch {
                rotation: Some(gizmo::snap_rotation(element.rotation + angle_delta)),
                ..Default::default()
            },
        )),
        GestureEvent::DoubleActivate => element.is_text().then_some(SceneIntent::BeginTextEdit(id)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Interaction {
    Idle,
    Dragging {
        id: ElementId,
        start: Pos2,
        current: Pos2,
    },
    Transforming {
        id: ElementId,
        handle: GizmoHandle,
        start: Pos2,
        current: Pos2,
    },
}

/// Tracks one pointer interaction on the canvas and turns it into gestures
#[derive(Debug)]
pub struct GestureRecognizer {
    interaction: Interaction,
    /// The latest press landed on a resize or rotate handle
    press_on_handle: bool,
}

impl Default for GestureRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self {
            interaction: Interaction::Idle,
            press_on_handle: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.interaction == Interaction::Idle
    }

    pub fn is_transforming(&self) -> bool {
        matches!(self.interaction, Interaction::Transforming { .. })
    }

    /// Feed one event; returns the intents it completes.
    ///
    /// While `edit_state` is editing, the selection handles are hidden and
    /// cannot be grabbed, and presses on the edited text belong to the overlay.
    pub fn handle(
        &mut self,
        event: InputEvent,
        scene: &Scene,
        edit_state: &TextEditState,
    ) -> Vec<SceneIntent> {
        match event {
            InputEvent::PointerDown { pos } => self.pointer_down(pos, scene, edit_state),
            InputEvent::PointerMove { pos } => {
                self.set_current(pos);
                Vec::new()
            }
            InputEvent::PointerUp { pos } => {
                self.set_current(pos);
                let finished = std::mem::replace(&mut self.interaction, Interaction::Idle);
                Self::finish(finished, scene).into_iter().collect()
            }
            InputEvent::DoubleClick { pos } => {
                if self.press_on_handle || self.is_transforming() {
                    debug!("Double click on a handle ignored");
                    return Vec::new();
                }
                scene
                    .element_at(pos)
                    .and_then(|element| on_gesture(element, GestureEvent::DoubleActivate))
                    .into_iter()
                    .collect()
            }
        }
    }

    fn pointer_down(&mut self, pos: Pos2, scene: &Scene, edit_state: &TextEditState) -> Vec<SceneIntent> {
        self.press_on_handle = false;

        if let Some(selected) = scene.selected_element().filter(|_| !edit_state.is_editing()) {
            match gizmo::hit_handle(selected.frame(), selected.rotation, pos) {
                Some(GizmoHandle::Delete) => {
                    self.interaction = Interaction::Idle;
                    return vec![SceneIntent::Delete(selected.id)];
                }
                Some(handle) => {
                    self.press_on_handle = true;
                    self.interaction = Interaction::Transforming {
                        id: selected.id,
                        handle,
                        start: pos,
                        current: pos,
                    };
                    return Vec::new();
                }
                None => {}
            }
        }

        match scene.element_at(pos) {
            Some(element) if edit_state.is_editing_element(element.id) => {
                // The overlay owns presses on the text it covers
                self.interaction = Interaction::Idle;
                Vec::new()
            }
            Some(element) => {
                self.interaction = Interaction::Dragging {
                    id: element.id,
                    start: pos,
                    current: pos,
                };
                vec![SceneIntent::Select(element.id)]
            }
            None => {
                self.interaction = Interaction::Idle;
                vec![SceneIntent::Deselect]
            }
        }
    }

    fn set_current(&mut self, pos: Pos2) {
        match &mut self.interaction {
            Interaction::Dragging { current, .. } | Interaction::Transforming { current, .. } => {
                *current = pos;
            }
            Interaction::Idle => {}
        }
    }

    /// The gesture an interaction amounts to so far
    fn gesture(interaction: Interaction, scene: &Scene) -> Option<(ElementId, GestureEvent)> {
        match interaction {
            Interaction::Idle => None,
            Interaction::Dragging { id, start, current } => {
                let delta = current - start;
                (delta != Vec2::ZERO).then_some((
                    id,
                    GestureEvent::Drag {
                        dx: delta.x,
                        dy: delta.y,
                    },
                ))
            }
            Interaction::Transforming {
                id,
                handle,
                start,
                current,
            } => {
                let delta = current - start;
                match handle {
                    GizmoHandle::Resize(anchor) => Some((
                        id,
                        GestureEvent::Resize {
                            anchor,
                            dx: delta.x,
                            dy: delta.y,
                        },
                    )),
                    GizmoHandle::Rotate => {
                        let center = scene.get(id)?.frame().center();
                        let angle_delta =
                            gizmo::pointer_angle(center, current) - gizmo::pointer_angle(center, start);
                        Some((id, GestureEvent::Rotate { angle_delta }))
                    }
                    GizmoHandle::Delete => None,
                }
            }
        }
    }

    fn finish(interaction: Interaction, scene: &Scene) -> Option<SceneIntent> {
        let (id, gesture) = Self::gesture(interaction, scene)?;
        debug!("Gesture on {}: {:?}", id, gesture);
        on_gesture(scene.get(id)?, gesture)
    }

    /// The element being manipulated, as it would look if released now
    pub fn preview(&self, scene: &Scene) -> Option<DesignElement> {
        let (id, gesture) = Self::gesture(self.interaction, scene)?;
        let element = scene.get(id)?;
        let mut preview = element.clone();
        if let Some(SceneIntent::Update { patch, .. }) = on_gesture(element, gesture) {
            preview.apply(&patch);
        }
        Some(preview)
    }
}

/// Cursor to show over `pos`. Handles only count while they are drawn.
pub fn hover_cursor(scene: &Scene, edit_state: &TextEditState, pos: Pos2) -> Option<CursorIcon> {
    if let Some(selected) = scene.selected_element().filter(|_| !edit_state.is_editing()) {
        match gizmo::hit_handle(selected.frame(), selected.rotation, pos) {
            Some(GizmoHandle::Resize(anchor)) => return Some(anchor.cursor_icon()),
            Some(GizmoHandle::Rotate) => return Some(CursorIcon::Alias),
            Some(GizmoHandle::Delete) => return Some(CursorIcon::PointingHand),
            None => {}
        }
    }
    scene.element_at(pos).map(|_| CursorIcon::Grab)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;
    use egui::Rect;

    #[test]
    fn test_drag_moves_position_only() {
        let element = factory::create_image("a.png");
        let intent = on_gesture(&element, GestureEvent::Drag { dx: 15.0, dy: -5.0 }).unwrap();
        assert_eq!(
            intent,
            SceneIntent::update(element.id, ElementPatch::position(Pos2::new(115.0, 95.0)))
        );
    }

    #[test]
    fn test_tiny_resize_produces_nothing() {
        let element = factory::create_image("a.png");
        let gesture = GestureEvent::Resize {
            anchor: Anchor::BottomRight,
            dx: -190.0,
            dy: -190.0,
        };
        assert!(on_gesture(&element, gesture).is_none());
    }

    #[test]
    fn test_text_resize_changes_font_size() {
        let element = factory::create_text(
            "Hi",
            Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(100.0, 50.0)),
        );
        let gesture = GestureEvent::Resize {
            anchor: Anchor::BottomCenter,
            dx: 0.0,
            dy: 30.0,
        };
        let Some(SceneIntent::Update { patch, .. }) = on_gesture(&element, gesture) else {
            panic!("expected an update");
        };
        assert_eq!(patch.height, Some(80.0));
        assert_eq!(patch.width, Some(100.0));
    }

    #[test]
    fn test_text_shrinks_to_small_font_sizes() {
        let element = factory::create_text(
            "Hi",
            Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(100.0, 50.0)),
        );
        // The 70 unit tall frame shrinks to 32, leaving a 12 unit font
        let gesture = GestureEvent::Resize {
            anchor: Anchor::BottomCenter,
            dx: 0.0,
            dy: -38.0,
        };
        let Some(SceneIntent::Update { patch, .. }) = on_gesture(&element, gesture) else {
            panic!("expected an update");
        };
        assert!((patch.height.unwrap() - 12.0).abs() < 0.01);
        assert!(patch.y.unwrap().abs() < 0.01);

        let gesture = GestureEvent::Resize {
            anchor: Anchor::BottomCenter,
            dx: 0.0,
            dy: -50.0,
        };
        let Some(SceneIntent::Update { patch, .. }) = on_gesture(&element, gesture) else {
            panic!("expected an update");
        };
        assert_eq!(patch.height, Some(MIN_FONT_SIZE));
    }

    #[test]
    fn test_handles_are_inert_while_editing() {
        let mut scene = Scene::new();
        let element = factory::create_text(
            "Hi",
            Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::new(100.0, 50.0)),
        );
        let id = element.id;
        let delete = gizmo::delete_button_rect(element.frame(), 0.0).center();
        let mut editing = TextEditState::default();
        editing.begin(&element).unwrap();
        scene.add(element);
        scene.select(Some(id));

        let mut recognizer = GestureRecognizer::new();
        let intents = recognizer.handle(InputEvent::PointerDown { pos: delete }, &scene, &editing);
        assert!(!intents.contains(&SceneIntent::Delete(id)));
        assert!(!recognizer.is_transforming());
        assert_eq!(hover_cursor(&scene, &editing, delete), None);
    }

    #[test]
    fn test_rotation_snaps() {
        let element = factory::create_image("a.png");
        let Some(SceneIntent::Update { patch, .. }) =
            on_gesture(&element, GestureEvent::Rotate { angle_delta: 88.0 })
        else {
            panic!("expected an update");
        };
        assert_eq!(patch.rotation, Some(90.0));
    }

    #[test]
    fn test_double_activate_only_edits_text() {
        let image = factory::create_image("a.png");
        assert!(on_gesture(&image, GestureEvent::DoubleActivate).is_none());
        let text = factory::create_text("Hi", Rect::from_min_size(Pos2::ZERO, Vec2::splat(50.0)));
        assert_eq!(
            on_gesture(&text, GestureEvent::DoubleActivate),
            Some(SceneIntent::BeginTextEdit(text.id))
        );
    }

    #[test]
    fn test_preview_follows_pointer() {
        let mut scene = Scene::new();
        let element = factory::create_image("a.png");
        let id = element.id;
        scene.add(element);

        let mut recognizer = GestureRecognizer::new();
        let display = TextEditState::default();
        recognizer.handle(InputEvent::PointerDown { pos: Pos2::new(150.0, 150.0) }, &scene, &display);
        recognizer.handle(InputEvent::PointerMove { pos: Pos2::new(170.0, 160.0) }, &scene, &display);

        let preview = recognizer.preview(&scene).unwrap();
        assert_eq!(preview.id, id);
        assert_eq!(preview.position(), Pos2::new(120.0, 110.0));
        // The model itself is untouched until release
        assert_eq!(scene.get(id).unwrap().position(), Pos2::new(100.0, 100.0));
    }
}
