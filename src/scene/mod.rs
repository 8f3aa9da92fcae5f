//! The element collection, the selection and the viewport.
//!
//! [`Scene`] is plain data guarded by a handful of invariants:
//! - element ids are unique,
//! - `selected` is either `None` or the id of an element in the collection,
//! - width and height never drop below [`MIN_ELEMENT_SIZE`](crate::element::MIN_ELEMENT_SIZE) through an update;
//!   for text the height is the font size, floored at
//!   [`MIN_FONT_SIZE`](crate::element::MIN_FONT_SIZE) and
//!   checked together with the vertical padding.
//!
//! All mutation from the outside goes through [`composer::SceneComposer`].

use egui::{Pos2, Rect, Vec2};
use log::{debug, warn};

use crate::element::{DesignElement, ElementId, ElementPatch};

pub mod composer;

pub use composer::{LoadFailure, SceneComposer};

#[derive(Debug, Default, Clone)]
pub struct Scene {
    /// Paint order: later elements are drawn on top
    elements: Vec<DesignElement>,
    selected: Option<ElementId>,
    viewport: Vec2,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, id: ElementId) -> Option<&DesignElement> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    /// Append an element on top. Returns false if the id is already taken.
    pub fn add(&mut self, element: DesignElement) -> bool {
        if self.contains(element.id) {
            warn!("Refusing to add duplicate element {}", element.id);
            return false;
        }
        self.elements.push(element);
        true
    }

    /// Merge `patch` into the element with `id`.
    ///
    /// A patch proposing a width or height below the minimum keeps the
    /// previous size; the remaining attributes still apply. Returns false if
    /// the element does not exist.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        let Some(element) = self.elements.iter_mut().find(|element| element.id == id) else {
            return false;
        };

        let width = patch.width.unwrap_or(element.width);
        let height = patch.height.unwrap_or(element.height);
        if patch.touches_size() {
            if let Err(reason) = element.validate_size(width, height) {
                debug!("Resize of {} rejected: {}", id, reason);
                let mut clamped = patch.clone();
                clamped.width = None;
                clamped.height = None;
                element.apply(&clamped);
                return true;
            }
        }

        element.apply(patch);
        true
    }

    /// Remove the element with `id`, clearing the selection if it pointed at
    /// it. Removing an absent id does nothing.
    pub fn remove(&mut self, id: ElementId) -> Option<DesignElement> {
        let index = self.elements.iter().position(|element| element.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.elements.remove(index))
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn selected_element(&self) -> Option<&DesignElement> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Select an element, or clear the selection with `None`. Selecting an id
    /// that is not in the scene clears the selection.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id.filter(|id| self.contains(*id));
    }

    /// Topmost element under `pos`
    pub fn element_at(&self, pos: Pos2) -> Option<&DesignElement> {
        self.elements.iter().rev().find(|element| element.hit_test(pos))
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, size: Vec2) {
        self.viewport = size.max(Vec2::ZERO);
    }
}

/// Where the background template is drawn: scaled by `overscan` in both
/// axes and centered on the viewport, regardless of its aspect ratio
pub fn background_rect(viewport: Vec2, overscan: f32) -> Rect {
    let size = viewport * overscan;
    Rect::from_min_size((-(size - viewport) / 2.0).to_pos2(), size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;

    #[test]
    fn test_update_merges_only_supplied_fields() {
        let mut scene = Scene::new();
        let element = factory::create_image("data:image/png;base64,");
        let id = element.id;
        scene.add(element);

        scene.update(id, &ElementPatch::position(Pos2::new(5.0, 6.0)));
        let element = scene.get(id).unwrap();
        assert_eq!(element.position(), Pos2::new(5.0, 6.0));
        assert_eq!(element.size(), Vec2::new(200.0, 200.0));
        assert_eq!(element.content, "data:image/png;base64,");
    }

    #[test]
    fn test_undersized_patch_keeps_size_but_moves() {
        let mut scene = Scene::new();
        let element = factory::create_image("a.png");
        let id = element.id;
        scene.add(element);

        let mut patch = ElementPatch::size(10.0, 300.0);
        patch.x = Some(42.0);
        scene.update(id, &patch);

        let element = scene.get(id).unwrap();
        assert_eq!(element.size(), Vec2::new(200.0, 200.0));
        assert_eq!(element.x, 42.0);
    }

    #[test]
    fn test_small_font_sizes_are_reachable() {
        let mut scene = Scene::new();
        let element = factory::create_text(
            "Hi",
            Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 50.0)),
        );
        let id = element.id;
        scene.add(element);

        scene.update(id, &ElementPatch::size(100.0, 12.0));
        assert_eq!(scene.get(id).unwrap().font_size(), 12.0);

        scene.update(id, &ElementPatch::size(100.0, 4.0));
        assert_eq!(scene.get(id).unwrap().font_size(), 12.0);
    }

    #[test]
    fn test_duplicate_ids_are_refused() {
        let mut scene = Scene::new();
        let element = factory::create_image("a.png");
        assert!(scene.add(element.clone()));
        assert!(!scene.add(element));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_select_unknown_id_clears_selection() {
        let mut scene = Scene::new();
        let element = factory::create_image("a.png");
        let id = element.id;
        scene.add(element);
        scene.select(Some(id));
        assert_eq!(scene.selected(), Some(id));

        scene.select(Some(ElementId::new()));
        assert_eq!(scene.selected(), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut scene = Scene::new();
        let element = factory::create_image("a.png");
        let id = element.id;
        scene.add(element);
        assert!(scene.remove(id).is_some());
        assert!(scene.remove(id).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_topmost_element_wins_hit_test() {
        let mut scene = Scene::new();
        let below = factory::create_image("below.png");
        let above = factory::create_image("above.png");
        let above_id = above.id;
        scene.add(below);
        scene.add(above);
        let hit = scene.element_at(Pos2::new(150.0, 150.0)).unwrap();
        assert_eq!(hit.id, above_id);
        assert!(scene.element_at(Pos2::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_background_overscan_is_centered() {
        let rect = background_rect(Vec2::new(700.0, 900.0), 1.3);
        assert!((rect.width() - 910.0).abs() < 0.01);
        assert!((rect.height() - 1170.0).abs() < 0.01);
        assert!((rect.center() - Pos2::new(350.0, 450.0)).length() < 0.01);
    }
}
