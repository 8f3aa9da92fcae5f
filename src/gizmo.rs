use egui::{Pos2, Rect, Vec2};

use crate::element::{MIN_ELEMENT_SIZE, rotated_bounds, rotation};

pub const HANDLE_SIZE: f32 = 10.0;
/// Distance of the rotation handle above the top edge
pub const ROTATION_HANDLE_OFFSET: f32 = 30.0;
pub const DELETE_BUTTON_SIZE: f32 = 28.0;

const ROTATION_SNAP_STEP: f32 = 45.0;
const ROTATION_SNAP_TOLERANCE: f32 = 5.0;

/// Resize anchors, at the corners and edge midpoints of the selection box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleRight,
    BottomRight,
    BottomCenter,
    BottomLeft,
    MiddleLeft,
}

impl Anchor {
    pub const ALL: [Anchor; 8] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MiddleRight,
        Anchor::BottomRight,
        Anchor::BottomCenter,
        Anchor::BottomLeft,
        Anchor::MiddleLeft,
    ];

    /// Position of the anchor relative to the box, in -1..=1 on each axis
    fn unit_offset(&self) -> Vec2 {
        match self {
            Anchor::TopLeft => Vec2::new(-1.0, -1.0),
            Anchor::TopCenter => Vec2::new(0.0, -1.0),
            Anchor::TopRight => Vec2::new(1.0, -1.0),
            Anchor::MiddleRight => Vec2::new(1.0, 0.0),
            Anchor::BottomRight => Vec2::new(1.0, 1.0),
            Anchor::BottomCenter => Vec2::new(0.0, 1.0),
            Anchor::BottomLeft => Vec2::new(-1.0, 1.0),
            Anchor::MiddleLeft => Vec2::new(-1.0, 0.0),
        }
    }

    pub fn cursor_icon(&self) -> egui::CursorIcon {
        match self {
            Anchor::TopLeft | Anchor::BottomRight => egui::CursorIcon::ResizeNwSe,
            Anchor::TopRight | Anchor::BottomLeft => egui::CursorIcon::ResizeNeSw,
            Anchor::TopCenter | Anchor::BottomCenter => egui::CursorIcon::ResizeVertical,
            Anchor::MiddleLeft | Anchor::MiddleRight => egui::CursorIcon::ResizeHorizontal,
        }
    }
}

/// A selection decoration the pointer can grab
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GizmoHandle {
    Resize(Anchor),
    Rotate,
    Delete,
}

/// Scene positions of the resize anchors of a rotated box
pub fn anchor_positions(rect: Rect, degrees: f32) -> [(Anchor, Pos2); 8] {
    let rot = rotation(degrees);
    let center = rect.center();
    let half = rect.size() / 2.0;
    Anchor::ALL.map(|anchor| {
        let offset = anchor.unit_offset() * half;
        (anchor, center + rot * offset)
    })
}

/// Scene position of the rotation handle, above the top edge
pub fn rotation_handle_position(rect: Rect, degrees: f32) -> Pos2 {
    let offset = Vec2::new(0.0, -(rect.height() / 2.0 + ROTATION_HANDLE_OFFSET));
    rect.center() + rotation(degrees) * offset
}

/// The delete control sits at the top-right corner of the axis-aligned
/// bounds of the selection
pub fn delete_button_rect(rect: Rect, degrees: f32) -> Rect {
    let bounds = rotated_bounds(rect, degrees);
    Rect::from_min_size(bounds.right_top(), Vec2::splat(DELETE_BUTTON_SIZE))
}

/// Which handle of a selected box is under `pos`, if any
pub fn hit_handle(rect: Rect, degrees: f32, pos: Pos2) -> Option<GizmoHandle> {
    if delete_button_rect(rect, degrees).contains(pos) {
        return Some(GizmoHandle::Delete);
    }
    let grab = Vec2::splat(HANDLE_SIZE * 1.5);
    if Rect::from_center_size(rotation_handle_position(rect, degrees), grab).contains(pos) {
        return Some(GizmoHandle::Rotate);
    }
    anchor_positions(rect, degrees)
        .into_iter()
        .find(|(_, anchor_pos)| Rect::from_center_size(*anchor_pos, grab).contains(pos))
        .map(|(anchor, _)| GizmoHandle::Resize(anchor))
}

/// Resize a rotated box by dragging `anchor` by `delta` (scene space).
///
/// The opposite side stays fixed. Returns `None` when the proposed box would
/// be smaller than the minimum element size, in which case the caller keeps
/// the previous box.
pub fn resize_rect(rect: Rect, degrees: f32, anchor: Anchor, delta: Vec2) -> Option<Rect> {
    let rot = rotation(degrees);
    let local = rot.inverse() * delta;
    let unit = anchor.unit_offset();

    let half = rect.size() / 2.0;
    let (mut left, mut right) = (-half.x, half.x);
    let (mut top, mut bottom) = (-half.y, half.y);
    if unit.x < 0.0 {
        left += local.x;
    } else if unit.x > 0.0 {
        right += local.x;
    }
    if unit.y < 0.0 {
        top += local.y;
    } else if unit.y > 0.0 {
        bottom += local.y;
    }

    let size = Vec2::new(right - left, bottom - top);
    if size.x < MIN_ELEMENT_SIZE || size.y < MIN_ELEMENT_SIZE {
        return None;
    }
    let local_center = Vec2::new((left + right) / 2.0, (top + bottom) / 2.0);
    Some(Rect::from_center_size(rect.center() + rot * local_center, size))
}

/// Pointer angle around `center` in degrees, zero pointing straight up
pub fn pointer_angle(center: Pos2, pos: Pos2) -> f32 {
    let v = pos - center;
    v.x.atan2(-v.y).to_degrees()
}

/// Normalize to `0..360` and snap to the nearest multiple of 45° when within
/// the snap tolerance
pub fn snap_rotation(degrees: f32) -> f32 {
    let normalized = degrees.rem_euclid(360.0);
    let nearest = (normalized / ROTATION_SNAP_STEP).round() * ROTATION_SNAP_STEP;
    if (normalized - nearest).abs() < ROTATION_SNAP_TOLERANCE {
        nearest.rem_euclid(360.0)
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Rect {
        Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::new(200.0, 100.0))
    }

    #[test]
    fn test_bottom_right_resize_keeps_top_left() {
        let rect = resize_rect(sample(), 0.0, Anchor::BottomRight, Vec2::new(50.0, 20.0)).unwrap();
        assert!((rect.min - Pos2::new(100.0, 100.0)).length() < 0.01);
        assert!((rect.size() - Vec2::new(250.0, 120.0)).length() < 0.01);
    }

    #[test]
    fn test_edge_anchor_moves_one_axis() {
        let rect = resize_rect(sample(), 0.0, Anchor::MiddleLeft, Vec2::new(-30.0, 999.0)).unwrap();
        assert!((rect.min.x - 70.0).abs() < 0.01);
        assert!((rect.height() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_undersized_resize_is_rejected() {
        assert!(resize_rect(sample(), 0.0, Anchor::BottomRight, Vec2::new(-190.0, 0.0)).is_none());
        assert!(resize_rect(sample(), 0.0, Anchor::TopCenter, Vec2::new(0.0, 95.0)).is_none());
    }

    #[test]
    fn test_rotated_resize_keeps_opposite_corner_fixed() {
        let rect = sample();
        let degrees = 90.0;
        let fixed_before = anchor_positions(rect, degrees)[0].1;
        // In a quarter-turned box the local +x axis points down the screen
        let resized = resize_rect(rect, degrees, Anchor::BottomRight, Vec2::new(0.0, 40.0)).unwrap();
        let fixed_after = anchor_positions(resized, degrees)[0].1;
        assert!((fixed_before - fixed_after).length() < 0.01);
        assert!((resized.width() - 240.0).abs() < 0.01);
    }

    #[test]
    fn test_rotation_snapping() {
        assert_eq!(snap_rotation(43.0), 45.0);
        assert_eq!(snap_rotation(30.0), 30.0);
        assert_eq!(snap_rotation(-2.0), 0.0);
        assert_eq!(snap_rotation(358.0), 0.0);
        assert_eq!(snap_rotation(181.0), 180.0);
    }

    #[test]
    fn test_pointer_angle_is_clockwise_from_up() {
        let center = Pos2::new(0.0, 0.0);
        assert!((pointer_angle(center, Pos2::new(0.0, -10.0)) - 0.0).abs() < 0.01);
        assert!((pointer_angle(center, Pos2::new(10.0, 0.0)) - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_delete_button_hit_before_anchors() {
        let rect = sample();
        let pos = rect.right_top() + Vec2::new(5.0, 5.0);
        assert_eq!(hit_handle(rect, 0.0, pos), Some(GizmoHandle::Delete));
        assert_eq!(
            hit_handle(rect, 0.0, rect.left_bottom()),
            Some(GizmoHandle::Resize(Anchor::BottomLeft))
        );
        assert_eq!(hit_handle(rect, 0.0, rect.center()), None);
    }
}
