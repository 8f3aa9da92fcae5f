use egui::{Pos2, Rect, Vec2, emath::Rot2};

// Size limits enforced on every resize
pub const MIN_ELEMENT_SIZE: f32 = 20.0;
pub const MIN_FONT_SIZE: f32 = 5.0;

// Placement of freshly uploaded images
pub const DEFAULT_IMAGE_POSITION: Pos2 = Pos2::new(100.0, 100.0);
pub const DEFAULT_IMAGE_SIZE: Vec2 = Vec2::new(200.0, 200.0);

/// Inner padding of a text box, on every side
pub const TEXT_PADDING: f32 = 10.0;

/// Validates that a proposed size satisfies the minimum bound
pub(crate) fn validate_size(width: f32, height: f32) -> Result<(), String> {
    if width < MIN_ELEMENT_SIZE || height < MIN_ELEMENT_SIZE {
        Err(format!(
            "Element dimensions too small (min: {}). Width: {}, Height: {}",
            MIN_ELEMENT_SIZE, width, height
        ))
    } else {
        Ok(())
    }
}

/// Text boxes are measured with their vertical padding, and the font size
/// itself never drops below [`MIN_FONT_SIZE`]
pub(crate) fn validate_text_size(width: f32, font_size: f32) -> Result<(), String> {
    if font_size < MIN_FONT_SIZE {
        return Err(format!(
            "Font size too small (min: {}). Font size: {}",
            MIN_FONT_SIZE, font_size
        ));
    }
    validate_size(width, font_size + 2.0 * TEXT_PADDING)
}

/// Rotation about the center, with degrees measured clockwise in screen space
pub fn rotation(degrees: f32) -> Rot2 {
    Rot2::from_angle(degrees.to_radians())
}

/// The four corners of `rect` rotated by `degrees` around its center,
/// in the order top-left, top-right, bottom-right, bottom-left
pub fn rotated_corners(rect: Rect, degrees: f32) -> [Pos2; 4] {
    let rot = rotation(degrees);
    let center = rect.center();
    [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ]
    .map(|corner| center + rot * (corner - center))
}

/// Axis-aligned bounds of a rotated rectangle
pub fn rotated_bounds(rect: Rect, degrees: f32) -> Rect {
    Rect::from_points(&rotated_corners(rect, degrees))
}

/// Map a scene point into the unrotated frame of `rect`
pub fn to_local(rect: Rect, degrees: f32, point: Pos2) -> Pos2 {
    let center = rect.center();
    center + rotation(degrees).inverse() * (point - center)
}

/// Hit test against a rectangle rotated around its center
pub fn rotated_contains(rect: Rect, degrees: f32, point: Pos2) -> bool {
    rect.contains(to_local(rect, degrees, point))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrotated_bounds_match_rect() {
        let rect = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(100.0, 50.0));
        let bounds = rotated_bounds(rect, 0.0);
        assert!((bounds.min - rect.min).length() < 0.001);
        assert!((bounds.max - rect.max).length() < 0.001);
    }

    #[test]
    fn test_quarter_turn_swaps_extent() {
        let rect = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(100.0, 40.0));
        let bounds = rotated_bounds(rect, 90.0);
        assert!((bounds.width() - 40.0).abs() < 0.01);
        assert!((bounds.height() - 100.0).abs() < 0.01);
        assert!((bounds.center() - rect.center()).length() < 0.01);
    }

    #[test]
    fn test_rotated_hit_testing() {
        let rect = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(100.0, 20.0));
        // Inside the unrotated box but outside once it stands upright
        assert!(rotated_contains(rect, 0.0, Pos2::new(95.0, 10.0)));
        assert!(!rotated_contains(rect, 90.0, Pos2::new(95.0, 10.0)));
        // The center is always inside
        assert!(rotated_contains(rect, 37.0, rect.center()));
    }

    #[test]
    fn test_size_validation() {
        assert!(validate_size(20.0, 20.0).is_ok());
        let err = validate_size(10.0, 200.0).unwrap_err();
        assert!(err.contains("too small"));
    }

    #[test]
    fn test_text_size_counts_padding() {
        // A 12 unit font sits in a 32 unit tall box
        assert!(validate_text_size(100.0, 12.0).is_ok());
        assert!(validate_text_size(100.0, MIN_FONT_SIZE).is_ok());
        assert!(validate_text_size(100.0, 4.0).is_err());
        assert!(validate_text_size(10.0, 50.0).is_err());
    }
}
