use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod common;

pub use common::{
    DEFAULT_IMAGE_POSITION, DEFAULT_IMAGE_SIZE, MIN_ELEMENT_SIZE, MIN_FONT_SIZE, TEXT_PADDING,
    rotated_bounds, rotated_contains, rotated_corners, rotation, to_local,
};
pub(crate) use common::{validate_size, validate_text_size};

/// Opaque identifier of a design element, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an element draws. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Image,
    Text,
}

/// A positioned image or text item placed on the shirt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignElement {
    pub id: ElementId,
    pub kind: ElementKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    /// For text this is also the font size
    pub height: f32,
    /// Degrees, clockwise, about the center
    pub rotation: f32,
    /// Image reference for images, the literal string for text
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[u8; 3]>,
}

impl DesignElement {
    pub fn position(&self) -> Pos2 {
        Pos2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// The unrotated box in scene coordinates
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position(), self.size())
    }

    /// The box the selection handles surround. Text is drawn with
    /// [`TEXT_PADDING`] above and below its font-sized line box.
    pub fn frame(&self) -> Rect {
        match self.kind {
            ElementKind::Image => self.rect(),
            ElementKind::Text => self.rect().expand2(Vec2::new(0.0, TEXT_PADDING)),
        }
    }

    pub fn hit_test(&self, pos: Pos2) -> bool {
        rotated_contains(self.frame(), self.rotation, pos)
    }

    /// Check a proposed width and height against the size limits of this
    /// element's kind
    pub fn validate_size(&self, width: f32, height: f32) -> Result<(), String> {
        match self.kind {
            ElementKind::Image => validate_size(width, height),
            ElementKind::Text => validate_text_size(width, height),
        }
    }

    pub fn is_text(&self) -> bool {
        self.kind == ElementKind::Text
    }

    pub fn font_size(&self) -> f32 {
        self.height
    }

    /// Fill color of a text element, falling back to `default`
    pub fn text_color(&self, default: Color32) -> Color32 {
        self.color
            .map(|[r, g, b]| Color32::from_rgb(r, g, b))
            .unwrap_or(default)
    }

    /// Merge the supplied attributes, leaving the others unchanged
    pub fn apply(&mut self, patch: &ElementPatch) {
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = rotation;
        }
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(color) = patch.color {
            self.color = Some(color);
        }
    }
}

/// A partial set of element attributes for `Scene::update`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
    pub content: Option<String>,
    pub color: Option<[u8; 3]>,
}

impl ElementPatch {
    pub fn position(pos: Pos2) -> Self {
        Self {
            x: Some(pos.x),
            y: Some(pos.y),
            ..Default::default()
        }
    }

    pub fn size(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Full transform: position, size and rotation
    pub fn transform(rect: Rect, rotation: f32) -> Self {
        Self {
            x: Some(rect.min.x),
            y: Some(rect.min.y),
            width: Some(rect.width()),
            height: Some(rect.height()),
            rotation: Some(rotation),
            ..Default::default()
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn touches_size(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// Factory functions for creating elements
pub mod factory {
    use super::*;

    /// Create an image element at the default upload placement
    pub fn create_image(content: impl Into<String>) -> DesignElement {
        DesignElement {
            id: ElementId::new(),
            kind: ElementKind::Image,
            x: DEFAULT_IMAGE_POSITION.x,
            y: DEFAULT_IMAGE_POSITION.y,
            width: DEFAULT_IMAGE_SIZE.x,
            height: DEFAULT_IMAGE_SIZE.y,
            rotation: 0.0,
            content: content.into(),
            color: None,
        }
    }

    /// Create a text element occupying `rect`; the rect height is the font size
    pub fn create_text(content: impl Into<String>, rect: Rect) -> DesignElement {
        DesignElement {
            id: ElementId::new(),
            kind: ElementKind::Text,
            x: rect.min.x,
            y: rect.min.y,
            width: rect.width(),
            height: rect.height(),
            rotation: 0.0,
            content: content.into(),
            color: None,
        }
    }
}
