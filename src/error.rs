use thiserror::Error;

/// Errors that can occur while resolving an image reference into a bitmap
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(String),
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Unsupported image reference: {0}")]
    Unsupported(String),
    #[error("Failed to read image source: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to fetch image: {0}")]
    Fetch(String),
    #[error("Failed to parse SVG: {0}")]
    Svg(String),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Errors that can occur while flattening the scene into a PNG
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Viewport is empty ({width}x{height})")]
    EmptyViewport { width: f32, height: f32 },
    #[error("Failed to allocate a {width}x{height} export surface")]
    Allocation { width: u32, height: u32 },
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Failed to deliver download: {0}")]
    Delivery(String),
}

/// Errors that can occur while loading the fonts used for text layout
#[derive(Error, Debug)]
pub enum FontError {
    #[error("No usable font in the bundled font set")]
    NoFonts,
}

/// Errors that can occur while reading the editor configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors that can occur during inline text editor state transitions
#[derive(Error, Debug, PartialEq)]
pub enum TransitionError {
    /// Another element is already being edited
    #[error("Cannot start editing: element {0} is already being edited")]
    AlreadyEditing(String),
    /// Only text elements can be edited inline
    #[error("Element {0} is not a text element")]
    NotText(String),
    /// The element does not exist in the scene
    #[error("Element {0} does not exist")]
    MissingElement(String),
}
