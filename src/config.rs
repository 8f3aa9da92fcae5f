use egui::Color32;
use log::{info, warn};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming an optional JSON config file
pub const CONFIG_ENV_VAR: &str = "SHIRT_DESIGNER_CONFIG";

/// Width over height of the design canvas
pub const CANVAS_ASPECT_RATIO: f32 = 7.0 / 9.0;

const TEMPLATE_SVG: &str = include_str!("../assets/tshirt-template.svg");

/// Encode SVG markup the way uploads of `.svg` files are encoded
pub fn svg_data_url(markup: &str) -> String {
    format!(
        "data:image/svg+xml;charset=utf-8,{}",
        utf8_percent_encode(markup, NON_ALPHANUMERIC)
    )
}

/// Knobs of the editor. Every field falls back to its default when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Background template reference
    pub template: String,
    /// Fill color of text without an explicit color, as `#RRGGBB`
    pub text_color: String,
    pub default_text: String,
    pub default_font_size: f32,
    /// Background scale relative to the viewport
    pub background_overscan: f32,
    /// Output pixels per viewport unit when exporting
    pub export_pixel_ratio: f32,
    pub export_file_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            template: svg_data_url(TEMPLATE_SVG),
            text_color: "#8B575C".to_owned(),
            default_text: "Text".to_owned(),
            default_font_size: 50.0,
            background_overscan: 1.3,
            export_pixel_ratio: 2.0,
            export_file_name: "meme-shirt-design.png".to_owned(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read the file named by [`CONFIG_ENV_VAR`], falling back to defaults
    pub fn load() -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            match Self::from_file(&path) {
                Ok(config) => {
                    info!("Loaded config from {}", path);
                    return config;
                }
                Err(err) => warn!("Ignoring config file {}: {}", path, err),
            }
        }
        Self::default()
    }

    /// The brand color, or its default if `text_color` does not parse
    pub fn text_color(&self) -> Color32 {
        parse_hex_color(&self.text_color).unwrap_or_else(|| {
            warn!("Invalid text color {:?}", self.text_color);
            Color32::from_rgb(0x8B, 0x57, 0x5C)
        })
    }
}

/// Parse `#RRGGBB`
pub fn parse_hex_color(hex: &str) -> Option<Color32> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
