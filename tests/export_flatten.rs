use std::io::Cursor;
use std::sync::Arc;

use base64::Engine as _;
use egui::Vec2;
use image::{ImageFormat, Rgba, RgbaImage};
use shirt_designer::{EditorConfig, ExportError, ImageLoader, SceneComposer, TextMetrics};

fn png_data_url(color: [u8; 4]) -> String {
    let image = RgbaImage::from_pixel(8, 8, Rgba(color));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn loaded_composer() -> SceneComposer {
    let fonts = Arc::new(TextMetrics::from_egui_defaults().unwrap());
    let mut composer = SceneComposer::new(EditorConfig::default(), ImageLoader::immediate(), fonts);
    composer.resize_viewport(Vec2::new(350.0, 450.0));
    composer.add_image_element(&png_data_url([255, 0, 0, 255]));
    composer.add_text_element(Some("Tee"));
    composer.poll();
    composer
}

#[test]
fn test_flatten_is_supersampled() {
    let composer = loaded_composer();
    let image = composer.flatten().unwrap();
    assert_eq!(image.dimensions(), (700, 900));
}

#[test]
fn test_selection_does_not_change_the_export() {
    let mut composer = loaded_composer();
    let text = composer.scene().selected().unwrap();
    let with_selection = composer.flatten().unwrap();

    composer.select(None);
    let without_selection = composer.flatten().unwrap();
    assert!(with_selection == without_selection);

    // Selection survives an export untouched
    composer.select(Some(text));
    composer.flatten().unwrap();
    assert_eq!(composer.scene().selected(), Some(text));
}

#[test]
fn test_editing_text_is_still_exported() {
    let mut composer = loaded_composer();
    let text = composer.scene().selected().unwrap();
    let before = composer.flatten().unwrap();

    composer.begin_text_edit(text).unwrap();
    let during = composer.flatten().unwrap();
    assert!(before == during);
}

#[test]
fn test_image_pixels_land_in_the_export() {
    let composer = loaded_composer();
    let image = composer.flatten().unwrap();

    // Image box spans (100,100)-(300,300) in scene units, doubled on export.
    // The text box sits below y=200, so sample above it.
    let pixel = image.get_pixel(240, 240);
    assert_eq!(pixel, &Rgba([255, 0, 0, 255]));
}

#[test]
fn test_export_png_has_png_signature() {
    let composer = loaded_composer();
    let png = composer.export_png().unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_empty_viewport_fails() {
    let fonts = Arc::new(TextMetrics::from_egui_defaults().unwrap());
    let composer = SceneComposer::new(EditorConfig::default(), ImageLoader::manual(), fonts);
    assert!(matches!(
        composer.flatten(),
        Err(ExportError::EmptyViewport { .. })
    ));
}
