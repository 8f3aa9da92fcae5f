use base64::Engine as _;
use egui::{Align2, Color32, DroppedFile, Id, LayerId, Order};
use log::{info, warn};

use crate::command::SceneHandle;
use crate::config::svg_data_url;
use crate::error::LoadError;

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

fn extension(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Turn uploaded file bytes into an image reference the scene can load.
///
/// SVG files become percent-encoded `image/svg+xml` data URLs, everything
/// else a base64 data URL with the sniffed (or declared) MIME type.
pub fn data_url_for(bytes: &[u8], mime: &str, name: &str) -> Result<String, LoadError> {
    let is_svg = mime == "image/svg+xml" || extension(name).as_deref() == Some("svg");
    if is_svg {
        return Ok(svg_data_url(&String::from_utf8_lossy(bytes)));
    }

    let mime = if mime.starts_with("image/") {
        mime.to_owned()
    } else {
        image::guess_format(bytes)?.to_mime_type().to_owned()
    };
    Ok(format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

/// Feeds uploads from the file picker and from drag-and-drop into the scene
#[derive(Debug)]
pub struct UploadHandler {
    handle: SceneHandle,
    dropped_files: Vec<DroppedFile>,
}

impl UploadHandler {
    pub fn new(handle: SceneHandle) -> Self {
        Self {
            handle,
            dropped_files: Vec::new(),
        }
    }

    /// Pick an image file and add it as an image element
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_file_picker(&self, _ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .set_title("Add Image")
            .pick_file()
        else {
            return;
        };
        let name = path.display().to_string();
        match std::fs::read(&path) {
            Ok(bytes) => self.add_bytes(&bytes, "", &name),
            Err(err) => warn!("Failed to read {}: {}", name, err),
        }
    }

    /// Pick an image file and add it as an image element
    #[cfg(target_arch = "wasm32")]
    pub fn open_file_picker(&self, ctx: &egui::Context) {
        let handle = self.handle.clone();
        let ctx = ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let Some(file) = rfd::AsyncFileDialog::new()
                .add_filter("Images", &IMAGE_EXTENSIONS)
                .set_title("Add Image")
                .pick_file()
                .await
            else {
                return;
            };
            let name = file.file_name();
            let bytes = file.read().await;
            match data_url_for(&bytes, "", &name) {
                Ok(url) => handle.add_image(url),
                Err(err) => warn!("Unsupported upload {}: {}", name, err),
            }
            ctx.request_repaint();
        });
    }

    fn add_bytes(&self, bytes: &[u8], mime: &str, name: &str) {
        match data_url_for(bytes, mime, name) {
            Ok(url) => {
                info!("Uploading {} ({} bytes)", name, bytes.len());
                self.handle.add_image(url);
            }
            Err(err) => warn!("Unsupported upload {}: {}", name, err),
        }
    }

    /// Returns true if files were dropped this frame
    pub fn check_for_dropped_files(&mut self, ctx: &egui::Context) -> bool {
        ctx.input(|i| {
            if i.raw.dropped_files.is_empty() {
                false
            } else {
                self.dropped_files = i.raw.dropped_files.clone();
                true
            }
        })
    }

    /// Add every dropped image file to the scene
    pub fn process_dropped_files(&mut self) {
        for file in std::mem::take(&mut self.dropped_files) {
            let name = match &file.path {
                Some(path) => path.display().to_string(),
                None if !file.name.is_empty() => file.name.clone(),
                None => "unknown".to_owned(),
            };

            if !is_image_file(&file, &name) {
                warn!("Dropped file is not a supported type: {}", name);
                continue;
            }

            if let Some(bytes) = &file.bytes {
                self.add_bytes(bytes, &file.mime, &name);
                continue;
            }

            #[cfg(not(target_arch = "wasm32"))]
            if let Some(path) = &file.path {
                match std::fs::read(path) {
                    Ok(bytes) => self.add_bytes(&bytes, &file.mime, &name),
                    Err(err) => warn!("Failed to read dropped file {}: {}", name, err),
                }
                continue;
            }

            warn!("Dropped file has no accessible data: {}", name);
        }
    }

    /// Dim the window while files hover over it
    pub fn preview_files_being_dropped(&self, ctx: &egui::Context) {
        if ctx.input(|i| i.raw.hovered_files.is_empty()) {
            return;
        }
        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop_target")));
        let screen_rect = ctx.screen_rect();
        painter.rect_filled(screen_rect, 0.0, Color32::from_black_alpha(192));
        painter.text(
            screen_rect.center(),
            Align2::CENTER_CENTER,
            "Drop images to add them to the shirt",
            egui::FontId::proportional(24.0),
            Color32::WHITE,
        );
    }
}

fn is_image_file(file: &DroppedFile, name: &str) -> bool {
    if !file.mime.is_empty() {
        return file.mime.starts_with("image/");
    }
    extension(name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
