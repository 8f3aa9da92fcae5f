//! Resolves image references into decoded bitmaps off the UI thread.
//!
//! A reference is a data URL (base64 or percent-encoded), an `http(s)` URL or
//! a file path. SVG markup, detected by the `data:image/svg+xml` prefix or a
//! `.svg` suffix, is rasterized with resvg; everything else goes through the
//! `image` crate. Results come back through a channel that the scene composer
//! drains once per frame.

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine as _;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use image::RgbaImage;
use log::{debug, info, warn};
use resvg::tiny_skia::{self, Pixmap};
use resvg::usvg;

use crate::element::ElementId;
use crate::error::LoadError;

/// A decoded, unpremultiplied RGBA bitmap shared between the screen and export
pub type Bitmap = Arc<RgbaImage>;

/// Longest side SVGs are rasterized to, unless their natural size is larger
const SVG_RASTER_TARGET: f32 = 1024.0;

const SVG_DATA_PREFIX: &str = "data:image/svg+xml";

/// Who asked for a bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadTarget {
    Background,
    Element(ElementId),
}

/// Where the bytes of an image reference come from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    DataUrl {
        mime: String,
        base64: bool,
        payload: String,
    },
    Remote(String),
    File(PathBuf),
}

impl ImageSource {
    pub fn parse(content: &str) -> Result<Self, LoadError> {
        if let Some(rest) = content.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| LoadError::MalformedDataUrl(truncate(content)))?;
            let base64 = header.ends_with(";base64");
            let mime = header.split(';').next().unwrap_or_default().to_owned();
            Ok(Self::DataUrl {
                mime,
                base64,
                payload: payload.to_owned(),
            })
        } else if content.starts_with("http://") || content.starts_with("https://") {
            Ok(Self::Remote(content.to_owned()))
        } else if let Some(path) = content.strip_prefix("file://") {
            Ok(Self::File(PathBuf::from(path)))
        } else {
            Ok(Self::File(PathBuf::from(content)))
        }
    }

    /// Fetch the raw bytes behind the reference
    pub fn read_bytes(&self) -> Result<Vec<u8>, LoadError> {
        match self {
            Self::DataUrl {
                base64: true,
                payload,
                ..
            } => Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?),
            Self::DataUrl { payload, .. } => {
                Ok(percent_encoding::percent_decode_str(payload).collect())
            }
            Self::Remote(url) => fetch_remote(url),
            Self::File(path) => read_file(path),
        }
    }
}

/// True if the reference should be treated as SVG markup
pub fn is_svg(content: &str) -> bool {
    content.starts_with(SVG_DATA_PREFIX) || content.to_ascii_lowercase().ends_with(".svg")
}

/// Resolve and decode a reference synchronously
pub fn decode(content: &str) -> Result<RgbaImage, LoadError> {
    let bytes = ImageSource::parse(content)?.read_bytes()?;
    if is_svg(content) {
        rasterize_svg(&bytes)
    } else {
        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }
}

fn rasterize_svg(data: &[u8]) -> Result<RgbaImage, LoadError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_data(data, &options).map_err(|e| LoadError::Svg(e.to_string()))?;
    let size = tree.size();
    let scale = (SVG_RASTER_TARGET / size.width().max(size.height())).max(1.0);
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap =
        Pixmap::new(width, height).ok_or(LoadError::InvalidDimensions { width, height })?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    debug!("Rasterized SVG at {}x{}", width, height);
    Ok(pixmap_to_image(&pixmap))
}

#[cfg(all(feature = "network", not(target_arch = "wasm32")))]
fn fetch_remote(url: &str) -> Result<Vec<u8>, LoadError> {
    let response = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .map_err(|e| LoadError::Fetch(e.to_string()))?;
    let bytes = response.bytes().map_err(|e| LoadError::Fetch(e.to_string()))?;
    Ok(bytes.to_vec())
}

#[cfg(not(all(feature = "network", not(target_arch = "wasm32"))))]
fn fetch_remote(url: &str) -> Result<Vec<u8>, LoadError> {
    Err(LoadError::Unsupported(format!(
        "remote images need the `network` feature: {}",
        truncate(url)
    )))
}

#[cfg(not(target_arch = "wasm32"))]
fn read_file(path: &std::path::Path) -> Result<Vec<u8>, LoadError> {
    Ok(std::fs::read(path)?)
}

#[cfg(target_arch = "wasm32")]
fn read_file(path: &std::path::Path) -> Result<Vec<u8>, LoadError> {
    Err(LoadError::Unsupported(format!(
        "file paths are not readable on the web: {}",
        path.display()
    )))
}

/// Keep data URLs out of log lines
pub(crate) fn truncate(content: &str) -> String {
    const MAX: usize = 64;
    match content.char_indices().nth(MAX) {
        Some((index, _)) => format!("{}…", &content[..index]),
        None => content.to_owned(),
    }
}

/// Convert a premultiplied pixmap into an unpremultiplied image
pub(crate) fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = image::Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}

/// Convert an unpremultiplied image into a premultiplied pixmap
pub(crate) fn image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = tiny_skia::ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// One pending decode
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub target: LoadTarget,
    pub content: String,
}

impl LoadRequest {
    /// Decode on the current thread
    pub fn run(self) -> LoadOutcome {
        let result = decode(&self.content).map(Arc::new);
        LoadOutcome {
            target: self.target,
            content: self.content,
            result,
        }
    }
}

/// A finished decode. `content` is the reference the request was issued
/// for, used to discard results that arrive after the element moved on.
#[derive(Debug)]
pub struct LoadOutcome {
    pub target: LoadTarget,
    pub content: String,
    pub result: Result<Bitmap, LoadError>,
}

/// How requests get executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Decode on a worker (a thread natively, a local task on the web)
    Background,
    /// Decode inside `request`; the result is available on the next drain
    Immediate,
    /// Queue requests until the owner runs them with `take_queued`
    Manual,
}

pub struct ImageLoader {
    mode: LoadMode,
    sender: UnboundedSender<LoadOutcome>,
    receiver: UnboundedReceiver<LoadOutcome>,
    queued: Vec<LoadRequest>,
    repaint: Option<egui::Context>,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("mode", &self.mode)
            .field("queued", &self.queued.len())
            .finish_non_exhaustive()
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new(LoadMode::Background)
    }
}

impl ImageLoader {
    pub fn new(mode: LoadMode) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            mode,
            sender,
            receiver,
            queued: Vec::new(),
            repaint: None,
        }
    }

    pub fn immediate() -> Self {
        Self::new(LoadMode::Immediate)
    }

    pub fn manual() -> Self {
        Self::new(LoadMode::Manual)
    }

    /// Wake the UI when a background decode finishes
    pub fn set_repaint_context(&mut self, ctx: egui::Context) {
        self.repaint = Some(ctx);
    }

    /// Start loading `content` for `target`. Never blocks in background mode.
    pub fn request(&mut self, target: LoadTarget, content: &str) {
        info!("Loading image for {:?}: {}", target, truncate(content));
        let request = LoadRequest {
            target,
            content: content.to_owned(),
        };
        match self.mode {
            LoadMode::Immediate => self.deliver(request.run()),
            LoadMode::Manual => self.queued.push(request),
            LoadMode::Background => self.spawn(request),
        }
    }

    /// Requests held back in manual mode, oldest first
    pub fn take_queued(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.queued)
    }

    /// Every outcome that arrived since the last call
    pub fn drain(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(Some(outcome)) = self.receiver.try_next() {
            outcomes.push(outcome);
        }
        outcomes
    }

    fn deliver(&self, outcome: LoadOutcome) {
        if self.sender.unbounded_send(outcome).is_err() {
            warn!("Image loader channel closed");
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn spawn(&self, request: LoadRequest) {
        let sender = self.sender.clone();
        let repaint = self.repaint.clone();
        let fallback = request.clone();
        let spawned = std::thread::Builder::new()
            .name("image-loader".to_owned())
            .spawn(move || {
                let _ = sender.unbounded_send(request.run());
                if let Some(ctx) = repaint {
                    ctx.request_repaint();
                }
            });
        if let Err(err) = spawned {
            warn!("Failed to spawn loader thread, decoding inline: {}", err);
            self.deliver(fallback.run());
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn spawn(&self, request: LoadRequest) {
        let sender = self.sender.clone();
        let repaint = self.repaint.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let _ = sender.unbounded_send(request.run());
            if let Some(ctx) = repaint {
                ctx.request_repaint();
            }
        });
    }
}
