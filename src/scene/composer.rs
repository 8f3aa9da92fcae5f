use std::collections::HashMap;
use std::sync::Arc;

use egui::{Rect, Vec2};
use image::RgbaImage;
use log::{debug, error, info, warn};

use super::Scene;
use crate::command::{CommandReceiver, HostCommand, SceneHandle, SceneIntent, command_channel};
use crate::config::EditorConfig;
use crate::element::{DesignElement, ElementId, ElementPatch, factory};
use crate::error::{ExportError, TransitionError};
use crate::export::{self, FlattenInput};
use crate::image_loader::{Bitmap, ImageLoader, LoadOutcome, LoadTarget, truncate};
use crate::state::TextEditState;
use crate::text::{GROWTH_THRESHOLD, INITIAL_TEXT_PADDING, TextMetrics};

/// A failed image load, kept for inspection
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub reference: String,
    pub message: String,
}

/// Progress of the t-shirt template
#[derive(Debug, Clone)]
pub enum BackgroundState {
    Loading,
    Ready(Bitmap),
    Failed(String),
}

/// Owns the scene and is the only way to change it.
///
/// Host commands arrive through the [`SceneHandle`] channel, canvas
/// gestures as [`SceneIntent`]s and decoded images through the
/// [`ImageLoader`]. Everything is applied on the UI thread, one request at a
/// time.
pub struct SceneComposer {
    scene: Scene,
    config: EditorConfig,
    loader: ImageLoader,
    fonts: Arc<TextMetrics>,
    bitmaps: HashMap<ElementId, Bitmap>,
    background: BackgroundState,
    edit_state: TextEditState,
    diagnostics: Vec<LoadFailure>,
    handle: SceneHandle,
    commands: CommandReceiver,
}

impl std::fmt::Debug for SceneComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneComposer")
            .field("elements", &self.scene.len())
            .field("selected", &self.scene.selected())
            .field("bitmaps", &self.bitmaps.len())
            .field("edit_state", &self.edit_state)
            .finish_non_exhaustive()
    }
}

impl SceneComposer {
    /// Create an empty scene and start loading the background template
    pub fn new(config: EditorConfig, loader: ImageLoader, fonts: Arc<TextMetrics>) -> Self {
        let (handle, commands) = command_channel();
        let mut composer = Self {
            scene: Scene::new(),
            config,
            loader,
            fonts,
            bitmaps: HashMap::new(),
            background: BackgroundState::Loading,
            edit_state: TextEditState::default(),
            diagnostics: Vec::new(),
            handle,
            commands,
        };
        let template = composer.config.template.clone();
        composer.loader.request(LoadTarget::Background, &template);
        composer
    }

    /// A sender for host commands
    pub fn handle(&self) -> SceneHandle {
        self.handle.clone()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn fonts(&self) -> &TextMetrics {
        &self.fonts
    }

    pub fn loader_mut(&mut self) -> &mut ImageLoader {
        &mut self.loader
    }

    pub fn background(&self) -> &BackgroundState {
        &self.background
    }

    /// Decoded bitmap of an image element, once it has loaded
    pub fn bitmap(&self, id: ElementId) -> Option<&Bitmap> {
        self.bitmaps.get(&id)
    }

    pub fn diagnostics(&self) -> &[LoadFailure] {
        &self.diagnostics
    }

    pub fn edit_state(&self) -> &TextEditState {
        &self.edit_state
    }

    pub fn edit_state_mut(&mut self) -> &mut TextEditState {
        &mut self.edit_state
    }

    /// Append an image element at the default placement. The new element is
    /// not selected; its bitmap shows up once the loader delivers it.
    pub fn add_image_element(&mut self, content: &str) -> ElementId {
        let element = factory::create_image(content);
        let id = element.id;
        self.scene.add(element);
        self.loader.request(LoadTarget::Element(id), content);
        info!("Added image element {}", id);
        id
    }

    /// Append a text element centered in the viewport and select it
    pub fn add_text_element(&mut self, text: Option<&str>) -> ElementId {
        let content = text.unwrap_or(&self.config.default_text).to_owned();
        let font_size = self.config.default_font_size;
        let size = Vec2::new(
            self.fonts.advance_width(&content, font_size) + INITIAL_TEXT_PADDING,
            font_size,
        );
        let min = ((self.scene.viewport() - size) / 2.0).to_pos2();
        let element = factory::create_text(content, Rect::from_min_size(min, size));
        let id = element.id;
        self.scene.add(element);
        self.scene.select(Some(id));
        info!("Added text element {}", id);
        id
    }

    pub fn select(&mut self, id: Option<ElementId>) {
        self.scene.select(id);
    }

    /// Merge `patch` into element `id`. Returns false if there is no such
    /// element.
    pub fn apply_update(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        let Some(previous) = self.scene.get(id).map(|element| element.content.clone()) else {
            debug!("Update for missing element {} ignored", id);
            return false;
        };
        self.scene.update(id, patch);

        if let Some(content) = &patch.content {
            if *content != previous {
                self.content_changed(id);
            }
        }
        true
    }

    fn content_changed(&mut self, id: ElementId) {
        let Some(element) = self.scene.get(id).cloned() else {
            return;
        };
        if element.is_text() {
            if !self.edit_state.is_editing_element(id) {
                self.grow_text_to_fit(&element);
            }
        } else {
            // The old bitmap is superseded, and so is any load still in flight
            self.bitmaps.remove(&id);
            self.loader.request(LoadTarget::Element(id), &element.content);
        }
    }

    /// Widen a text box whose content outgrew it. Never shrinks.
    fn grow_text_to_fit(&mut self, element: &DesignElement) {
        let measured = self.fonts.measure(&element.content, element.font_size());
        if measured.width > element.width + GROWTH_THRESHOLD {
            debug!(
                "Growing text {} from {} to {}",
                element.id, element.width, measured.width
            );
            self.scene
                .update(element.id, &ElementPatch::default().with_width(measured.width));
        }
    }

    /// Remove an element, clearing the selection if it was selected
    pub fn delete(&mut self, id: ElementId) {
        if self.edit_state.is_editing_element(id) {
            self.edit_state.abandon();
        }
        if self.scene.remove(id).is_some() {
            self.bitmaps.remove(&id);
            info!("Deleted element {}", id);
        }
    }

    /// Delete whatever is selected; nothing happens without a selection
    pub fn delete_selected(&mut self) {
        if let Some(id) = self.scene.selected() {
            self.delete(id);
        }
    }

    pub fn resize_viewport(&mut self, size: Vec2) {
        if self.scene.viewport() != size {
            debug!("Viewport resized to {:?}", size);
            self.scene.set_viewport(size);
        }
    }

    pub fn apply_intent(&mut self, intent: SceneIntent) {
        debug!("Applying {} intent", intent.name());
        match intent {
            SceneIntent::Select(id) => self.select(Some(id)),
            SceneIntent::Deselect => self.select(None),
            SceneIntent::Update { id, patch } => {
                self.apply_update(id, &patch);
            }
            SceneIntent::Delete(id) => self.delete(id),
            SceneIntent::BeginTextEdit(id) => {
                if let Err(err) = self.begin_text_edit(id) {
                    warn!("{}", err);
                }
            }
        }
    }

    /// Cover a text element with the inline editor
    pub fn begin_text_edit(&mut self, id: ElementId) -> Result<(), TransitionError> {
        let element = self
            .scene
            .get(id)
            .ok_or_else(|| TransitionError::MissingElement(id.to_string()))?;
        self.edit_state.begin(element)?;
        info!("Editing text {}", id);
        Ok(())
    }

    /// Close the inline editor, writing the buffer back if it changed
    pub fn commit_text_edit(&mut self) {
        let Some(commit) = self.edit_state.finish() else {
            return;
        };
        match commit.content {
            Some(content) => {
                self.apply_update(commit.id, &ElementPatch::content(content));
            }
            None => debug!("Text {} unchanged", commit.id),
        }
    }

    /// Apply a finished load. Returns false for results that no longer
    /// match the element's current content.
    pub fn accept_load(&mut self, outcome: LoadOutcome) -> bool {
        match outcome.target {
            LoadTarget::Background => match outcome.result {
                Ok(bitmap) => {
                    info!("Background loaded ({}x{})", bitmap.width(), bitmap.height());
                    self.background = BackgroundState::Ready(bitmap);
                }
                Err(err) => {
                    self.report_failure(&outcome.content, &err);
                    self.background = BackgroundState::Failed(err.to_string());
                }
            },
            LoadTarget::Element(id) => {
                let current = self.scene.get(id).map(|element| element.content.as_str());
                if current != Some(outcome.content.as_str()) {
                    debug!("Discarding stale image for {}", id);
                    return false;
                }
                match outcome.result {
                    Ok(bitmap) => {
                        debug!("Image {} loaded ({}x{})", id, bitmap.width(), bitmap.height());
                        self.bitmaps.insert(id, bitmap);
                    }
                    Err(err) => self.report_failure(&outcome.content, &err),
                }
            }
        }
        true
    }

    fn report_failure(&mut self, reference: &str, err: &dyn std::error::Error) {
        error!("Error loading image {}: {}", truncate(reference), err);
        self.diagnostics.push(LoadFailure {
            reference: reference.to_owned(),
            message: err.to_string(),
        });
    }

    /// Apply pending host commands and finished loads
    pub fn poll(&mut self) {
        for outcome in self.loader.drain() {
            self.accept_load(outcome);
        }
        self.process_commands();
    }

    /// Apply queued host commands. Returns true if there were any.
    pub fn process_commands(&mut self) -> bool {
        let commands = self.commands.drain();
        let applied = !commands.is_empty();
        for command in commands {
            match command {
                HostCommand::AddImage(content) => {
                    self.add_image_element(&content);
                }
                HostCommand::AddText(text) => {
                    self.add_text_element(text.as_deref());
                }
                HostCommand::ExportPng => {
                    if let Err(err) = self.download_flattened_design() {
                        error!("Export failed: {}", err);
                    }
                }
            }
        }
        applied
    }

    /// Render the design without any selection decorations
    pub fn flatten(&self) -> Result<RgbaImage, ExportError> {
        let background = match &self.background {
            BackgroundState::Ready(bitmap) => Some(bitmap.as_ref()),
            _ => None,
        };
        export::flatten(&FlattenInput {
            scene: &self.scene,
            background,
            bitmaps: &self.bitmaps,
            fonts: &self.fonts,
            text_color: self.config.text_color(),
            overscan: self.config.background_overscan,
            pixel_ratio: self.config.export_pixel_ratio,
        })
    }

    pub fn export_png(&self) -> Result<Vec<u8>, ExportError> {
        export::encode_png(&self.flatten()?)
    }

    pub fn download_flattened_design(&self) -> Result<(), ExportError> {
        let png = self.export_png()?;
        export::deliver_download(&self.config.export_file_name, &png)
    }
}
