use std::sync::Arc;

use serde::Serialize;

use crate::config::EditorConfig;
use crate::element::DesignElement;
use crate::emoji::EmojiPicker;
use crate::error::FontError;
use crate::image_loader::{ImageLoader, truncate};
use crate::input::{GestureRecognizer, InputHandler};
use crate::panels::{canvas_panel, toolbar_panel};
use crate::renderer::Renderer;
use crate::scene::SceneComposer;
use crate::text::TextMetrics;
use crate::upload::UploadHandler;

/// The host page: toolbar on the left, the shirt canvas in the middle
pub struct DesignerApp {
    pub(crate) composer: SceneComposer,
    pub(crate) renderer: Renderer,
    pub(crate) input: InputHandler,
    pub(crate) gestures: GestureRecognizer,
    pub(crate) uploads: UploadHandler,
    pub(crate) emoji: EmojiPicker,
    pub(crate) show_debug: bool,
}

impl DesignerApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self, FontError> {
        let config = EditorConfig::load();
        let mut loader = ImageLoader::default();
        loader.set_repaint_context(cc.egui_ctx.clone());
        let fonts = Arc::new(TextMetrics::from_egui_defaults()?);
        Ok(Self::with_composer(SceneComposer::new(config, loader, fonts)))
    }

    pub fn with_composer(composer: SceneComposer) -> Self {
        let uploads = UploadHandler::new(composer.handle());
        Self {
            composer,
            renderer: Renderer::new(),
            input: InputHandler::new(),
            gestures: GestureRecognizer::new(),
            uploads,
            emoji: EmojiPicker::default(),
            show_debug: false,
        }
    }

    pub fn composer(&self) -> &SceneComposer {
        &self.composer
    }

    fn debug_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("Scene Debug")
            .open(&mut self.show_debug)
            .default_width(360.0)
            .show(ctx, |ui| {
                let scene = self.composer.scene();
                ui.label(format!("Number of elements: {}", scene.len()));
                match scene.selected() {
                    Some(id) => ui.label(format!("Selected: {}", id)),
                    None => ui.label("Selected: none"),
                };
                if let Some(id) = self.composer.edit_state().editing_id() {
                    ui.label(format!("Editing: {}", id));
                }
                ui.label(format!("Load failures: {}", self.composer.diagnostics().len()));
                ui.separator();

                // Data URLs would drown the dump
                let elements: Vec<DesignElement> = scene
                    .elements()
                    .iter()
                    .cloned()
                    .map(|mut element| {
                        element.content = truncate(&element.content);
                        element
                    })
                    .collect();
                let json = dump_json(&elements);
                egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                    ui.monospace(json);
                });
            });
    }
}

fn dump_json(value: &impl Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| format!("<{}>", err))
}

impl eframe::App for DesignerApp {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.composer.poll();

        if self.uploads.check_for_dropped_files(ctx) {
            self.uploads.process_dropped_files();
        }

        toolbar_panel(self, ctx);
        canvas_panel(self, ctx);

        let handle = self.composer.handle();
        self.emoji.show(ctx, &handle);
        if self.show_debug {
            self.debug_window(ctx);
        }
        self.uploads.preview_files_being_dropped(ctx);

        // Commands sent this frame, after any inline edit has been committed
        if self.composer.process_commands() {
            ctx.request_repaint();
        }
    }
}
