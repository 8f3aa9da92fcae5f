use egui::{Button, Color32, RichText};

use crate::DesignerApp;

const BUTTON_HEIGHT: f32 = 40.0;

const DESIGN_TIPS: [&str; 4] = [
    "🖱 Drag elements to position them",
    "↔ Use corner handles to resize",
    "🔄 Rotate using the top handle",
    "✨ Double-click text to edit",
];

pub fn toolbar_panel(app: &mut DesignerApp, ctx: &egui::Context) {
    egui::SidePanel::left("toolbar_panel")
        .resizable(false)
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.add_space(8.0);
            ui.heading("Customize Your Design");
            ui.separator();

            let handle = app.composer.handle();
            let width = ui.available_width();
            let half = (width - ui.spacing().item_spacing.x) / 2.0;

            ui.horizontal(|ui| {
                if ui
                    .add_sized([half, BUTTON_HEIGHT], Button::new("🖼 Add Image"))
                    .clicked()
                {
                    log::info!("Add Image clicked");
                    app.uploads.open_file_picker(ctx);
                }
                if ui
                    .add_sized([half, BUTTON_HEIGHT], Button::new("🔤 Add Text"))
                    .clicked()
                {
                    handle.add_text(None);
                }
            });

            if ui
                .add_sized([width, BUTTON_HEIGHT], Button::new("😀 Add Emoji").selected(app.emoji.is_open()))
                .clicked()
            {
                app.emoji.toggle();
            }

            let download = Button::new(RichText::new("⬇ Download Design").color(Color32::WHITE).strong())
                .fill(Color32::from_rgb(0xC9, 0x89, 0x86));
            if ui.add_sized([width, BUTTON_HEIGHT], download).clicked() {
                log::info!("Download requested");
                handle.export_png();
            }

            ui.add_space(16.0);
            ui.separator();
            ui.strong("Design Tips");
            for tip in DESIGN_TIPS {
                ui.label(tip);
            }

            ui.add_space(16.0);
            ui.separator();
            ui.checkbox(&mut app.show_debug, "Show debug window");
        });
}
