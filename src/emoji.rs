use crate::command::SceneHandle;

pub const EMOJIS: [&str; 24] = [
    "😀", "😂", "😍", "😎", "🤔", "😴", "🥳", "😱", "👍", "👎", "👏", "🙌", "❤", "🔥", "⭐", "✨",
    "🎉", "🎸", "🍕", "☕", "🐱", "🐶", "🌈", "🚀",
];

/// A popup grid of emoji; picking one adds it as a text element
#[derive(Debug, Default)]
pub struct EmojiPicker {
    open: bool,
}

impl EmojiPicker {
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn show(&mut self, ctx: &egui::Context, handle: &SceneHandle) {
        let mut open = self.open;
        let mut picked = false;
        egui::Window::new("Add Emoji")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("emoji_grid").spacing([4.0, 4.0]).show(ui, |ui| {
                    for (i, emoji) in EMOJIS.iter().enumerate() {
                        let button = egui::Button::new(egui::RichText::new(*emoji).size(24.0)).frame(false);
                        if ui.add(button).clicked() {
                            handle.add_text(Some((*emoji).to_owned()));
                            picked = true;
                        }
                        if i % 6 == 5 {
                            ui.end_row();
                        }
                    }
                });
            });
        self.open = open && !picked;
    }
}
