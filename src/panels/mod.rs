mod canvas_panel;
mod text_overlay;
mod toolbar_panel;

pub use canvas_panel::{canvas_panel, fit_canvas};
pub use text_overlay::text_overlay;
pub use toolbar_panel::toolbar_panel;
