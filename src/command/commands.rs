use crate::element::{ElementId, ElementPatch};

/// Requests coming out of the canvas, applied to the scene one at a time
#[derive(Debug, Clone, PartialEq)]
pub enum SceneIntent {
    /// Make `id` the selected element
    Select(ElementId),
    /// Clear the selection
    Deselect,
    /// Merge attributes into an element
    Update { id: ElementId, patch: ElementPatch },
    /// Remove an element, clearing the selection if it was selected
    Delete(ElementId),
    /// Open the inline text editor over a text element
    BeginTextEdit(ElementId),
}

impl SceneIntent {
    pub fn update(id: ElementId, patch: ElementPatch) -> Self {
        Self::Update { id, patch }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SceneIntent::Select(_) => "select",
            SceneIntent::Deselect => "deselect",
            SceneIntent::Update { .. } => "update",
            SceneIntent::Delete(_) => "delete",
            SceneIntent::BeginTextEdit(_) => "begin_text_edit",
        }
    }
}

/// The operations the host page may ask of the scene composer
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    /// Add an image element from an already resolved reference
    AddImage(String),
    /// Add a text element; `None` uses the default text
    AddText(Option<String>),
    /// Flatten the design and hand the PNG to the download collaborator
    ExportPng,
}
