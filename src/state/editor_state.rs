//! The inline text editor's state machine.
//!
//! A text element is either drawn on the canvas or covered by an editable
//! overlay. Only one element can be in the editing state at a time.
//!
//! ```text
//!   ┌───────────┐  double-click on text   ┌───────────┐
//!   │           ├────────────────────────►│           │
//!   │  Display  │                         │  Editing  │
//!   │           │◄────────────────────────┤           │
//!   └───────────┘  blur / Enter / Escape  └───────────┘
//! ```
//!
//! Leaving the editing state always produces an [`EditCommit`]. Its content
//! is `Some` only when the buffer differs from what the element held when
//! the session started, so an unchanged edit never touches the scene.
//!
//! # Examples
//!
//! ```rust
//! use egui::{Pos2, Rect, Vec2};
//! use shirt_designer::element::factory;
//! use shirt_designer::state::TextEditState;
//!
//! let element = factory::create_text("Text", Rect::from_min_size(Pos2::ZERO, Vec2::new(120.0, 50.0)));
//! let mut state = TextEditState::default();
//! state.begin(&element).unwrap();
//! state.session_mut().unwrap().buffer.push('!');
//! let commit = state.finish().unwrap();
//! assert!(commit.content.is_some());
//! ```
use crate::element::{DesignElement, ElementId};
use crate::error::TransitionError;

/// An open editing session over one text element
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub id: ElementId,
    /// Element content when the session opened
    pub original: String,
    /// What the overlay currently shows
    pub buffer: String,
    /// Set once the overlay has grabbed keyboard focus
    pub focused: bool,
}

/// Result of leaving the editing state
#[derive(Debug, Clone, PartialEq)]
pub struct EditCommit {
    pub id: ElementId,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TextEditState {
    #[default]
    Display,
    Editing(EditSession),
}

impl TextEditState {
    pub fn is_editing(&self) -> bool {
        matches!(self, TextEditState::Editing(_))
    }

    /// True while `id` is hidden behind the overlay
    pub fn is_editing_element(&self, id: ElementId) -> bool {
        self.editing_id() == Some(id)
    }

    pub fn editing_id(&self) -> Option<ElementId> {
        self.session().map(|session| session.id)
    }

    pub fn session(&self) -> Option<&EditSession> {
        match self {
            TextEditState::Editing(session) => Some(session),
            TextEditState::Display => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut EditSession> {
        match self {
            TextEditState::Editing(session) => Some(session),
            TextEditState::Display => None,
        }
    }

    /// Display → Editing over `element`, seeding the buffer with its content
    pub fn begin(&mut self, element: &DesignElement) -> Result<(), TransitionError> {
        if let TextEditState::Editing(session) = self {
            return Err(TransitionError::AlreadyEditing(session.id.to_string()));
        }
        if !element.is_text() {
            return Err(TransitionError::NotText(element.id.to_string()));
        }
        *self = TextEditState::Editing(EditSession {
            id: element.id,
            original: element.content.clone(),
            buffer: element.content.clone(),
            focused: false,
        });
        Ok(())
    }

    /// Editing → Display. Returns `None` when nothing was being edited.
    pub fn finish(&mut self) -> Option<EditCommit> {
        match std::mem::take(self) {
            TextEditState::Editing(session) => {
                let content = (session.buffer != session.original).then_some(session.buffer);
                Some(EditCommit {
                    id: session.id,
                    content,
                })
            }
            TextEditState::Display => None,
        }
    }

    /// Drop the session without producing a commit, used when the element
    /// disappears from under the editor
    pub fn abandon(&mut self) {
        *self = TextEditState::Display;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;
    use egui::{Pos2, Rect, Vec2};

    fn text_element(content: &str) -> DesignElement {
        factory::create_text(
            content,
            Rect::from_min_size(Pos2::new(10.0, 10.0), Vec2::new(120.0, 50.0)),
        )
    }

    #[test]
    fn test_begin_seeds_buffer() {
        let element = text_element("Hello");
        let mut state = TextEditState::default();
        state.begin(&element).unwrap();
        assert!(state.is_editing_element(element.id));
        assert_eq!(state.session().unwrap().buffer, "Hello");
    }

    #[test]
    fn test_unchanged_edit_commits_nothing() {
        let element = text_element("Hello");
        let mut state = TextEditState::default();
        state.begin(&element).unwrap();
        let commit = state.finish().unwrap();
        assert_eq!(commit.content, None);
        assert_eq!(state, TextEditState::Display);
    }

    #[test]
    fn test_changed_edit_commits_buffer() {
        let element = text_element("Hello");
        let mut state = TextEditState::default();
        state.begin(&element).unwrap();
        state.session_mut().unwrap().buffer = "Hello\nworld".to_owned();
        let commit = state.finish().unwrap();
        assert_eq!(commit.content.as_deref(), Some("Hello\nworld"));
        assert!(state.finish().is_none());
    }

    #[test]
    fn test_second_session_is_rejected() {
        let first = text_element("a");
        let second = text_element("b");
        let mut state = TextEditState::default();
        state.begin(&first).unwrap();
        assert_eq!(
            state.begin(&second),
            Err(TransitionError::AlreadyEditing(first.id.to_string()))
        );
        assert!(state.is_editing_element(first.id));
    }

    #[test]
    fn test_images_cannot_be_edited() {
        let image = factory::create_image("a.png");
        let mut state = TextEditState::default();
        assert!(matches!(state.begin(&image), Err(TransitionError::NotText(_))));
        assert!(!state.is_editing());
    }
}
