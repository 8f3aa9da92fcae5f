mod editor_state;

pub use editor_state::{EditCommit, EditSession, TextEditState};
