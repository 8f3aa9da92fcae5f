#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod command;
pub mod config;
pub mod element;
pub mod emoji;
pub mod error;
pub mod export;
pub mod gizmo;
pub mod image_loader;
pub mod input;
pub mod panels;
pub mod renderer;
pub mod scene;
pub mod state;
pub mod text;
pub mod texture_manager;
pub mod upload;

pub use app::DesignerApp;
pub use command::{HostCommand, SceneHandle, SceneIntent};
pub use config::EditorConfig;
pub use element::{DesignElement, ElementId, ElementKind, ElementPatch};
pub use error::{ExportError, LoadError};
pub use image_loader::{ImageLoader, LoadMode};
pub use renderer::Renderer;
pub use scene::{LoadFailure, Scene, SceneComposer};
pub use state::TextEditState;
pub use text::TextMetrics;
