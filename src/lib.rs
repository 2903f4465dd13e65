//! SnapEdit — the image editor behind a chat composer.
//!
//! A picked image goes through an [`session::EditorSession`]: rotation and
//! flips, a filter chain, freehand annotations with undo/redo, and crops.
//! Exporting renders the same pipeline to JPEG, ready to attach to a
//! [`chat::Message`].

pub mod logger;

pub mod canvas;
pub mod chat;
pub mod components;
pub mod compositor;
pub mod config;
pub mod error;
pub mod ops;
pub mod session;

pub use chat::{ImagePreview, ImageRef, Message, MessageList, Sender, SourceFile};
pub use compositor::{Compositor, EncodedImage, PixelSurface, RenderTarget};
pub use config::EditorConfig;
pub use error::{EditorError, Result};
pub use session::{EditorCommand, EditorSession, Mode};
