// ============================================================================
// CHAT — the caller side: pick an image, edit it, send it as a message
// ============================================================================

use std::sync::Arc;
use std::time::SystemTime;

use uuid::Uuid;

use crate::canvas::RasterImage;
use crate::compositor::EncodedImage;
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::session::EditorSession;
use crate::{log_info, log_warn};

/// A file as handed over by a picker or drag-and-drop.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Shared handle to an encoded image.  Clones point at the same bytes.
#[derive(Clone, Debug)]
pub struct ImageRef {
    id: Uuid,
    image: Arc<EncodedImage>,
}

impl ImageRef {
    pub fn new(image: EncodedImage) -> Self {
        Self { id: Uuid::new_v4(), image: Arc::new(image) }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }
}

impl PartialEq for ImageRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// The picked image, shown in the preview dialog before sending.
pub struct ImagePreview {
    name: String,
    source: RasterImage,
    edited: Option<ImageRef>,
}

impl ImagePreview {
    /// Accept `file` if it is an image and decodes.
    pub fn open(file: &SourceFile) -> Result<Self> {
        if !file.mime_type.starts_with("image/") {
            log_warn!("rejected '{}': type '{}' is not an image", file.name, file.mime_type);
            return Err(EditorError::InvalidFileType { mime: file.mime_type.clone() });
        }
        let source = RasterImage::decode(&file.bytes)?;
        Ok(Self { name: file.name.clone(), source, edited: None })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &RasterImage {
        &self.source
    }

    /// The last accepted edit, if any.
    pub fn edited(&self) -> Option<&ImageRef> {
        self.edited.as_ref()
    }

    /// Start an editing session on the picked image.
    pub fn editor(&self, config: &EditorConfig) -> Result<EditorSession> {
        EditorSession::new(self.source.clone(), config)
    }

    /// Replace the image that will be sent with an exported edit.
    pub fn accept_edit(&mut self, image: ImageRef) {
        self.edited = Some(image);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    User,
    Other,
}

#[derive(Clone, Debug)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub timestamp: SystemTime,
    pub sender: Sender,
    pub image: Option<ImageRef>,
    pub sender_name: Option<String>,
}

impl Message {
    fn from_user(text: String, image: Option<ImageRef>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            timestamp: SystemTime::now(),
            sender: Sender::User,
            image,
            sender_name: None,
        }
    }
}

/// Ordered message history, oldest first.
#[derive(Debug, Default)]
pub struct MessageList {
    messages: Vec<Message>,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a text message.  Blank text is ignored.
    pub fn send_text(&mut self, text: &str) -> Option<&Message> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.messages.push(Message::from_user(text.to_string(), None));
        self.messages.last()
    }

    /// Append an image message with an optional caption.
    pub fn send_image(&mut self, image: ImageRef, caption: &str) -> &Message {
        let e = image.image();
        log_info!("sending {}x{} image ({} bytes)", e.width, e.height, e.bytes.len());
        self.messages.push(Message::from_user(caption.trim().to_string(), Some(image)));
        &self.messages[self.messages.len() - 1]
    }

    /// Append a message from someone else.
    pub fn receive(&mut self, sender_name: &str, text: &str) -> &Message {
        self.messages.push(Message {
            id: Uuid::new_v4(),
            text: text.to_string(),
            timestamp: SystemTime::now(),
            sender: Sender::Other,
            image: None,
            sender_name: Some(sender_name.to_string()),
        });
        &self.messages[self.messages.len() - 1]
    }
}
