use image::ImageError;

/// Everything that can go wrong while picking, editing or exporting an image.
///
/// None of these are fatal to an editing session: the caller can always
/// retry or cancel.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The picked file does not advertise an `image/*` MIME type.
    #[error("not an image file (type '{mime}')")]
    InvalidFileType { mime: String },

    #[error("could not decode image: {0}")]
    Decode(#[from] ImageError),

    #[error("could not encode image: {0}")]
    Encode(ImageError),

    /// The encoder finished without producing any bytes.
    #[error("encoder produced no data")]
    EmptyEncoding,

    /// A command arrived after the session was exported or cancelled.
    #[error("editing session is closed")]
    SessionClosed,

    #[error("invalid color '{0}' (expected #rrggbb)")]
    InvalidColor(String),
}

pub type Result<T> = std::result::Result<T, EditorError>;
