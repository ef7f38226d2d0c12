//! Gallery error types

use loupe_gesture::AdapterError;
use thiserror::Error;

use crate::config::ConfigError;

/// Gallery controller errors
///
/// Animation-path failures never surface here: they fall back to a stable
/// value and log a warning.
#[derive(Error, Debug)]
pub enum GalleryError {
    /// The modal or the pinch preview is already showing
    #[error("gallery is busy showing the {0}")]
    Busy(&'static str),

    #[error("image index {index} out of range (gallery has {count} images)")]
    InvalidIndex { index: usize, count: usize },

    #[error("the gallery has no images")]
    Empty,

    #[error("the gallery modal is not open")]
    NotOpen,

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for gallery operations
pub type Result<T> = std::result::Result<T, GalleryError>;
