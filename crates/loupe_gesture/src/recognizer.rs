//! Recognizers feeding the gallery

use serde::{Deserialize, Serialize};

/// Source of a gesture sample
///
/// Every recognizer writes its own cells, so two recognizers never write the
/// same cell within a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recognizer {
    /// Vertical drag on the open modal (preview drag, fling to close)
    ModalPan,
    /// Pan on the zoomed image
    ViewerPan,
    Pinch,
    Rotation,
    /// Toggles the overlay controls
    SingleTap,
    /// Zooms in or out
    DoubleTap,
    /// Pinch directly on a grid thumbnail
    ThumbnailPinch,
}

impl Recognizer {
    pub const ALL: [Recognizer; 7] = [
        Recognizer::ModalPan,
        Recognizer::ViewerPan,
        Recognizer::Pinch,
        Recognizer::Rotation,
        Recognizer::SingleTap,
        Recognizer::DoubleTap,
        Recognizer::ThumbnailPinch,
    ];

    /// Prefix for this recognizer's cell labels
    pub fn label(self) -> &'static str {
        match self {
            Recognizer::ModalPan => "modal_pan",
            Recognizer::ViewerPan => "viewer_pan",
            Recognizer::Pinch => "pinch",
            Recognizer::Rotation => "rotation",
            Recognizer::SingleTap => "single_tap",
            Recognizer::DoubleTap => "double_tap",
            Recognizer::ThumbnailPinch => "thumbnail_pinch",
        }
    }
}
