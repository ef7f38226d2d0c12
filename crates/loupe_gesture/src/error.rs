//! Gesture adapter error types

use thiserror::Error;

use crate::recognizer::Recognizer;

/// Gesture input errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// A sample carried NaN or an infinity
    #[error("{recognizer:?} sample has non-finite {field}: {value}")]
    NonFinite {
        recognizer: Recognizer,
        field: &'static str,
        value: f32,
    },

    /// No input cells were registered for the recognizer
    #[error("no cells registered for {0:?}")]
    Unregistered(Recognizer),
}

/// Result type for gesture adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;
