//! Loupe Gallery
//!
//! Gesture-driven image gallery built on the [`loupe_core`] value graph:
//!
//! - **Viewer**: pinch, pan, rotate and double-tap zoom with rubber-band
//!   bounds and focal-point preserving scale
//! - **Modal**: the open/close morph between a grid thumbnail and the
//!   full-screen viewer, with preview drag and overlay fading
//! - **Pinch preview**: a floating copy lifted off a thumbnail by a pinch
//! - **Gallery**: the controller routing gesture samples and host callbacks
//!
//! Each surface owns its graph. The host pushes gesture samples, calls
//! [`Gallery::tick`] once per display frame and draws the returned
//! [`Transform`] records.
//!
//! # Example
//!
//! ```rust
//! use loupe_gallery::{Gallery, GalleryConfig, ModalPhase, Size};
//!
//! let images = vec![Size::new(1200.0, 800.0)];
//! let mut gallery = Gallery::new(GalleryConfig::default(), images).unwrap();
//! gallery.open(0, None).unwrap();
//!
//! let mut t = 0.0;
//! for _ in 0..120 {
//!     t += 1000.0 / 60.0;
//!     gallery.tick(t);
//! }
//! assert_eq!(gallery.phase(), ModalPhase::Open);
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod gallery;
pub mod geometry;
pub mod modal;
pub mod preview;
pub mod transform;
pub mod viewer;

pub use config::{ConfigError, GalleryConfig, ModalConfig, ScreenConfig, ViewerConfig};
pub use error::{GalleryError, Result};
pub use events::{EventSink, GalleryEvent};
pub use gallery::{Callback, Gallery, GalleryFrame};
pub use geometry::{fit_image_size, Rect, Size, ThumbnailGeometry};
pub use modal::{GalleryModal, ModalFrame, ModalPhase};
pub use preview::{PinchPreview, PreviewFrame};
pub use transform::{Transform, TransformNodes};
pub use viewer::{ImageViewer, ViewerInputs};
