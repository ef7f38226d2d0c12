//! Gallery controller
//!
//! Owns at most one surface at a time: the full-screen modal or a pinch
//! preview on a grid thumbnail. Gesture samples are routed to whichever
//! surface is showing, events raised during a tick are dispatched to the
//! host's callbacks afterwards, and a surface is dropped once it reports
//! that it has finished.

use loupe_gesture::{GestureSample, Recognizer};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::GalleryConfig;
use crate::error::{GalleryError, Result};
use crate::events::{EventSink, GalleryEvent};
use crate::geometry::{Size, ThumbnailGeometry};
use crate::modal::{GalleryModal, ModalFrame, ModalPhase};
use crate::preview::{PinchPreview, PreviewFrame};

/// Callback with no payload
pub type Callback = Box<dyn FnMut() + Send>;

/// Everything the host renders for one display frame
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GalleryFrame {
    pub frame: u64,
    pub time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modal: Option<ModalFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<PreviewFrame>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<GalleryEvent>,
}

#[derive(Default)]
struct Callbacks {
    request_close: Option<Callback>,
    index_change: Option<Box<dyn FnMut(usize) + Send>>,
    overlay_toggle: Option<Box<dyn FnMut(bool) + Send>>,
    preview_close: Option<Callback>,
}

impl Callbacks {
    fn dispatch(&mut self, event: GalleryEvent) {
        match event {
            GalleryEvent::RequestClose => {
                if let Some(cb) = self.request_close.as_mut() {
                    cb();
                }
            }
            GalleryEvent::IndexChange { index } => {
                if let Some(cb) = self.index_change.as_mut() {
                    cb(index);
                }
            }
            GalleryEvent::OverlayToggle { active } => {
                if let Some(cb) = self.overlay_toggle.as_mut() {
                    cb(active);
                }
            }
            GalleryEvent::PreviewClose => {
                if let Some(cb) = self.preview_close.as_mut() {
                    cb();
                }
            }
        }
    }
}

/// Image gallery with a modal viewer and thumbnail pinch previews
pub struct Gallery {
    config: GalleryConfig,
    images: Vec<Size>,
    events: EventSink,
    modal: Option<GalleryModal>,
    preview: Option<PinchPreview>,
    callbacks: Callbacks,
    frame: u64,
}

impl Gallery {
    /// Create a gallery over images of the given natural sizes
    pub fn new(config: GalleryConfig, images: Vec<Size>) -> Result<Self> {
        config.validate()?;
        if images.is_empty() {
            return Err(GalleryError::Empty);
        }
        let invalid = images.iter().filter(|s| !s.is_valid()).count();
        if invalid > 0 {
            warn!(invalid, "images without a usable size will open static");
        }
        Ok(Self {
            config,
            images,
            events: EventSink::new(),
            modal: None,
            preview: None,
            callbacks: Callbacks::default(),
            frame: 0,
        })
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    pub fn on_request_close(&mut self, callback: impl FnMut() + Send + 'static) {
        self.callbacks.request_close = Some(Box::new(callback));
    }

    pub fn on_index_change(&mut self, callback: impl FnMut(usize) + Send + 'static) {
        self.callbacks.index_change = Some(Box::new(callback));
    }

    pub fn on_overlay_toggle(&mut self, callback: impl FnMut(bool) + Send + 'static) {
        self.callbacks.overlay_toggle = Some(Box::new(callback));
    }

    pub fn on_preview_close(&mut self, callback: impl FnMut() + Send + 'static) {
        self.callbacks.preview_close = Some(Box::new(callback));
    }

    // =========================================================================
    // Surfaces
    // =========================================================================

    fn ensure_idle(&self) -> Result<()> {
        if self.modal.is_some() {
            return Err(GalleryError::Busy("modal"));
        }
        if self.preview.is_some() {
            return Err(GalleryError::Busy("pinch preview"));
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.images.len() {
            Ok(())
        } else {
            Err(GalleryError::InvalidIndex {
                index,
                count: self.images.len(),
            })
        }
    }

    /// Open the modal on `index`, morphing from the thumbnail at `anchor`
    ///
    /// Without an anchor (the thumbnail could not be measured) the modal
    /// opens from a full-screen rect.
    pub fn open(&mut self, index: usize, anchor: Option<ThumbnailGeometry>) -> Result<()> {
        self.ensure_idle()?;
        self.check_index(index)?;

        let anchor = anchor.unwrap_or_else(|| {
            warn!(index, "thumbnail not measured, opening from full screen");
            ThumbnailGeometry::fallback(self.config.screen_size())
        });
        let mut modal = GalleryModal::new(
            &self.config,
            self.images.clone(),
            index,
            anchor,
            self.events.clone(),
        )?;
        modal.open();
        info!(index, "gallery opened");
        self.modal = Some(modal);
        Ok(())
    }

    /// Lift a pinch preview off the thumbnail at `index`
    ///
    /// Returns `Ok(false)` when the geometry is unusable and no preview is
    /// shown.
    pub fn begin_preview(&mut self, index: usize, geometry: ThumbnailGeometry) -> Result<bool> {
        self.ensure_idle()?;
        self.check_index(index)?;

        match PinchPreview::new(&self.config, index, geometry, self.events.clone()) {
            Some(preview) => {
                info!(index, "pinch preview started");
                self.preview = Some(preview);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Start the close transition (back button, close control)
    pub fn request_close(&mut self) -> Result<()> {
        let modal = self.modal.as_mut().ok_or(GalleryError::NotOpen)?;
        modal.request_close();
        Ok(())
    }

    /// The pager settled on `index`
    pub fn set_index(&mut self, index: usize) -> Result<()> {
        let modal = self.modal.as_mut().ok_or(GalleryError::NotOpen)?;
        modal.set_index(index)
    }

    /// The grid scrolled `index`'s thumbnail to a new place
    pub fn update_anchor(&mut self, index: usize, anchor: ThumbnailGeometry) -> Result<()> {
        let modal = self.modal.as_mut().ok_or(GalleryError::NotOpen)?;
        modal.update_anchor(index, anchor)
    }

    /// Queue a gesture sample for the next frame
    ///
    /// Samples for a surface that is not showing are dropped.
    pub fn push_sample(&mut self, recognizer: Recognizer, sample: GestureSample) -> Result<()> {
        match (recognizer, self.modal.as_mut(), self.preview.as_mut()) {
            (Recognizer::ThumbnailPinch, _, Some(preview)) => {
                preview.push_sample(recognizer, sample)
            }
            (Recognizer::ThumbnailPinch, _, None) => {
                debug!(?recognizer, "no pinch preview, sample dropped");
                Ok(())
            }
            (_, Some(modal), _) => modal.push_sample(recognizer, sample),
            (Recognizer::Rotation, None, Some(preview)) => preview.push_sample(recognizer, sample),
            _ => {
                debug!(?recognizer, "no surface showing, sample dropped");
                Ok(())
            }
        }
    }

    /// Advance one display frame and dispatch the events it raised
    pub fn tick(&mut self, host_ms: f64) -> GalleryFrame {
        self.frame += 1;
        let modal = self.modal.as_mut().map(|m| m.tick(host_ms));
        let preview = self.preview.as_mut().map(|p| p.tick(host_ms));

        let events = self.events.drain();
        for event in &events {
            self.callbacks.dispatch(*event);
        }

        if self.modal.as_ref().is_some_and(|m| m.is_finished()) {
            info!("gallery closed");
            self.modal = None;
        }
        if self.preview.as_ref().is_some_and(|p| p.is_closed()) {
            info!("pinch preview closed");
            self.preview = None;
        }

        GalleryFrame {
            frame: self.frame,
            time_ms: host_ms,
            modal,
            preview,
            events,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn images(&self) -> &[Size] {
        &self.images
    }

    pub fn modal(&self) -> Option<&GalleryModal> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut GalleryModal> {
        self.modal.as_mut()
    }

    pub fn preview(&self) -> Option<&PinchPreview> {
        self.preview.as_ref()
    }

    /// Modal phase, `Closed` when no modal is showing
    pub fn phase(&self) -> ModalPhase {
        self.modal
            .as_ref()
            .map_or(ModalPhase::Closed, GalleryModal::phase)
    }

    pub fn is_busy(&self) -> bool {
        self.modal.is_some() || self.preview.is_some()
    }
}

impl std::fmt::Debug for Gallery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gallery")
            .field("images", &self.images.len())
            .field("modal", &self.modal)
            .field("preview", &self.preview)
            .field("frame", &self.frame)
            .finish()
    }
}
