//! Gallery configuration
//!
//! Loaded from a `gallery.toml`; every field has a default, so an empty file
//! is a valid configuration:
//!
//! ```toml
//! [screen]
//! width = 390.0
//! height = 844.0
//!
//! [modal]
//! close_duration_ms = 300.0
//!
//! [viewer]
//! double_tap_threshold = 1.1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use loupe_animation::{DecayConfig, Easing, SpringConfig, TimingConfig, MAX_SCALE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Size;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse gallery config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub screen: ScreenConfig,
    /// Base spring for opening, snap-backs and zoom
    pub spring: SpringConfig,
    pub modal: ModalConfig,
    pub viewer: ViewerConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            screen: ScreenConfig::default(),
            spring: SpringConfig::gentle(),
            modal: ModalConfig::default(),
            viewer: ViewerConfig::default(),
        }
    }
}

/// Host window metrics
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: f32,
    pub height: f32,
    /// Added to measured thumbnail `y` (translucent status bars)
    pub status_bar_offset: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 390.0,
            height: 844.0,
            status_bar_offset: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    pub close_duration_ms: f32,
    pub close_easing: Easing,
    /// Drag distance at which the preview drag reaches its smallest size
    pub preview_drag_distance: f32,
    /// Smallest size of the dragged preview, as a fraction of full screen
    pub preview_min_scale: f32,
    /// Drag distance over which the background fades out
    pub preview_fade_distance: f32,
    /// Corner radius of the thumbnails the modal morphs from
    pub thumbnail_radius: f32,
    pub overlay_duration_ms: f32,
    pub overlay_easing: Easing,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            close_duration_ms: 300.0,
            close_easing: Easing::InOutEase,
            preview_drag_distance: 200.0,
            preview_min_scale: 0.8,
            preview_fade_distance: 100.0,
            thumbnail_radius: 5.0,
            overlay_duration_ms: 1000.0,
            overlay_easing: Easing::Elastic(1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Duration of the snap back inside pan and scale bounds
    pub snap_duration_ms: f32,
    pub deceleration: f32,
    /// Double-tap zooms in at or below this scale, out above it
    pub double_tap_threshold: f32,
    pub double_tap_scale: f32,
    /// Largest image extent, in screens, before it is scaled down
    pub max_image_screens: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            snap_duration_ms: 300.0,
            deceleration: 0.99,
            double_tap_threshold: 1.1,
            double_tap_scale: 2.0,
            max_image_screens: 2.0,
        }
    }
}

impl GalleryConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GalleryConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("screen.width", self.screen.width)?;
        positive("screen.height", self.screen.height)?;
        finite("screen.status_bar_offset", self.screen.status_bar_offset)?;

        positive("spring.stiffness", self.spring.stiffness)?;
        positive("spring.mass", self.spring.mass)?;
        non_negative("spring.damping", self.spring.damping)?;
        positive("spring.rest_speed_threshold", self.spring.rest_speed_threshold)?;
        positive(
            "spring.rest_displacement_threshold",
            self.spring.rest_displacement_threshold,
        )?;

        positive("modal.close_duration_ms", self.modal.close_duration_ms)?;
        positive("modal.overlay_duration_ms", self.modal.overlay_duration_ms)?;
        positive("modal.preview_drag_distance", self.modal.preview_drag_distance)?;
        positive("modal.preview_fade_distance", self.modal.preview_fade_distance)?;
        non_negative("modal.thumbnail_radius", self.modal.thumbnail_radius)?;
        let min_scale = self.modal.preview_min_scale;
        if !(min_scale > 0.0 && min_scale <= 1.0) {
            return Err(invalid("modal.preview_min_scale", "must be in (0, 1]"));
        }

        positive("viewer.snap_duration_ms", self.viewer.snap_duration_ms)?;
        let decel = self.viewer.deceleration;
        if !(decel > 0.0 && decel < 1.0) {
            return Err(invalid("viewer.deceleration", "must be in (0, 1)"));
        }
        positive("viewer.double_tap_threshold", self.viewer.double_tap_threshold)?;
        let zoom = self.viewer.double_tap_scale;
        if !(zoom > self.viewer.double_tap_threshold && zoom <= MAX_SCALE) {
            return Err(invalid(
                "viewer.double_tap_scale",
                format!(
                    "must be above double_tap_threshold and at most {}",
                    MAX_SCALE
                ),
            ));
        }
        positive("viewer.max_image_screens", self.viewer.max_image_screens)?;
        Ok(())
    }

    pub fn screen_size(&self) -> Size {
        Size::new(self.screen.width, self.screen.height)
    }

    /// Spring that opens the modal; never overshoots full screen
    pub fn open_spring(&self) -> SpringConfig {
        self.spring.with_overshoot_clamping(true)
    }

    pub fn close_timing(&self) -> TimingConfig {
        TimingConfig::new(self.modal.close_duration_ms, self.modal.close_easing)
    }

    pub fn overlay_timing(&self) -> TimingConfig {
        TimingConfig::new(self.modal.overlay_duration_ms, self.modal.overlay_easing)
    }

    pub fn snap_timing(&self) -> TimingConfig {
        TimingConfig::new(self.viewer.snap_duration_ms, Easing::EaseInOut)
    }

    pub fn decay(&self) -> DecayConfig {
        DecayConfig {
            deceleration: self.viewer.deceleration,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be finite, got {}", value)))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {}", value)))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must not be negative, got {}", value)))
    }
}
