//! Per-sample gesture records

use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};
use crate::phase::GesturePhase;
use crate::recognizer::Recognizer;

/// One recognizer callback's worth of values
///
/// Translations are cumulative since the gesture began; velocities are in
/// points per second (radians per second for rotation).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSample {
    pub phase: GesturePhase,
    pub translation_x: f32,
    pub translation_y: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    /// Cumulative pinch scale, `1.0` at rest
    pub scale: f32,
    pub focal_x: f32,
    pub focal_y: f32,
    /// Cumulative rotation in radians
    pub rotation: f32,
    pub rotation_velocity: f32,
    /// Touch position in view coordinates (taps)
    pub x: f32,
    pub y: f32,
}

impl Default for GestureSample {
    fn default() -> Self {
        Self {
            phase: GesturePhase::Undetermined,
            translation_x: 0.0,
            translation_y: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
            scale: 1.0,
            focal_x: 0.0,
            focal_y: 0.0,
            rotation: 0.0,
            rotation_velocity: 0.0,
            x: 0.0,
            y: 0.0,
        }
    }
}

impl GestureSample {
    pub fn new(phase: GesturePhase) -> Self {
        Self {
            phase,
            ..Self::default()
        }
    }

    pub fn with_translation(mut self, x: f32, y: f32) -> Self {
        self.translation_x = x;
        self.translation_y = y;
        self
    }

    pub fn with_velocity(mut self, x: f32, y: f32) -> Self {
        self.velocity_x = x;
        self.velocity_y = y;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_focal(mut self, x: f32, y: f32) -> Self {
        self.focal_x = x;
        self.focal_y = y;
        self
    }

    pub fn with_rotation(mut self, rotation: f32, velocity: f32) -> Self {
        self.rotation = rotation;
        self.rotation_velocity = velocity;
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub(crate) fn fields(&self) -> [(&'static str, f32); 11] {
        [
            ("translation_x", self.translation_x),
            ("translation_y", self.translation_y),
            ("velocity_x", self.velocity_x),
            ("velocity_y", self.velocity_y),
            ("scale", self.scale),
            ("focal_x", self.focal_x),
            ("focal_y", self.focal_y),
            ("rotation", self.rotation),
            ("rotation_velocity", self.rotation_velocity),
            ("x", self.x),
            ("y", self.y),
        ]
    }

    /// Reject samples carrying NaN or infinities
    pub fn validate(&self, recognizer: Recognizer) -> Result<()> {
        match self.fields().into_iter().find(|(_, v)| !v.is_finite()) {
            Some((field, value)) => Err(AdapterError::NonFinite {
                recognizer,
                field,
                value,
            }),
            None => Ok(()),
        }
    }
}
