//! Recorded gesture scripts
//!
//! A script lists the images of a gallery and the host actions to replay,
//! each stamped with the frame it happens on:
//!
//! ```json
//! {
//!   "images": [{ "width": 1200, "height": 800 }],
//!   "steps": [
//!     { "at": 0, "action": "open", "index": 0,
//!       "thumbnail": { "x": 10, "y": 200, "width": 120, "height": 120 } },
//!     { "at": 40, "action": "gesture", "recognizer": "double_tap",
//!       "sample": { "phase": "end", "x": 100, "y": 300 } },
//!     { "at": 120, "action": "request_close" }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use loupe_gallery::{Gallery, Rect, Size, ThumbnailGeometry};
use loupe_gesture::{GestureSample, Recognizer};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Frames replayed after the last step when no count is given
const TRAILING_FRAMES: usize = 120;

#[derive(Debug, Deserialize)]
pub struct Script {
    pub images: Vec<Size>,
    /// Total frames to replay
    #[serde(default)]
    pub frames: Option<usize>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Step {
    /// Frame the action is applied before
    pub at: usize,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Open {
        index: usize,
        /// Thumbnail rect in window coordinates; omitted when unmeasured
        #[serde(default)]
        thumbnail: Option<Rect>,
    },
    BeginPreview {
        index: usize,
        thumbnail: Rect,
    },
    Gesture {
        recognizer: Recognizer,
        sample: GestureSample,
    },
    SetIndex {
        index: usize,
    },
    UpdateAnchor {
        index: usize,
        thumbnail: Rect,
    },
    RequestClose,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let mut script: Script = serde_json::from_str(content)?;
        script.steps.sort_by_key(|step| step.at);
        Ok(script)
    }

    /// Frames to replay: the override, the script's own count, or enough to
    /// cover every step plus a settle tail
    pub fn frame_count(&self, requested: Option<usize>) -> usize {
        requested.or(self.frames).unwrap_or_else(|| {
            self.steps.last().map_or(0, |step| step.at + 1) + TRAILING_FRAMES
        })
    }

    /// Steps scheduled on `frame`
    pub fn steps_at(&self, frame: usize) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(move |step| step.at == frame)
    }
}

impl Action {
    /// Apply the action to `gallery`
    ///
    /// Gallery errors are returned so the replay can report them and carry on.
    pub fn apply(&self, gallery: &mut Gallery) -> Result<()> {
        match self {
            Action::Open { index, thumbnail } => {
                let anchor = match thumbnail {
                    Some(rect) => measure(gallery, *index, *rect),
                    None => None,
                };
                gallery.open(*index, anchor)?;
            }
            Action::BeginPreview { index, thumbnail } => {
                let geometry = measure(gallery, *index, *thumbnail)
                    .context("thumbnail cannot be measured")?;
                if !gallery.begin_preview(*index, geometry)? {
                    warn!(index, "pinch preview refused");
                }
            }
            Action::Gesture { recognizer, sample } => gallery.push_sample(*recognizer, *sample)?,
            Action::SetIndex { index } => gallery.set_index(*index)?,
            Action::UpdateAnchor { index, thumbnail } => {
                let anchor = measure(gallery, *index, *thumbnail)
                    .context("thumbnail cannot be measured")?;
                gallery.update_anchor(*index, anchor)?;
            }
            Action::RequestClose => gallery.request_close()?,
        }
        Ok(())
    }
}

fn measure(gallery: &Gallery, index: usize, rect: Rect) -> Option<ThumbnailGeometry> {
    let natural = *gallery.images().get(index)?;
    ThumbnailGeometry::measure(rect, natural, gallery.config().screen.status_bar_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_gesture::GesturePhase;

    const SCRIPT: &str = r#"{
        "images": [{ "width": 1200, "height": 800 }, { "width": 800, "height": 800 }],
        "steps": [
            { "at": 40, "action": "gesture", "recognizer": "double_tap",
              "sample": { "phase": "end", "x": 100, "y": 300 } },
            { "at": 0, "action": "open", "index": 0,
              "thumbnail": { "x": 10, "y": 200, "width": 120, "height": 120 } },
            { "at": 90, "action": "request_close" }
        ]
    }"#;

    #[test]
    fn test_parse_sorts_steps() {
        let script = Script::from_json(SCRIPT).unwrap();
        assert_eq!(script.images.len(), 2);
        let frames: Vec<usize> = script.steps.iter().map(|s| s.at).collect();
        assert_eq!(frames, vec![0, 40, 90]);

        match &script.steps[1].action {
            Action::Gesture { recognizer, sample } => {
                assert_eq!(*recognizer, Recognizer::DoubleTap);
                assert_eq!(sample.phase, GesturePhase::End);
                assert_eq!(sample.scale, 1.0);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_frame_count() {
        let script = Script::from_json(SCRIPT).unwrap();
        assert_eq!(script.frame_count(None), 91 + TRAILING_FRAMES);
        assert_eq!(script.frame_count(Some(10)), 10);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let bad = r#"{ "images": [], "steps": [{ "at": 0, "action": "explode" }] }"#;
        assert!(Script::from_json(bad).is_err());
    }
}
