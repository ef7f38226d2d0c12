//! Host notifications raised during graph evaluation
//!
//! Graph effects cannot call back into the host while the graph is borrowed,
//! so they record events into an [`EventSink`] that the gallery drains after
//! each tick.

use std::sync::{Arc, Mutex};

use loupe_core::{call, Node};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GalleryEvent {
    /// The close transition completed; the host should unmount the modal
    RequestClose,
    IndexChange { index: usize },
    OverlayToggle { active: bool },
    /// The pinch preview settled back onto its thumbnail
    PreviewClose,
}

/// Shared queue of events raised by graph effects
#[derive(Clone, Debug, Default)]
pub struct EventSink(Arc<Mutex<Vec<GalleryEvent>>>);

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: GalleryEvent) {
        debug!(?event, "gallery event");
        match self.0.lock() {
            Ok(mut events) => events.push(event),
            Err(_) => warn!(?event, "event sink poisoned, dropping event"),
        }
    }

    pub fn drain(&self) -> Vec<GalleryEvent> {
        match self.0.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(_) => Vec::new(),
        }
    }

    /// Effect node raising the event built from the current `args`
    pub fn emit<F>(&self, args: impl IntoIterator<Item = Node>, build: F) -> Node
    where
        F: Fn(&[f32]) -> GalleryEvent + Send + Sync + 'static,
    {
        let sink = self.clone();
        call(args, move |values| sink.push(build(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_core::{lit, Graph};

    #[test]
    fn test_emit_and_drain() {
        let mut graph = Graph::new();
        let sink = EventSink::new();
        let node = sink.emit([lit(3.0)], |v| GalleryEvent::IndexChange {
            index: v[0] as usize,
        });

        graph.eval(&node);
        assert_eq!(sink.drain(), vec![GalleryEvent::IndexChange { index: 3 }]);
        assert!(sink.drain().is_empty());
    }
}
