//! Sample queue between the platform recognizers and the graph
//!
//! Recognizers call back at their own sampling rate; the graph evaluates once
//! per display frame. [`GestureAdapter`] buffers samples per recognizer and
//! applies at most one sample per recognizer at the start of each frame, so
//! a sample's fields always land together and a phase change is never
//! collapsed away.

use std::collections::VecDeque;

use loupe_core::Graph;
use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use crate::cells::GestureCells;
use crate::error::{AdapterError, Result};
use crate::recognizer::Recognizer;
use crate::sample::GestureSample;

struct Channel {
    cells: GestureCells,
    queue: VecDeque<GestureSample>,
}

/// Routes recognizer samples into their input cells
#[derive(Default)]
pub struct GestureAdapter {
    channels: FxHashMap<Recognizer, Channel>,
}

impl GestureAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate input cells for `recognizer`, or return the existing ones
    pub fn register(&mut self, graph: &mut Graph, recognizer: Recognizer) -> GestureCells {
        self.channels
            .entry(recognizer)
            .or_insert_with(|| Channel {
                cells: GestureCells::new(graph, recognizer),
                queue: VecDeque::new(),
            })
            .cells
    }

    pub fn cells(&self, recognizer: Recognizer) -> Option<GestureCells> {
        self.channels.get(&recognizer).map(|c| c.cells)
    }

    /// Queue a sample for the next frame
    ///
    /// A sample with the same phase as the newest queued one replaces it:
    /// only phase transitions need a frame of their own.
    pub fn push(&mut self, recognizer: Recognizer, sample: GestureSample) -> Result<()> {
        if let Err(err) = sample.validate(recognizer) {
            warn!("dropping gesture sample: {}", err);
            return Err(err);
        }
        let channel = self
            .channels
            .get_mut(&recognizer)
            .ok_or(AdapterError::Unregistered(recognizer))?;

        match channel.queue.back_mut() {
            Some(last) if last.phase == sample.phase => *last = sample,
            _ => channel.queue.push_back(sample),
        }
        trace!(?recognizer, phase = ?sample.phase, queued = channel.queue.len(), "sample queued");
        Ok(())
    }

    /// Samples waiting for a frame
    pub fn pending(&self, recognizer: Recognizer) -> usize {
        self.channels
            .get(&recognizer)
            .map_or(0, |c| c.queue.len())
    }

    pub fn has_pending(&self) -> bool {
        self.channels.values().any(|c| !c.queue.is_empty())
    }

    /// Apply the oldest queued sample of every recognizer
    ///
    /// Call once per frame, before [`Graph::tick`]. Clears the `fresh` flag
    /// of recognizers without a sample. Returns how many samples landed.
    pub fn apply_frame(&mut self, graph: &mut Graph) -> usize {
        let mut applied = 0;
        for channel in self.channels.values_mut() {
            match channel.queue.pop_front() {
                Some(sample) => {
                    channel.cells.write(graph, &sample);
                    applied += 1;
                }
                None => graph.set(channel.cells.fresh, 0.0),
            }
        }
        applied
    }

    /// Drop every queued sample
    pub fn clear(&mut self) {
        for channel in self.channels.values_mut() {
            channel.queue.clear();
        }
    }
}

impl std::fmt::Debug for GestureAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut recognizers: Vec<_> = self.channels.keys().copied().collect();
        recognizers.sort();
        f.debug_struct("GestureAdapter")
            .field("recognizers", &recognizers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::GesturePhase;

    fn adapter_with(recognizer: Recognizer) -> (Graph, GestureAdapter, GestureCells) {
        let mut graph = Graph::new();
        let mut adapter = GestureAdapter::new();
        let cells = adapter.register(&mut graph, recognizer);
        (graph, adapter, cells)
    }

    #[test]
    fn test_one_sample_per_frame() {
        let (mut graph, mut adapter, cells) = adapter_with(Recognizer::ModalPan);
        let drag = GestureSample::new(GesturePhase::Active).with_translation(0.0, 40.0);
        let release = GestureSample::new(GesturePhase::End).with_velocity(0.0, 800.0);
        adapter.push(Recognizer::ModalPan, drag).unwrap();
        adapter.push(Recognizer::ModalPan, release).unwrap();

        assert_eq!(adapter.apply_frame(&mut graph), 1);
        assert_eq!(cells.current_phase(&graph), GesturePhase::Active);
        assert_eq!(graph.get(cells.translation_y), 40.0);

        assert_eq!(adapter.apply_frame(&mut graph), 1);
        assert_eq!(cells.current_phase(&graph), GesturePhase::End);
        assert_eq!(graph.get(cells.velocity_y), 800.0);
        assert_eq!(graph.get(cells.fresh), 1.0);

        assert_eq!(adapter.apply_frame(&mut graph), 0);
        assert_eq!(graph.get(cells.fresh), 0.0);
    }

    #[test]
    fn test_same_phase_samples_coalesce() {
        let (mut graph, mut adapter, cells) = adapter_with(Recognizer::Pinch);
        for scale in [1.1, 1.2, 1.3] {
            adapter
                .push(Recognizer::Pinch, GestureSample::new(GesturePhase::Active).with_scale(scale))
                .unwrap();
        }
        assert_eq!(adapter.pending(Recognizer::Pinch), 1);

        adapter.apply_frame(&mut graph);
        assert_eq!(graph.get(cells.scale), 1.3);
    }

    #[test]
    fn test_rejects_non_finite_and_unregistered() {
        let (mut graph, mut adapter, cells) = adapter_with(Recognizer::Pinch);
        let bad = GestureSample::new(GesturePhase::Active).with_scale(f32::INFINITY);
        assert!(matches!(
            adapter.push(Recognizer::Pinch, bad),
            Err(AdapterError::NonFinite { field: "scale", .. })
        ));
        assert_eq!(adapter.pending(Recognizer::Pinch), 0);
        adapter.apply_frame(&mut graph);
        assert_eq!(graph.get(cells.scale), 1.0);

        assert_eq!(
            adapter.push(Recognizer::DoubleTap, GestureSample::new(GesturePhase::End)),
            Err(AdapterError::Unregistered(Recognizer::DoubleTap))
        );
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut graph = Graph::new();
        let mut adapter = GestureAdapter::new();
        let a = adapter.register(&mut graph, Recognizer::Rotation);
        let b = adapter.register(&mut graph, Recognizer::Rotation);
        assert_eq!(a, b);
        assert_eq!(adapter.cells(Recognizer::Rotation), Some(a));
    }
}
