//! Per-recognizer input cells and phase predicates

use loupe_core::{read, CellId, Graph, Node};

use crate::phase::GesturePhase;
use crate::recognizer::Recognizer;
use crate::sample::GestureSample;

/// Input cells written by one recognizer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureCells {
    pub recognizer: Recognizer,
    pub phase: CellId,
    /// Phase before the most recent sample
    pub previous_phase: CellId,
    pub translation_x: CellId,
    pub translation_y: CellId,
    pub velocity_x: CellId,
    pub velocity_y: CellId,
    pub scale: CellId,
    pub focal_x: CellId,
    pub focal_y: CellId,
    pub rotation: CellId,
    pub rotation_velocity: CellId,
    pub x: CellId,
    pub y: CellId,
    /// Number of samples applied so far
    pub sample_seq: CellId,
    /// `1.0` on frames where a sample was applied
    pub fresh: CellId,
}

impl GestureCells {
    pub fn new(graph: &mut Graph, recognizer: Recognizer) -> Self {
        let prefix = recognizer.label();
        let mut cell =
            |name: &str, initial: f32| graph.cell_named(format!("{prefix}.{name}"), initial);

        Self {
            recognizer,
            phase: cell("phase", GesturePhase::Undetermined.code()),
            previous_phase: cell("previous_phase", GesturePhase::Undetermined.code()),
            translation_x: cell("translation_x", 0.0),
            translation_y: cell("translation_y", 0.0),
            velocity_x: cell("velocity_x", 0.0),
            velocity_y: cell("velocity_y", 0.0),
            scale: cell("scale", 1.0),
            focal_x: cell("focal_x", 0.0),
            focal_y: cell("focal_y", 0.0),
            rotation: cell("rotation", 0.0),
            rotation_velocity: cell("rotation_velocity", 0.0),
            x: cell("x", 0.0),
            y: cell("y", 0.0),
            sample_seq: cell("sample_seq", 0.0),
            fresh: cell("fresh", 0.0),
        }
    }

    /// Write every field of `sample` and mark the cells fresh
    pub fn write(&self, graph: &mut Graph, sample: &GestureSample) {
        let previous = graph.get(self.phase);
        graph.set(self.previous_phase, previous);
        graph.set(self.phase, sample.phase.code());
        graph.set(self.translation_x, sample.translation_x);
        graph.set(self.translation_y, sample.translation_y);
        graph.set(self.velocity_x, sample.velocity_x);
        graph.set(self.velocity_y, sample.velocity_y);
        graph.set(self.scale, sample.scale);
        graph.set(self.focal_x, sample.focal_x);
        graph.set(self.focal_y, sample.focal_y);
        graph.set(self.rotation, sample.rotation);
        graph.set(self.rotation_velocity, sample.rotation_velocity);
        graph.set(self.x, sample.x);
        graph.set(self.y, sample.y);
        let seq = graph.get(self.sample_seq);
        graph.set(self.sample_seq, seq + 1.0);
        graph.set(self.fresh, 1.0);
    }

    pub fn current_phase(&self, graph: &Graph) -> GesturePhase {
        GesturePhase::from_code(graph.get(self.phase))
    }

    pub fn phase_is(&self, phase: GesturePhase) -> Node {
        read(self.phase).eq(phase.code())
    }

    pub fn is_active(&self) -> Node {
        self.phase_is(GesturePhase::Active)
    }

    pub fn has_ended(&self) -> Node {
        self.phase_is(GesturePhase::End)
    }

    pub fn has_began(&self) -> Node {
        self.phase_is(GesturePhase::Began)
    }

    /// Truthy only on the frame a tracking gesture was released
    ///
    /// Requires a fresh `End` sample following `Began` or `Active`, so a
    /// stale `End` left in the cells never re-triggers.
    pub fn released(&self) -> Node {
        let was_tracking = read(self.previous_phase)
            .eq(GesturePhase::Active.code())
            .or(read(self.previous_phase).eq(GesturePhase::Began.code()));
        read(self.fresh).and(self.has_ended()).and(was_tracking)
    }

    /// Truthy only on the frame a discrete tap completed
    pub fn tapped(&self) -> Node {
        read(self.fresh).and(self.has_ended())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_lands_all_fields() {
        let mut graph = Graph::new();
        let cells = GestureCells::new(&mut graph, Recognizer::Pinch);
        let sample = GestureSample::new(GesturePhase::Active)
            .with_scale(1.8)
            .with_focal(120.0, 300.0);

        cells.write(&mut graph, &sample);
        assert_eq!(cells.current_phase(&graph), GesturePhase::Active);
        assert_eq!(graph.get(cells.scale), 1.8);
        assert_eq!(graph.get(cells.focal_x), 120.0);
        assert_eq!(graph.get(cells.focal_y), 300.0);
        assert_eq!(graph.get(cells.sample_seq), 1.0);
        assert_eq!(graph.lookup("pinch.scale"), Ok(cells.scale));
    }

    #[test]
    fn test_released_needs_tracking_before_end() {
        let mut graph = Graph::new();
        let cells = GestureCells::new(&mut graph, Recognizer::ModalPan);

        cells.write(&mut graph, &GestureSample::new(GesturePhase::Active));
        assert_eq!(graph.eval(&cells.released()), 0.0);

        cells.write(&mut graph, &GestureSample::new(GesturePhase::End));
        assert_eq!(graph.eval(&cells.released()), 1.0);

        // A second End (duplicate delivery) is not a release
        cells.write(&mut graph, &GestureSample::new(GesturePhase::End));
        assert_eq!(graph.eval(&cells.released()), 0.0);
        assert_eq!(graph.eval(&cells.tapped()), 1.0);
    }
}
