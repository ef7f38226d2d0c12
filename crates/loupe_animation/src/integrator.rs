//! Integrator state shared by the graph-driven animations
//!
//! Every animation keeps its progress in ordinary graph cells so a host can
//! read it like any other value. A `time` of `0.0` means "not yet stepped":
//! the first evaluation after activation advances by zero milliseconds.

use loupe_core::{CellId, Graph};

/// Largest frame delta an integrator will advance by, in milliseconds
///
/// Hitches longer than this (a backgrounded app, a debugger pause) advance
/// the animation by one capped step instead of jumping to the end.
pub const MAX_FRAME_DELTA_MS: f32 = 64.0;

/// Whether a timed animation starts and stops its clock itself
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockMode {
    /// Starts the clock on activation and stops it when finished
    #[default]
    Owned,
    /// Follows a clock started and stopped by a sibling animation
    Shared,
}

/// Cells holding one integrator's progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntegratorState {
    /// `1.0` once the animation reached its target
    pub finished: CellId,
    pub position: CellId,
    /// Units per second
    pub velocity: CellId,
    /// Timeline position of the last step, `0.0` before the first
    pub time: CellId,
    pub target: CellId,
    /// Milliseconds advanced since activation
    pub elapsed: CellId,
    /// Position at activation
    pub origin: CellId,
}

impl IntegratorState {
    pub fn new(graph: &mut Graph) -> Self {
        Self {
            finished: graph.cell(0.0),
            position: graph.cell(0.0),
            velocity: graph.cell(0.0),
            time: graph.cell(0.0),
            target: graph.cell(0.0),
            elapsed: graph.cell(0.0),
            origin: graph.cell(0.0),
        }
    }

    /// Seed the state for a fresh run
    pub fn reset(&self, graph: &mut Graph, position: f32, velocity: f32, target: f32) {
        graph.set(self.finished, 0.0);
        graph.set(self.position, position);
        graph.set(self.velocity, velocity);
        graph.set(self.time, 0.0);
        graph.set(self.target, target);
        graph.set(self.elapsed, 0.0);
        graph.set(self.origin, position);
    }

    pub fn is_finished(&self, graph: &Graph) -> bool {
        graph.get(self.finished) != 0.0
    }

    /// Milliseconds to advance this frame, recording the current time
    pub(crate) fn advance(&self, graph: &mut Graph) -> f32 {
        let last = graph.get(self.time);
        let now = graph.now();
        graph.set(self.time, now);
        if last <= 0.0 {
            0.0
        } else {
            (now - last).clamp(0.0, MAX_FRAME_DELTA_MS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_advance_is_zero() {
        let mut graph = Graph::new();
        let state = IntegratorState::new(&mut graph);

        graph.tick(0.0);
        assert_eq!(state.advance(&mut graph), 0.0);

        graph.tick(16.0);
        assert!((state.advance(&mut graph) - 16.0).abs() < 1e-3);
    }

    #[test]
    fn test_advance_is_capped() {
        let mut graph = Graph::new();
        let state = IntegratorState::new(&mut graph);

        graph.tick(0.0);
        state.advance(&mut graph);
        graph.tick(5_000.0);
        assert_eq!(state.advance(&mut graph), MAX_FRAME_DELTA_MS);
    }

    #[test]
    fn test_reset_seeds_origin() {
        let mut graph = Graph::new();
        let state = IntegratorState::new(&mut graph);
        graph.set(state.finished, 1.0);

        state.reset(&mut graph, 3.0, 10.0, 7.0);
        assert!(!state.is_finished(&graph));
        assert_eq!(graph.get(state.origin), 3.0);
        assert_eq!(graph.get(state.target), 7.0);
        assert_eq!(graph.get(state.time), 0.0);
    }
}
