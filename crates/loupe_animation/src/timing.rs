//! Fixed-duration eased animation

use loupe_core::{ClockId, Graph, Node};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::easing::Easing;
use crate::integrator::{ClockMode, IntegratorState};

/// Duration and curve of a timed animation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub duration_ms: f32,
    pub easing: Easing,
}

impl TimingConfig {
    pub fn new(duration_ms: f32, easing: Easing) -> Self {
        Self {
            duration_ms,
            easing,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::new(300.0, Easing::EaseInOut)
    }
}

/// Animate from `value` to `dest` over a fixed duration
///
/// Start and target are captured when the animation activates (its clock is
/// idle); `position = start + (target - start) * easing(elapsed / duration)`
/// afterwards. With [`ClockMode::Owned`] the clock is started on activation
/// and stopped once the duration elapses. A [`ClockMode::Shared`] timing
/// re-seeds whenever the clock is idle and leaves it to its owner.
pub fn timing(
    clock: ClockId,
    state: IntegratorState,
    config: TimingConfig,
    value: impl Into<Node>,
    dest: impl Into<Node>,
    mode: ClockMode,
) -> Node {
    let value = value.into();
    let dest = dest.into();

    Node::new(move |g| {
        if !g.is_running(clock) {
            let start = value.eval(g);
            let target = dest.eval(g);
            state.reset(g, start, 0.0, target);
            if mode == ClockMode::Owned {
                g.start_clock(clock);
            }
            trace!(start, target, duration = config.duration_ms, "timing start");
        }

        let elapsed = g.get(state.elapsed) + state.advance(g);
        g.set(state.elapsed, elapsed);

        let origin = g.get(state.origin);
        let target = g.get(state.target);
        if elapsed >= config.duration_ms {
            g.set(state.position, target);
            g.set(state.finished, 1.0);
            if mode == ClockMode::Owned {
                g.stop_clock(clock);
            }
        } else {
            let progress = config.easing.apply(elapsed / config.duration_ms);
            g.set(state.position, origin + (target - origin) * progress);
        }
        g.get(state.position)
    })
}

/// [`timing`] with freshly allocated integrator state
pub fn run_timing(
    graph: &mut Graph,
    clock: ClockId,
    value: impl Into<Node>,
    dest: impl Into<Node>,
    config: TimingConfig,
    mode: ClockMode,
) -> Node {
    let state = IntegratorState::new(graph);
    timing(clock, state, config, value, dest, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_core::{read, set, sequence};

    #[test]
    fn test_timing_reaches_target_at_duration() {
        let mut graph = Graph::new();
        let value = graph.cell(1.0);
        let clock = graph.clock();
        let config = TimingConfig::new(100.0, Easing::Linear);
        let node = run_timing(&mut graph, clock, read(value), 0.0, config, ClockMode::Owned);
        graph.attach(set(value, node));

        graph.tick(0.0);
        assert_eq!(graph.get(value), 1.0);

        graph.tick(50.0);
        assert!((graph.get(value) - 0.5).abs() < 1e-4);

        graph.tick(110.0);
        assert_eq!(graph.get(value), 0.0);
        assert!(!graph.is_running(clock));
    }

    #[test]
    fn test_timing_captures_target_on_activation() {
        let mut graph = Graph::new();
        let value = graph.cell(0.0);
        let dest = graph.cell(10.0);
        let clock = graph.clock();
        let config = TimingConfig::new(100.0, Easing::Linear);
        let node = run_timing(&mut graph, clock, read(value), read(dest), config, ClockMode::Owned);
        graph.attach(set(value, node));

        graph.tick(0.0);
        graph.set(dest, -50.0);
        graph.tick(50.0);
        assert!((graph.get(value) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_shared_clock_follows_owner() {
        let mut graph = Graph::new();
        let a = graph.cell(0.0);
        let b = graph.cell(0.0);
        let clock = graph.clock();
        let config = TimingConfig::new(100.0, Easing::Linear);

        let follower = run_timing(&mut graph, clock, read(b), 20.0, config, ClockMode::Shared);
        let owner = run_timing(&mut graph, clock, read(a), 10.0, config, ClockMode::Owned);
        graph.attach(sequence([set(b, follower), set(a, owner)]));

        graph.tick(0.0);
        graph.tick(50.0);
        assert!((graph.get(a) - 5.0).abs() < 1e-4);
        assert!((graph.get(b) - 10.0).abs() < 1e-4);

        graph.tick(110.0);
        assert_eq!(graph.get(a), 10.0);
        assert_eq!(graph.get(b), 20.0);
        assert!(!graph.is_running(clock));
    }

    #[test]
    fn test_zero_duration_finishes_immediately() {
        let mut graph = Graph::new();
        let value = graph.cell(3.0);
        let clock = graph.clock();
        let node = run_timing(
            &mut graph,
            clock,
            read(value),
            7.0,
            TimingConfig::new(0.0, Easing::Linear),
            ClockMode::Owned,
        );
        graph.attach(set(value, node));

        graph.tick(0.0);
        assert_eq!(graph.get(value), 7.0);
        assert!(!graph.is_running(clock));
    }
}
