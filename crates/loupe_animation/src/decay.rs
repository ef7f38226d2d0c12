//! Velocity decay (momentum coasting)

use loupe_core::{ClockId, Graph, Node};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::integrator::IntegratorState;

/// Speed (units/s) below which a decay comes to rest
pub const DECAY_REST_VELOCITY: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Fraction of velocity kept per millisecond
    pub deceleration: f32,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self { deceleration: 0.99 }
    }
}

/// Coast `value` from `velocity`, decaying exponentially until nearly still
///
/// Velocity decays as `v * deceleration^dt_ms` and the position advances by
/// the closed-form integral over the frame. The position is re-read from
/// `value` on every frame so an outside write is picked up. Stops the clock
/// once the speed drops under [`DECAY_REST_VELOCITY`].
pub fn decay(
    clock: ClockId,
    state: IntegratorState,
    config: DecayConfig,
    value: impl Into<Node>,
    velocity: impl Into<Node>,
) -> Node {
    let value = value.into();
    let velocity = velocity.into();

    Node::new(move |g| {
        let position = value.eval(g);
        if !g.is_running(clock) {
            let velocity = velocity.eval(g);
            state.reset(g, position, velocity, 0.0);
            g.start_clock(clock);
            trace!(position, velocity, "decay start");
        }
        g.set(state.position, position);

        let dt = state.advance(g);
        let decel = config.deceleration;
        let kv = decel.powf(dt);
        let kx = if (1.0 - decel).abs() < f32::EPSILON {
            dt
        } else {
            decel * (1.0 - kv) / (1.0 - decel)
        };

        let v0 = g.get(state.velocity) / 1000.0;
        let v = v0 * kv * 1000.0;
        let x = position + v0 * kx;
        g.set(state.velocity, v);
        g.set(state.position, x);

        if v.abs() < DECAY_REST_VELOCITY {
            g.set(state.finished, 1.0);
            g.stop_clock(clock);
        }
        g.get(state.position)
    })
}

/// [`decay`] with freshly allocated integrator state
pub fn run_decay(
    graph: &mut Graph,
    clock: ClockId,
    value: impl Into<Node>,
    velocity: impl Into<Node>,
    config: DecayConfig,
) -> Node {
    let state = IntegratorState::new(graph);
    decay(clock, state, config, value, velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_core::{read, set};

    #[test]
    fn test_decay_coasts_in_velocity_direction() {
        let mut graph = Graph::new();
        let value = graph.cell(0.0);
        let clock = graph.clock();
        let node = run_decay(&mut graph, clock, read(value), 1000.0, DecayConfig::default());
        graph.attach(set(value, node));

        graph.tick(0.0);
        assert_eq!(graph.get(value), 0.0);

        let mut t = 0.0;
        let mut last = 0.0;
        while graph.is_running(clock) && t < 10_000.0 {
            t += 16.0;
            graph.tick(t);
            let now = graph.get(value);
            assert!(now >= last);
            last = now;
        }

        assert!(!graph.is_running(clock));
        // Closed form limit: v0 * decel / (1 - decel) = 1.0 * 0.99 / 0.01
        assert!(last > 90.0 && last < 99.0, "coasted to {}", last);
    }

    #[test]
    fn test_slow_decay_stops_on_activation() {
        let mut graph = Graph::new();
        let value = graph.cell(4.0);
        let clock = graph.clock();
        let node = run_decay(&mut graph, clock, read(value), 2.0, DecayConfig::default());
        graph.attach(set(value, node));

        graph.tick(0.0);
        assert_eq!(graph.get(value), 4.0);
        assert!(!graph.is_running(clock));
    }
}
