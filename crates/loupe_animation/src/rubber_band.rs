//! Rubber-band combinators
//!
//! [`bouncy`] drives a translation that follows the finger with resistance
//! past its bounds, coasts on release and snaps back inside. [`bouncy_pinch`]
//! does the same for a pinch scale while keeping the pinch focal point fixed
//! on screen.

use loupe_core::{
    clock_running, derive, read, select, sequence, set, stop_clock, CellId, ClockId, Graph, Node,
};
use serde::{Deserialize, Serialize};

use crate::decay::{run_decay, DecayConfig, DECAY_REST_VELOCITY};
use crate::diff::{scale_diff, speed};
use crate::integrator::ClockMode;
use crate::timing::{run_timing, TimingConfig};

/// Strongest drag resistance past a bound
pub const MAX_FRICTION: f32 = 5.0;
/// Overshoot at which drag resistance saturates
pub const MAX_FRICTION_DISTANCE: f32 = 100.0;

/// Strongest pinch resistance past a scale bound
pub const MAX_SCALE_FRICTION: f32 = 20.0;
/// Scale overshoot at which pinch resistance saturates
pub const MAX_SCALE_OVERSHOOT: f32 = 0.5;

pub const MIN_SCALE: f32 = 1.0;
pub const MAX_SCALE: f32 = 2.0;

/// Drag resistance for an overshoot distance: `1` at the bound, rising
/// linearly to [`MAX_FRICTION`] at [`MAX_FRICTION_DISTANCE`]
pub fn friction_coefficient(distance: f32) -> f32 {
    (1.0 + distance * (MAX_FRICTION - 1.0) / MAX_FRICTION_DISTANCE).clamp(1.0, MAX_FRICTION)
}

/// [`friction_coefficient`] as a node
pub fn friction(distance: impl Into<Node>) -> Node {
    distance.into().map(friction_coefficient)
}

/// Nearest scale inside `[MIN_SCALE, MAX_SCALE]`
pub fn scale_rest_value(scale: f32) -> f32 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

pub fn scale_rest(scale: impl Into<Node>) -> Node {
    scale.into().map(scale_rest_value)
}

/// Apply a pinch ratio `delta` to `value`, resisting past the rest scale
///
/// Outside the bounds the ratio's effect is divided by a friction that grows
/// linearly from `1` with the overshoot, reaching [`MAX_SCALE_FRICTION`] at
/// [`MAX_SCALE_OVERSHOOT`].
pub fn scale_friction_value(value: f32, rest: f32, delta: f32) -> f32 {
    let how_far = (rest - value).abs();
    let friction = (1.0 + how_far * (MAX_SCALE_FRICTION - 1.0) / MAX_SCALE_OVERSHOOT)
        .clamp(1.0, MAX_SCALE_FRICTION);
    if how_far > 0.0 {
        value * (1.0 + (delta - 1.0) / friction)
    } else {
        value * delta
    }
}

pub fn scale_friction(
    value: impl Into<Node>,
    rest: impl Into<Node>,
    delta: impl Into<Node>,
) -> Node {
    derive([value.into(), rest.into(), delta.into()], |v| {
        scale_friction_value(v[0], v[1], v[2])
    })
}

/// Release behavior shared by the rubber-band combinators
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BouncyConfig {
    /// Snap back inside the bounds
    pub snap: TimingConfig,
    /// Coast after a fling
    pub decay: DecayConfig,
    /// Release speed (units/s) above which the value coasts
    pub fling_velocity: f32,
}

impl Default for BouncyConfig {
    fn default() -> Self {
        Self {
            snap: TimingConfig::default(),
            decay: DecayConfig::default(),
            fling_velocity: DECAY_REST_VELOCITY,
        }
    }
}

/// Clocks driving a [`bouncy`] value after release
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BouncyClocks {
    /// Snap back inside the bounds
    pub snap: ClockId,
    /// Coast after a fling
    pub coast: ClockId,
}

impl BouncyClocks {
    pub fn new(graph: &mut Graph) -> Self {
        Self {
            snap: graph.clock(),
            coast: graph.clock(),
        }
    }

    /// Cancel any release animation
    pub fn stop(&self) -> Node {
        sequence([stop_clock(self.snap), stop_clock(self.coast)])
    }
}

/// Rubber-banded translation of `value` between `lower` and `upper`
///
/// Evaluate exactly once per frame and write the result into `value`:
///
/// - while `gesture_active`, both clocks stop and the value follows
///   `gesture_delta` divided by `friction(overshoot)`
/// - otherwise, if snapping or out of bounds, coasting stops and the value
///   snaps to the nearest bound
/// - otherwise, if coasting or moving faster than the fling velocity, the
///   value coasts
/// - otherwise it is returned unchanged
#[allow(clippy::too_many_arguments)]
pub fn bouncy<F>(
    graph: &mut Graph,
    clocks: BouncyClocks,
    value: CellId,
    gesture_delta: impl Into<Node>,
    gesture_active: impl Into<Node>,
    lower: impl Into<Node>,
    upper: impl Into<Node>,
    friction: F,
    config: &BouncyConfig,
) -> Node
where
    F: Fn(Node) -> Node,
{
    let gesture_delta = gesture_delta.into();
    let lower = lower.into();
    let upper = upper.into();

    let timing_clock = clocks.snap;
    let decay_clock = clocks.coast;

    let velocity = speed(graph, read(value));
    let rest = read(value).clamp(lower.clone(), upper.clone());
    let out_of_bounds = read(value).lt(lower).or(read(value).gt(upper));
    let overshoot = (rest.clone() - read(value)).abs();

    let snap = run_timing(
        graph,
        timing_clock,
        read(value),
        rest,
        config.snap,
        ClockMode::Owned,
    );
    let coast = run_decay(graph, decay_clock, read(value), velocity.clone(), config.decay);

    sequence([
        gesture_delta.clone(),
        velocity.clone(),
        select(
            gesture_active,
            sequence([
                stop_clock(timing_clock),
                stop_clock(decay_clock),
                read(value) + gesture_delta / friction(overshoot),
            ]),
            select(
                clock_running(timing_clock).or(out_of_bounds),
                sequence([stop_clock(decay_clock), snap]),
                select(
                    clock_running(decay_clock).or(velocity.abs().gt(config.fling_velocity)),
                    coast,
                    read(value),
                ),
            ),
        ),
    ])
}

/// Focal point of a pinch, in the pinched content's own frame
#[derive(Clone, Debug)]
pub struct PinchFocal {
    /// Focal coordinate relative to the content origin
    pub focal: Node,
    /// Translation that keeps the focal point fixed while scaling
    pub displacement: CellId,
}

/// Rubber-banded pinch scale of `value`
///
/// While `gesture_active` the scale follows the per-frame pinch ratio with
/// [`scale_friction`] past `[MIN_SCALE, MAX_SCALE]`, and each focal
/// displacement shifts by `-focal * (next / value - 1)` so the point under
/// the fingers stays put. After release the scale and both displacements
/// ease back on one shared clock: the scale to its rest value and the
/// displacements to where that rest scale leaves the focal point. Evaluate
/// once per frame and write the result into `value`.
#[allow(clippy::too_many_arguments)]
pub fn bouncy_pinch(
    graph: &mut Graph,
    clock: ClockId,
    value: CellId,
    gesture_scale: impl Into<Node>,
    gesture_active: impl Into<Node>,
    x: PinchFocal,
    y: PinchFocal,
    config: &BouncyConfig,
) -> Node {
    let delta = scale_diff(graph, gesture_scale);
    let rest = scale_rest(read(value));
    let next = graph.cell(1.0);

    let focal_rest = |axis: &PinchFocal| {
        select(
            read(value).lt(1.0),
            0.0,
            read(axis.displacement) - axis.focal.clone() * (rest.clone() / read(value) - 1.0),
        )
    };
    let follow = |axis: &PinchFocal| {
        set(
            axis.displacement,
            read(axis.displacement) - axis.focal.clone() * (read(next) / read(value) - 1.0),
        )
    };

    let snap_x = run_timing(
        graph,
        clock,
        read(x.displacement),
        focal_rest(&x),
        config.snap,
        ClockMode::Shared,
    );
    let snap_y = run_timing(
        graph,
        clock,
        read(y.displacement),
        focal_rest(&y),
        config.snap,
        ClockMode::Shared,
    );
    let snap_scale = run_timing(
        graph,
        clock,
        read(value),
        rest.clone(),
        config.snap,
        ClockMode::Owned,
    );

    select(
        sequence([delta.clone(), gesture_active.into()]),
        sequence([
            stop_clock(clock),
            set(next, scale_friction(read(value), rest.clone(), delta)),
            follow(&x),
            follow(&y),
            read(next),
        ]),
        select(
            clock_running(clock).or(rest.ne(read(value))),
            sequence([
                set(x.displacement, snap_x),
                set(y.displacement, snap_y),
                snap_scale,
            ]),
            read(value),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_core::lit;

    #[test]
    fn test_friction_is_monotonic_and_capped() {
        let mut last = friction_coefficient(0.0);
        assert_eq!(last, 1.0);
        for d in 1..300 {
            let f = friction_coefficient(d as f32);
            assert!(f >= last);
            last = f;
        }
        assert_eq!(friction_coefficient(100.0), MAX_FRICTION);
        assert_eq!(friction_coefficient(1_000.0), MAX_FRICTION);
        assert_eq!(friction_coefficient(-10.0), 1.0);
    }

    #[test]
    fn test_scale_friction_inside_bounds_is_plain_product() {
        assert!((scale_friction_value(1.5, 1.5, 1.2) - 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_scale_friction_resists_past_bounds() {
        let free = 2.2 * 1.1;
        let resisted = scale_friction_value(2.2, 2.0, 1.1);
        assert!(resisted > 2.2 && resisted < free);
    }

    #[test]
    fn test_scale_friction_never_amplifies() {
        // Just past the bound the pinch is barely resisted, never boosted
        let next = scale_friction_value(2.001, 2.0, 1.1);
        assert!(next <= 2.001 * 1.1 + 1e-5);
        assert!(next > 2.001);
    }

    #[test]
    fn test_scale_rest_clamps() {
        assert_eq!(scale_rest_value(0.6), MIN_SCALE);
        assert_eq!(scale_rest_value(1.4), 1.4);
        assert_eq!(scale_rest_value(3.0), MAX_SCALE);
    }

    fn bouncy_fixture(initial: f32) -> (Graph, CellId, CellId, CellId) {
        let mut graph = Graph::new();
        let value = graph.cell(initial);
        let delta = graph.cell(0.0);
        let active = graph.cell(0.0);
        let clocks = BouncyClocks::new(&mut graph);
        let node = bouncy(
            &mut graph,
            clocks,
            value,
            read(delta),
            read(active),
            lit(-100.0),
            lit(0.0),
            friction,
            &BouncyConfig::default(),
        );
        graph.attach(set(value, node));
        (graph, value, delta, active)
    }

    #[test]
    fn test_bouncy_is_identity_at_rest() {
        let (mut graph, value, _, _) = bouncy_fixture(-40.0);
        for frame in 0..30 {
            graph.tick(frame as f64 * 16.0);
            assert_eq!(graph.get(value), -40.0);
        }
    }

    #[test]
    fn test_bouncy_follows_gesture_in_bounds() {
        let (mut graph, value, delta, active) = bouncy_fixture(-50.0);
        graph.set(active, 1.0);
        graph.set(delta, 10.0);
        graph.tick(0.0);
        assert_eq!(graph.get(value), -40.0);
    }

    #[test]
    fn test_bouncy_resists_and_snaps_back() {
        let (mut graph, value, delta, active) = bouncy_fixture(0.0);
        graph.set(active, 1.0);
        graph.set(delta, 50.0);
        graph.tick(0.0);
        let first = graph.get(value);
        assert_eq!(first, 50.0, "no overshoot yet, so no resistance");

        graph.tick(16.0);
        let second = graph.get(value);
        assert!(second - first < 50.0, "resisted past the bound");

        graph.set(active, 0.0);
        graph.set(delta, 0.0);
        let mut t = 16.0;
        for _ in 0..60 {
            t += 16.0;
            graph.tick(t);
        }
        assert!(graph.get(value).abs() < 1e-3, "snapped to the upper bound");
    }

    #[test]
    fn test_bouncy_drag_increment_shrinks_with_overshoot() {
        let raw = 10.0;
        let mut last = f32::INFINITY;
        for overshoot in [0.0, 10.0, 50.0, 200.0, 10_000.0] {
            let (mut graph, value, delta, active) = bouncy_fixture(overshoot);
            graph.set(active, 1.0);
            graph.set(delta, raw);
            graph.tick(0.0);

            let applied = graph.get(value) - overshoot;
            assert!(applied <= last, "increment grew at overshoot {}", overshoot);
            assert!(applied >= raw / MAX_FRICTION - 1e-4, "beyond the 5x cap at {}", overshoot);
            last = applied;
        }
        assert_eq!(last, raw / MAX_FRICTION);
    }

    #[test]
    fn test_bouncy_pinch_ratio_shrinks_with_overshoot() {
        let raw = 1.1_f32;
        let mut last = f32::INFINITY;
        for overshoot in [0.0, 0.05, 0.2, 0.5, 5.0] {
            let mut graph = Graph::new();
            let start = MAX_SCALE + overshoot;
            let scale = graph.cell(start);
            let gesture = graph.cell(raw);
            let focal = |graph: &mut Graph| PinchFocal {
                focal: lit(0.0),
                displacement: graph.cell(0.0),
            };
            let (x, y) = (focal(&mut graph), focal(&mut graph));
            let clock = graph.clock();
            let node = bouncy_pinch(
                &mut graph,
                clock,
                scale,
                read(gesture),
                lit(1.0),
                x,
                y,
                &BouncyConfig::default(),
            );
            graph.attach(set(scale, node));
            graph.tick(0.0);

            let applied = graph.get(scale) / start - 1.0;
            assert!(applied <= last + 1e-6, "ratio grew at overshoot {}", overshoot);
            assert!(
                applied >= (raw - 1.0) / MAX_SCALE_FRICTION - 1e-5,
                "beyond the friction cap at {}",
                overshoot
            );
            last = applied;
        }
    }

    #[test]
    fn test_bouncy_pinch_keeps_focal_point() {
        let mut graph = Graph::new();
        let scale = graph.cell(1.0);
        let gesture = graph.cell(1.0);
        let active = graph.cell(1.0);
        let disp_x = graph.cell(0.0);
        let disp_y = graph.cell(0.0);
        let clock = graph.clock();

        let focal_x = 100.0;
        let x = PinchFocal {
            focal: lit(focal_x) - read(disp_x),
            displacement: disp_x,
        };
        let y = PinchFocal {
            focal: lit(0.0) - read(disp_y),
            displacement: disp_y,
        };
        let node = bouncy_pinch(
            &mut graph,
            clock,
            scale,
            read(gesture),
            read(active),
            x,
            y,
            &BouncyConfig::default(),
        );
        graph.attach(set(scale, node));

        let mut t = 0.0;
        for s in [1.0, 1.25, 1.5, 1.75] {
            graph.set(gesture, s);
            graph.tick(t);
            t += 16.0;

            // The content point first under the fingers stays there
            let s_now = graph.get(scale);
            let d = graph.get(disp_x);
            assert!((s_now * focal_x + d - focal_x).abs() < 1e-3, "focal moved at scale {}", s_now);
        }
        assert!((graph.get(scale) - 1.75).abs() < 1e-5);
        assert_eq!(graph.get(disp_y), 0.0);
    }
}
