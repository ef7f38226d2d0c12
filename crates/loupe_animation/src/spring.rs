//! Spring integrators
//!
//! [`Spring`] steps a damped oscillator over plain floats; [`spring`] and
//! [`run_spring`] drive one from graph cells and a clock, seeding it from
//! the live value whenever the clock is idle.

use loupe_core::{ClockId, Graph, Node};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::integrator::IntegratorState;

/// Damped harmonic oscillator parameters
///
/// Rest thresholds decide when a spring counts as settled; the defaults
/// (0.01) suit unit-range quantities such as modal progress and scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
    /// Snap to the target instead of crossing it
    pub overshoot_clamping: bool,
    /// Below this speed (units/s) the spring may settle
    pub rest_speed_threshold: f32,
    /// Within this distance of the target the spring may settle
    pub rest_displacement_threshold: f32,
}

impl SpringConfig {
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
            overshoot_clamping: false,
            rest_speed_threshold: 0.01,
            rest_displacement_threshold: 0.01,
        }
    }

    /// The gallery's base spring: modal open, zoom and snap-back
    pub fn gentle() -> Self {
        Self::new(120.0, 14.0, 1.0)
    }

    /// Visible bounce
    pub fn wobbly() -> Self {
        Self::new(180.0, 12.0, 1.0)
    }

    pub fn stiff() -> Self {
        Self::new(400.0, 30.0, 1.0)
    }

    pub fn snappy() -> Self {
        Self::new(600.0, 40.0, 1.0)
    }

    /// Critically damped and slow
    pub fn molasses() -> Self {
        Self::new(100.0, 20.0, 1.0)
    }

    pub fn with_overshoot_clamping(mut self, clamp: bool) -> Self {
        self.overshoot_clamping = clamp;
        self
    }

    pub fn with_rest_thresholds(mut self, speed: f32, displacement: f32) -> Self {
        self.rest_speed_threshold = speed;
        self.rest_displacement_threshold = displacement;
        self
    }

    /// Damping at which the spring stops oscillating, `2 * sqrt(k * m)`
    pub fn critical_damping(&self) -> f32 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    /// Damping ratio; below 1 the spring oscillates around its target
    pub fn damping_ratio(&self) -> f32 {
        let critical = self.critical_damping();
        if critical > 0.0 {
            self.damping / critical
        } else {
            0.0
        }
    }

    pub fn is_underdamped(&self) -> bool {
        self.damping_ratio() < 1.0
    }

    pub fn is_critically_damped(&self) -> bool {
        (self.damping - self.critical_damping()).abs() < 0.01
    }

    pub fn is_overdamped(&self) -> bool {
        self.damping_ratio() > 1.0
    }

    /// Acceleration at displacement `offset` from the target moving at `speed`
    fn acceleration(&self, offset: f32, speed: f32) -> f32 {
        (-self.stiffness * offset - self.damping * speed) / self.mass
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::stiff()
    }
}

/// Standalone spring simulator over plain floats
///
/// The graph integrators rebuild one of these from their cells every frame,
/// step it, and write the result back.
#[derive(Clone, Copy, Debug)]
pub struct Spring {
    config: SpringConfig,
    value: f32,
    velocity: f32,
    target: f32,
}

impl Spring {
    /// A spring at rest on `initial`
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self::from_state(config, initial, 0.0, initial)
    }

    /// Resume a spring from an existing position and velocity
    pub fn from_state(config: SpringConfig, value: f32, velocity: f32, target: f32) -> Self {
        Self {
            config,
            value,
            velocity,
            target,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Move the target; the current velocity carries over
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn is_settled(&self) -> bool {
        (self.value - self.target).abs() < self.config.rest_displacement_threshold
            && self.velocity.abs() < self.config.rest_speed_threshold
    }

    /// Advance by `dt` seconds (fourth-order Runge-Kutta)
    ///
    /// A settled spring snaps onto its target. With overshoot clamping, a
    /// step that would cross the target lands on it instead.
    pub fn step(&mut self, dt: f32) {
        if dt > 0.0 && !self.is_settled() {
            let offset = self.value - self.target;
            let (d_offset, d_velocity) = self.rk4(offset, dt);
            self.value += d_offset;
            self.velocity += d_velocity;

            let crossed = offset * (self.value - self.target) < 0.0;
            if self.config.overshoot_clamping && crossed {
                self.rest();
            }
        }
        if self.is_settled() {
            self.rest();
        }
    }

    /// Position and velocity increments over one step of length `dt`
    fn rk4(&self, offset: f32, dt: f32) -> (f32, f32) {
        let config = &self.config;
        let slope = |x: f32, v: f32| (v, config.acceleration(x, v));

        let (a_x, a_v) = slope(offset, self.velocity);
        let (b_x, b_v) = slope(offset + a_x * dt / 2.0, self.velocity + a_v * dt / 2.0);
        let (c_x, c_v) = slope(offset + b_x * dt / 2.0, self.velocity + b_v * dt / 2.0);
        let (d_x, d_v) = slope(offset + c_x * dt, self.velocity + c_v * dt);

        (
            dt / 6.0 * (a_x + 2.0 * (b_x + c_x) + d_x),
            dt / 6.0 * (a_v + 2.0 * (b_v + c_v) + d_v),
        )
    }

    fn rest(&mut self) {
        self.value = self.target;
        self.velocity = 0.0;
    }
}

// =============================================================================
// Graph integration
// =============================================================================

/// Spring an animated quantity towards `dest` on `clock`
///
/// When the clock is idle the integrator is seeded from `value` and
/// `velocity`, the target is captured from `dest` and the clock starts. Each
/// evaluation then advances by the frame delta; the activation frame advances
/// by zero. Once settled the state is marked finished and the clock stops.
/// Evaluates to the live position.
pub fn spring(
    clock: ClockId,
    state: IntegratorState,
    config: SpringConfig,
    value: impl Into<Node>,
    velocity: impl Into<Node>,
    dest: impl Into<Node>,
) -> Node {
    let value = value.into();
    let velocity = velocity.into();
    let dest = dest.into();

    Node::new(move |g| {
        if !g.is_running(clock) {
            let position = value.eval(g);
            let velocity = velocity.eval(g);
            let target = dest.eval(g);
            state.reset(g, position, velocity, target);
            g.start_clock(clock);
            trace!(position, velocity, target, "spring start");
        }
        step_spring(g, clock, state, config)
    })
}

/// [`spring`] with freshly allocated integrator state
pub fn run_spring(
    graph: &mut Graph,
    clock: ClockId,
    value: impl Into<Node>,
    velocity: impl Into<Node>,
    dest: impl Into<Node>,
    config: SpringConfig,
) -> Node {
    let state = IntegratorState::new(graph);
    spring(clock, state, config, value, velocity, dest)
}

fn step_spring(
    g: &mut Graph,
    clock: ClockId,
    state: IntegratorState,
    config: SpringConfig,
) -> f32 {
    let dt_ms = state.advance(g);
    let mut sim = Spring::from_state(
        config,
        g.get(state.position),
        g.get(state.velocity),
        g.get(state.target),
    );
    sim.step(dt_ms / 1000.0);
    g.set(state.position, sim.value());
    g.set(state.velocity, sim.velocity());

    if sim.is_settled() {
        g.set(state.finished, 1.0);
        g.stop_clock(clock);
    }
    g.get(state.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_core::{read, set};

    fn settle(spring: &mut Spring, frames: usize) -> usize {
        (0..frames)
            .position(|_| {
                spring.step(1.0 / 60.0);
                spring.is_settled()
            })
            .map_or(frames, |i| i + 1)
    }

    #[test]
    fn test_base_spring_settles_on_unit_progress() {
        let mut spring = Spring::new(SpringConfig::gentle(), 0.0);
        spring.set_target(1.0);

        let frames = settle(&mut spring, 240);
        assert!(frames < 240, "settled after {} frames", frames);
        assert_eq!(spring.value(), 1.0);
        assert_eq!(spring.velocity(), 0.0);
    }

    #[test]
    fn test_retarget_keeps_momentum() {
        let mut spring = Spring::new(SpringConfig::wobbly(), 1.0);
        spring.set_target(2.0);
        for _ in 0..6 {
            spring.step(1.0 / 60.0);
        }
        let moving = spring.velocity();
        assert!(moving > 0.0);

        spring.set_target(1.0);
        assert_eq!(spring.velocity(), moving);
        spring.step(1.0 / 60.0);
        assert!(spring.value() > 1.0, "still travelling towards the old target");
    }

    #[test]
    fn test_damping_classes() {
        assert!(SpringConfig::gentle().is_underdamped());
        assert!(SpringConfig::wobbly().damping_ratio() < SpringConfig::gentle().damping_ratio());
        assert!(SpringConfig::molasses().is_critically_damped());
        assert!(SpringConfig::new(100.0, 40.0, 1.0).is_overdamped());
    }

    #[test]
    fn test_large_steps_stay_bounded() {
        let mut spring = Spring::new(SpringConfig::snappy(), 0.0);
        spring.set_target(300.0);

        for _ in 0..60 {
            spring.step(0.064);
            assert!(spring.value().is_finite());
            assert!(spring.value() > -300.0 && spring.value() < 600.0);
        }
    }

    #[test]
    fn test_zero_step_is_a_no_op() {
        let mut spring = Spring::from_state(SpringConfig::gentle(), 0.5, 2.0, 1.0);
        spring.step(0.0);
        assert_eq!(spring.value(), 0.5);
        assert_eq!(spring.velocity(), 2.0);
    }

    #[test]
    fn test_overshoot_clamping_never_crosses_target() {
        let config = SpringConfig::wobbly().with_overshoot_clamping(true);
        let mut spring = Spring::new(config, 0.0);
        spring.set_target(1.0);

        for _ in 0..120 {
            spring.step(1.0 / 60.0);
            assert!(spring.value() <= 1.0);
        }
        assert!(spring.is_settled());
    }

    #[test]
    fn test_graph_spring_runs_and_stops_clock() {
        let mut graph = Graph::new();
        let value = graph.cell(0.0);
        let clock = graph.clock();
        let node = run_spring(&mut graph, clock, read(value), 0.0, 1.0, SpringConfig::gentle());
        graph.attach(set(value, node));

        graph.tick(0.0);
        assert_eq!(graph.get(value), 0.0, "activation frame does not move");
        assert!(graph.is_running(clock));

        let mut t = 0.0;
        while graph.is_running(clock) && t < 5_000.0 {
            t += 16.0;
            graph.tick(t);
        }
        assert!(!graph.is_running(clock));
        assert_eq!(graph.get(value), 1.0);
    }

    #[test]
    fn test_graph_spring_seeds_velocity() {
        let mut graph = Graph::new();
        let value = graph.cell(0.0);
        let clock = graph.clock();
        let state = IntegratorState::new(&mut graph);
        let node = spring(clock, state, SpringConfig::gentle(), read(value), 5.0, 0.0);
        graph.attach(set(value, node));

        graph.tick(0.0);
        graph.tick(16.0);
        assert!(graph.get(value) > 0.0, "initial velocity carries the value forward");
    }
}
