//! One-shot springs on a single animated value
//!
//! A [`SpringValue`] owns a value cell and a clock, and offers two guarded
//! springs over them: [`SpringValue::spring_to`] runs forward once and
//! [`SpringValue::spring_back`] runs back once. Each guard moves
//! `Idle → Running → Done` and stays `Done` until [`SpringValue::reset`].

use loupe_core::{
    clock_running, read, select, sequence, set, stop_clock, when, CellId, ClockId, Graph, Node,
};

use crate::integrator::IntegratorState;
use crate::spring::{spring, SpringConfig};

/// Progress of one guarded spring
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpringPhase {
    #[default]
    Idle,
    Running,
    Done,
}

impl SpringPhase {
    /// Numeric encoding stored in a guard cell
    pub fn code(self) -> f32 {
        match self {
            SpringPhase::Idle => 0.0,
            SpringPhase::Running => 1.0,
            SpringPhase::Done => 2.0,
        }
    }

    pub fn from_code(code: f32) -> Self {
        if code >= 2.0 {
            SpringPhase::Done
        } else if code >= 1.0 {
            SpringPhase::Running
        } else {
            SpringPhase::Idle
        }
    }
}

/// A value animated by guarded one-shot springs
#[derive(Clone, Copy, Debug)]
pub struct SpringValue {
    pub value: CellId,
    pub clock: ClockId,
    forward: CellId,
    back: CellId,
    forward_state: IntegratorState,
    back_state: IntegratorState,
    config: SpringConfig,
}

impl SpringValue {
    pub fn new(graph: &mut Graph, initial: f32, config: SpringConfig) -> Self {
        Self {
            value: graph.cell(initial),
            clock: graph.clock(),
            forward: graph.cell(SpringPhase::Idle.code()),
            back: graph.cell(SpringPhase::Idle.code()),
            forward_state: IntegratorState::new(graph),
            back_state: IntegratorState::new(graph),
            config,
        }
    }

    /// Spring forward to `to` once, starting from the current value at rest
    pub fn spring_to(&self, to: impl Into<Node>) -> Node {
        self.spring_to_with_velocity(to, 0.0)
    }

    pub fn spring_to_with_velocity(&self, to: impl Into<Node>, velocity: impl Into<Node>) -> Node {
        self.once(self.forward, self.forward_state, to.into(), velocity.into())
    }

    /// Spring back to `to` once
    ///
    /// Marks the forward spring done first, so a pending or running forward
    /// spring will not fire again until [`SpringValue::reset`].
    pub fn spring_back(&self, to: impl Into<Node>) -> Node {
        self.spring_back_with_velocity(to, 0.0)
    }

    pub fn spring_back_with_velocity(
        &self,
        to: impl Into<Node>,
        velocity: impl Into<Node>,
    ) -> Node {
        let done = SpringPhase::Done.code();
        sequence([
            when(
                read(self.forward).ne(done),
                sequence([stop_clock(self.clock), set(self.forward, done)]),
            ),
            self.once(self.back, self.back_state, to.into(), velocity.into()),
        ])
    }

    /// Stop any running spring and re-arm both guards
    pub fn reset(&self) -> Node {
        sequence([
            stop_clock(self.clock),
            set(self.forward, SpringPhase::Idle.code()),
            set(self.back, SpringPhase::Idle.code()),
        ])
    }

    /// Re-arm both guards and jump to `value` without animating
    pub fn snap(&self, value: impl Into<Node>) -> Node {
        sequence([self.reset(), set(self.value, value)])
    }

    pub fn forward_phase(&self, graph: &Graph) -> SpringPhase {
        SpringPhase::from_code(graph.get(self.forward))
    }

    pub fn back_phase(&self, graph: &Graph) -> SpringPhase {
        SpringPhase::from_code(graph.get(self.back))
    }

    /// Truthy once the forward spring has finished or been superseded
    pub fn forward_done(&self) -> Node {
        read(self.forward).eq(SpringPhase::Done.code())
    }

    pub fn back_done(&self) -> Node {
        read(self.back).eq(SpringPhase::Done.code())
    }

    /// Truthy while either spring is animating
    pub fn is_animating(&self) -> Node {
        clock_running(self.clock)
    }

    fn once(&self, guard: CellId, state: IntegratorState, to: Node, velocity: Node) -> Node {
        let idle = SpringPhase::Idle.code();
        let running = SpringPhase::Running.code();
        let done = SpringPhase::Done.code();

        select(
            read(guard).ne(done),
            sequence([
                when(
                    read(guard).eq(idle),
                    sequence([stop_clock(self.clock), set(guard, running)]),
                ),
                set(
                    self.value,
                    spring(self.clock, state, self.config, read(self.value), velocity, to),
                ),
                when(!clock_running(self.clock), set(guard, done)),
                read(self.value),
            ]),
            read(self.value),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_until_idle(graph: &mut Graph, clock: ClockId, mut t: f64) -> f64 {
        for _ in 0..600 {
            t += 16.0;
            graph.tick(t);
            if !graph.is_running(clock) {
                break;
            }
        }
        t
    }

    #[test]
    fn test_spring_to_runs_once() {
        let mut graph = Graph::new();
        let sv = SpringValue::new(&mut graph, 1.0, SpringConfig::stiff());
        graph.attach(sv.spring_to(2.0));

        graph.tick(0.0);
        assert_eq!(sv.forward_phase(&graph), SpringPhase::Running);
        run_until_idle(&mut graph, sv.clock, 0.0);

        assert_eq!(sv.forward_phase(&graph), SpringPhase::Done);
        assert_eq!(graph.get(sv.value), 2.0);

        // Moving the value afterwards does not re-trigger the spring
        graph.set(sv.value, 1.5);
        graph.tick(20_000.0);
        assert_eq!(graph.get(sv.value), 1.5);
    }

    #[test]
    fn test_spring_back_supersedes_forward() {
        let mut graph = Graph::new();
        let sv = SpringValue::new(&mut graph, 1.0, SpringConfig::stiff());
        let going_back = graph.cell(0.0);
        graph.attach(select(read(going_back), sv.spring_back(1.0), sv.spring_to(2.0)));

        graph.tick(0.0);
        graph.tick(16.0);
        graph.tick(32.0);
        assert!(graph.get(sv.value) > 1.0);

        graph.set(going_back, 1.0);
        let t = run_until_idle(&mut graph, sv.clock, 32.0);
        assert_eq!(sv.forward_phase(&graph), SpringPhase::Done);
        assert_eq!(sv.back_phase(&graph), SpringPhase::Done);
        assert_eq!(graph.get(sv.value), 1.0);

        graph.set(going_back, 0.0);
        graph.tick(t + 16.0);
        assert_eq!(graph.get(sv.value), 1.0, "forward guard stays done");
    }

    #[test]
    fn test_reset_rearms() {
        let mut graph = Graph::new();
        let sv = SpringValue::new(&mut graph, 0.0, SpringConfig::stiff());
        let spring_node = sv.spring_to(1.0);
        let driver = graph.attach(spring_node);

        graph.tick(0.0);
        let t = run_until_idle(&mut graph, sv.clock, 0.0);
        assert_eq!(graph.get(sv.value), 1.0);

        graph.detach(driver);
        graph.eval(&sv.snap(0.0));
        assert_eq!(sv.forward_phase(&graph), SpringPhase::Idle);
        assert_eq!(graph.get(sv.value), 0.0);

        graph.attach(sv.spring_to(1.0));
        graph.tick(t + 16.0);
        assert_eq!(sv.forward_phase(&graph), SpringPhase::Running);
    }
}
