//! Expression nodes
//!
//! A [`Node`] is a cheap-to-clone expression evaluated against a [`Graph`].
//! Nodes carry no storage of their own: every evaluation re-reads the cells it
//! depends on, so a read placed after a write in a [`sequence`] sees the new
//! value. Truthiness follows the numeric convention: any non-zero, non-NaN
//! value is true, and boolean results are `1.0` / `0.0`.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Not, Sub};
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::trace;

use crate::graph::{CellId, ClockId, Graph};

/// Evaluation function behind a node
pub type EvalFn = dyn Fn(&mut Graph) -> f32 + Send + Sync;

/// A reusable expression over graph cells
#[derive(Clone)]
pub struct Node(Arc<EvalFn>);

impl Node {
    /// Wrap an evaluation function
    pub fn new<F>(eval: F) -> Self
    where
        F: Fn(&mut Graph) -> f32 + Send + Sync + 'static,
    {
        Self(Arc::new(eval))
    }

    /// Evaluate against the graph's current state
    pub fn eval(&self, graph: &mut Graph) -> f32 {
        (self.0)(graph)
    }

    /// Apply a pure function to this node's value
    pub fn map<F>(self, f: F) -> Node
    where
        F: Fn(f32) -> f32 + Send + Sync + 'static,
    {
        Node::new(move |g| f(self.eval(g)))
    }

    /// Combine with another node through a pure function
    pub fn zip_with<F>(self, other: impl Into<Node>, f: F) -> Node
    where
        F: Fn(f32, f32) -> f32 + Send + Sync + 'static,
    {
        let other = other.into();
        Node::new(move |g| {
            let a = self.eval(g);
            let b = other.eval(g);
            f(a, b)
        })
    }

    pub fn lt(self, other: impl Into<Node>) -> Node {
        self.zip_with(other, |a, b| flag(a < b))
    }

    pub fn le(self, other: impl Into<Node>) -> Node {
        self.zip_with(other, |a, b| flag(a <= b))
    }

    pub fn gt(self, other: impl Into<Node>) -> Node {
        self.zip_with(other, |a, b| flag(a > b))
    }

    pub fn ge(self, other: impl Into<Node>) -> Node {
        self.zip_with(other, |a, b| flag(a >= b))
    }

    /// Exact equality (use for phase codes and flags)
    pub fn eq(self, other: impl Into<Node>) -> Node {
        self.zip_with(other, |a, b| flag(a == b))
    }

    pub fn ne(self, other: impl Into<Node>) -> Node {
        self.zip_with(other, |a, b| flag(a != b))
    }

    /// Logical and, short-circuiting on a false left side
    pub fn and(self, other: impl Into<Node>) -> Node {
        let other = other.into();
        Node::new(move |g| {
            if truthy(self.eval(g)) {
                flag(truthy(other.eval(g)))
            } else {
                0.0
            }
        })
    }

    /// Logical or, short-circuiting on a true left side
    pub fn or(self, other: impl Into<Node>) -> Node {
        let other = other.into();
        Node::new(move |g| {
            if truthy(self.eval(g)) {
                1.0
            } else {
                flag(truthy(other.eval(g)))
            }
        })
    }

    pub fn abs(self) -> Node {
        self.map(f32::abs)
    }

    pub fn min(self, other: impl Into<Node>) -> Node {
        self.zip_with(other, f32::min)
    }

    pub fn max(self, other: impl Into<Node>) -> Node {
        self.zip_with(other, f32::max)
    }

    /// Clamp between two (possibly live) bounds
    ///
    /// The lower bound wins when the bounds cross.
    pub fn clamp(self, lo: impl Into<Node>, hi: impl Into<Node>) -> Node {
        let lo = lo.into();
        let hi = hi.into();
        Node::new(move |g| {
            let v = self.eval(g);
            let lo = lo.eval(g);
            let hi = hi.eval(g);
            v.min(hi).max(lo)
        })
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Node")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

impl From<f32> for Node {
    fn from(value: f32) -> Self {
        lit(value)
    }
}

impl From<CellId> for Node {
    fn from(cell: CellId) -> Self {
        read(cell)
    }
}

impl From<&Node> for Node {
    fn from(node: &Node) -> Self {
        node.clone()
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl<R: Into<Node>> $trait<R> for Node {
            type Output = Node;

            fn $method(self, rhs: R) -> Node {
                self.zip_with(rhs, |a, b| a $op b)
            }
        }

        impl $trait<Node> for f32 {
            type Output = Node;

            fn $method(self, rhs: Node) -> Node {
                lit(self).zip_with(rhs, |a, b| a $op b)
            }
        }
    };
}

binary_op!(Add, add, +);
binary_op!(Sub, sub, -);
binary_op!(Mul, mul, *);

impl<R: Into<Node>> Div<R> for Node {
    type Output = Node;

    /// Division where a zero divisor yields `0.0` instead of an infinity
    fn div(self, rhs: R) -> Node {
        self.zip_with(rhs, safe_div)
    }
}

impl Div<Node> for f32 {
    type Output = Node;

    fn div(self, rhs: Node) -> Node {
        lit(self).zip_with(rhs, safe_div)
    }
}

impl Neg for Node {
    type Output = Node;

    fn neg(self) -> Node {
        self.map(|v| -v)
    }
}

impl Not for Node {
    type Output = Node;

    fn not(self) -> Node {
        self.map(|v| flag(!truthy(v)))
    }
}

/// Numeric truthiness
pub fn truthy(value: f32) -> bool {
    value != 0.0 && !value.is_nan()
}

/// Boolean to `1.0` / `0.0`
pub fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn safe_div(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        0.0
    } else {
        a / b
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Constant
pub fn lit(value: f32) -> Node {
    Node::new(move |_| value)
}

/// Current value of a cell
pub fn read(cell: CellId) -> Node {
    Node::new(move |g| g.get(cell))
}

/// Write a cell; evaluates to the value actually stored
pub fn set(cell: CellId, value: impl Into<Node>) -> Node {
    let value = value.into();
    Node::new(move |g| {
        let v = value.eval(g);
        g.set(cell, v);
        g.get(cell)
    })
}

/// Evaluate exactly one branch per evaluation
pub fn select(
    condition: impl Into<Node>,
    then: impl Into<Node>,
    otherwise: impl Into<Node>,
) -> Node {
    let condition = condition.into();
    let then = then.into();
    let otherwise = otherwise.into();
    Node::new(move |g| {
        if truthy(condition.eval(g)) {
            then.eval(g)
        } else {
            otherwise.eval(g)
        }
    })
}

/// `select` with a `0.0` else branch
pub fn when(condition: impl Into<Node>, then: impl Into<Node>) -> Node {
    select(condition, then, lit(0.0))
}

/// Run nodes in declaration order; evaluates to the last one
pub fn sequence(nodes: impl IntoIterator<Item = Node>) -> Node {
    let nodes: Vec<Node> = nodes.into_iter().collect();
    Node::new(move |g| {
        let mut last = 0.0;
        for node in &nodes {
            last = node.eval(g);
        }
        last
    })
}

/// Pure function of other nodes, recomputed on every evaluation
pub fn derive<F>(deps: impl IntoIterator<Item = Node>, compute: F) -> Node
where
    F: Fn(&[f32]) -> f32 + Send + Sync + 'static,
{
    let deps: SmallVec<[Node; 4]> = deps.into_iter().collect();
    Node::new(move |g| {
        let values: SmallVec<[f32; 4]> = deps.iter().map(|d| d.eval(g)).collect();
        compute(&values)
    })
}

/// Invoke a host action with the current values of `args`
///
/// Evaluates to `0.0`. Wrap in [`Graph::on_change`](crate::Graph::on_change)
/// or another edge guard to fire once per transition.
pub fn call<F>(args: impl IntoIterator<Item = Node>, action: F) -> Node
where
    F: Fn(&[f32]) + Send + Sync + 'static,
{
    let args: SmallVec<[Node; 4]> = args.into_iter().collect();
    Node::new(move |g| {
        let values: SmallVec<[f32; 4]> = args.iter().map(|a| a.eval(g)).collect();
        trace!(frame = g.frame(), ?values, "call");
        action(&values);
        0.0
    })
}

pub fn start_clock(clock: ClockId) -> Node {
    Node::new(move |g| {
        g.start_clock(clock);
        0.0
    })
}

pub fn stop_clock(clock: ClockId) -> Node {
    Node::new(move |g| {
        g.stop_clock(clock);
        0.0
    })
}

pub fn clock_running(clock: ClockId) -> Node {
    Node::new(move |g| flag(g.is_running(clock)))
}

/// Timeline position of the current frame in milliseconds
pub fn now() -> Node {
    Node::new(|g| g.now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_arithmetic() {
        let mut graph = Graph::new();
        let a = graph.cell(6.0);
        let b = graph.cell(2.0);

        assert_eq!(graph.eval(&(read(a) + read(b))), 8.0);
        assert_eq!(graph.eval(&(read(a) - 1.0)), 5.0);
        assert_eq!(graph.eval(&(read(a) * read(b))), 12.0);
        assert_eq!(graph.eval(&(read(a) / b)), 3.0);
        assert_eq!(graph.eval(&(10.0 - read(a))), 4.0);
        assert_eq!(graph.eval(&-read(a)), -6.0);
    }

    #[test]
    fn test_division_by_zero_is_zero() {
        let mut graph = Graph::new();
        let zero = graph.cell(0.0);
        assert_eq!(graph.eval(&(lit(1.0) / zero)), 0.0);
        assert_eq!(graph.eval(&(1.0 / read(zero))), 0.0);
    }

    #[test]
    fn test_comparisons_and_logic() {
        let mut graph = Graph::new();
        let x = graph.cell(1.1);

        assert_eq!(graph.eval(&read(x).le(1.1)), 1.0);
        assert_eq!(graph.eval(&read(x).lt(1.1)), 0.0);
        assert_eq!(graph.eval(&read(x).gt(1.0).and(read(x).lt(2.0))), 1.0);
        assert_eq!(graph.eval(&read(x).gt(5.0).or(0.0)), 0.0);
        assert_eq!(graph.eval(&!read(x)), 0.0);
        assert_eq!(graph.eval(&!lit(0.0)), 1.0);
    }

    #[test]
    fn test_select_evaluates_one_branch() {
        let mut graph = Graph::new();
        let hits = graph.cell(0.0);
        let cond = graph.cell(1.0);

        let node = select(cond, set(hits, read(hits) + 1.0), set(hits, read(hits) + 100.0));
        graph.eval(&node);
        assert_eq!(graph.get(hits), 1.0);

        graph.set(cond, 0.0);
        graph.eval(&node);
        assert_eq!(graph.get(hits), 101.0);
    }

    #[test]
    fn test_when_without_else_is_zero() {
        let mut graph = Graph::new();
        assert_eq!(graph.eval(&when(0.0, 7.0)), 0.0);
        assert_eq!(graph.eval(&when(1.0, 7.0)), 7.0);
    }

    #[test]
    fn test_derive_recomputes_every_read() {
        let mut graph = Graph::new();
        let a = graph.cell(1.0);
        let b = graph.cell(2.0);
        let sum = derive([read(a), read(b)], |v| v[0] + v[1]);

        assert_eq!(graph.eval(&sum), 3.0);
        graph.set(a, 10.0);
        assert_eq!(graph.eval(&sum), 12.0);
    }

    #[test]
    fn test_set_returns_stored_value() {
        let mut graph = Graph::new();
        let cell = graph.cell(4.0);
        assert_eq!(graph.eval(&set(cell, f32::NAN)), 4.0);
        assert_eq!(graph.eval(&set(cell, 9.0)), 9.0);
    }

    #[test]
    fn test_call_passes_values() {
        let mut graph = Graph::new();
        let cell = graph.cell(3.0);
        let seen = Arc::new(AtomicUsize::new(0));

        let node = call([read(cell)], {
            let seen = Arc::clone(&seen);
            move |values| seen.store(values[0] as usize, Ordering::SeqCst)
        });
        graph.eval(&node);

        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_clock_nodes() {
        let mut graph = Graph::new();
        let clock = graph.clock();

        assert_eq!(graph.eval(&clock_running(clock)), 0.0);
        graph.eval(&start_clock(clock));
        assert_eq!(graph.eval(&clock_running(clock)), 1.0);
        graph.eval(&stop_clock(clock));
        assert_eq!(graph.eval(&clock_running(clock)), 0.0);
    }

    #[test]
    fn test_clamp() {
        let mut graph = Graph::new();
        assert_eq!(graph.eval(&lit(0.05).clamp(0.1, 1.0)), 0.1);
        assert_eq!(graph.eval(&lit(3.0).clamp(0.1, 1.0)), 1.0);
        assert_eq!(graph.eval(&lit(0.5).clamp(0.1, 1.0)), 0.5);
    }
}
