//! Frame-gated stateful helpers
//!
//! These helpers keep state between frames (a previous value, a cached
//! result). Each advances at most once per frame: a second evaluation in the
//! same frame returns the cached result, so a helper shared by several
//! expressions still observes one step per frame.

use crate::graph::{Graph, MemoId};
use crate::node::{flag, lit, select, Node};

impl Graph {
    /// Evaluate `node` at most once per frame
    ///
    /// Later evaluations within the same frame return the cached result
    /// without re-running the node's side effects.
    pub fn per_frame(&mut self, node: Node) -> Node {
        let memo = self.alloc_memo();
        Node::new(move |g| {
            let frame = g.frame();
            if let Some(slot) = g.memo_mut(memo) {
                if slot.frame == frame && frame != 0 {
                    return slot.value;
                }
            }
            let value = node.eval(g);
            store(g, memo, frame, value, None);
            value
        })
    }

    /// Change of `node` since the previous frame it was evaluated on
    ///
    /// Evaluates to `0.0` the first time.
    pub fn diff(&mut self, node: Node) -> Node {
        self.stepped(node, |prev, current| match prev {
            Some(prev) => current - prev,
            None => 0.0,
        })
    }

    /// `1.0` on frames where `node` differs from its previous-frame value
    ///
    /// The first evaluation only records the value and reports no change.
    pub fn changed(&mut self, node: Node) -> Node {
        self.stepped(node, |prev, current| match prev {
            Some(prev) => flag(prev != current),
            None => 0.0,
        })
    }

    /// Run `effect` only on frames where `node`'s value changed
    ///
    /// Use this to fire host callbacks once per transition instead of once
    /// per frame.
    pub fn on_change(&mut self, node: Node, effect: Node) -> Node {
        let changed = self.changed(node);
        select(changed, effect, lit(0.0))
    }

    fn stepped<F>(&mut self, node: Node, step: F) -> Node
    where
        F: Fn(Option<f32>, f32) -> f32 + Send + Sync + 'static,
    {
        let memo = self.alloc_memo();
        Node::new(move |g| {
            let frame = g.frame();
            let prev = match g.memo_mut(memo) {
                Some(slot) if slot.frame == frame && frame != 0 => return slot.value,
                Some(slot) => slot.prev,
                None => None,
            };
            let current = node.eval(g);
            let value = step(prev, current);
            store(g, memo, frame, value, Some(current));
            value
        })
    }
}

fn store(g: &mut Graph, memo: MemoId, frame: u64, value: f32, prev: Option<f32>) {
    if let Some(slot) = g.memo_mut(memo) {
        slot.frame = frame;
        slot.value = value;
        if prev.is_some() {
            slot.prev = prev;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::Graph;
    use crate::node::{call, read, sequence, set};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_per_frame_runs_once() {
        let mut graph = Graph::new();
        let counter = graph.cell(0.0);
        let bump = graph.per_frame(set(counter, read(counter) + 1.0));

        graph.attach(sequence([bump.clone(), bump.clone(), bump]));
        graph.tick(0.0);
        assert_eq!(graph.get(counter), 1.0);

        graph.tick(16.0);
        assert_eq!(graph.get(counter), 2.0);
    }

    #[test]
    fn test_diff_between_frames() {
        let mut graph = Graph::new();
        let value = graph.cell(10.0);
        let out = graph.cell(0.0);
        let delta = graph.diff(read(value));
        graph.attach(set(out, delta));

        graph.tick(0.0);
        assert_eq!(graph.get(out), 0.0);

        graph.set(value, 14.0);
        graph.tick(16.0);
        assert_eq!(graph.get(out), 4.0);

        graph.tick(32.0);
        assert_eq!(graph.get(out), 0.0);
    }

    #[test]
    fn test_diff_is_stable_within_a_frame() {
        let mut graph = Graph::new();
        let value = graph.cell(0.0);
        let delta = graph.diff(read(value));
        let first = graph.cell(0.0);
        let second = graph.cell(0.0);
        graph.attach(sequence([set(first, delta.clone()), set(second, delta)]));

        graph.tick(0.0);
        graph.set(value, 3.0);
        graph.tick(16.0);

        assert_eq!(graph.get(first), 3.0);
        assert_eq!(graph.get(second), 3.0);
    }

    #[test]
    fn test_on_change_fires_once_per_transition() {
        let mut graph = Graph::new();
        let finished = graph.cell(0.0);
        let fired = Arc::new(AtomicUsize::new(0));

        let effect = call([], {
            let fired = Arc::clone(&fired);
            move |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            }
        });
        let driver = graph.on_change(read(finished), effect);
        graph.attach(driver);

        graph.tick(0.0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        graph.set(finished, 1.0);
        for frame in 1..10 {
            graph.tick(frame as f64 * 16.0);
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        graph.set(finished, 0.0);
        graph.tick(200.0);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_changed_ignores_first_frame() {
        let mut graph = Graph::new();
        let value = graph.cell(5.0);
        let out = graph.cell(-1.0);
        let changed = graph.changed(read(value));
        graph.attach(set(out, changed));

        graph.tick(0.0);
        assert_eq!(graph.get(out), 0.0);
    }
}
