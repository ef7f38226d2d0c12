//! Per-frame gesture deltas
//!
//! Gesture recognizers report cumulative values (total translation, total
//! scale). The rubber-band combinators consume per-frame increments, which
//! these helpers derive.

use loupe_core::{derive, lit, now, read, select, sequence, set, Graph, Node};

/// Per-frame change of a cumulative drag translation
///
/// While `updating` is truthy evaluates to `value - previous` and remembers
/// `value`. Otherwise resets so the next gesture starts from zero.
pub fn drag_diff(graph: &mut Graph, value: impl Into<Node>, updating: impl Into<Node>) -> Node {
    let value = value.into();
    let tmp = graph.cell(0.0);
    let prev = graph.cell(0.0);

    graph.per_frame(select(
        updating,
        sequence([
            set(tmp, value.clone() - read(prev)),
            set(prev, value),
            read(tmp),
        ]),
        sequence([set(prev, 0.0), lit(0.0)]),
    ))
}

/// Per-frame ratio of a cumulative pinch scale
///
/// Evaluates to `value / previous`, starting from a previous scale of `1.0`.
pub fn scale_diff(graph: &mut Graph, value: impl Into<Node>) -> Node {
    let value = value.into();
    let tmp = graph.cell(1.0);
    let prev = graph.cell(1.0);

    let ratio = derive([value.clone(), read(prev)], |v| {
        if v[1] <= 0.0 || !v[1].is_finite() {
            1.0
        } else {
            v[0] / v[1]
        }
    });
    graph.per_frame(sequence([set(tmp, ratio), set(prev, value), read(tmp)]))
}

/// Rate of change of `value` in units per second
///
/// Measured between consecutive frames; `0.0` when less than a millisecond
/// passed.
pub fn speed(graph: &mut Graph, value: impl Into<Node>) -> Node {
    let dt = graph.diff(now());
    let dv = graph.diff(value.into());
    derive([dt, dv], |v| if v[0] < 1.0 { 0.0 } else { 1000.0 * v[1] / v[0] })
}
