//! Piecewise-linear interpolation
//!
//! Maps an input through breakpoints onto (possibly live) outputs. Input
//! breakpoints are constants and must be ascending; outputs are nodes so a
//! transition can morph towards a moving target.

use smallvec::SmallVec;

use crate::node::Node;

/// Behavior outside the first/last breakpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Extrapolate {
    /// Continue the outer segment's slope
    #[default]
    Extend,
    /// Hold the outer output value
    Clamp,
    /// Return the input unchanged
    Identity,
}

/// Interpolate a plain value through `(input, output)` breakpoints
pub fn interpolate_value(x: f32, inputs: &[f32], outputs: &[f32], extrapolate: Extrapolate) -> f32 {
    let n = inputs.len().min(outputs.len());
    match n {
        0 => return x,
        1 => return outputs[0],
        _ => {}
    }

    if x < inputs[0] {
        return match extrapolate {
            Extrapolate::Clamp => outputs[0],
            Extrapolate::Identity => x,
            Extrapolate::Extend => segment(x, inputs[0], inputs[1], outputs[0], outputs[1]),
        };
    }
    if x > inputs[n - 1] {
        return match extrapolate {
            Extrapolate::Clamp => outputs[n - 1],
            Extrapolate::Identity => x,
            Extrapolate::Extend => segment(
                x,
                inputs[n - 2],
                inputs[n - 1],
                outputs[n - 2],
                outputs[n - 1],
            ),
        };
    }

    let i = segment_index(x, &inputs[..n]);
    segment(x, inputs[i], inputs[i + 1], outputs[i], outputs[i + 1])
}

/// Interpolate a node through breakpoints with node outputs
///
/// Only the two outputs bounding the active segment are evaluated.
pub fn interpolate(
    value: impl Into<Node>,
    stops: impl IntoIterator<Item = (f32, Node)>,
    extrapolate: Extrapolate,
) -> Node {
    let value = value.into();
    let (inputs, outputs): (SmallVec<[f32; 4]>, SmallVec<[Node; 4]>) = stops.into_iter().unzip();

    Node::new(move |g| {
        let x = value.eval(g);
        let n = inputs.len();
        match n {
            0 => return x,
            1 => return outputs[0].eval(g),
            _ => {}
        }

        let i = if x < inputs[0] {
            match extrapolate {
                Extrapolate::Clamp => return outputs[0].eval(g),
                Extrapolate::Identity => return x,
                Extrapolate::Extend => 0,
            }
        } else if x > inputs[n - 1] {
            match extrapolate {
                Extrapolate::Clamp => return outputs[n - 1].eval(g),
                Extrapolate::Identity => return x,
                Extrapolate::Extend => n - 2,
            }
        } else {
            segment_index(x, &inputs)
        };

        let a = outputs[i].eval(g);
        let b = outputs[i + 1].eval(g);
        segment(x, inputs[i], inputs[i + 1], a, b)
    })
}

/// Index of the segment `[inputs[i], inputs[i + 1]]` containing `x`
fn segment_index(x: f32, inputs: &[f32]) -> usize {
    let last = inputs.len() - 2;
    (0..=last)
        .find(|&i| x <= inputs[i + 1])
        .unwrap_or(last)
}

fn segment(x: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let span = in_hi - in_lo;
    if span.abs() < f32::EPSILON {
        return out_lo;
    }
    let t = (x - in_lo) / span;
    out_lo + (out_hi - out_lo) * t
}
