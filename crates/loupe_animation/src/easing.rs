//! Easing curves
//!
//! Remap linear progress `t ∈ [0, 1]` onto an eased progress. Every curve
//! maps 0 to 0 and 1 to 1.

use serde::{Deserialize, Serialize};

/// Easing curve for timed animations
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    /// Cubic ease-in
    EaseIn,
    /// Cubic ease-out
    EaseOut,
    /// Cubic ease-in-out
    EaseInOut,
    /// Gentle acceleration, bezier(.42, 0, 1, 1)
    Ease,
    /// `Ease` mirrored into an in-out curve
    InOutEase,
    /// Overshooting spring-like curve; higher bounciness wobbles more
    Elastic(f32),
    /// Arbitrary cubic bezier with control points (x1, y1) and (x2, y2)
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Apply the curve to a linear progress value
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::Ease => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Easing::InOutEase => {
                if t < 0.5 {
                    cubic_bezier(0.42, 0.0, 1.0, 1.0, t * 2.0) / 2.0
                } else {
                    1.0 - cubic_bezier(0.42, 0.0, 1.0, 1.0, (1.0 - t) * 2.0) / 2.0
                }
            }
            Easing::Elastic(bounciness) => {
                if t >= 1.0 {
                    return 1.0;
                }
                let p = bounciness * std::f32::consts::PI;
                1.0 - (t * std::f32::consts::FRAC_PI_2).cos().powi(3) * (t * p).cos()
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

/// Evaluate a unit cubic bezier at `x`
///
/// Solves the x polynomial for its parameter with Newton steps, falling back
/// to bisection when the slope flattens.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let bezier = |a1: f32, a2: f32, s: f32| {
        let c = 3.0 * a1;
        let b = 3.0 * (a2 - a1) - c;
        let a = 1.0 - c - b;
        ((a * s + b) * s + c) * s
    };
    let slope = |a1: f32, a2: f32, s: f32| {
        let c = 3.0 * a1;
        let b = 3.0 * (a2 - a1) - c;
        let a = 1.0 - c - b;
        (3.0 * a * s + 2.0 * b) * s + c
    };

    let mut s = x;
    for _ in 0..8 {
        let err = bezier(x1, x2, s) - x;
        if err.abs() < 1e-6 {
            return bezier(y1, y2, s);
        }
        let d = slope(x1, x2, s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= err / d;
    }

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    s = x;
    for _ in 0..32 {
        let value = bezier(x1, x2, s);
        if (value - x).abs() < 1e-6 {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    bezier(y1, y2, s)
}
