//! Loupe Animation System
//!
//! Spring, decay and timing integrators driven by the [`loupe_core`] value
//! graph, plus the rubber-band combinators the gallery gestures are built on.
//!
//! # Features
//!
//! - **Spring Physics**: RK4-integrated springs with stiffness, damping, mass
//! - **Timing**: Fixed-duration animations with easing curves
//! - **Decay**: Momentum coasting after a fling
//! - **Rubber Banding**: Drag and pinch resistance past bounds with snap-back
//! - **One-shot Springs**: Guarded forward/back springs on a single value
//!
//! Every integrator keeps its progress in graph cells and is gated by a
//! clock. An integrator seeds itself when its clock is idle, and stops the
//! clock once it finishes.

pub mod decay;
pub mod diff;
pub mod easing;
pub mod integrator;
pub mod rubber_band;
pub mod spring;
pub mod spring_value;
pub mod timing;

pub use decay::{decay, run_decay, DecayConfig, DECAY_REST_VELOCITY};
pub use diff::{drag_diff, scale_diff, speed};
pub use easing::Easing;
pub use integrator::{ClockMode, IntegratorState, MAX_FRAME_DELTA_MS};
pub use rubber_band::{
    bouncy, bouncy_pinch, friction, friction_coefficient, scale_friction, scale_friction_value,
    scale_rest, scale_rest_value, BouncyClocks, BouncyConfig, PinchFocal, MAX_FRICTION,
    MAX_SCALE, MIN_SCALE,
};
pub use spring::{run_spring, spring, Spring, SpringConfig};
pub use spring_value::{SpringPhase, SpringValue};
pub use timing::{run_timing, timing, TimingConfig};
