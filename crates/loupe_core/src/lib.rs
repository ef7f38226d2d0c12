//! Loupe Core Runtime
//!
//! This crate provides the per-frame value graph the gallery animations are
//! built on:
//!
//! - **Cells**: numeric containers written by gesture input or by effects
//! - **Nodes**: cheap-to-clone expressions re-evaluated every frame
//! - **Clocks**: running/stopped flags gating stateful integrators
//! - **Edge detection**: `diff`, `changed` and `on_change` helpers that
//!   advance once per frame
//!
//! # Example
//!
//! ```rust
//! use loupe_core::{read, select, set, Graph};
//!
//! let mut graph = Graph::new();
//! let active = graph.cell(0.0);
//! let value = graph.cell(10.0);
//! let out = graph.cell(0.0);
//!
//! graph.attach(set(out, select(active, read(value) * 2.0, read(value))));
//! graph.tick(0.0);
//! assert_eq!(graph.get(out), 10.0);
//!
//! graph.set(active, 1.0);
//! graph.tick(16.0);
//! assert_eq!(graph.get(out), 20.0);
//! ```

pub mod error;
pub mod graph;
pub mod interpolate;
pub mod node;
mod stateful;

pub use error::{GraphError, Result};
pub use graph::{CellId, ClockId, DriverId, Graph, GraphStats, NOMINAL_FRAME_MS};
pub use interpolate::{interpolate, interpolate_value, Extrapolate};
pub use node::{
    call, clock_running, derive, flag, lit, now, read, select, sequence, set, start_clock,
    stop_clock, truthy, when, Node,
};
