//! Loupe Gesture Adapter
//!
//! Maps the per-sample callbacks of platform gesture recognizers onto graph
//! input cells. Recognition itself (touches to phase transitions) happens
//! upstream; this crate only buffers, validates and applies samples, and
//! exposes phase predicates as graph nodes.
//!
//! # Example
//!
//! ```rust
//! use loupe_core::Graph;
//! use loupe_gesture::{GestureAdapter, GesturePhase, GestureSample, Recognizer};
//!
//! let mut graph = Graph::new();
//! let mut adapter = GestureAdapter::new();
//! let pinch = adapter.register(&mut graph, Recognizer::Pinch);
//!
//! adapter
//!     .push(Recognizer::Pinch, GestureSample::new(GesturePhase::Active).with_scale(1.5))
//!     .unwrap();
//! adapter.apply_frame(&mut graph);
//! graph.tick(0.0);
//!
//! assert_eq!(graph.get(pinch.scale), 1.5);
//! assert_eq!(graph.eval(&pinch.is_active()), 1.0);
//! ```

pub mod adapter;
pub mod cells;
pub mod error;
pub mod phase;
pub mod recognizer;
pub mod sample;

pub use adapter::GestureAdapter;
pub use cells::GestureCells;
pub use error::{AdapterError, Result};
pub use phase::GesturePhase;
pub use recognizer::Recognizer;
pub use sample::GestureSample;
