//! Graph error types

use thiserror::Error;

use crate::graph::{CellId, ClockId};

/// Errors raised by graph bookkeeping.
///
/// Frame evaluation itself never fails: a bad read falls back to `0.0` and a
/// bad write keeps the previous value. These errors surface only through the
/// explicit `try_*` accessors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// The cell was removed or belongs to another graph
    #[error("unknown cell {0:?}")]
    UnknownCell(CellId),

    /// The clock was removed or belongs to another graph
    #[error("unknown clock {0:?}")]
    UnknownClock(ClockId),

    /// A write carried NaN or an infinity
    #[error("rejected non-finite value {value} for cell {cell:?}")]
    NonFinite { cell: CellId, value: f32 },

    /// A label lookup found nothing
    #[error("no cell labelled '{0}'")]
    UnknownLabel(String),
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;
