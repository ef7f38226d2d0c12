//! Per-frame value graph
//!
//! The graph owns every numeric cell and clock of one gallery instance. Host
//! code writes input cells between frames, then calls [`Graph::tick`] once per
//! displayed frame. A tick evaluates the attached drivers (effect chains) in
//! attachment order; within a driver, writes happen in declaration order and
//! every later read sees the most recent write.
//!
//! ```rust
//! use loupe_core::{read, set, Graph};
//!
//! let mut graph = Graph::new();
//! let input = graph.cell(2.0);
//! let doubled = graph.cell(0.0);
//!
//! graph.attach(set(doubled, read(input) * 2.0));
//! graph.tick(0.0);
//! assert_eq!(graph.get(doubled), 4.0);
//! ```

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, trace, warn};

use crate::error::{GraphError, Result};
use crate::node::Node;

new_key_type! {
    /// Unique identifier for a numeric cell
    pub struct CellId;
    /// Unique identifier for an integrator clock
    pub struct ClockId;
    /// Unique identifier for per-frame memo storage
    pub struct MemoId;
}

/// Nominal frame interval in milliseconds (60 Hz)
///
/// The timeline reported by [`Graph::now`] starts at one nominal interval so
/// that a zero timestamp can keep meaning "not yet stamped" in integrator
/// state.
pub const NOMINAL_FRAME_MS: f32 = 1000.0 / 60.0;

/// Internal cell storage
struct CellSlot {
    value: f32,
    label: Option<String>,
}

/// Internal clock storage
#[derive(Default)]
struct ClockSlot {
    running: bool,
    /// Frame in which the clock was last started
    started_frame: u64,
}

/// Storage for stateful helpers that advance at most once per frame
#[derive(Debug, Default)]
pub(crate) struct MemoSlot {
    /// Frame of the cached result (0 = never evaluated)
    pub frame: u64,
    /// Result cached for `frame`
    pub value: f32,
    /// Input observed on the previous evaluated frame
    pub prev: Option<f32>,
}

/// Handle to an attached driver
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DriverId(u64);

/// Snapshot of graph bookkeeping
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GraphStats {
    pub cells: usize,
    pub clocks: usize,
    pub running_clocks: usize,
    pub drivers: usize,
    pub frame: u64,
}

/// The per-frame value graph
pub struct Graph {
    cells: SlotMap<CellId, CellSlot>,
    clocks: SlotMap<ClockId, ClockSlot>,
    memos: SlotMap<MemoId, MemoSlot>,
    labels: FxHashMap<String, CellId>,
    drivers: Vec<(DriverId, Node)>,
    next_driver: u64,
    frame: u64,
    /// Host timestamp of the first tick
    origin_ms: Option<f64>,
    /// Host timestamp of the latest tick
    last_host_ms: f64,
    now_ms: f32,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            cells: SlotMap::with_key(),
            clocks: SlotMap::with_key(),
            memos: SlotMap::with_key(),
            labels: FxHashMap::default(),
            drivers: Vec::new(),
            next_driver: 0,
            frame: 0,
            origin_ms: None,
            last_host_ms: 0.0,
            now_ms: 0.0,
        }
    }

    // =========================================================================
    // CELLS
    // =========================================================================

    /// Allocate a mutable cell with an initial value
    pub fn cell(&mut self, initial: f32) -> CellId {
        self.cells.insert(CellSlot {
            value: sanitize(initial),
            label: None,
        })
    }

    /// Allocate a labelled cell
    ///
    /// Labels are for diagnostics and host lookups. Reusing a label rebinds it
    /// to the newest cell.
    pub fn cell_named(&mut self, label: impl Into<String>, initial: f32) -> CellId {
        let label = label.into();
        let id = self.cells.insert(CellSlot {
            value: sanitize(initial),
            label: Some(label.clone()),
        });
        if let Some(previous) = self.labels.insert(label.clone(), id) {
            debug!("label '{}' rebound from {:?} to {:?}", label, previous, id);
        }
        id
    }

    /// Find a cell by label
    pub fn lookup(&self, label: &str) -> Result<CellId> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| GraphError::UnknownLabel(label.to_string()))
    }

    /// Label of a cell, if it has one
    pub fn label(&self, cell: CellId) -> Option<&str> {
        self.cells.get(cell).and_then(|slot| slot.label.as_deref())
    }

    /// Read a cell
    ///
    /// Unknown cells read as `0.0` so a stale handle degrades one frame
    /// instead of poisoning the transform with NaN.
    pub fn get(&self, cell: CellId) -> f32 {
        match self.cells.get(cell) {
            Some(slot) => slot.value,
            None => {
                warn!("read of unknown cell {:?}, using 0.0", cell);
                0.0
            }
        }
    }

    /// Read a cell, reporting unknown handles
    pub fn try_get(&self, cell: CellId) -> Result<f32> {
        self.cells
            .get(cell)
            .map(|slot| slot.value)
            .ok_or(GraphError::UnknownCell(cell))
    }

    /// Write a cell
    ///
    /// Non-finite values are dropped and the cell keeps its last stable value.
    pub fn set(&mut self, cell: CellId, value: f32) {
        if let Err(err) = self.try_set(cell, value) {
            warn!("{}", err);
        }
    }

    /// Write a cell, reporting rejected writes
    pub fn try_set(&mut self, cell: CellId, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(GraphError::NonFinite { cell, value });
        }
        let slot = self
            .cells
            .get_mut(cell)
            .ok_or(GraphError::UnknownCell(cell))?;
        slot.value = value;
        Ok(())
    }

    /// Remove a cell from the graph
    pub fn remove_cell(&mut self, cell: CellId) -> Result<()> {
        let slot = self
            .cells
            .remove(cell)
            .ok_or(GraphError::UnknownCell(cell))?;
        if let Some(label) = slot.label {
            if self.labels.get(&label) == Some(&cell) {
                self.labels.remove(&label);
            }
        }
        Ok(())
    }

    // =========================================================================
    // CLOCKS
    // =========================================================================

    /// Allocate a stopped clock
    pub fn clock(&mut self) -> ClockId {
        self.clocks.insert(ClockSlot::default())
    }

    /// Start a clock (no-op when already running)
    pub fn start_clock(&mut self, clock: ClockId) {
        let frame = self.frame;
        match self.clocks.get_mut(clock) {
            Some(slot) if !slot.running => {
                slot.running = true;
                slot.started_frame = frame;
                trace!(?clock, frame, "clock started");
            }
            Some(_) => {}
            None => warn!("start of unknown clock {:?}", clock),
        }
    }

    /// Stop a clock (no-op when already stopped)
    pub fn stop_clock(&mut self, clock: ClockId) {
        match self.clocks.get_mut(clock) {
            Some(slot) if slot.running => {
                slot.running = false;
                trace!(?clock, frame = self.frame, "clock stopped");
            }
            Some(_) => {}
            None => warn!("stop of unknown clock {:?}", clock),
        }
    }

    /// Whether a clock is running
    pub fn is_running(&self, clock: ClockId) -> bool {
        self.clocks.get(clock).map(|slot| slot.running).unwrap_or(false)
    }

    /// Whether a clock is running, reporting unknown handles
    pub fn try_is_running(&self, clock: ClockId) -> Result<bool> {
        self.clocks
            .get(clock)
            .map(|slot| slot.running)
            .ok_or(GraphError::UnknownClock(clock))
    }

    // =========================================================================
    // FRAMES
    // =========================================================================

    /// Current frame number (0 before the first tick)
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Timeline position of the current frame in milliseconds
    ///
    /// Always positive once the first tick has started.
    pub fn now(&self) -> f32 {
        self.now_ms
    }

    /// Register an effect chain evaluated on every tick
    pub fn attach(&mut self, driver: Node) -> DriverId {
        let id = DriverId(self.next_driver);
        self.next_driver += 1;
        self.drivers.push((id, driver));
        id
    }

    /// Unregister an effect chain
    pub fn detach(&mut self, id: DriverId) -> bool {
        let before = self.drivers.len();
        self.drivers.retain(|(driver, _)| *driver != id);
        before != self.drivers.len()
    }

    /// Advance to a new frame and evaluate every driver
    ///
    /// `host_ms` is the host's frame timestamp. Timestamps that go backwards
    /// are treated as a repeat of the previous one.
    pub fn tick(&mut self, host_ms: f64) {
        let origin = *self.origin_ms.get_or_insert(host_ms);
        let host_ms = if self.frame > 0 && host_ms < self.last_host_ms {
            warn!(
                "frame timestamp went backwards ({} < {}), holding time",
                host_ms, self.last_host_ms
            );
            self.last_host_ms
        } else {
            host_ms
        };
        self.last_host_ms = host_ms;
        self.frame += 1;
        self.now_ms = ((host_ms - origin) as f32) + NOMINAL_FRAME_MS;

        trace!(frame = self.frame, now = self.now_ms, "tick");

        let mut drivers = std::mem::take(&mut self.drivers);
        for (_, driver) in &drivers {
            driver.eval(self);
        }
        // Drivers attached while evaluating run from the next frame on.
        drivers.append(&mut self.drivers);
        self.drivers = drivers;
    }

    /// Evaluate an expression against the current cell values
    pub fn eval(&mut self, node: &Node) -> f32 {
        node.eval(self)
    }

    /// Bookkeeping snapshot
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            cells: self.cells.len(),
            clocks: self.clocks.len(),
            running_clocks: self.clocks.values().filter(|c| c.running).count(),
            drivers: self.drivers.len(),
            frame: self.frame,
        }
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    pub(crate) fn alloc_memo(&mut self) -> MemoId {
        self.memos.insert(MemoSlot::default())
    }

    pub(crate) fn memo_mut(&mut self, id: MemoId) -> Option<&mut MemoSlot> {
        self.memos.get_mut(id)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("stats", &self.stats())
            .field("now_ms", &self.now_ms)
            .finish()
    }
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        warn!("non-finite initial value {}, using 0.0", value);
        0.0
    }
}
