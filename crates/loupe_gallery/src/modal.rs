//! Modal open/close transition
//!
//! A single progress value drives the morph between a thumbnail's on-screen
//! rect (progress 0) and the full-screen viewer (progress 1). The phase lives
//! in a cell and moves `Closed → Opening → Open → Closing → Closed`:
//!
//! - opening springs progress towards 1 without overshoot
//! - closing (explicit request, or a downward fling on the anchor page)
//!   eases progress to 0 from wherever it currently is
//! - when the close finishes, `RequestClose` is raised exactly once

use loupe_animation::{run_spring, run_timing, spring, ClockMode, IntegratorState};
use loupe_core::{
    clock_running, interpolate, lit, read, select, sequence, set, stop_clock, when, CellId,
    ClockId, Extrapolate, Graph, GraphStats, Node,
};
use loupe_gesture::{GestureAdapter, GestureCells, GestureSample, Recognizer};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::GalleryConfig;
use crate::error::{GalleryError, Result};
use crate::events::{EventSink, GalleryEvent};
use crate::geometry::{Size, ThumbnailGeometry};
use crate::transform::{Transform, TransformNodes};
use crate::viewer::{ImageViewer, ViewerInputs};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalPhase {
    /// Progress 0, nothing visible
    #[default]
    Closed,
    Opening,
    /// Progress 1
    Open,
    Closing,
}

impl ModalPhase {
    pub fn code(self) -> f32 {
        match self {
            ModalPhase::Closed => 0.0,
            ModalPhase::Opening => 1.0,
            ModalPhase::Open => 2.0,
            ModalPhase::Closing => 3.0,
        }
    }

    pub fn from_code(code: f32) -> Self {
        match code as i32 {
            1 => ModalPhase::Opening,
            2 => ModalPhase::Open,
            3 => ModalPhase::Closing,
            _ => ModalPhase::Closed,
        }
    }
}

/// Thumbnail anchor cells
#[derive(Clone, Copy, Debug)]
struct AnchorCells {
    x: CellId,
    y: CellId,
    width: CellId,
    height: CellId,
    contain_width: CellId,
    contain_height: CellId,
}

impl AnchorCells {
    fn new(graph: &mut Graph) -> Self {
        Self {
            x: graph.cell_named("anchor.x", 0.0),
            y: graph.cell_named("anchor.y", 0.0),
            width: graph.cell_named("anchor.width", 0.0),
            height: graph.cell_named("anchor.height", 0.0),
            contain_width: graph.cell_named("anchor.contain_width", 0.0),
            contain_height: graph.cell_named("anchor.contain_height", 0.0),
        }
    }

    fn write(&self, graph: &mut Graph, geometry: &ThumbnailGeometry) {
        graph.set(self.x, geometry.x);
        graph.set(self.y, geometry.y);
        graph.set(self.width, geometry.width);
        graph.set(self.height, geometry.height);
        graph.set(self.contain_width, geometry.contain_width);
        graph.set(self.contain_height, geometry.contain_height);
    }
}

/// Snapshot of the modal after one frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ModalFrame {
    pub phase: ModalPhase,
    pub progress: f32,
    /// Overlay controls visibility, 0 hidden to 1 shown
    pub overlay: f32,
    pub index: usize,
    pub image: Transform,
}

/// Cells and clocks the modal driver reads and writes
#[derive(Clone, Copy, Debug)]
struct ModalCells {
    progress: CellId,
    phase: CellId,
    close_request: CellId,
    closed_finished: CellId,
    show_overlay: CellId,
    overlay: CellId,
    drag_x: CellId,
    drag_y: CellId,
    index: CellId,
    anchor_index: CellId,
    anchor: AnchorCells,
    open_clock: ClockId,
    close_clock: ClockId,
}

impl ModalCells {
    fn new(graph: &mut Graph, index: usize) -> Self {
        Self {
            progress: graph.cell_named("modal.progress", 0.0),
            phase: graph.cell_named("modal.phase", ModalPhase::Closed.code()),
            close_request: graph.cell_named("modal.close_request", 0.0),
            closed_finished: graph.cell_named("modal.closed_finished", 0.0),
            show_overlay: graph.cell_named("modal.show_overlay", 1.0),
            overlay: graph.cell_named("modal.overlay", 0.0),
            drag_x: graph.cell_named("modal.drag_x", 0.0),
            drag_y: graph.cell_named("modal.drag_y", 0.0),
            index: graph.cell_named("modal.index", index as f32),
            anchor_index: graph.cell_named("modal.anchor_index", index as f32),
            anchor: AnchorCells::new(graph),
            open_clock: graph.clock(),
            close_clock: graph.clock(),
        }
    }

    fn is(&self, phase: ModalPhase) -> Node {
        read(self.phase).eq(phase.code())
    }
}

/// Full-screen gallery modal with its own graph and gesture cells
pub struct GalleryModal {
    graph: Graph,
    adapter: GestureAdapter,
    viewer: ImageViewer,
    images: Vec<Size>,
    screen: Size,
    cells: ModalCells,
    outputs: TransformNodes,
    last_phase: ModalPhase,
}

impl GalleryModal {
    /// Build a closed modal showing `images[index]`, anchored on `anchor`
    pub fn new(
        config: &GalleryConfig,
        images: Vec<Size>,
        index: usize,
        anchor: ThumbnailGeometry,
        events: EventSink,
    ) -> Result<Self> {
        let image = *images.get(index).ok_or(GalleryError::InvalidIndex {
            index,
            count: images.len(),
        })?;

        let mut graph = Graph::new();
        let mut adapter = GestureAdapter::new();
        let modal_pan = adapter.register(&mut graph, Recognizer::ModalPan);
        let single_tap = adapter.register(&mut graph, Recognizer::SingleTap);
        let inputs = ViewerInputs {
            pan: adapter.register(&mut graph, Recognizer::ViewerPan),
            pinch: adapter.register(&mut graph, Recognizer::Pinch),
            rotation: adapter.register(&mut graph, Recognizer::Rotation),
            double_tap: adapter.register(&mut graph, Recognizer::DoubleTap),
        };

        let screen = config.screen_size();
        let cells = ModalCells::new(&mut graph, index);
        let driver = build_driver(
            &mut graph,
            cells,
            config,
            screen,
            modal_pan,
            single_tap,
            &events,
        );
        graph.attach(driver);
        let viewer = ImageViewer::new(&mut graph, inputs, config, image);
        let outputs = build_outputs(cells, &viewer, config, screen);

        let mut modal = Self {
            graph,
            adapter,
            viewer,
            images,
            screen,
            cells,
            outputs,
            last_phase: ModalPhase::Closed,
        };
        modal.set_anchor(anchor);
        debug!(index, "gallery modal created");
        Ok(modal)
    }

    // =========================================================================
    // Host commands
    // =========================================================================

    /// Start (or resume) the opening transition
    ///
    /// Allowed from `Closed` and `Closing`; the spring starts from the
    /// current progress.
    pub fn open(&mut self) {
        match self.phase() {
            ModalPhase::Closed | ModalPhase::Closing => {
                self.graph.stop_clock(self.cells.close_clock);
                self.graph.stop_clock(self.cells.open_clock);
                self.graph.set(self.cells.closed_finished, 0.0);
                self.graph.set(self.cells.phase, ModalPhase::Opening.code());
            }
            phase => debug!(?phase, "open ignored"),
        }
    }

    /// Ask the modal to close; takes effect on the next frame
    pub fn request_close(&mut self) {
        self.graph.set(self.cells.close_request, 1.0);
    }

    /// Switch the visible image (the pager settled on a new page)
    pub fn set_index(&mut self, index: usize) -> Result<()> {
        let image = *self.images.get(index).ok_or(GalleryError::InvalidIndex {
            index,
            count: self.images.len(),
        })?;
        if index != self.index() {
            self.graph.set(self.cells.index, index as f32);
            self.viewer.set_image(&mut self.graph, image);
        }
        Ok(())
    }

    /// Re-anchor the close transition on another thumbnail
    pub fn update_anchor(&mut self, index: usize, anchor: ThumbnailGeometry) -> Result<()> {
        if index >= self.images.len() {
            return Err(GalleryError::InvalidIndex {
                index,
                count: self.images.len(),
            });
        }
        self.graph.set(self.cells.anchor_index, index as f32);
        self.set_anchor(anchor);
        Ok(())
    }

    fn set_anchor(&mut self, anchor: ThumbnailGeometry) {
        let anchor = if anchor.is_valid() {
            anchor
        } else {
            warn!(?anchor, "unusable thumbnail anchor, using full screen");
            ThumbnailGeometry::fallback(self.screen)
        };
        self.cells.anchor.write(&mut self.graph, &anchor);
    }

    pub fn push_sample(&mut self, recognizer: Recognizer, sample: GestureSample) -> Result<()> {
        Ok(self.adapter.push(recognizer, sample)?)
    }

    /// Advance one display frame
    pub fn tick(&mut self, host_ms: f64) -> ModalFrame {
        self.adapter.apply_frame(&mut self.graph);
        self.graph.tick(host_ms);

        let phase = self.phase();
        if phase != self.last_phase {
            info!(from = ?self.last_phase, to = ?phase, progress = self.progress(), "modal phase");
            self.last_phase = phase;
        }
        self.frame()
    }

    /// Current outputs without advancing
    pub fn frame(&mut self) -> ModalFrame {
        ModalFrame {
            phase: self.phase(),
            progress: self.progress(),
            overlay: self.graph.get(self.cells.overlay),
            index: self.index(),
            image: self.outputs.sample(&mut self.graph),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn phase(&self) -> ModalPhase {
        ModalPhase::from_code(self.graph.get(self.cells.phase))
    }

    pub fn progress(&self) -> f32 {
        self.graph.get(self.cells.progress)
    }

    pub fn index(&self) -> usize {
        self.graph.get(self.cells.index).max(0.0) as usize
    }

    /// The close transition has completed
    pub fn is_finished(&self) -> bool {
        self.graph.get(self.cells.closed_finished) != 0.0
    }

    pub fn viewer(&self) -> &ImageViewer {
        &self.viewer
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }

    pub fn has_pending_input(&self) -> bool {
        self.adapter.has_pending()
    }
}

// =============================================================================
// Graph construction
// =============================================================================

fn build_driver(
    graph: &mut Graph,
    cells: ModalCells,
    config: &GalleryConfig,
    screen: Size,
    modal_pan: GestureCells,
    single_tap: GestureCells,
    events: &EventSink,
) -> Node {
    let progress = cells.progress;
    let phase = cells.phase;
    let opening_or_open = cells.is(ModalPhase::Opening).or(cells.is(ModalPhase::Open));

    // Close: explicit request, or a downward fling on the anchor page
    let fling = modal_pan
        .released()
        .and(read(modal_pan.velocity_y).gt(0.0))
        .and(read(cells.index).eq(read(cells.anchor_index)));
    let begin_close = when(
        read(cells.close_request).or(fling),
        sequence([
            when(
                opening_or_open.clone(),
                sequence([
                    stop_clock(cells.open_clock),
                    stop_clock(cells.close_clock),
                    set(phase, ModalPhase::Closing.code()),
                ]),
            ),
            set(cells.close_request, 0.0),
        ]),
    );

    // An upward swipe in flight speeds up the opening spring
    let open_velocity = (-read(modal_pan.velocity_y) / screen.height).max(0.0);
    let open_state = IntegratorState::new(graph);
    let opening = sequence([
        set(
            progress,
            spring(
                cells.open_clock,
                open_state,
                config.open_spring(),
                read(progress),
                open_velocity,
                1.0,
            )
            .clamp(0.0, 1.0),
        ),
        when(
            !clock_running(cells.open_clock),
            set(phase, ModalPhase::Open.code()),
        ),
    ]);
    let closing = sequence([
        set(
            progress,
            run_timing(
                graph,
                cells.close_clock,
                read(progress),
                0.0,
                config.close_timing(),
                ClockMode::Owned,
            )
            .clamp(0.0, 1.0),
        ),
        when(
            !clock_running(cells.close_clock),
            sequence([
                set(phase, ModalPhase::Closed.code()),
                set(cells.closed_finished, 1.0),
            ]),
        ),
    ]);
    let progress_step = select(
        cells.is(ModalPhase::Opening),
        opening,
        select(
            cells.is(ModalPhase::Closing),
            closing,
            select(cells.is(ModalPhase::Open), set(progress, 1.0), set(progress, 0.0)),
        ),
    );
    let request_close = graph.on_change(
        read(cells.closed_finished),
        when(
            read(cells.closed_finished),
            events.emit([], |_| GalleryEvent::RequestClose),
        ),
    );

    // Preview drag: track the pan while open, freeze while closing,
    // otherwise settle back
    let drag_clocks = [graph.clock(), graph.clock()];
    let mut settle = |cell: CellId, clock: ClockId| {
        when(
            read(cell).ne(0.0).or(clock_running(clock)),
            set(cell, run_spring(graph, clock, read(cell), 0.0, 0.0, config.spring)),
        )
    };
    let settle_x = settle(cells.drag_x, drag_clocks[0]);
    let settle_y = settle(cells.drag_y, drag_clocks[1]);
    let drag_step = select(
        cells.is(ModalPhase::Open).and(modal_pan.is_active()),
        sequence([
            stop_clock(drag_clocks[0]),
            stop_clock(drag_clocks[1]),
            set(cells.drag_x, read(modal_pan.translation_x)),
            set(cells.drag_y, read(modal_pan.translation_y)),
        ]),
        when(!cells.is(ModalPhase::Closing), sequence([settle_x, settle_y])),
    );

    // Overlay controls
    let overlay_clock = graph.clock();
    let toggle_overlay = when(
        cells.is(ModalPhase::Open).and(single_tap.tapped()),
        set(cells.show_overlay, !read(cells.show_overlay)),
    );
    let overlay_target = read(cells.show_overlay).and(opening_or_open);
    let overlay_flip = graph.on_change(
        overlay_target.clone(),
        sequence([
            stop_clock(overlay_clock),
            events.emit([overlay_target.clone()], |v| GalleryEvent::OverlayToggle {
                active: v[0] != 0.0,
            }),
        ]),
    );
    let overlay_step = when(
        read(cells.overlay)
            .ne(overlay_target.clone())
            .or(clock_running(overlay_clock)),
        set(
            cells.overlay,
            run_timing(
                graph,
                overlay_clock,
                read(cells.overlay),
                overlay_target,
                config.overlay_timing(),
                ClockMode::Owned,
            ),
        ),
    );

    let index_change = graph.on_change(
        read(cells.index),
        events.emit([read(cells.index)], |v| GalleryEvent::IndexChange {
            index: v[0].max(0.0) as usize,
        }),
    );

    sequence([
        begin_close,
        progress_step,
        request_close,
        drag_step,
        toggle_overlay,
        overlay_flip,
        overlay_step,
        index_change,
    ])
}

fn build_outputs(
    cells: ModalCells,
    viewer: &ImageViewer,
    config: &GalleryConfig,
    screen: Size,
) -> TransformNodes {
    let p = read(cells.progress);
    let drag_y = read(cells.drag_y);
    let (w, h) = (screen.width, screen.height);
    let drag = config.modal.preview_drag_distance;
    let min_scale = config.modal.preview_min_scale;

    let preview_width = interpolate(
        drag_y.clone(),
        [(0.0, lit(w)), (drag, lit(w * min_scale))],
        Extrapolate::Clamp,
    );
    let preview_height = interpolate(
        drag_y.clone(),
        [(0.0, lit(h)), (drag, lit(h * min_scale))],
        Extrapolate::Clamp,
    );
    let preview_opacity = interpolate(
        drag_y,
        [(0.0, lit(1.0)), (config.modal.preview_fade_distance, lit(0.0))],
        Extrapolate::Clamp,
    );
    let morph = |from: Node, to: Node| {
        interpolate(p.clone(), [(0.0, from), (1.0, to)], Extrapolate::Clamp)
    };

    TransformNodes {
        translate_x: morph(read(cells.anchor.x), read(cells.drag_x))
            + viewer.translate_x(p.clone()),
        translate_y: morph(read(cells.anchor.y), read(cells.drag_y))
            + viewer.translate_y(p.clone()),
        scale: viewer.scale_output(p.clone()),
        rotate: viewer.rotate_output(),
        width: morph(read(cells.anchor.contain_width), preview_width.clone()),
        height: morph(read(cells.anchor.contain_height), preview_height.clone()),
        mask_width: morph(read(cells.anchor.width), preview_width),
        mask_height: morph(read(cells.anchor.height), preview_height),
        border_radius: interpolate(
            p.clone(),
            [(0.5, lit(config.modal.thumbnail_radius)), (1.0, lit(0.0))],
            Extrapolate::Clamp,
        ),
        opacity: interpolate(
            p,
            [
                (0.0, lit(0.0)),
                (0.2, lit(0.0)),
                (0.8, lit(1.0)),
                (1.0, lit(1.0)),
            ],
            Extrapolate::Clamp,
        ) * preview_opacity,
    }
}

impl std::fmt::Debug for GalleryModal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryModal")
            .field("phase", &self.phase())
            .field("progress", &self.progress())
            .field("index", &self.index())
            .finish()
    }
}
