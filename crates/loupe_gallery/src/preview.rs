//! Pinch preview on a grid thumbnail
//!
//! Pinching a thumbnail lifts a floating copy off the grid: the copy grows
//! from the thumbnail rect to its contain box, follows the pinch scale and
//! the two-finger drag, and darkens the background as it grows. On release
//! everything springs back and `PreviewClose` is raised once the copy has
//! settled onto the thumbnail again.

use loupe_animation::{run_spring, SpringValue};
use loupe_core::{
    clock_running, interpolate, lit, read, select, sequence, set, stop_clock, when, CellId,
    ClockId, Extrapolate, Graph, Node,
};
use loupe_gesture::{GestureAdapter, GestureCells, GestureSample, Recognizer};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::GalleryConfig;
use crate::error::Result;
use crate::events::{EventSink, GalleryEvent};
use crate::geometry::ThumbnailGeometry;
use crate::transform::{Transform, TransformNodes};

/// Snapshot of the preview after one frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PreviewFrame {
    pub index: usize,
    /// Released and settling back onto the thumbnail
    pub releasing: bool,
    pub image: Transform,
}

#[derive(Clone, Copy, Debug)]
struct PreviewCells {
    scale: CellId,
    translate_x: CellId,
    translate_y: CellId,
    /// Set once the pinch has been seen active
    armed: CellId,
    releasing: CellId,
    closed: CellId,
    scale_clock: ClockId,
    translate_clocks: [ClockId; 2],
}

/// Floating thumbnail copy driven by a pinch on the grid
pub struct PinchPreview {
    graph: Graph,
    adapter: GestureAdapter,
    index: usize,
    cells: PreviewCells,
    outputs: TransformNodes,
}

impl PinchPreview {
    /// Build a preview over `geometry`
    ///
    /// Returns `None` when the geometry cannot produce a finite transform.
    pub fn new(
        config: &GalleryConfig,
        index: usize,
        geometry: ThumbnailGeometry,
        events: EventSink,
    ) -> Option<Self> {
        if !geometry.is_valid() {
            warn!(index, ?geometry, "unusable thumbnail geometry, pinch preview suppressed");
            return None;
        }

        let mut graph = Graph::new();
        let mut adapter = GestureAdapter::new();
        let pinch = adapter.register(&mut graph, Recognizer::ThumbnailPinch);
        let rotation = adapter.register(&mut graph, Recognizer::Rotation);

        let cells = PreviewCells {
            scale: graph.cell_named("preview.scale", 1.0),
            translate_x: graph.cell_named("preview.translate_x", 0.0),
            translate_y: graph.cell_named("preview.translate_y", 0.0),
            armed: graph.cell(0.0),
            releasing: graph.cell(0.0),
            closed: graph.cell(0.0),
            scale_clock: graph.clock(),
            translate_clocks: [graph.clock(), graph.clock()],
        };
        let lift = SpringValue::new(&mut graph, 0.0, config.spring);
        let turn = SpringValue::new(&mut graph, 0.0, config.spring);

        let driver = build_driver(&mut graph, cells, lift, turn, pinch, rotation, config, &events);
        graph.attach(driver);
        let outputs = build_outputs(cells, lift, turn, &geometry, config);

        debug!(index, ?geometry, "pinch preview created");
        Some(Self {
            graph,
            adapter,
            index,
            cells,
            outputs,
        })
    }

    pub fn push_sample(&mut self, recognizer: Recognizer, sample: GestureSample) -> Result<()> {
        Ok(self.adapter.push(recognizer, sample)?)
    }

    /// Advance one display frame
    pub fn tick(&mut self, host_ms: f64) -> PreviewFrame {
        self.adapter.apply_frame(&mut self.graph);
        self.graph.tick(host_ms);
        self.frame()
    }

    pub fn frame(&mut self) -> PreviewFrame {
        PreviewFrame {
            index: self.index,
            releasing: self.graph.get(self.cells.releasing) != 0.0,
            image: self.outputs.sample(&mut self.graph),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The copy has settled back and `PreviewClose` was raised
    pub fn is_closed(&self) -> bool {
        self.graph.get(self.cells.closed) != 0.0
    }

    pub fn scale(&self) -> f32 {
        self.graph.get(self.cells.scale)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }
}

impl std::fmt::Debug for PinchPreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinchPreview")
            .field("index", &self.index)
            .field("scale", &self.scale())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[allow(clippy::too_many_arguments)]
fn build_driver(
    graph: &mut Graph,
    cells: PreviewCells,
    lift: SpringValue,
    turn: SpringValue,
    pinch: GestureCells,
    rotation: GestureCells,
    config: &GalleryConfig,
    events: &EventSink,
) -> Node {
    let active = pinch.is_active();

    let mut settle = |cell: CellId, clock: ClockId, to: f32| {
        when(
            read(cell).ne(to).or(clock_running(clock)),
            set(cell, run_spring(graph, clock, read(cell), 0.0, to, config.spring)),
        )
    };
    let settle_scale = settle(cells.scale, cells.scale_clock, 1.0);
    let settle_x = settle(cells.translate_x, cells.translate_clocks[0], 0.0);
    let settle_y = settle(cells.translate_y, cells.translate_clocks[1], 0.0);

    // Closing stops the driver, so every settle spring must have landed
    let springs_running = clock_running(cells.scale_clock)
        .or(clock_running(cells.translate_clocks[0]))
        .or(clock_running(cells.translate_clocks[1]));
    let settled = (!springs_running)
        .and(read(cells.scale).eq(1.0))
        .and(read(cells.translate_x).eq(0.0))
        .and(read(cells.translate_y).eq(0.0));

    let follow = sequence([
        set(cells.armed, 1.0),
        // Grabbed again while settling back
        when(
            read(cells.releasing),
            sequence([lift.reset(), set(cells.releasing, 0.0)]),
        ),
        stop_clock(cells.scale_clock),
        stop_clock(cells.translate_clocks[0]),
        stop_clock(cells.translate_clocks[1]),
        lift.spring_to(1.0),
        set(cells.scale, read(pinch.scale)),
        set(cells.translate_x, read(pinch.translation_x)),
        set(cells.translate_y, read(pinch.translation_y)),
    ]);
    let release = when(
        read(cells.armed),
        sequence([
            set(cells.releasing, 1.0),
            lift.spring_back(0.0),
            settle_scale,
            settle_x,
            settle_y,
            when(
                lift.back_done()
                    .and(settled)
                    .and(read(cells.closed).eq(0.0)),
                sequence([
                    set(cells.closed, 1.0),
                    events.emit([], |_| GalleryEvent::PreviewClose),
                ]),
            ),
        ]),
    );

    let damping = (read(cells.scale) - 1.0).clamp(0.1, 1.0);
    let rotate_step = select(
        rotation.is_active(),
        sequence([
            turn.reset(),
            set(turn.value, read(rotation.rotation) * damping),
        ]),
        turn.spring_back_with_velocity(0.0, read(rotation.rotation_velocity)),
    );

    when(
        read(cells.closed).eq(0.0),
        sequence([select(active, follow, release), rotate_step]),
    )
}

fn build_outputs(
    cells: PreviewCells,
    lift: SpringValue,
    turn: SpringValue,
    geometry: &ThumbnailGeometry,
    config: &GalleryConfig,
) -> TransformNodes {
    let lifted = |from: f32, to: f32| {
        interpolate(
            read(lift.value),
            [(0.0, lit(from)), (1.0, lit(to))],
            Extrapolate::Clamp,
        )
    };
    let mask_width = lifted(geometry.width, geometry.contain_width);
    let mask_height = lifted(geometry.height, geometry.contain_height);

    // Grow around the thumbnail's center
    let translate_x =
        geometry.x + (geometry.width - mask_width.clone()) / 2.0 + read(cells.translate_x);
    let translate_y =
        geometry.y + (geometry.height - mask_height.clone()) / 2.0 + read(cells.translate_y);

    TransformNodes {
        translate_x,
        translate_y,
        scale: read(cells.scale),
        rotate: read(turn.value),
        width: mask_width.clone(),
        height: mask_height.clone(),
        mask_width,
        mask_height,
        border_radius: interpolate(
            read(cells.scale),
            [(1.0, lit(config.modal.thumbnail_radius)), (1.2, lit(0.0))],
            Extrapolate::Clamp,
        ),
        opacity: interpolate(
            read(cells.scale),
            [(1.0, lit(0.0)), (1.4, lit(0.4)), (2.0, lit(0.8))],
            Extrapolate::Clamp,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_gesture::GesturePhase;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn geometry() -> ThumbnailGeometry {
        ThumbnailGeometry {
            x: 20.0,
            y: 100.0,
            width: 100.0,
            height: 100.0,
            full_width: 400.0,
            full_height: 300.0,
            contain_width: 133.33333,
            contain_height: 100.0,
        }
    }

    fn run(preview: &mut PinchPreview, frames: usize, start: &mut f64) -> PreviewFrame {
        let mut frame = preview.frame();
        for _ in 0..frames {
            *start += FRAME_MS;
            frame = preview.tick(*start);
        }
        frame
    }

    #[test]
    fn test_invalid_geometry_suppresses_preview() {
        let mut geometry = geometry();
        geometry.width = 0.0;
        let preview = PinchPreview::new(&GalleryConfig::default(), 0, geometry, EventSink::new());
        assert!(preview.is_none());
    }

    #[test]
    fn test_idle_preview_stays_on_thumbnail() {
        let events = EventSink::new();
        let mut preview =
            PinchPreview::new(&GalleryConfig::default(), 3, geometry(), events.clone()).unwrap();
        let mut t = 0.0;
        let frame = run(&mut preview, 5, &mut t);

        assert_eq!(frame.image.mask_width, 100.0);
        assert_eq!(frame.image.translate_x, 20.0);
        assert_eq!(frame.image.opacity, 0.0);
        assert_eq!(frame.image.border_radius, 5.0);
        assert!(events.drain().is_empty());
        assert!(!preview.is_closed());
    }

    #[test]
    fn test_pinch_grows_then_closes_once() {
        let events = EventSink::new();
        let mut preview =
            PinchPreview::new(&GalleryConfig::default(), 3, geometry(), events.clone()).unwrap();
        let mut t = 0.0;

        preview
            .push_sample(
                Recognizer::ThumbnailPinch,
                GestureSample::new(GesturePhase::Active).with_scale(1.4),
            )
            .unwrap();
        let frame = run(&mut preview, 60, &mut t);
        assert_eq!(frame.image.scale_x, 1.4);
        assert!((frame.image.opacity - 0.4).abs() < 1e-5);
        assert_eq!(frame.image.border_radius, 0.0);
        assert!((frame.image.mask_width - 133.33333).abs() < 0.5);

        preview
            .push_sample(
                Recognizer::ThumbnailPinch,
                GestureSample::new(GesturePhase::End).with_scale(1.4),
            )
            .unwrap();
        let frame = run(&mut preview, 180, &mut t);
        assert!(frame.releasing);
        assert!(preview.is_closed());
        assert_eq!(preview.scale(), 1.0);

        let closes = events
            .drain()
            .into_iter()
            .filter(|e| *e == GalleryEvent::PreviewClose)
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_close_waits_for_scale_and_translation_to_land() {
        let events = EventSink::new();
        let mut preview =
            PinchPreview::new(&GalleryConfig::default(), 0, geometry(), events.clone()).unwrap();
        let mut t = 0.0;

        let pinch = GestureSample::new(GesturePhase::Active)
            .with_scale(2.5)
            .with_translation(80.0, 120.0);
        preview.push_sample(Recognizer::ThumbnailPinch, pinch).unwrap();
        run(&mut preview, 60, &mut t);

        let release = GestureSample::new(GesturePhase::End)
            .with_scale(2.5)
            .with_translation(80.0, 120.0);
        preview.push_sample(Recognizer::ThumbnailPinch, release).unwrap();

        let mut frames = 0;
        while !preview.is_closed() && frames < 900 {
            run(&mut preview, 1, &mut t);
            frames += 1;
        }
        assert!(preview.is_closed(), "never closed");

        let frame = preview.frame();
        assert_eq!(frame.image.scale_x, 1.0);
        assert_eq!(frame.image.translate_x, 20.0);
        assert_eq!(frame.image.translate_y, 100.0);
        assert_eq!(frame.image.mask_width, 100.0);

        // Nothing moves once closed
        let later = run(&mut preview, 120, &mut t);
        assert_eq!(later.image, frame.image);
        assert_eq!(events.drain().len(), 1);
    }
}
