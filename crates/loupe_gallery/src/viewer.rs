//! Full-screen image viewer: pinch, pan, rotate and double-tap zoom
//!
//! The viewer composes gesture cells and rubber-band combinators into one
//! effect chain per frame. The chain writes, in order: zoom flags, scale,
//! rotation, then pan, so the pan bounds always see this frame's scale.
//!
//! Scale is treated as anchored at the view's top-left corner; the
//! `extent * (scale - 1) / 2` term in the output translation turns the
//! surface's center-anchored scale into that.

use loupe_animation::{
    bouncy, bouncy_pinch, drag_diff, friction, BouncyClocks, BouncyConfig, PinchFocal, SpringValue,
};
use loupe_core::{
    interpolate, lit, read, select, sequence, set, stop_clock, when, CellId, ClockId, Extrapolate,
    Graph, Node,
};
use loupe_gesture::GestureCells;
use tracing::{debug, warn};

use crate::config::GalleryConfig;
use crate::geometry::{fit_image_size, Size};

/// Recognizers feeding one viewer
#[derive(Clone, Copy, Debug)]
pub struct ViewerInputs {
    pub pan: GestureCells,
    pub pinch: GestureCells,
    pub rotation: GestureCells,
    pub double_tap: GestureCells,
}

/// Live transform pieces of the viewer, before modal progress is applied
#[derive(Clone, Copy, Debug)]
pub struct ImageViewer {
    scale: SpringValue,
    rotation: SpringValue,
    pub pan_x: CellId,
    pub pan_y: CellId,
    /// Translation keeping pinch and zoom focal points fixed
    pub displacement_x: CellId,
    pub displacement_y: CellId,
    zoom_in: CellId,
    zoom_out: CellId,
    zoom_focal_x: CellId,
    zoom_focal_y: CellId,
    previous_scale: CellId,
    /// `0.0` when the image has no usable size
    valid: CellId,
    pub content_width: CellId,
    pub content_height: CellId,
    pan_clocks: [BouncyClocks; 2],
    pinch_clock: ClockId,
    screen: Size,
    max_image_screens: f32,
}

impl ImageViewer {
    /// Allocate the viewer's cells and attach its effect chain
    pub fn new(
        graph: &mut Graph,
        inputs: ViewerInputs,
        config: &GalleryConfig,
        image: Size,
    ) -> Self {
        let screen = config.screen_size();
        let viewer = Self {
            scale: SpringValue::new(graph, 1.0, config.spring),
            rotation: SpringValue::new(graph, 0.0, config.spring),
            pan_x: graph.cell_named("viewer.pan_x", 0.0),
            pan_y: graph.cell_named("viewer.pan_y", 0.0),
            displacement_x: graph.cell_named("viewer.displacement_x", 0.0),
            displacement_y: graph.cell_named("viewer.displacement_y", 0.0),
            zoom_in: graph.cell(0.0),
            zoom_out: graph.cell(0.0),
            zoom_focal_x: graph.cell(0.0),
            zoom_focal_y: graph.cell(0.0),
            previous_scale: graph.cell(1.0),
            valid: graph.cell(0.0),
            content_width: graph.cell(0.0),
            content_height: graph.cell(0.0),
            pan_clocks: [BouncyClocks::new(graph), BouncyClocks::new(graph)],
            pinch_clock: graph.clock(),
            screen,
            max_image_screens: config.viewer.max_image_screens,
        };
        viewer.set_image(graph, image);

        let driver = viewer.build_driver(graph, inputs, config);
        graph.attach(driver);
        viewer
    }

    fn build_driver(
        &self,
        graph: &mut Graph,
        inputs: ViewerInputs,
        config: &GalleryConfig,
    ) -> Node {
        let bouncy_config = BouncyConfig {
            snap: config.snap_timing(),
            decay: config.decay(),
            ..BouncyConfig::default()
        };
        let scale = self.scale.value;
        let pinch_active = inputs.pinch.is_active();
        let pan_active = inputs.pan.is_active();

        // Double tap zooms in at or below the threshold and back out above it
        let double_tap = when(
            inputs.double_tap.tapped(),
            sequence([
                set(self.zoom_focal_x, read(inputs.double_tap.x)),
                set(self.zoom_focal_y, read(inputs.double_tap.y)),
                self.scale.reset(),
                select(
                    read(scale).le(config.viewer.double_tap_threshold),
                    sequence([set(self.zoom_in, 1.0), set(self.zoom_out, 0.0)]),
                    sequence([set(self.zoom_in, 0.0), set(self.zoom_out, 1.0)]),
                ),
            ]),
        );
        // A new pinch takes over from a zoom in flight; cancelling on `Began`
        // lets the pinch ratio pick up its baseline on that frame
        let pinch_cancels_zoom = when(
            pinch_active.clone().or(inputs.pinch.has_began()),
            sequence([set(self.zoom_in, 0.0), set(self.zoom_out, 0.0)]),
        );

        let pinch = bouncy_pinch(
            graph,
            self.pinch_clock,
            scale,
            read(inputs.pinch.scale),
            pinch_active.clone(),
            PinchFocal {
                focal: self.relative(read(inputs.pinch.focal_x), self.pan_x, self.displacement_x),
                displacement: self.displacement_x,
            },
            PinchFocal {
                focal: self.relative(read(inputs.pinch.focal_y), self.pan_y, self.displacement_y),
                displacement: self.displacement_y,
            },
            &bouncy_config,
        );

        let scale_step = select(
            read(self.zoom_in),
            self.zoom_step(self.scale.spring_to(config.viewer.double_tap_scale)),
            select(
                read(self.zoom_out),
                self.zoom_step(self.scale.spring_back(1.0)),
                set(scale, pinch),
            ),
        );

        let damping = (read(scale) - 1.0).clamp(0.1, 1.0);
        let rotation_step = select(
            inputs.rotation.is_active(),
            sequence([
                self.rotation.reset(),
                set(self.rotation.value, read(inputs.rotation.rotation) * damping),
            ]),
            self.rotation
                .spring_back_with_velocity(0.0, read(inputs.rotation.rotation_velocity)),
        );

        let gesture_active = pan_active.clone().or(pinch_active);
        let pan_axis = |graph: &mut Graph,
                        pan: CellId,
                        displacement: CellId,
                        translation: CellId,
                        extent: f32,
                        clocks: BouncyClocks| {
            let upper = select(read(scale).lt(1.0), 0.0, -read(displacement));
            let lower = upper.clone() - extent * (read(scale).max(1.0) - 1.0);
            let delta = drag_diff(graph, read(translation), pan_active.clone());
            let node = bouncy(
                graph,
                clocks,
                pan,
                delta,
                gesture_active.clone(),
                lower,
                upper,
                friction,
                &bouncy_config,
            );
            set(pan, node)
        };
        let pan_x_step = pan_axis(
            graph,
            self.pan_x,
            self.displacement_x,
            inputs.pan.translation_x,
            self.screen.width,
            self.pan_clocks[0],
        );
        let pan_y_step = pan_axis(
            graph,
            self.pan_y,
            self.displacement_y,
            inputs.pan.translation_y,
            self.screen.height,
            self.pan_clocks[1],
        );

        select(
            read(self.valid),
            sequence([
                double_tap,
                pinch_cancels_zoom,
                scale_step,
                rotation_step,
                pan_x_step,
                pan_y_step,
            ]),
            self.rest(),
        )
    }

    /// Focal coordinate relative to the current content origin
    fn relative(&self, focal: Node, pan: CellId, displacement: CellId) -> Node {
        focal - (read(pan) + read(displacement))
    }

    /// Run a zoom spring, shifting the displacement so the tap point stays put
    fn zoom_step(&self, spring: Node) -> Node {
        let scale = self.scale.value;
        let shift = |focal: CellId, pan: CellId, displacement: CellId| {
            let relative = self.relative(read(focal), pan, displacement);
            set(
                displacement,
                read(displacement) - relative * (read(scale) / read(self.previous_scale) - 1.0),
            )
        };
        sequence([
            set(self.previous_scale, read(scale)),
            spring,
            shift(self.zoom_focal_x, self.pan_x, self.displacement_x),
            shift(self.zoom_focal_y, self.pan_y, self.displacement_y),
        ])
    }

    /// Identity transform with every animation cancelled
    fn rest(&self) -> Node {
        sequence([
            self.scale.snap(1.0),
            self.rotation.snap(0.0),
            stop_clock(self.pinch_clock),
            self.pan_clocks[0].stop(),
            self.pan_clocks[1].stop(),
            set(self.pan_x, 0.0),
            set(self.pan_y, 0.0),
            set(self.displacement_x, 0.0),
            set(self.displacement_y, 0.0),
            set(self.zoom_in, 0.0),
            set(self.zoom_out, 0.0),
        ])
    }

    /// Show a different image, resetting zoom, pan and rotation
    ///
    /// A non-positive or non-finite size leaves the viewer static: no pinch,
    /// pan or zoom, identity transform.
    pub fn set_image(&self, graph: &mut Graph, natural: Size) {
        graph.eval(&self.rest());
        if natural.is_valid() {
            let fitted = fit_image_size(natural, self.screen, self.max_image_screens);
            debug!(?natural, ?fitted, "viewer image");
            graph.set(self.content_width, fitted.width);
            graph.set(self.content_height, fitted.height);
            graph.set(self.valid, 1.0);
        } else {
            warn!(?natural, "invalid image size, viewer is static");
            graph.set(self.content_width, 0.0);
            graph.set(self.content_height, 0.0);
            graph.set(self.valid, 0.0);
        }
    }

    pub fn is_static(&self, graph: &Graph) -> bool {
        graph.get(self.valid) == 0.0
    }

    pub fn scale(&self) -> CellId {
        self.scale.value
    }

    pub fn rotation(&self) -> CellId {
        self.rotation.value
    }

    /// Translation contributed by the viewer, faded in with `progress`
    pub fn translate_x(&self, progress: Node) -> Node {
        self.translate(progress, self.pan_x, self.displacement_x, self.screen.width)
    }

    pub fn translate_y(&self, progress: Node) -> Node {
        self.translate(progress, self.pan_y, self.displacement_y, self.screen.height)
    }

    fn translate(&self, progress: Node, pan: CellId, displacement: CellId, extent: f32) -> Node {
        let top_left_fix = extent * (read(self.scale.value) - 1.0) / 2.0;
        let total = read(pan) + read(displacement) + top_left_fix;
        interpolate(progress, [(0.0, lit(0.0)), (1.0, total)], Extrapolate::Clamp)
    }

    /// Scale faded from `1` at progress 0 to the live scale at progress 1
    pub fn scale_output(&self, progress: Node) -> Node {
        interpolate(
            progress,
            [(0.0, lit(1.0)), (1.0, read(self.scale.value))],
            Extrapolate::Clamp,
        )
    }

    pub fn rotate_output(&self) -> Node {
        read(self.rotation.value)
    }
}
