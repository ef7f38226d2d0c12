//! Per-frame transform records handed to the rendering surface

use loupe_core::{Graph, Node};
use serde::Serialize;

/// Everything the rendering surface needs to draw one layer for a frame
///
/// Translation is applied first, then rotation and scale about the center of
/// the `mask_width` x `mask_height` layout box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Transform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Radians
    pub rotate: f32,
    /// Image content size
    pub width: f32,
    pub height: f32,
    /// Clip box size
    pub mask_width: f32,
    pub mask_height: f32,
    pub border_radius: f32,
    pub opacity: f32,
}

impl Transform {
    /// Map a point in the untransformed layout box to screen space
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        let cx = self.mask_width / 2.0;
        let cy = self.mask_height / 2.0;
        let dx = (x - cx) * self.scale_x;
        let dy = (y - cy) * self.scale_y;
        let (sin, cos) = self.rotate.sin_cos();
        (
            self.translate_x + cx + dx * cos - dy * sin,
            self.translate_y + cy + dx * sin + dy * cos,
        )
    }

    /// Every field finite
    pub fn is_finite(&self) -> bool {
        [
            self.translate_x,
            self.translate_y,
            self.scale_x,
            self.scale_y,
            self.rotate,
            self.width,
            self.height,
            self.mask_width,
            self.mask_height,
            self.border_radius,
            self.opacity,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Output expressions producing a [`Transform`]
#[derive(Clone, Debug)]
pub struct TransformNodes {
    pub translate_x: Node,
    pub translate_y: Node,
    pub scale: Node,
    pub rotate: Node,
    pub width: Node,
    pub height: Node,
    pub mask_width: Node,
    pub mask_height: Node,
    pub border_radius: Node,
    pub opacity: Node,
}

impl TransformNodes {
    /// Read the outputs after a tick
    pub fn sample(&self, graph: &mut Graph) -> Transform {
        let scale = graph.eval(&self.scale);
        Transform {
            translate_x: graph.eval(&self.translate_x),
            translate_y: graph.eval(&self.translate_y),
            scale_x: scale,
            scale_y: scale,
            rotate: graph.eval(&self.rotate),
            width: graph.eval(&self.width),
            height: graph.eval(&self.height),
            mask_width: graph.eval(&self.mask_width),
            mask_height: graph.eval(&self.mask_height),
            border_radius: graph.eval(&self.border_radius),
            opacity: graph.eval(&self.opacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(size: f32) -> Transform {
        Transform {
            scale_x: 1.0,
            scale_y: 1.0,
            width: size,
            height: size,
            mask_width: size,
            mask_height: size,
            opacity: 1.0,
            ..Transform::default()
        }
    }

    #[test]
    fn test_identity_maps_points_unchanged() {
        let t = identity(100.0);
        assert_eq!(t.map_point(30.0, 70.0), (30.0, 70.0));
    }

    #[test]
    fn test_scale_is_about_center() {
        let t = Transform {
            scale_x: 2.0,
            scale_y: 2.0,
            ..identity(100.0)
        };
        assert_eq!(t.map_point(50.0, 50.0), (50.0, 50.0));
        assert_eq!(t.map_point(0.0, 0.0), (-50.0, -50.0));
    }

    #[test]
    fn test_top_left_fix_anchors_scale_at_origin() {
        // Translating by extent * (s - 1) / 2 turns a center scale into a
        // top-left one
        let s = 2.0;
        let t = Transform {
            scale_x: s,
            scale_y: s,
            translate_x: 100.0 * (s - 1.0) / 2.0,
            translate_y: 100.0 * (s - 1.0) / 2.0,
            ..identity(100.0)
        };
        assert_eq!(t.map_point(0.0, 0.0), (0.0, 0.0));
        assert_eq!(t.map_point(10.0, 20.0), (20.0, 40.0));
    }

    #[test]
    fn test_rotation_about_center() {
        let t = Transform {
            rotate: std::f32::consts::FRAC_PI_2,
            ..identity(100.0)
        };
        let (x, y) = t.map_point(100.0, 50.0);
        assert!((x - 50.0).abs() < 1e-4);
        assert!((y - 100.0).abs() < 1e-4);
    }
}
