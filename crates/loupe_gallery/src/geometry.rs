//! Screen-space geometry: rects, image fitting and thumbnail measurement

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both extents finite and positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.size().is_valid()
    }
}

/// Scale an image down so neither extent exceeds `max_screens` screens
///
/// Only the dominant axis (relative to the screen) is checked; the aspect
/// ratio is preserved. Smaller images keep their natural size.
pub fn fit_image_size(natural: Size, screen: Size, max_screens: f32) -> Size {
    if !natural.is_valid() || !screen.is_valid() {
        return natural;
    }
    let h_ratio = natural.height / screen.height;
    let w_ratio = natural.width / screen.width;
    let aspect = natural.width / natural.height;

    if h_ratio > w_ratio {
        if h_ratio > max_screens {
            let height = screen.height * max_screens;
            return Size::new(aspect * height, height);
        }
    } else if w_ratio > max_screens {
        let width = screen.width * max_screens;
        return Size::new(width, width / aspect);
    }
    natural
}

/// On-screen placement of a thumbnail, the anchor of the open transition
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailGeometry {
    pub x: f32,
    pub y: f32,
    /// Visible (cropped) thumbnail size
    pub width: f32,
    pub height: f32,
    /// Natural image size
    pub full_width: f32,
    pub full_height: f32,
    /// Image scaled so it covers the thumbnail box
    pub contain_width: f32,
    pub contain_height: f32,
}

impl ThumbnailGeometry {
    /// Measure a thumbnail showing an image of `natural` size in `window_rect`
    ///
    /// Returns `None` when either the rect or the image size is degenerate.
    pub fn measure(window_rect: Rect, natural: Size, status_bar_offset: f32) -> Option<Self> {
        if !window_rect.is_valid() || !natural.is_valid() {
            return None;
        }
        let h_ratio = window_rect.height / natural.height;
        let w_ratio = window_rect.width / natural.width;
        let contain_ratio = h_ratio.max(w_ratio);

        Some(Self {
            x: window_rect.x,
            y: window_rect.y + status_bar_offset,
            width: window_rect.width,
            height: window_rect.height,
            full_width: natural.width,
            full_height: natural.height,
            contain_width: natural.width * contain_ratio,
            contain_height: natural.height * contain_ratio,
        })
    }

    /// Full-screen anchor used when a thumbnail cannot be measured
    pub fn fallback(screen: Size) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: screen.width,
            height: screen.height,
            full_width: screen.width,
            full_height: screen.height,
            contain_width: screen.width,
            contain_height: screen.height,
        }
    }

    pub fn is_valid(&self) -> bool {
        Rect::new(self.x, self.y, self.width, self.height).is_valid()
            && Size::new(self.contain_width, self.contain_height).is_valid()
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Size = Size {
        width: 400.0,
        height: 800.0,
    };

    #[test]
    fn test_fit_keeps_small_images() {
        let natural = Size::new(300.0, 200.0);
        assert_eq!(fit_image_size(natural, SCREEN, 2.0), natural);
    }

    #[test]
    fn test_fit_scales_tall_images() {
        let fitted = fit_image_size(Size::new(1000.0, 4000.0), SCREEN, 2.0);
        assert_eq!(fitted.height, 1600.0);
        assert_eq!(fitted.width, 400.0);
    }

    #[test]
    fn test_fit_scales_wide_images() {
        let fitted = fit_image_size(Size::new(2000.0, 500.0), SCREEN, 2.0);
        assert_eq!(fitted.width, 800.0);
        assert_eq!(fitted.height, 200.0);
    }

    #[test]
    fn test_measure_contain_box_covers_thumbnail() {
        let rect = Rect::new(10.0, 100.0, 100.0, 100.0);
        let geometry = ThumbnailGeometry::measure(rect, Size::new(400.0, 200.0), 24.0).unwrap();

        // Height is the limiting ratio: 100 / 200
        assert_eq!(geometry.contain_height, 100.0);
        assert_eq!(geometry.contain_width, 200.0);
        assert_eq!(geometry.y, 124.0);
        assert_eq!(geometry.width, 100.0);
    }

    #[test]
    fn test_measure_rejects_degenerate_input() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(ThumbnailGeometry::measure(rect, Size::new(0.0, 100.0), 0.0).is_none());
        let inverted = Rect::new(0.0, 0.0, -5.0, 10.0);
        assert!(ThumbnailGeometry::measure(inverted, Size::new(10.0, 10.0), 0.0).is_none());
        assert!(ThumbnailGeometry::measure(rect, Size::new(f32::NAN, 100.0), 0.0).is_none());
    }

    #[test]
    fn test_fallback_is_full_screen() {
        let geometry = ThumbnailGeometry::fallback(SCREEN);
        assert!(geometry.is_valid());
        assert_eq!(geometry.rect(), Rect::new(0.0, 0.0, 400.0, 800.0));
    }
}
