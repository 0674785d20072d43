//! Coordinate mapping from detector space to view space
//!
//! Detector points are normalized with the origin at the bottom-left. Views put
//! the origin at the top-left with y growing down, and the camera image is
//! usually letterboxed (fit) or cropped (fill) inside the view.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::pose::NormalizedPoint;

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Positive, finite width and height
    pub fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Point in view space (origin top-left, y down)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in view space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// How the camera image is placed inside the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContentMode {
    /// Whole image visible, letterboxed on the shorter axis
    #[default]
    Fit,
    /// View fully covered, image cropped on the longer axis
    Fill,
    /// Image stretched to the view bounds
    Stretch,
}

/// Everything the mapper needs from the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub image_size: Size,
    pub view_bounds: Rect,
    pub content_mode: ContentMode,
}

impl DisplayGeometry {
    pub fn new(image_size: Size, view_bounds: Rect, content_mode: ContentMode) -> Self {
        Self {
            image_size,
            view_bounds,
            content_mode,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.image_size.has_area() {
            return Err(GeometryError::DegenerateImage {
                width: self.image_size.width,
                height: self.image_size.height,
            });
        }
        if !self.view_bounds.size().has_area() {
            return Err(GeometryError::DegenerateView {
                width: self.view_bounds.width,
                height: self.view_bounds.height,
            });
        }
        Ok(())
    }
}

/// Rectangle the image occupies inside the view.
///
/// Degenerate geometry falls back to the full view bounds.
pub fn display_rect(geometry: &DisplayGeometry) -> Rect {
    let view = geometry.view_bounds;
    if geometry.validate().is_err() {
        return view;
    }

    let image = geometry.image_size;
    let scale_x = view.width / image.width;
    let scale_y = view.height / image.height;
    let scale = match geometry.content_mode {
        ContentMode::Fit => scale_x.min(scale_y),
        ContentMode::Fill => scale_x.max(scale_y),
        ContentMode::Stretch => return view,
    };

    let width = image.width * scale;
    let height = image.height * scale;
    Rect {
        x: view.x + (view.width - width) / 2.0,
        y: view.y + (view.height - height) / 2.0,
        width,
        height,
    }
}

/// Maps normalized detector points to view pixels for one display geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    geometry: DisplayGeometry,
    rect: Rect,
}

impl CoordinateMapper {
    pub fn new(geometry: DisplayGeometry) -> Self {
        if let Err(e) = geometry.validate() {
            log::debug!("{}; mapping to full view bounds", e);
        }
        Self {
            geometry,
            rect: display_rect(&geometry),
        }
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    pub fn display_rect(&self) -> Rect {
        self.rect
    }

    /// Flip, scale to the display rectangle, then translate by its origin
    pub fn map(&self, point: NormalizedPoint) -> Point2D {
        let flipped_y = 1.0 - point.y;
        Point2D {
            x: self.rect.x + point.x * self.rect.width,
            y: self.rect.y + flipped_y * self.rect.height,
        }
    }

    /// Inverse of [`map`](Self::map). `None` when the display rectangle has no area.
    pub fn unmap(&self, point: Point2D) -> Option<NormalizedPoint> {
        if !self.rect.size().has_area() {
            return None;
        }
        let x = (point.x - self.rect.x) / self.rect.width;
        let y = 1.0 - (point.y - self.rect.y) / self.rect.height;
        Some(NormalizedPoint::new(x, y))
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(DisplayGeometry::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn geometry(image: (f64, f64), view: (f64, f64), mode: ContentMode) -> DisplayGeometry {
        DisplayGeometry::new(
            Size::new(image.0, image.1),
            Rect::new(0.0, 0.0, view.0, view.1),
            mode,
        )
    }

    fn assert_rect(actual: Rect, expected: Rect) {
        assert!((actual.x - expected.x).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        assert!((actual.y - expected.y).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        assert!((actual.width - expected.width).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        assert!((actual.height - expected.height).abs() < 1e-9, "{:?} != {:?}", actual, expected);
    }

    #[test]
    fn test_fit_letterboxes_wide_image() {
        // 640x480 image in a 390x844 portrait view
        let rect = display_rect(&geometry((640.0, 480.0), (390.0, 844.0), ContentMode::Fit));
        assert_rect(rect, Rect::new(0.0, (844.0 - 292.5) / 2.0, 390.0, 292.5));
    }

    #[test]
    fn test_fit_pillarboxes_tall_image() {
        let rect = display_rect(&geometry((480.0, 640.0), (800.0, 400.0), ContentMode::Fit));
        assert_rect(rect, Rect::new(250.0, 0.0, 300.0, 400.0));
    }

    #[test]
    fn test_fill_crops_and_centers() {
        let rect = display_rect(&geometry((480.0, 640.0), (800.0, 400.0), ContentMode::Fill));
        let height = 640.0 * (800.0 / 480.0);
        assert_rect(rect, Rect::new(0.0, (400.0 - height) / 2.0, 800.0, height));
        assert!(rect.y < 0.0);
    }

    #[test]
    fn test_stretch_uses_view_bounds() {
        let rect = display_rect(&geometry((480.0, 640.0), (800.0, 400.0), ContentMode::Stretch));
        assert_rect(rect, Rect::new(0.0, 0.0, 800.0, 400.0));
    }

    #[test]
    fn test_view_origin_is_honored() {
        let g = DisplayGeometry::new(
            Size::new(100.0, 100.0),
            Rect::new(10.0, 20.0, 200.0, 100.0),
            ContentMode::Fit,
        );
        assert_rect(display_rect(&g), Rect::new(60.0, 20.0, 100.0, 100.0));
    }

    #[test]
    fn test_zero_image_size_falls_back_to_view() {
        for size in [(0.0, 480.0), (640.0, 0.0), (0.0, 0.0)] {
            let g = geometry(size, (390.0, 844.0), ContentMode::Fit);
            assert!(matches!(g.validate(), Err(GeometryError::DegenerateImage { .. })));
            let mapper = CoordinateMapper::new(g);
            assert_rect(mapper.display_rect(), Rect::new(0.0, 0.0, 390.0, 844.0));
            let p = mapper.map(NormalizedPoint::new(0.5, 0.5));
            assert!(p.x.is_finite() && p.y.is_finite());
        }
    }

    #[test]
    fn test_zero_view_produces_no_nan() {
        let g = geometry((640.0, 480.0), (0.0, 0.0), ContentMode::Fill);
        assert!(matches!(g.validate(), Err(GeometryError::DegenerateView { .. })));
        let mapper = CoordinateMapper::new(g);
        let p = mapper.map(NormalizedPoint::new(0.3, 0.7));
        assert_eq!(p, Point2D::new(0.0, 0.0));
        assert_eq!(mapper.unmap(p), None);
    }

    #[test]
    fn test_map_flips_vertically() {
        let mapper = CoordinateMapper::new(geometry(
            (100.0, 100.0),
            (100.0, 100.0),
            ContentMode::Fit,
        ));
        assert_eq!(mapper.map(NormalizedPoint::new(0.0, 0.0)), Point2D::new(0.0, 100.0));
        assert_eq!(mapper.map(NormalizedPoint::new(1.0, 1.0)), Point2D::new(100.0, 0.0));
        assert_eq!(mapper.map(NormalizedPoint::new(0.25, 0.75)), Point2D::new(25.0, 25.0));
    }

    #[test]
    fn test_fit_round_trip() {
        let mut rng = rand::rng();
        for mode in [ContentMode::Fit, ContentMode::Fill] {
            let mapper = CoordinateMapper::new(geometry((640.0, 480.0), (390.0, 844.0), mode));
            for _ in 0..200 {
                let p = NormalizedPoint::new(
                    rng.random_range(0.0..=1.0),
                    rng.random_range(0.0..=1.0),
                );
                let back = mapper.unmap(mapper.map(p)).unwrap();
                assert!((back.x - p.x).abs() < 1e-9);
                assert!((back.y - p.y).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_distinct_points_stay_distinct() {
        let mapper = CoordinateMapper::new(geometry(
            (640.0, 480.0),
            (390.0, 844.0),
            ContentMode::Fit,
        ));
        let a = mapper.map(NormalizedPoint::new(0.5, 0.5));
        let b = mapper.map(NormalizedPoint::new(0.5, 0.5001));
        assert_ne!(a, b);
    }
}
