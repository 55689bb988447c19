//! Page boxes and the flip from PDF space to top-left page space.
//!
//! PDF user space has its origin at the bottom-left. Tables are described
//! top-down, so every coordinate leaving this crate is measured from the
//! top-left corner of the visible page (the CropBox, else the MediaBox).

use tabula_core::{Point, Rectangle};

/// A PDF page box `[x0 y0 x1 y1]` in native bottom-left coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PageBox {
    /// Corners may be given in any order; they are normalized.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// The visible viewport of one page.
///
/// `/Rotate` is recorded but not applied: coordinates stay in the
/// unrotated orientation of the content stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    media_box: PageBox,
    crop_box: Option<PageBox>,
    rotation: i32,
}

impl PageGeometry {
    pub fn new(media_box: PageBox, crop_box: Option<PageBox>, rotation: i32) -> Self {
        Self {
            media_box,
            crop_box,
            rotation: rotation.rem_euclid(360),
        }
    }

    pub fn media_box(&self) -> PageBox {
        self.media_box
    }

    /// The CropBox when present, else the MediaBox.
    pub fn viewport(&self) -> PageBox {
        self.crop_box.unwrap_or(self.media_box)
    }

    /// Rotation in degrees, normalized to `0..360`.
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn width(&self) -> f64 {
        self.viewport().width()
    }

    pub fn height(&self) -> f64 {
        self.viewport().height()
    }

    /// The page as a rectangle anchored at the origin.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(0.0, 0.0, self.width(), self.height())
    }

    /// Map a point in PDF user space to top-left page space.
    pub fn to_page(&self, p: Point) -> Point {
        let view = self.viewport();
        Point::new(p.x - view.x0, view.y1 - p.y)
    }

    /// Bounding rectangle, in page space, of points given in PDF space.
    pub fn rect_around(&self, points: &[Point]) -> Option<Rectangle> {
        let mapped: Vec<Point> = points.iter().map(|&p| self.to_page(p)).collect();
        let first = mapped.first()?;
        let (mut left, mut top, mut right, mut bottom) = (first.x, first.y, first.x, first.y);
        for p in &mapped[1..] {
            left = left.min(p.x);
            right = right.max(p.x);
            top = top.min(p.y);
            bottom = bottom.max(p.y);
        }
        Some(Rectangle::from_bounds(top, left, bottom, right))
    }
}
