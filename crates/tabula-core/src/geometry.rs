//! Geometric primitives in page space.
//!
//! Coordinates follow the page layout convention: the origin is the top-left
//! corner of the page and `y` grows downward.

use std::cmp::Ordering;

/// Tolerance used by [`feq`].
pub const EPSILON: f64 = 0.01;

/// Tolerant float equality (`|a - b| < EPSILON`).
pub fn feq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// True when `a` and `b` differ by at most `tolerance`.
pub fn within(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// A point in page space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are within `tolerance` of `other`'s.
    pub fn approx_eq(&self, other: &Point, tolerance: f64) -> bool {
        within(self.x, other.x, tolerance) && within(self.y, other.y, tolerance)
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An axis-aligned rectangle: a query region on a page, or cell geometry.
///
/// Stored as `top`, `left`, `width`, `height`; `right` and `bottom` are
/// derived.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rectangle {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Build a rectangle from its four edges.
    pub fn from_bounds(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self::new(top, left, right - left, bottom - top)
    }

    /// Build a rectangle from a `[top, left, bottom, right]` area.
    pub fn from_corners(corners: [f64; 4]) -> Self {
        let [top, left, bottom, right] = corners;
        Self::from_bounds(top, left, bottom, right)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.left + self.width / 2.0,
            self.top + self.height / 2.0,
        )
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// True when every field is finite and both dimensions are positive.
    pub fn is_valid(&self) -> bool {
        [self.top, self.left, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Inclusive containment of a point, expanded by `tolerance`.
    pub fn contains_point(&self, point: Point, tolerance: f64) -> bool {
        point.x >= self.left - tolerance
            && point.x <= self.right() + tolerance
            && point.y >= self.top - tolerance
            && point.y <= self.bottom() + tolerance
    }

    /// True when `other` lies entirely inside `self` (within `tolerance`).
    pub fn contains(&self, other: &Rectangle, tolerance: f64) -> bool {
        other.left >= self.left - tolerance
            && other.right() <= self.right() + tolerance
            && other.top >= self.top - tolerance
            && other.bottom() <= self.bottom() + tolerance
    }

    /// Length of the shared x-range, zero when disjoint.
    pub fn horizontal_overlap(&self, other: &Rectangle) -> f64 {
        (self.right().min(other.right()) - self.left.max(other.left)).max(0.0)
    }

    /// Length of the shared y-range, zero when disjoint.
    pub fn vertical_overlap(&self, other: &Rectangle) -> f64 {
        (self.bottom().min(other.bottom()) - self.top.max(other.top)).max(0.0)
    }

    pub fn horizontally_overlaps(&self, other: &Rectangle) -> bool {
        self.horizontal_overlap(other) > 0.0
    }

    pub fn vertically_overlaps(&self, other: &Rectangle) -> bool {
        self.vertical_overlap(other) > 0.0
    }

    /// Shared height relative to the shorter of the two rectangles.
    ///
    /// Zero-height rectangles count as fully overlapping when their `top`
    /// lies inside the other's y-range.
    pub fn vertical_overlap_ratio(&self, other: &Rectangle) -> f64 {
        let shorter = self.height.min(other.height);
        if shorter <= 0.0 {
            let touching = self.top <= other.bottom() && other.top <= self.bottom();
            return if touching { 1.0 } else { 0.0 };
        }
        self.vertical_overlap(other) / shorter
    }

    /// Intersection over union of the two areas.
    pub fn overlap_ratio(&self, other: &Rectangle) -> f64 {
        let inter = self.horizontal_overlap(other) * self.vertical_overlap(other);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }

    /// Inclusive intersection test, expanded by `tolerance`.
    pub fn intersects(&self, other: &Rectangle, tolerance: f64) -> bool {
        self.left <= other.right() + tolerance
            && other.left <= self.right() + tolerance
            && self.top <= other.bottom() + tolerance
            && other.top <= self.bottom() + tolerance
    }

    /// Overlapping region, or `None` when the rectangles do not overlap.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > left && bottom > top).then(|| Rectangle::from_bounds(top, left, bottom, right))
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        Rectangle::from_bounds(
            self.top.min(other.top),
            self.left.min(other.left),
            self.bottom().max(other.bottom()),
            self.right().max(other.right()),
        )
    }

    /// Order by `top`, then `left`.
    pub fn cmp_position(&self, other: &Rectangle) -> Ordering {
        self.top
            .total_cmp(&other.top)
            .then(self.left.total_cmp(&other.left))
    }
}

/// Bounding box of a set of rectangles, `None` for an empty set.
pub fn bounding_box<I>(rects: I) -> Option<Rectangle>
where
    I: IntoIterator<Item = Rectangle>,
{
    rects.into_iter().reduce(|acc, r| acc.union(&r))
}
