//! Ruling lines: drawn segments used as table grid hints.
//!
//! Raw segments from the PDF layer are classified, snapped, merged and cropped
//! here before any grid inference sees them.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::geometry::{EPSILON, Point, Rectangle};

/// Orientation of a ruling relative to the page axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    Horizontal,
    Vertical,
    /// Neither axis-aligned; ignored by grid inference.
    Oblique,
}

/// Tolerances for ruling processing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RulingSettings {
    /// Maximum deviation from an axis for a segment to count as axis-aligned.
    pub orientation_tolerance: f64,
    /// Parallel rulings closer than this are snapped to a shared position.
    pub snap_tolerance: f64,
    /// Collinear segments separated by at most this gap are joined.
    pub join_tolerance: f64,
    /// Slack applied to both spans when testing for a crossing.
    pub intersection_tolerance: f64,
}

impl Default for RulingSettings {
    fn default() -> Self {
        Self {
            orientation_tolerance: 1.0,
            snap_tolerance: 1.0,
            join_tolerance: 1.0,
            intersection_tolerance: 2.0,
        }
    }
}

/// A drawn line segment, classified once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ruling {
    pub start: Point,
    pub end: Point,
    orientation: Orientation,
}

impl Ruling {
    /// Build a ruling, classifying it with the default orientation tolerance.
    pub fn new(start: Point, end: Point) -> Self {
        Self::with_tolerance(start, end, RulingSettings::default().orientation_tolerance)
    }

    /// Build a ruling, classifying it with an explicit orientation tolerance.
    pub fn with_tolerance(start: Point, end: Point, tolerance: f64) -> Self {
        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();
        let orientation = if dx <= tolerance && dy > dx {
            Orientation::Vertical
        } else if dy <= tolerance && dx >= dy {
            Orientation::Horizontal
        } else {
            Orientation::Oblique
        };
        Self {
            start,
            end,
            orientation,
        }
    }

    /// Build a ruling from `top`, `left`, `width`, `height`.
    ///
    /// The segment runs from `(left, top)` to `(left + width, top + height)`.
    pub fn from_rect(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self::new(
            Point::new(left, top),
            Point::new(left + width, top + height),
        )
    }

    /// A horizontal ruling at `y` from `x0` to `x1`.
    pub fn horizontal(y: f64, x0: f64, x1: f64) -> Self {
        Self {
            start: Point::new(x0.min(x1), y),
            end: Point::new(x0.max(x1), y),
            orientation: Orientation::Horizontal,
        }
    }

    /// A vertical ruling at `x` from `y0` to `y1`.
    pub fn vertical(x: f64, y0: f64, y1: f64) -> Self {
        Self {
            start: Point::new(x, y0.min(y1)),
            end: Point::new(x, y0.max(y1)),
            orientation: Orientation::Vertical,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation == Orientation::Vertical
    }

    pub fn is_oblique(&self) -> bool {
        self.orientation == Orientation::Oblique
    }

    /// x for a vertical ruling, y for a horizontal one.
    ///
    /// Oblique rulings report the midpoint x.
    pub fn position(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => (self.start.y + self.end.y) / 2.0,
            Orientation::Vertical | Orientation::Oblique => (self.start.x + self.end.x) / 2.0,
        }
    }

    /// Extent along the ruling's own axis, as `(low, high)`.
    pub fn span(&self) -> (f64, f64) {
        let (a, b) = match self.orientation {
            Orientation::Vertical => (self.start.y, self.end.y),
            Orientation::Horizontal | Orientation::Oblique => (self.start.x, self.end.x),
        };
        (a.min(b), a.max(b))
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    pub fn top(&self) -> f64 {
        self.start.y.min(self.end.y)
    }

    pub fn bottom(&self) -> f64 {
        self.start.y.max(self.end.y)
    }

    pub fn left(&self) -> f64 {
        self.start.x.min(self.end.x)
    }

    pub fn right(&self) -> f64 {
        self.start.x.max(self.end.x)
    }

    /// Bounding rectangle (zero width or height for axis-aligned rulings).
    pub fn bounds(&self) -> Rectangle {
        Rectangle::from_bounds(self.top(), self.left(), self.bottom(), self.right())
    }

    /// Snap an axis-aligned ruling exactly onto its axis, start before end.
    pub fn straightened(&self) -> Ruling {
        let (lo, hi) = self.span();
        let pos = self.position();
        match self.orientation {
            Orientation::Horizontal => Ruling::horizontal(pos, lo, hi),
            Orientation::Vertical => Ruling::vertical(pos, lo, hi),
            Orientation::Oblique => *self,
        }
    }

    fn with_span(&self, lo: f64, hi: f64) -> Ruling {
        match self.orientation {
            Orientation::Horizontal => Ruling::horizontal(self.position(), lo, hi),
            Orientation::Vertical => Ruling::vertical(self.position(), lo, hi),
            Orientation::Oblique => *self,
        }
    }

    fn with_position(&self, pos: f64) -> Ruling {
        let (lo, hi) = self.span();
        match self.orientation {
            Orientation::Horizontal => Ruling::horizontal(pos, lo, hi),
            Orientation::Vertical => Ruling::vertical(pos, lo, hi),
            Orientation::Oblique => *self,
        }
    }

    /// Clip to `area`, or `None` when nothing of the ruling lies inside it.
    ///
    /// Oblique rulings are kept unclipped when their bounds touch the area.
    pub fn crop(&self, area: &Rectangle) -> Option<Ruling> {
        let (lo, hi) = self.span();
        let pos = self.position();
        let (pos_lo, pos_hi, span_lo, span_hi) = match self.orientation {
            Orientation::Horizontal => (area.top, area.bottom(), area.left, area.right()),
            Orientation::Vertical => (area.left, area.right(), area.top, area.bottom()),
            Orientation::Oblique => {
                return self.bounds().intersects(area, 0.0).then_some(*self);
            }
        };
        if pos < pos_lo || pos > pos_hi {
            return None;
        }
        let (lo, hi) = (lo.max(span_lo), hi.min(span_hi));
        (hi > lo).then(|| self.with_span(lo, hi))
    }

    /// Crossing point with a perpendicular ruling, if the two spans meet.
    pub fn intersection_point(&self, other: &Ruling, tolerance: f64) -> Option<Point> {
        let (h, v) = match (self.orientation, other.orientation) {
            (Orientation::Horizontal, Orientation::Vertical) => (self, other),
            (Orientation::Vertical, Orientation::Horizontal) => (other, self),
            _ => return None,
        };
        let (hx0, hx1) = h.span();
        let (vy0, vy1) = v.span();
        let x = v.position();
        let y = h.position();
        let crosses = x >= hx0 - tolerance
            && x <= hx1 + tolerance
            && y >= vy0 - tolerance
            && y <= vy1 + tolerance;
        crosses.then(|| Point::new(x, y))
    }
}

/// Classify, snap and merge raw segments into clean rulings.
///
/// Oblique segments are discarded. Parallel rulings within `snap_tolerance`
/// of each other share their mean position; collinear segments overlapping or
/// separated by at most `join_tolerance` become one ruling. Horizontal
/// rulings come first (by y, then x), verticals after (by x, then y).
/// Normalizing an already normalized set returns it unchanged.
pub fn normalize(rulings: &[Ruling], settings: &RulingSettings) -> Vec<Ruling> {
    let mut horizontals = Vec::new();
    let mut verticals = Vec::new();
    for r in rulings {
        let r = Ruling::with_tolerance(r.start, r.end, settings.orientation_tolerance);
        match r.orientation {
            Orientation::Horizontal => horizontals.push(r.straightened()),
            Orientation::Vertical => verticals.push(r.straightened()),
            Orientation::Oblique => {}
        }
    }

    snap_group(&mut horizontals, settings.snap_tolerance);
    snap_group(&mut verticals, settings.snap_tolerance);

    let mut result = join_collinear(horizontals, settings.join_tolerance);
    result.extend(join_collinear(verticals, settings.join_tolerance));
    result.retain(|r| r.length() > EPSILON);
    result
}

/// Cluster parallel rulings by position and snap each cluster to its mean.
///
/// A ruling joins the running cluster when it is within `tolerance` of the
/// previous member, so distinct clusters stay more than `tolerance` apart.
fn snap_group(rulings: &mut [Ruling], tolerance: f64) {
    if rulings.is_empty() {
        return;
    }
    rulings.sort_by(|a, b| a.position().total_cmp(&b.position()));

    let mut cluster_start = 0;
    for i in 1..=rulings.len() {
        let end_of_cluster = i == rulings.len()
            || rulings[i].position() - rulings[i - 1].position() > tolerance;
        if end_of_cluster {
            let first = rulings[cluster_start].position();
            if rulings[cluster_start..i].iter().all(|r| r.position() == first) {
                cluster_start = i;
                continue;
            }
            let sum: f64 = rulings[cluster_start..i].iter().map(Ruling::position).sum();
            let mean = sum / (i - cluster_start) as f64;
            for r in &mut rulings[cluster_start..i] {
                *r = r.with_position(mean);
            }
            cluster_start = i;
        }
    }
}

/// Merge overlapping or nearly touching segments that share a position.
fn join_collinear(mut rulings: Vec<Ruling>, tolerance: f64) -> Vec<Ruling> {
    if rulings.is_empty() {
        return Vec::new();
    }
    rulings.sort_by(|a, b| {
        a.position()
            .total_cmp(&b.position())
            .then_with(|| a.span().0.total_cmp(&b.span().0))
    });

    let mut result = Vec::new();
    let mut i = 0;
    while i < rulings.len() {
        let group_pos = rulings[i].position();
        let mut j = i + 1;
        while j < rulings.len() && (rulings[j].position() - group_pos).abs() < 1e-9 {
            j += 1;
        }

        let (mut cur_start, mut cur_end) = rulings[i].span();
        for r in &rulings[(i + 1)..j] {
            let (s, e) = r.span();
            if s <= cur_end + tolerance {
                cur_end = cur_end.max(e);
            } else {
                result.push(rulings[i].with_span(cur_start, cur_end));
                cur_start = s;
                cur_end = e;
            }
        }
        result.push(rulings[i].with_span(cur_start, cur_end));
        i = j;
    }
    result
}

/// Clip rulings to `area`, discarding those entirely outside it.
pub fn crop_to_area(rulings: &[Ruling], area: &Rectangle) -> Vec<Ruling> {
    rulings.iter().filter_map(|r| r.crop(area)).collect()
}

/// Row-major key for a crossing: `y` first, then `x`.
pub type PointKey = (OrderedFloat<f64>, OrderedFloat<f64>);

fn point_key(point: Point) -> PointKey {
    (OrderedFloat(point.y), OrderedFloat(point.x))
}

/// A horizontal/vertical crossing, with indexes into the input slices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub point: Point,
    pub horizontal: usize,
    pub vertical: usize,
}

/// Crossings between horizontal and vertical rulings, ordered row-major.
///
/// Several ruling pairs may meet at one point, e.g. two border segments at
/// the same y that both reach a divider; every pair is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intersections {
    map: BTreeMap<PointKey, Vec<Crossing>>,
}

impl Intersections {
    /// Number of distinct crossing points.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The first crossing found at `point`.
    pub fn get(&self, point: Point) -> Option<&Crossing> {
        self.at(point).first()
    }

    /// Every crossing at `point`.
    pub fn at(&self, point: Point) -> &[Crossing] {
        self.map.get(&point_key(point)).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, point: Point) -> bool {
        self.map.contains_key(&point_key(point))
    }

    /// Crossings sorted by y, then x.
    pub fn iter(&self) -> impl Iterator<Item = &Crossing> {
        self.map.values().flatten()
    }

    /// Distinct crossing points, sorted by y, then x.
    pub fn points(&self) -> Vec<Point> {
        self.map.values().filter_map(|c| c.first()).map(|c| c.point).collect()
    }
}

/// Find every crossing between `horizontals` and `verticals`.
///
/// A pair crosses when the vertical's x lies within the horizontal's x-span
/// and the horizontal's y lies within the vertical's y-span, both inclusive
/// and widened by `tolerance`. Rulings of the wrong orientation are skipped.
pub fn find_intersections(
    horizontals: &[Ruling],
    verticals: &[Ruling],
    tolerance: f64,
) -> Intersections {
    let mut map = BTreeMap::new();
    for (hi, h) in horizontals.iter().enumerate() {
        if !h.is_horizontal() {
            continue;
        }
        for (vi, v) in verticals.iter().enumerate() {
            if let Some(point) = h.intersection_point(v, tolerance) {
                map.entry(point_key(point))
                    .or_insert_with(Vec::new)
                    .push(Crossing {
                        point,
                        horizontal: hi,
                        vertical: vi,
                    });
            }
        }
    }
    Intersections { map }
}

/// Split a mixed set into `(horizontals, verticals)`, dropping oblique ones.
pub fn partition(rulings: &[Ruling]) -> (Vec<Ruling>, Vec<Ruling>) {
    let horizontals = rulings.iter().filter(|r| r.is_horizontal()).copied().collect();
    let verticals = rulings.iter().filter(|r| r.is_vertical()).copied().collect();
    (horizontals, verticals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::feq;

    fn settings() -> RulingSettings {
        RulingSettings::default()
    }

    // --- Classification ---

    #[test]
    fn test_classification() {
        assert!(Ruling::from_rect(10.0, 1.0, 10.0, 0.0).is_horizontal());
        assert!(Ruling::from_rect(1.0, 3.0, 0.0, 11.0).is_vertical());
        assert!(Ruling::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0)).is_oblique());
    }

    #[test]
    fn test_almost_vertical_is_vertical() {
        let r = Ruling::new(Point::new(100.0, 0.0), Point::new(100.5, 50.0));
        assert!(r.is_vertical());
        assert!(feq(r.position(), 100.25));
        let s = r.straightened();
        assert_eq!(s.start.x, s.end.x);
    }

    #[test]
    fn test_span_and_length() {
        let r = Ruling::vertical(5.0, 30.0, 10.0);
        assert_eq!(r.span(), (10.0, 30.0));
        assert!(feq(r.length(), 20.0));
    }

    // --- Normalization ---

    #[test]
    fn test_normalize_joins_overlapping_segments() {
        let raw = vec![
            Ruling::horizontal(10.0, 0.0, 50.0),
            Ruling::horizontal(10.0, 40.0, 100.0),
        ];
        let out = normalize(&raw, &settings());
        assert_eq!(out, vec![Ruling::horizontal(10.0, 0.0, 100.0)]);
    }

    #[test]
    fn test_normalize_joins_near_touching_segments() {
        let raw = vec![
            Ruling::vertical(20.0, 0.0, 10.0),
            Ruling::vertical(20.0, 10.8, 30.0),
        ];
        let out = normalize(&raw, &settings());
        assert_eq!(out, vec![Ruling::vertical(20.0, 0.0, 30.0)]);
    }

    #[test]
    fn test_normalize_keeps_distant_segments_apart() {
        let raw = vec![
            Ruling::horizontal(10.0, 0.0, 10.0),
            Ruling::horizontal(10.0, 15.0, 30.0),
        ];
        assert_eq!(normalize(&raw, &settings()).len(), 2);
    }

    #[test]
    fn test_normalize_snaps_jittered_positions() {
        let raw = vec![
            Ruling::vertical(70.0, 0.0, 20.0),
            Ruling::vertical(70.4, 20.0, 40.0),
        ];
        let out = normalize(&raw, &settings());
        assert_eq!(out.len(), 1);
        assert!(feq(out[0].position(), 70.2));
        assert_eq!(out[0].span(), (0.0, 40.0));
    }

    #[test]
    fn test_normalize_discards_oblique() {
        let raw = vec![
            Ruling::new(Point::new(0.0, 0.0), Point::new(30.0, 40.0)),
            Ruling::horizontal(5.0, 0.0, 10.0),
        ];
        let out = normalize(&raw, &settings());
        assert_eq!(out.len(), 1);
        assert!(out[0].is_horizontal());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = vec![
            Ruling::horizontal(10.0, 0.0, 50.0),
            Ruling::horizontal(10.6, 45.0, 90.0),
            Ruling::horizontal(11.4, 200.0, 210.0),
            Ruling::horizontal(40.0, 0.0, 90.0),
            Ruling::vertical(0.0, 10.0, 40.0),
            Ruling::vertical(0.9, 40.5, 60.0),
            Ruling::vertical(90.0, 10.0, 40.0),
        ];
        let once = normalize(&raw, &settings());
        let twice = normalize(&once, &settings());
        assert_eq!(once, twice);
    }

    // --- Cropping ---

    #[test]
    fn test_crop_truncates_partial_rulings() {
        let area = Rectangle::new(0.0, 0.0, 50.0, 50.0);
        let cropped = crop_to_area(&[Ruling::horizontal(10.0, -20.0, 80.0)], &area);
        assert_eq!(cropped, vec![Ruling::horizontal(10.0, 0.0, 50.0)]);
        assert!(cropped[0].is_horizontal());
    }

    #[test]
    fn test_crop_discards_outside_rulings() {
        let area = Rectangle::new(0.0, 0.0, 50.0, 50.0);
        let rulings = [
            Ruling::horizontal(60.0, 0.0, 50.0),
            Ruling::vertical(10.0, 55.0, 90.0),
        ];
        assert!(crop_to_area(&rulings, &area).is_empty());
    }

    #[test]
    fn test_crop_keeps_vertical_classification() {
        let area = Rectangle::new(10.0, 0.0, 100.0, 20.0);
        let cropped = crop_to_area(&[Ruling::vertical(50.0, 0.0, 100.0)], &area);
        assert_eq!(cropped, vec![Ruling::vertical(50.0, 10.0, 30.0)]);
        assert!(cropped[0].is_vertical());
    }

    // --- Intersections ---

    #[test]
    fn test_two_verticals_cross_one_horizontal() {
        let h = [Ruling::from_rect(10.0, 1.0, 10.0, 0.0)];
        let v = [
            Ruling::from_rect(1.0, 3.0, 0.0, 11.0),
            Ruling::from_rect(1.0, 4.0, 0.0, 11.0),
        ];
        let found = find_intersections(&h, &v, settings().intersection_tolerance);
        assert_eq!(found.len(), 2);
        assert_eq!(found.points(), vec![Point::new(3.0, 10.0), Point::new(4.0, 10.0)]);
        let crossing = found.get(Point::new(4.0, 10.0)).unwrap();
        assert_eq!((crossing.horizontal, crossing.vertical), (0, 1));
    }

    #[test]
    fn test_shared_point_keeps_every_pair() {
        // Two segments of one border both reach the divider at x = 50.
        let h = [
            Ruling::horizontal(0.0, 0.0, 49.0),
            Ruling::horizontal(0.0, 51.0, 100.0),
        ];
        let v = [Ruling::vertical(50.0, 0.0, 20.0)];
        let found = find_intersections(&h, &v, settings().intersection_tolerance);
        assert_eq!(found.len(), 1);
        let pairs: Vec<(usize, usize)> = found
            .at(Point::new(50.0, 0.0))
            .iter()
            .map(|c| (c.horizontal, c.vertical))
            .collect();
        assert_eq!(pairs, vec![(0, 0), (1, 0)]);
        assert_eq!(found.iter().count(), 2);
    }

    #[test]
    fn test_crossing_at_span_boundaries() {
        let h = [Ruling::horizontal(10.0, 0.0, 10.0)];
        let v = [Ruling::vertical(3.0, 0.0, 11.0), Ruling::vertical(4.0, 0.0, 11.0)];
        let found = find_intersections(&h, &v, settings().intersection_tolerance);
        assert_eq!(found.points(), vec![Point::new(3.0, 10.0), Point::new(4.0, 10.0)]);
    }

    #[test]
    fn test_no_crossing_without_y_overlap() {
        let h = [Ruling::horizontal(20.0, 0.0, 10.0)];
        let v = [Ruling::vertical(3.0, 0.0, 11.0)];
        assert!(find_intersections(&h, &v, settings().intersection_tolerance).is_empty());

        let h = [Ruling::from_rect(10.0, 1.0, 10.0, 0.0)];
        let v = [Ruling::from_rect(20.0, 3.0, 0.0, 11.0)];
        assert!(find_intersections(&h, &v, settings().intersection_tolerance).is_empty());
    }

    #[test]
    fn test_intersections_independent_of_input_order() {
        let h = [
            Ruling::horizontal(0.0, 0.0, 20.0),
            Ruling::horizontal(10.0, 0.0, 20.0),
        ];
        let v = [Ruling::vertical(0.0, 0.0, 10.0), Ruling::vertical(20.0, 0.0, 10.0)];
        let mut h_rev = h;
        h_rev.reverse();
        let mut v_rev = v;
        v_rev.reverse();
        let a = find_intersections(&h, &v, 2.0).points();
        let b = find_intersections(&h_rev, &v_rev, 2.0).points();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn test_intersections_ignore_swapped_roles() {
        let h = [Ruling::horizontal(10.0, 0.0, 10.0)];
        let v = [Ruling::vertical(3.0, 0.0, 11.0)];
        assert!(find_intersections(&v, &h, 2.0).is_empty());
    }

    #[test]
    fn test_partition() {
        let rulings = [
            Ruling::horizontal(1.0, 0.0, 5.0),
            Ruling::vertical(1.0, 0.0, 5.0),
            Ruling::new(Point::new(0.0, 0.0), Point::new(9.0, 9.0)),
        ];
        let (h, v) = partition(&rulings);
        assert_eq!((h.len(), v.len()), (1, 1));
    }
}
