//! Cell inference from ruling geometry and text assignment into cells.

use std::collections::HashMap;

use crate::geometry::{EPSILON, Point, Rectangle, bounding_box, feq};
use crate::ruling::{Crossing, Ruling, RulingSettings, find_intersections};
use crate::text::{TextChunk, TextElement, normalize_text};
use crate::words::{WordSettings, merge_words};

/// A rectangular table cell.
///
/// Cells are created empty by [`find_cells`] and resolved in place by
/// [`assign_text`]. `PartialEq` compares geometry only; use
/// [`Cell::content_eq`] to also compare text.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub rect: Rectangle,
    /// Word chunks assigned to this cell, in reading order.
    pub text_elements: Vec<TextChunk>,
    /// True once text assignment has run for this cell.
    pub resolved: bool,
    /// True when the cell covers more than one grid row or column.
    pub spanning: bool,
}

impl Cell {
    pub fn new(rect: Rectangle) -> Self {
        Self {
            rect,
            ..Self::default()
        }
    }

    /// Cell spanning from `top_left` to `bottom_right`.
    pub fn from_points(top_left: Point, bottom_right: Point) -> Self {
        Self::new(Rectangle::from_bounds(
            top_left.y,
            top_left.x,
            bottom_right.y,
            bottom_right.x,
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.text_elements.iter().all(TextChunk::is_blank)
    }

    /// Rendered text.
    ///
    /// Chunks on one line are joined with a space; lines are joined with a
    /// space, or with `'\r'` when `use_line_returns` is set. Whitespace runs
    /// collapse to one space and the result is trimmed.
    pub fn text(&self, use_line_returns: bool) -> String {
        let mut chunks: Vec<&TextChunk> =
            self.text_elements.iter().filter(|c| !c.is_empty()).collect();
        chunks.sort_by(|a, b| a.rect.center().y.total_cmp(&b.rect.center().y));

        let mut lines: Vec<(Rectangle, Vec<&TextChunk>)> = Vec::new();
        for chunk in chunks {
            match lines.last_mut() {
                Some((band, members)) if band.vertical_overlap_ratio(&chunk.rect) >= 0.1 => {
                    *band = band.union(&chunk.rect);
                    members.push(chunk);
                }
                _ => lines.push((chunk.rect, vec![chunk])),
            }
        }

        let separator = if use_line_returns { "\r" } else { " " };
        lines
            .into_iter()
            .map(|(_, mut members)| {
                members.sort_by(|a, b| a.left().total_cmp(&b.left()));
                let joined: Vec<String> = members.iter().map(|c| c.text()).collect();
                normalize_text(&joined.join(" "))
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Geometry and rendered text both match.
    pub fn content_eq(&self, other: &Cell) -> bool {
        self == other && self.text(false) == other.text(false)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        feq(self.rect.top, other.rect.top)
            && feq(self.rect.left, other.rect.left)
            && feq(self.rect.width, other.rect.width)
            && feq(self.rect.height, other.rect.height)
    }
}

/// Infer cells from horizontal and vertical rulings.
///
/// Every crossing is tried as a top-left corner. Candidate bottom-left
/// corners are the crossings further down the same vertical ruling, and
/// candidate top-right corners those further along the same horizontal
/// ruling, nearest first. A cell closes at the first bottom-right crossing
/// that lies on both the bottom-left's horizontal and the top-right's
/// vertical ruling. Where a divider is missing the nearest closure is the
/// wider rectangle, which yields one spanning cell; where a boundary is not
/// drawn no cell is produced.
///
/// Empty input yields no cells.
pub fn find_cells(
    horizontals: &[Ruling],
    verticals: &[Ruling],
    settings: &RulingSettings,
) -> Vec<Cell> {
    let intersections = find_intersections(horizontals, verticals, settings.intersection_tolerance);

    let mut by_vertical: HashMap<usize, Vec<&Crossing>> = HashMap::new();
    let mut by_horizontal: HashMap<usize, Vec<&Crossing>> = HashMap::new();
    for crossing in intersections.iter() {
        by_vertical.entry(crossing.vertical).or_default().push(crossing);
        by_horizontal.entry(crossing.horizontal).or_default().push(crossing);
    }

    let mut cells: Vec<Cell> = Vec::new();
    for top_left in intersections.iter() {
        let below = by_vertical
            .get(&top_left.vertical)
            .into_iter()
            .flatten()
            .filter(|c| c.point.y > top_left.point.y);
        let right: Vec<&Crossing> = by_horizontal
            .get(&top_left.horizontal)
            .into_iter()
            .flatten()
            .filter(|c| c.point.x > top_left.point.x)
            .copied()
            .collect();

        let closed = below.into_iter().find_map(|bottom_left| {
            right.iter().find_map(|top_right| {
                let corner = Point::new(top_right.point.x, bottom_left.point.y);
                intersections
                    .at(corner)
                    .iter()
                    .find(|br| {
                        br.horizontal == bottom_left.horizontal
                            && br.vertical == top_right.vertical
                    })
                    .map(|br| br.point)
            })
        });

        if let Some(bottom_right) = closed {
            let cell = Cell::from_points(top_left.point, bottom_right);
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }
    }

    mark_spanning(&mut cells);
    cells
}

/// Flag cells that contain a grid boundary strictly inside their extent.
fn mark_spanning(cells: &mut [Cell]) {
    let mut xs: Vec<f64> = cells
        .iter()
        .flat_map(|c| [c.rect.left, c.rect.right()])
        .collect();
    let mut ys: Vec<f64> = cells
        .iter()
        .flat_map(|c| [c.rect.top, c.rect.bottom()])
        .collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup_by(|a, b| feq(*a, *b));
    ys.sort_by(f64::total_cmp);
    ys.dedup_by(|a, b| feq(*a, *b));

    for cell in cells {
        let r = cell.rect;
        cell.spanning = xs
            .iter()
            .any(|&x| x > r.left + EPSILON && x < r.right() - EPSILON)
            || ys
                .iter()
                .any(|&y| y > r.top + EPSILON && y < r.bottom() - EPSILON);
    }
}

/// True when the two cells share part of a boundary.
fn cells_share_edge(a: &Cell, b: &Cell) -> bool {
    let (a, b) = (&a.rect, &b.rect);
    let shared_vertical = (feq(a.right(), b.left) || feq(a.left, b.right()))
        && a.top < b.bottom() + EPSILON
        && b.top < a.bottom() + EPSILON;
    let shared_horizontal = (feq(a.bottom(), b.top) || feq(a.top, b.bottom()))
        && a.left < b.right() + EPSILON
        && b.left < a.right() + EPSILON;
    shared_vertical || shared_horizontal
}

/// Group cells into spreadsheets: connected components of cells sharing an
/// edge. Groups are ordered by the top, then left, of their bounds, and the
/// cells of each group by top, then left.
pub fn find_spreadsheet_areas(cells: &[Cell]) -> Vec<(Rectangle, Vec<Cell>)> {
    let n = cells.len();
    let mut parent: Vec<usize> = (0..n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if cells_share_edge(&cells[i], &cells[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut groups: HashMap<usize, Vec<Cell>> = HashMap::new();
    for (i, cell) in cells.iter().enumerate() {
        let root = find(&mut parent, i);
        groups.entry(root).or_default().push(cell.clone());
    }

    let mut areas: Vec<(Rectangle, Vec<Cell>)> = groups
        .into_values()
        .filter_map(|mut group| {
            group.sort_by(|a, b| a.rect.cmp_position(&b.rect));
            let bounds = bounding_box(group.iter().map(|c| c.rect))?;
            Some((bounds, group))
        })
        .collect();
    areas.sort_by(|a, b| a.0.cmp_position(&b.0));
    areas
}

/// Assign each element to exactly one cell and resolve every cell.
///
/// An element belongs to the cell containing its center; when several do,
/// the cell whose top-left corner is nearest wins. Elements outside every
/// cell are ignored. Each cell's elements are merged into words, never
/// across the given vertical rulings.
pub fn assign_text(
    cells: &mut [Cell],
    elements: &[TextElement],
    verticals: &[Ruling],
    settings: &WordSettings,
) {
    let mut buckets: Vec<Vec<TextElement>> = vec![Vec::new(); cells.len()];
    for element in elements {
        let center = element.rect.center();
        let owner = cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.rect.contains_point(center, EPSILON))
            .min_by(|(_, a), (_, b)| {
                let da = center.distance(&Point::new(a.rect.left, a.rect.top));
                let db = center.distance(&Point::new(b.rect.left, b.rect.top));
                da.total_cmp(&db)
            })
            .map(|(i, _)| i);
        if let Some(i) = owner {
            buckets[i].push(element.clone());
        }
    }

    for (cell, bucket) in cells.iter_mut().zip(buckets) {
        cell.text_elements = merge_words(&bucket, verticals, settings);
        cell.resolved = true;
    }
}
