//! Ruled-versus-unruled decision for a page region.
//!
//! The heuristic only looks at vertical ruling coverage. It is coarse and
//! known to misclassify tables where only some columns carry a drawn rule;
//! a wrong answer is a silent best-effort outcome, not an error.

use crate::geometry::Rectangle;
use crate::ruling::{Ruling, crop_to_area};

/// Thresholds for the vertical-ruling coverage heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TabularHeuristic {
    /// A region needs strictly more vertical rulings than this. Default: `2`.
    pub min_vertical_rulings: usize,
    /// Fraction of the region height a ruling must span to count as
    /// covering it. Default: `0.9`.
    pub min_height_ratio: f64,
    /// Fraction of vertical rulings that must be covering. Default: `0.8`.
    pub min_ruling_fraction: f64,
}

impl Default for TabularHeuristic {
    fn default() -> Self {
        Self {
            min_vertical_rulings: 2,
            min_height_ratio: 0.9,
            min_ruling_fraction: 0.8,
        }
    }
}

impl TabularHeuristic {
    /// Decide whether `area` looks like a ruled table.
    ///
    /// Vertical rulings are cropped to `area` first; other orientations are
    /// ignored.
    pub fn is_tabular(&self, rulings: &[Ruling], area: &Rectangle) -> bool {
        if area.height <= 0.0 {
            return false;
        }
        let verticals: Vec<Ruling> = crop_to_area(rulings, area)
            .into_iter()
            .filter(Ruling::is_vertical)
            .collect();
        if verticals.len() <= self.min_vertical_rulings {
            return false;
        }
        let covering = verticals
            .iter()
            .filter(|v| v.length() / area.height >= self.min_height_ratio)
            .count();
        covering as f64 / verticals.len() as f64 >= self.min_ruling_fraction
    }
}
