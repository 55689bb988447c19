//! Removal of stacked duplicate glyphs.
//!
//! Some generators fake bold text by drawing the same glyph twice at nearly
//! the same spot. Left in place, the copies double every letter of a cell.

use std::collections::HashMap;

use crate::text::TextElement;

/// Smallest bucket size, so glyph coordinates never overflow a bucket key.
const MIN_BUCKET: f64 = 1e-3;

/// Options for duplicate glyph detection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DedupeOptions {
    /// Maximum distance (in points) between the `left`/`top` of two glyphs
    /// for them to count as duplicates. Default: `1.0`.
    pub tolerance: f64,
    /// Also require the same font name and size. Default: `true`.
    pub match_font: bool,
}

impl Default for DedupeOptions {
    fn default() -> Self {
        Self {
            tolerance: 1.0,
            match_font: true,
        }
    }
}

fn is_duplicate(a: &TextElement, b: &TextElement, options: &DedupeOptions) -> bool {
    if a.text != b.text {
        return false;
    }
    let dx = (a.rect.left - b.rect.left).abs();
    let dy = (a.rect.top - b.rect.top).abs();
    if dx > options.tolerance || dy > options.tolerance {
        return false;
    }
    !options.match_font
        || (a.font_name == b.font_name && (a.font_size - b.font_size).abs() < f64::EPSILON)
}

/// Remove duplicate glyphs, keeping the first occurrence of each.
///
/// Kept glyphs are bucketed on a grid of `tolerance`-sized cells so each
/// candidate is only compared with glyphs in neighbouring cells.
pub fn dedupe_elements(elements: &[TextElement], options: &DedupeOptions) -> Vec<TextElement> {
    let cell = options.tolerance.max(MIN_BUCKET);
    let bucket = |e: &TextElement| {
        (
            (e.rect.left / cell).floor() as i64,
            (e.rect.top / cell).floor() as i64,
        )
    };

    let mut kept: Vec<TextElement> = Vec::with_capacity(elements.len());
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();

    for element in elements {
        let (bx, by) = bucket(element);
        let duplicate = (bx.saturating_sub(1)..=bx.saturating_add(1))
            .flat_map(|x| (by.saturating_sub(1)..=by.saturating_add(1)).map(move |y| (x, y)))
            .filter_map(|key| grid.get(&key))
            .flatten()
            .any(|&i| is_duplicate(&kept[i], element, options));
        if !duplicate {
            grid.entry((bx, by)).or_default().push(kept.len());
            kept.push(element.clone());
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;

    fn glyph(text: &str, left: f64, top: f64) -> TextElement {
        TextElement::new(Rectangle::new(top, left, 6.0, 10.0), text).with_font("Helvetica", 10.0)
    }

    // --- Detection ---

    #[test]
    fn test_double_struck_glyphs_collapse() {
        let input = vec![
            glyph("B", 10.0, 10.0),
            glyph("B", 10.3, 10.2),
            glyph("o", 16.0, 10.0),
            glyph("o", 16.3, 10.2),
        ];
        let out = dedupe_elements(&input, &DedupeOptions::default());
        let text: String = out.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(text, "Bo");
        assert_eq!(out[0].rect.left, 10.0);
    }

    #[test]
    fn test_zero_tolerance_far_from_origin() {
        let exact = DedupeOptions {
            tolerance: 0.0,
            ..DedupeOptions::default()
        };
        let input = vec![glyph("x", 5000.0, 5000.0), glyph("x", 5000.0, 5000.0)];
        assert_eq!(dedupe_elements(&input, &exact).len(), 1);

        let huge = vec![glyph("x", 1e300, -1e300), glyph("x", 1e300, -1e300)];
        assert_eq!(dedupe_elements(&huge, &exact).len(), 1);
    }

    #[test]
    fn test_distinct_neighbours_are_kept() {
        let input = vec![glyph("l", 10.0, 10.0), glyph("l", 13.0, 10.0)];
        assert_eq!(dedupe_elements(&input, &DedupeOptions::default()).len(), 2);
    }

    #[test]
    fn test_different_text_is_kept() {
        let input = vec![glyph("a", 10.0, 10.0), glyph("b", 10.0, 10.0)];
        assert_eq!(dedupe_elements(&input, &DedupeOptions::default()).len(), 2);
    }

    #[test]
    fn test_font_match_is_optional() {
        let a = glyph("x", 0.0, 0.0);
        let b = glyph("x", 0.5, 0.0).with_font("Helvetica-Bold", 10.0);
        assert_eq!(dedupe_elements(&[a.clone(), b.clone()], &DedupeOptions::default()).len(), 2);
        let loose = DedupeOptions {
            match_font: false,
            ..DedupeOptions::default()
        };
        assert_eq!(dedupe_elements(&[a, b], &loose).len(), 1);
    }

    #[test]
    fn test_duplicates_across_bucket_boundary() {
        let input = vec![glyph("z", 9.9, 0.0), glyph("z", 10.1, 0.0)];
        assert_eq!(dedupe_elements(&input, &DedupeOptions::default()).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedupe_elements(&[], &DedupeOptions::default()).is_empty());
    }
}
