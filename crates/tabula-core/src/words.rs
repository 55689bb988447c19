//! Word merging: turning loose glyphs into text chunks.
//!
//! Glyphs are first put into reading order (rows by vertical overlap, then
//! left to right), then consecutive glyphs on one line are merged while the
//! gap between them stays below the font's word spacing and no vertical
//! ruling separates them.

use crate::geometry::Rectangle;
use crate::ruling::Ruling;
use crate::text::{TextChunk, TextElement};

/// Thresholds for word merging.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WordSettings {
    /// A space is inserted when the gap exceeds this fraction of the running
    /// average character width (or `space_ratio`, whichever is smaller).
    pub char_width_ratio: f64,
    /// Fraction of the space width that also triggers space insertion.
    pub space_ratio: f64,
    /// Space width as a fraction of font size when the font reports none.
    pub default_space_ratio: f64,
    /// A glyph repeating the previous one with at least this overlap ratio
    /// is a duplicate.
    pub duplicate_overlap: f64,
    /// Minimum vertical overlap ratio for two glyphs to share a row.
    pub row_overlap: f64,
}

impl Default for WordSettings {
    fn default() -> Self {
        Self {
            char_width_ratio: 0.3,
            space_ratio: 0.5,
            default_space_ratio: 0.25,
            duplicate_overlap: 0.5,
            row_overlap: 0.4,
        }
    }
}

/// Sort glyphs into rows by vertical overlap, each row left to right.
pub fn reading_order(elements: &[TextElement], row_overlap: f64) -> Vec<TextElement> {
    let mut sorted: Vec<&TextElement> = elements.iter().collect();
    sorted.sort_by(|a, b| a.rect.center().y.total_cmp(&b.rect.center().y));

    let mut rows: Vec<(Rectangle, Vec<&TextElement>)> = Vec::new();
    for e in sorted {
        match rows.last_mut() {
            Some((band, members)) if band.vertical_overlap_ratio(&e.rect) >= row_overlap => {
                *band = band.union(&e.rect);
                members.push(e);
            }
            _ => rows.push((e.rect, vec![e])),
        }
    }

    rows.into_iter()
        .flat_map(|(_, mut members)| {
            members.sort_by(|a, b| a.left().total_cmp(&b.left()));
            members.into_iter().cloned()
        })
        .collect()
}

/// Split every element crossed by a vertical ruling at the ruling's x.
///
/// Only rulings whose vertical span overlaps the element are considered.
pub fn split_by_rulings(elements: &[TextElement], verticals: &[Ruling]) -> Vec<TextElement> {
    let mut out = Vec::with_capacity(elements.len());
    for e in elements {
        let mut xs: Vec<f64> = verticals
            .iter()
            .filter(|v| v.is_vertical() && v.top() <= e.bottom() && v.bottom() >= e.top())
            .map(Ruling::position)
            .filter(|&x| x > e.left() && x < e.right())
            .collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();

        let mut rest = e.clone();
        for x in xs {
            if let Some((left, right)) = rest.split_at(x) {
                out.push(left);
                rest = right;
            }
        }
        out.push(rest);
    }
    out
}

/// True when a vertical ruling separates `prev` from `next`.
fn across_vertical_ruling(prev: &TextElement, next: &TextElement, verticals: &[Ruling]) -> bool {
    let top = prev.top().min(next.top());
    let bottom = prev.bottom().max(next.bottom());
    verticals.iter().any(|v| {
        if !v.is_vertical() || v.top() > bottom || v.bottom() < top {
            return false;
        }
        let x = v.position();
        (prev.left() < x && next.left() >= x) || (prev.left() >= x && next.left() < x)
    })
}

/// Merge glyphs into word chunks.
///
/// A glyph joins the current chunk when it shares the chunk's line, no
/// vertical ruling lies between it and the previous glyph, and the gap is
/// below the space width. A synthetic space is inserted when the gap is
/// large enough to read as a word break. Stacked duplicates and whitespace
/// glyphs drawn over their predecessor are dropped.
///
/// Merging the elements of already merged chunks
/// (via [`TextChunk::to_element`]) yields the same chunks.
pub fn merge_words(
    elements: &[TextElement],
    verticals: &[Ruling],
    settings: &WordSettings,
) -> Vec<TextChunk> {
    let ordered = reading_order(elements, settings.row_overlap);
    let mut chunks: Vec<TextChunk> = Vec::new();
    let mut current: Option<TextChunk> = None;
    let mut width_sum = 0.0;
    let mut char_sum = 0usize;

    for e in ordered {
        if e.is_empty() {
            continue;
        }
        let Some(chunk) = current.as_mut() else {
            width_sum = e.rect.width;
            char_sum = e.char_count();
            current = Some(TextChunk::new(e));
            continue;
        };
        let Some(prev) = chunk.elements.last() else {
            continue;
        };

        if e.text == prev.text && prev.rect.overlap_ratio(&e.rect) > settings.duplicate_overlap {
            continue;
        }
        if e.is_blank() && prev.rect.horizontally_overlaps(&e.rect) {
            continue;
        }

        if e.font_name != prev.font_name || (e.font_size - prev.font_size).abs() > f64::EPSILON {
            width_sum = 0.0;
            char_sum = 0;
        }
        width_sum += e.rect.width;
        char_sum += e.char_count();
        let avg_char_width = width_sum / char_sum.max(1) as f64;

        let space = if e.width_of_space > 0.0 {
            e.width_of_space
        } else if e.font_size > 0.0 {
            settings.default_space_ratio * e.font_size
        } else {
            avg_char_width
        };

        let same_line = chunk.rect.vertical_overlap_ratio(&e.rect) >= settings.row_overlap;
        let gap = e.left() - prev.right();
        let joins = same_line && !across_vertical_ruling(prev, &e, verticals) && gap < space;

        if joins {
            let threshold =
                (settings.char_width_ratio * avg_char_width).min(settings.space_ratio * space);
            if gap > threshold && !prev.is_blank() && !e.is_blank() {
                let mut sp = e.clone();
                sp.text = " ".to_string();
                sp.rect = Rectangle::from_bounds(e.top(), prev.right(), e.bottom(), e.left());
                chunk.push(sp);
            }
            chunk.push(e);
        } else {
            width_sum = e.rect.width;
            char_sum = e.char_count();
            if let Some(done) = current.replace(TextChunk::new(e)) {
                chunks.push(done);
            }
        }
    }
    chunks.extend(current);
    chunks
}
