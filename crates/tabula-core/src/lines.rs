//! Grouping word chunks into visual lines and deriving text columns.

use crate::geometry::{Rectangle, bounding_box};
use crate::text::TextChunk;

/// Thresholds for line grouping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSettings {
    /// A chunk starts a new line when its vertical overlap ratio with the
    /// current line falls below this.
    pub min_overlap: f64,
    /// Lines made of one repeated symbol that span more than this fraction
    /// of the text width are treated as drawn separators and dropped.
    pub separator_width_ratio: f64,
    /// Runs of at least this many space glyphs split a chunk in two.
    pub column_space_run: usize,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            min_overlap: 0.1,
            separator_width_ratio: 0.9,
            column_space_run: 3,
        }
    }
}

/// One visual row of text chunks, ordered left to right.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    pub rect: Rectangle,
    pub chunks: Vec<TextChunk>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: TextChunk) {
        self.rect = if self.chunks.is_empty() {
            chunk.rect
        } else {
            self.rect.union(&chunk.rect)
        };
        self.chunks.push(chunk);
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Normalized text of each chunk.
    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(TextChunk::normalized_text).collect()
    }

    fn significant(&self) -> &[TextChunk] {
        let keep = self
            .chunks
            .iter()
            .rposition(|c| !c.normalized_text().is_empty())
            .map_or(0, |i| i + 1);
        &self.chunks[..keep]
    }
}

impl PartialEq for Line {
    /// Compares chunk texts, ignoring trailing empty placeholders.
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

fn is_separator(line: &Line, min_width: f64) -> bool {
    if line.rect.width <= min_width {
        return false;
    }
    let text: String = line
        .chunks
        .iter()
        .flat_map(|c| c.text().chars().collect::<Vec<_>>())
        .filter(|c| !c.is_whitespace())
        .collect();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if !first.is_alphanumeric() => {
            text.chars().count() > 1 && chars.all(|c| c == first)
        }
        _ => false,
    }
}

/// Group chunks (in reading order) into lines.
///
/// Separator lines are dropped and chunks containing long runs of spaces
/// are split, since such runs separate columns in fixed-width layouts.
pub fn group_by_lines(chunks: &[TextChunk], settings: &LineSettings) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    for chunk in chunks.iter().filter(|c| !c.is_empty()) {
        match lines.last_mut() {
            Some(line) if line.rect.vertical_overlap_ratio(&chunk.rect) >= settings.min_overlap => {
                line.push(chunk.clone());
            }
            _ => {
                let mut line = Line::new();
                line.push(chunk.clone());
                lines.push(line);
            }
        }
    }

    let Some(bounds) = bounding_box(lines.iter().map(|l| l.rect)) else {
        return lines;
    };
    let min_width = bounds.width * settings.separator_width_ratio;
    lines.retain(|l| !is_separator(l, min_width));

    for line in &mut lines {
        let mut split = Line::new();
        let mut chunks = std::mem::take(&mut line.chunks);
        chunks.sort_by(|a, b| a.left().total_cmp(&b.left()));
        for chunk in chunks {
            for piece in chunk.split_on_repeated(' ', settings.column_space_run) {
                split.push(piece);
            }
        }
        *line = split;
    }
    lines.retain(|l| !l.is_empty());
    lines
}

/// Right edges of text columns found across all lines.
///
/// Every non-blank chunk is a region; regions that overlap horizontally are
/// merged, across lines, until no two overlap. The right edges of the
/// surviving regions, sorted, are the column boundaries.
pub fn column_positions(lines: &[Line]) -> Vec<f64> {
    let mut regions: Vec<Rectangle> = Vec::new();
    for chunk in lines.iter().flat_map(|l| &l.chunks) {
        if chunk.is_blank() {
            continue;
        }
        let mut region = chunk.rect;
        // Absorb every region the grown one now overlaps.
        loop {
            let before = regions.len();
            regions.retain(|r| {
                if r.horizontally_overlaps(&region) {
                    region = region.union(r);
                    false
                } else {
                    true
                }
            });
            if regions.len() == before {
                break;
            }
        }
        regions.push(region);
    }

    let mut rights: Vec<f64> = regions.iter().map(Rectangle::right).collect();
    rights.sort_by(f64::total_cmp);
    rights
}
