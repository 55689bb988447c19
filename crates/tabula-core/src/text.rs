//! Positioned text: glyphs, glyph runs and merged chunks.

use unicode_bidi::{BidiClass, bidi_class};
use unicode_normalization::UnicodeNormalization;

use crate::geometry::{Rectangle, within};

/// Reading direction of a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    /// Direction of the first strongly-directional character in `text`.
    ///
    /// Text without strong characters (digits, punctuation) reads `Ltr`.
    pub fn of(text: &str) -> Self {
        for c in text.chars() {
            match bidi_class(c) {
                BidiClass::R | BidiClass::AL => return TextDirection::Rtl,
                BidiClass::L => return TextDirection::Ltr,
                _ => {}
            }
        }
        TextDirection::Ltr
    }
}

/// Normalize text for content comparison.
///
/// Applies NFC, trims, and collapses every whitespace run to one space.
/// Case is preserved.
pub fn normalize_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A positioned glyph or glyph run.
///
/// `PartialEq` compares normalized text only: PDFs routinely shift identical
/// text by sub-pixel amounts, and fixtures compare elements regardless of
/// position. Use [`TextElement::same_geometry`] to compare placement.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextElement {
    pub rect: Rectangle,
    pub text: String,
    pub font_name: String,
    pub font_size: f64,
    /// Advance of a space in this element's font, zero when unknown.
    pub width_of_space: f64,
    pub direction: TextDirection,
}

impl TextElement {
    /// Placeholder with empty text, used for blank slots in table output.
    pub const EMPTY: TextElement = TextElement {
        rect: Rectangle {
            top: 0.0,
            left: 0.0,
            width: 0.0,
            height: 0.0,
        },
        text: String::new(),
        font_name: String::new(),
        font_size: 0.0,
        width_of_space: 0.0,
        direction: TextDirection::Ltr,
    };

    /// Build an element with no font information.
    ///
    /// The direction is derived from the text.
    pub fn new(rect: Rectangle, text: impl Into<String>) -> Self {
        let text = text.into();
        let direction = TextDirection::of(&text);
        Self {
            rect,
            text,
            font_name: String::new(),
            font_size: 0.0,
            width_of_space: 0.0,
            direction,
        }
    }

    pub fn with_font(mut self, name: impl Into<String>, size: f64) -> Self {
        self.font_name = name.into();
        self.font_size = size;
        self
    }

    pub fn with_space_width(mut self, width: f64) -> Self {
        self.width_of_space = width;
        self
    }

    pub fn with_direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn left(&self) -> f64 {
        self.rect.left
    }

    pub fn right(&self) -> f64 {
        self.rect.right()
    }

    pub fn top(&self) -> f64 {
        self.rect.top
    }

    pub fn bottom(&self) -> f64 {
        self.rect.bottom()
    }

    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when the text is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Width divided by character count.
    pub fn average_char_width(&self) -> f64 {
        let n = self.char_count().max(1);
        self.rect.width / n as f64
    }

    /// Compare placement and size after rounding to `tolerance`.
    pub fn same_geometry(&self, other: &TextElement, tolerance: f64) -> bool {
        within(self.rect.top, other.rect.top, tolerance)
            && within(self.rect.left, other.rect.left, tolerance)
            && within(self.rect.width, other.rect.width, tolerance)
            && within(self.rect.height, other.rect.height, tolerance)
            && within(self.font_size, other.font_size, tolerance)
    }

    /// Split at `x` when it falls strictly inside the element.
    ///
    /// The left piece covers `[left, x)` and the right piece `[x, right]`.
    /// Text is divided proportionally at a character boundary, each side
    /// keeping at least one character. Single characters are not split.
    pub fn split_at(&self, x: f64) -> Option<(TextElement, TextElement)> {
        if !(x > self.left() && x < self.right()) {
            return None;
        }
        let chars: Vec<char> = self.text.chars().collect();
        let n = chars.len();
        if n < 2 {
            return None;
        }
        let fraction = (x - self.left()) / self.rect.width;
        let at = ((fraction * n as f64).round() as usize).clamp(1, n - 1);

        let mut left = self.clone();
        left.text = chars[..at].iter().collect();
        left.rect = Rectangle::from_bounds(self.top(), self.left(), self.bottom(), x);

        let mut right = self.clone();
        right.text = chars[at..].iter().collect();
        right.rect = Rectangle::from_bounds(self.top(), x, self.bottom(), self.right());

        Some((left, right))
    }
}

impl PartialEq for TextElement {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_text() == other.normalized_text()
    }
}

/// A merged word or run: consecutive elements on one line.
///
/// Elements are kept in visual (left-to-right) order; [`TextChunk::text`]
/// yields logical order, reversing right-to-left runs.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextChunk {
    pub rect: Rectangle,
    pub elements: Vec<TextElement>,
}

impl TextChunk {
    pub fn new(first: TextElement) -> Self {
        Self {
            rect: first.rect,
            elements: vec![first],
        }
    }

    /// A chunk with no elements, used as a placeholder.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: TextElement) {
        self.rect = if self.elements.is_empty() {
            element.rect
        } else {
            self.rect.union(&element.rect)
        };
        self.elements.push(element);
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.elements.iter().all(TextElement::is_blank)
    }

    pub fn left(&self) -> f64 {
        self.rect.left
    }

    pub fn right(&self) -> f64 {
        self.rect.right()
    }

    pub fn top(&self) -> f64 {
        self.rect.top
    }

    /// Direction held by the majority of strongly-directional elements.
    pub fn direction(&self) -> TextDirection {
        let rtl = self
            .elements
            .iter()
            .filter(|e| e.direction == TextDirection::Rtl)
            .count();
        if rtl * 2 > self.elements.len() {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        }
    }

    /// Concatenated text in logical order.
    pub fn text(&self) -> String {
        match self.direction() {
            TextDirection::Ltr => self.elements.iter().map(|e| e.text.as_str()).collect(),
            TextDirection::Rtl => self.elements.iter().rev().map(|e| e.text.as_str()).collect(),
        }
    }

    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text())
    }

    /// Collapse the chunk into a single glyph-run element.
    pub fn to_element(&self) -> TextElement {
        let first = self.elements.first();
        TextElement {
            rect: self.rect,
            text: self.text(),
            font_name: first.map(|e| e.font_name.clone()).unwrap_or_default(),
            font_size: first.map_or(0.0, |e| e.font_size),
            width_of_space: first.map_or(0.0, |e| e.width_of_space),
            direction: self.direction(),
        }
    }

    /// Split before every run of at least `min_run` consecutive `c` glyphs.
    ///
    /// The run itself is dropped. Chunks without such a run come back whole.
    pub fn split_on_repeated(&self, c: char, min_run: usize) -> Vec<TextChunk> {
        let is_c = |e: &TextElement| {
            let mut chars = e.text.chars();
            chars.next() == Some(c) && chars.next().is_none()
        };

        let mut pieces = Vec::new();
        let mut current = TextChunk::empty();
        let mut i = 0;
        while i < self.elements.len() {
            let run = self.elements[i..].iter().take_while(|e| is_c(e)).count();
            if run >= min_run {
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                }
                i += run;
            } else if run > 0 {
                for e in &self.elements[i..i + run] {
                    current.push(e.clone());
                }
                i += run;
            } else {
                current.push(self.elements[i].clone());
                i += 1;
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }
}

impl PartialEq for TextChunk {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_text() == other.normalized_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::feq;

    fn glyph(left: f64, text: &str) -> TextElement {
        TextElement::new(Rectangle::new(10.0, left, 5.0, 10.0), text)
    }

    // --- Equality ---

    #[test]
    fn test_equality_ignores_padding_and_position() {
        let base = TextElement::new(Rectangle::new(0.0, 0.0, 0.0, 0.0), "Jeremy");
        let padded = TextElement::new(Rectangle::new(0.0, 0.0, 0.0, 0.0), " Jeremy  \n");
        let moved = TextElement::new(Rectangle::new(7.0, 6.0, 8.0, 6.0), "Jeremy").with_font("F1", 12.0);
        assert_eq!(base, padded);
        assert_eq!(base, moved);
    }

    #[test]
    fn test_equality_differs_on_text() {
        let base = TextElement::new(Rectangle::default(), "Jeremy");
        assert_ne!(base, TextElement::new(Rectangle::default(), "jeremy b"));
        assert_ne!(base, TextElement::new(Rectangle::default(), "jeremy    kj"));
        assert_ne!(base, TextElement::new(Rectangle::default(), "jeremy"));
    }

    #[test]
    fn test_same_geometry_is_separate_from_equality() {
        let a = TextElement::new(Rectangle::new(10.0, 10.0, 5.0, 5.0), "x");
        let b = TextElement::new(Rectangle::new(10.004, 10.0, 5.0, 5.0), "y");
        let c = TextElement::new(Rectangle::new(30.0, 10.0, 5.0, 5.0), "x");
        assert!(a.same_geometry(&b, 0.01));
        assert_ne!(a, b);
        assert!(!a.same_geometry(&c, 0.01));
        assert_eq!(a, c);
    }

    #[test]
    fn test_empty_sentinel() {
        assert!(TextElement::EMPTY.is_empty());
        assert_eq!(TextElement::EMPTY, TextElement::new(Rectangle::default(), "  "));
    }

    #[test]
    fn test_normalize_text_composes_unicode() {
        assert_eq!(normalize_text("Cafe\u{301}\t x"), "Caf\u{e9} x");
    }

    // --- Direction ---

    #[test]
    fn test_direction_detection() {
        assert_eq!(TextDirection::of("abc"), TextDirection::Ltr);
        assert_eq!(TextDirection::of("123 \u{5e9}\u{5dc}"), TextDirection::Rtl);
        assert_eq!(TextDirection::of("42"), TextDirection::Ltr);
    }

    // --- Splitting ---

    #[test]
    fn test_split_at_ruling() {
        let e = TextElement::new(Rectangle::new(0.0, 100.0, 100.0, 10.0), "ABCD");
        let (l, r) = e.split_at(150.0).unwrap();
        assert!(feq(l.left(), 100.0));
        assert!(feq(l.right(), 150.0));
        assert!(feq(r.left(), 150.0));
        assert!(feq(r.right(), 200.0));
        assert_eq!(format!("{}{}", l.text, r.text), "ABCD");
        assert_eq!(l.text, "AB");
    }

    #[test]
    fn test_split_outside_or_on_edge_is_none() {
        let e = TextElement::new(Rectangle::new(0.0, 100.0, 100.0, 10.0), "ABCD");
        assert!(e.split_at(100.0).is_none());
        assert!(e.split_at(250.0).is_none());
        let single = TextElement::new(Rectangle::new(0.0, 100.0, 100.0, 10.0), "A");
        assert!(single.split_at(150.0).is_none());
    }

    #[test]
    fn test_split_keeps_a_char_on_each_side() {
        let e = TextElement::new(Rectangle::new(0.0, 0.0, 100.0, 10.0), "ABCD");
        let (l, r) = e.split_at(1.0).unwrap();
        assert_eq!((l.text.as_str(), r.text.as_str()), ("A", "BCD"));
    }

    // --- Chunks ---

    #[test]
    fn test_chunk_text_and_bounds() {
        let mut chunk = TextChunk::new(glyph(0.0, "a"));
        chunk.push(glyph(5.0, "b"));
        assert_eq!(chunk.text(), "ab");
        assert!(feq(chunk.right(), 10.0));
    }

    #[test]
    fn test_rtl_chunk_reads_in_logical_order() {
        let mut chunk = TextChunk::new(glyph(0.0, "\u{5dd}"));
        chunk.push(glyph(5.0, "\u{5dc}"));
        chunk.push(glyph(10.0, "\u{5e9}"));
        assert_eq!(chunk.direction(), TextDirection::Rtl);
        assert_eq!(chunk.text(), "\u{5e9}\u{5dc}\u{5dd}");
    }

    #[test]
    fn test_split_on_repeated_spaces() {
        let mut chunk = TextChunk::new(glyph(0.0, "a"));
        for (i, t) in [" ", " ", " ", "b", " ", "c"].iter().enumerate() {
            chunk.push(glyph(5.0 * (i + 1) as f64, t));
        }
        let pieces = chunk.split_on_repeated(' ', 3);
        let texts: Vec<String> = pieces.iter().map(TextChunk::text).collect();
        assert_eq!(texts, vec!["a", "b c"]);
    }

    #[test]
    fn test_to_element_keeps_text_and_bounds() {
        let mut chunk = TextChunk::new(glyph(0.0, "o").with_space_width(2.5));
        chunk.push(glyph(5.0, "k"));
        let e = chunk.to_element();
        assert_eq!(e.text, "ok");
        assert_eq!(e.rect, chunk.rect);
        assert!(feq(e.width_of_space, 2.5));
    }
}
