//! Content handler callback trait for content stream interpretation.
//!
//! The interpreter walks a page's operators and reports what gets drawn
//! through a [`ContentHandler`]: one [`GlyphEvent`] per shown character and
//! one [`PathEvent`] per painted path. Turning those into text elements
//! and rulings is the handler's business.

use tabula_core::Point;

/// The type of paint operation applied to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOp {
    Stroke,
    Fill,
    FillAndStroke,
}

/// One segment of a painted path, in PDF user space with the CTM applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CurveTo { c1: Point, c2: Point, end: Point },
    ClosePath,
}

/// A character glyph as it was shown.
///
/// Widths, ascent and descent are in glyph space (thousandths of text
/// space). Combine with the matrices to get the glyph's box.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphEvent {
    /// The character code from the content stream string.
    pub char_code: u32,
    /// Decoded text, if the font could map the code.
    pub unicode: Option<String>,
    /// Base font name (e.g. "Helvetica", "ABCDEF+ArialMT").
    pub font_name: String,
    /// Font size from `Tf`.
    pub font_size: f64,
    /// Glyph advance width.
    pub width: f64,
    /// Advance width of the font's space glyph, when the font has one.
    pub space_width: Option<f64>,
    pub ascent: f64,
    pub descent: f64,
    /// Text matrix at the moment the glyph was shown.
    pub text_matrix: [f64; 6],
    /// Current transformation matrix at the moment the glyph was shown.
    pub ctm: [f64; 6],
    /// Horizontal scaling as a fraction (`Tz 100` is 1.0).
    pub h_scaling: f64,
    /// Text rise from `Ts`.
    pub rise: f64,
}

/// A painted path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEvent {
    pub segments: Vec<PathSegment>,
    pub paint_op: PaintOp,
    /// Stroke line width in user space units, before the CTM.
    pub line_width: f64,
}

/// Callback handler for content stream interpretation.
///
/// All methods have default no-op implementations, so handlers only
/// implement the events they care about.
pub trait ContentHandler {
    /// Called when a character glyph is shown.
    fn on_glyph(&mut self, _event: GlyphEvent) {}

    /// Called when a path is painted (stroked, filled, or both).
    fn on_path_painted(&mut self, _event: PathEvent) {}

    /// Called for recoverable problems; interpretation continues.
    fn on_warning(&mut self, _message: String) {}
}

/// A handler that records every event, mostly for tests and debugging.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    pub glyphs: Vec<GlyphEvent>,
    pub paths: Vec<PathEvent>,
    pub warnings: Vec<String>,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded text of all glyphs, in content stream order.
    pub fn text(&self) -> String {
        self.glyphs
            .iter()
            .filter_map(|g| g.unicode.as_deref())
            .collect()
    }
}

impl ContentHandler for CollectingHandler {
    fn on_glyph(&mut self, event: GlyphEvent) {
        self.glyphs.push(event);
    }

    fn on_path_painted(&mut self, event: PathEvent) {
        self.paths.push(event);
    }

    fn on_warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}
