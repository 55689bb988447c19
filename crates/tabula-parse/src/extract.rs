//! Page content extraction.
//!
//! Turns interpreter events into the core's page-space inputs: one
//! [`TextElement`] per glyph and raw [`Ruling`]s for painted straight
//! segments. Page space has its origin at the top-left of the crop box
//! with y growing downwards.

use tabula_core::{Point, Rectangle, Ruling, TextElement};
use tracing::debug;

use crate::backend::PdfBackend;
use crate::handler::{ContentHandler, GlyphEvent, PathEvent, PathSegment};
use crate::interpreter::InterpretOptions;
use crate::matrix::Matrix;
use crate::page_geometry::PageGeometry;

/// Rectangles thinner than this in one dimension are drawn lines.
const THIN_RECT: f64 = 2.0;

/// Build the page-space element for one glyph.
///
/// Returns `None` for glyphs that decode to empty text or whose box is
/// degenerate (non-finite coordinates).
pub fn text_element_from_glyph(event: &GlyphEvent, geometry: &PageGeometry) -> Option<TextElement> {
    // Trm = [Tfs*Th 0 0 Tfs 0 Trise] x Tm x CTM
    let font_matrix = Matrix::new(
        event.font_size * event.h_scaling,
        0.0,
        0.0,
        event.font_size,
        0.0,
        event.rise,
    );
    let trm = font_matrix
        .concat(&Matrix::from_array(event.text_matrix))
        .concat(&Matrix::from_array(event.ctm));

    let width = event.width / 1000.0;
    let descent = event.descent / 1000.0;
    let ascent = event.ascent / 1000.0;
    let corners = [
        trm.transform(0.0, descent),
        trm.transform(width, descent),
        trm.transform(width, ascent),
        trm.transform(0.0, ascent),
    ];
    let rect = geometry.rect_around(&corners)?;
    if ![rect.top, rect.left, rect.width, rect.height]
        .iter()
        .all(|v| v.is_finite())
    {
        return None;
    }

    let text = event.unicode.clone().unwrap_or_else(|| {
        char::from_u32(event.char_code)
            .map(|c| c.to_string())
            .unwrap_or_else(|| "\u{FFFD}".to_string())
    });
    if text.is_empty() {
        return None;
    }

    let font_size = trm.c.hypot(trm.d);
    let space_width = event
        .space_width
        .map_or(0.0, |w| w / 1000.0 * trm.a.hypot(trm.b));

    Some(
        TextElement::new(rect, text)
            .with_font(event.font_name.clone(), font_size)
            .with_space_width(space_width),
    )
}

/// Raw rulings for a painted path, in page space.
///
/// Every straight segment (including the closing edge of a closed
/// subpath) becomes a ruling; curves are skipped. An axis-aligned
/// rectangle thinner than two units collapses to its centre line.
pub fn rulings_from_path(event: &PathEvent, geometry: &PageGeometry) -> Vec<Ruling> {
    let mut rulings = Vec::new();
    for subpath in split_subpaths(&event.segments) {
        if let Some(rect) = thin_rectangle(&subpath, geometry) {
            rulings.push(centre_line(&rect));
            continue;
        }
        for (start, end) in subpath.edges {
            let start = geometry.to_page(start);
            let end = geometry.to_page(end);
            if start.distance(&end) > 0.0 {
                rulings.push(Ruling::new(start, end));
            }
        }
    }
    rulings
}

#[derive(Debug, Default)]
struct Subpath {
    /// Straight edges in PDF user space.
    edges: Vec<(Point, Point)>,
    has_curves: bool,
    closed: bool,
}

fn split_subpaths(segments: &[PathSegment]) -> Vec<Subpath> {
    let mut subpaths = Vec::new();
    let mut current = Subpath::default();
    let mut start: Option<Point> = None;
    let mut cursor: Option<Point> = None;

    for segment in segments {
        match *segment {
            PathSegment::MoveTo(p) => {
                if !current.edges.is_empty() || current.has_curves {
                    subpaths.push(std::mem::take(&mut current));
                }
                start = Some(p);
                cursor = Some(p);
            }
            PathSegment::LineTo(p) => {
                if let Some(from) = cursor {
                    current.edges.push((from, p));
                }
                start = start.or(Some(p));
                cursor = Some(p);
            }
            PathSegment::CurveTo { end, .. } => {
                current.has_curves = true;
                start = start.or(Some(end));
                cursor = Some(end);
            }
            PathSegment::ClosePath => {
                if let (Some(from), Some(to)) = (cursor, start) {
                    if from != to {
                        current.edges.push((from, to));
                    }
                }
                current.closed = true;
                cursor = start;
            }
        }
    }
    if !current.edges.is_empty() || current.has_curves {
        subpaths.push(current);
    }
    subpaths
}

/// The page-space box of a thin axis-aligned rectangle subpath.
fn thin_rectangle(subpath: &Subpath, geometry: &PageGeometry) -> Option<Rectangle> {
    if subpath.has_curves || subpath.edges.len() < 3 || subpath.edges.len() > 4 {
        return None;
    }
    let axis_aligned = subpath
        .edges
        .iter()
        .all(|(a, b)| a.x == b.x || a.y == b.y);
    let (first, _) = subpath.edges[0];
    let (_, last) = subpath.edges[subpath.edges.len() - 1];
    // Four edges, or three plus an implicit close back to the start.
    let closed = last == first || (subpath.closed && subpath.edges.len() == 4);
    if !axis_aligned || !(closed || subpath.edges.len() == 4) {
        return None;
    }

    let points: Vec<Point> = subpath.edges.iter().flat_map(|&(a, b)| [a, b]).collect();
    let rect = geometry.rect_around(&points)?;
    (rect.width < THIN_RECT || rect.height < THIN_RECT).then_some(rect)
}

fn centre_line(rect: &Rectangle) -> Ruling {
    if rect.width >= rect.height {
        let y = rect.top + rect.height / 2.0;
        Ruling::horizontal(y, rect.left, rect.right())
    } else {
        let x = rect.left + rect.width / 2.0;
        Ruling::vertical(x, rect.top, rect.bottom())
    }
}

/// Everything the core needs from one page.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub geometry: PageGeometry,
    /// Glyphs in content stream order.
    pub text: Vec<TextElement>,
    /// Raw, un-normalized rulings.
    pub rulings: Vec<Ruling>,
    /// Recoverable interpretation problems.
    pub warnings: Vec<String>,
}

/// Content handler converting events straight into page-space objects.
#[derive(Debug)]
pub struct PageContentCollector {
    geometry: PageGeometry,
    text: Vec<TextElement>,
    rulings: Vec<Ruling>,
    warnings: Vec<String>,
}

impl PageContentCollector {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            text: Vec::new(),
            rulings: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn finish(self) -> PageContent {
        PageContent {
            geometry: self.geometry,
            text: self.text,
            rulings: self.rulings,
            warnings: self.warnings,
        }
    }
}

impl ContentHandler for PageContentCollector {
    fn on_glyph(&mut self, event: GlyphEvent) {
        if let Some(element) = text_element_from_glyph(&event, &self.geometry) {
            self.text.push(element);
        }
    }

    fn on_path_painted(&mut self, event: PathEvent) {
        self.rulings
            .extend(rulings_from_path(&event, &self.geometry));
    }

    fn on_warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Interpret one page and collect its glyphs and rulings.
///
/// # Errors
///
/// Returns the backend's error when the page boxes are malformed or the
/// content cannot be interpreted.
pub fn extract_page_content<B: PdfBackend>(
    doc: &B::Document,
    page: &B::Page,
    options: &InterpretOptions,
) -> Result<PageContent, B::Error> {
    let media_box = B::page_media_box(doc, page)?;
    let crop_box = B::page_crop_box(doc, page)?;
    let rotation = B::page_rotate(doc, page)?;
    let geometry = PageGeometry::new(media_box, crop_box, rotation);

    let mut collector = PageContentCollector::new(geometry);
    B::interpret_page(doc, page, &mut collector, options)?;
    let content = collector.finish();
    debug!(
        glyphs = content.text.len(),
        rulings = content.rulings.len(),
        warnings = content.warnings.len(),
        "extracted page content"
    );
    Ok(content)
}
