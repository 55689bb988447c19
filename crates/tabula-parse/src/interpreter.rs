//! Content stream interpreter.
//!
//! Walks the operators of a page (and the Form XObjects it draws) while
//! tracking the graphics and text state, and reports glyphs and painted
//! paths to a [`ContentHandler`]. Color, clipping, images and marked
//! content do not affect table extraction and are skipped.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use tabula_core::Point;
use tracing::warn;

use crate::error::BackendError;
use crate::fonts::Font;
use crate::handler::{ContentHandler, GlyphEvent, PaintOp, PathEvent, PathSegment};
use crate::lopdf_backend::{decode_stream, object_to_f64, resolve};
use crate::matrix::Matrix;

/// Limits applied while interpreting a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpretOptions {
    /// Maximum nesting of Form XObjects.
    pub max_recursion_depth: usize,
}

impl Default for InterpretOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 10,
        }
    }
}

/// Text state parameters that are part of the graphics state.
#[derive(Debug, Clone, PartialEq)]
struct TextParams {
    char_spacing: f64,
    word_spacing: f64,
    /// Percentage; 100 is unscaled.
    h_scaling: f64,
    leading: f64,
    font: Option<String>,
    font_size: f64,
    rise: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 100.0,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct GraphicsState {
    ctm: Matrix,
    line_width: f64,
    text: TextParams,
}

/// The path under construction, in user space with the CTM applied.
#[derive(Debug, Default)]
struct PathBuilder {
    segments: Vec<PathSegment>,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Point) {
        self.segments.push(PathSegment::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, p: Point) {
        if self.current.is_none() {
            self.move_to(p);
            return;
        }
        self.segments.push(PathSegment::LineTo(p));
        self.current = Some(p);
    }

    fn curve_to(&mut self, c1: Point, c2: Point, end: Point) {
        if self.current.is_none() {
            self.move_to(c1);
        }
        self.segments.push(PathSegment::CurveTo { c1, c2, end });
        self.current = Some(end);
    }

    fn close(&mut self) {
        if self.current.is_some() {
            self.segments.push(PathSegment::ClosePath);
            self.current = self.subpath_start;
        }
    }

    fn take(&mut self) -> Vec<PathSegment> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.segments)
    }
}

/// Interpret a decoded content stream against `resources`.
///
/// # Errors
///
/// Returns an error if the stream cannot be tokenized or Form XObjects
/// nest deeper than `options.max_recursion_depth`. Unknown fonts, bad
/// operands and missing XObjects are reported as warnings instead.
pub fn interpret_content(
    doc: &Document,
    content: &[u8],
    resources: &Dictionary,
    handler: &mut dyn ContentHandler,
    options: &InterpretOptions,
) -> Result<(), BackendError> {
    let mut interpreter = Interpreter {
        doc,
        handler,
        options,
        state: GraphicsState {
            line_width: 1.0,
            ..GraphicsState::default()
        },
        saved: Vec::new(),
        text_matrix: Matrix::IDENTITY,
        line_matrix: Matrix::IDENTITY,
        path: PathBuilder::default(),
    };
    interpreter.run(content, resources, 0)
}

struct Interpreter<'a, 'h> {
    doc: &'a Document,
    handler: &'h mut dyn ContentHandler,
    options: &'a InterpretOptions,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path: PathBuilder,
}

impl Interpreter<'_, '_> {
    fn run(
        &mut self,
        content: &[u8],
        resources: &Dictionary,
        depth: usize,
    ) -> Result<(), BackendError> {
        if depth > self.options.max_recursion_depth {
            return Err(BackendError::Interpreter(format!(
                "Form XObject recursion depth {depth} exceeds limit {}",
                self.options.max_recursion_depth
            )));
        }

        let content = Content::decode(content).map_err(|e| {
            BackendError::Interpreter(format!("failed to decode content stream: {e}"))
        })?;
        let mut fonts: HashMap<String, Font> = HashMap::new();

        for op in &content.operations {
            let operands = op.operands.as_slice();
            match op.operator.as_str() {
                // --- Graphics state ---
                "q" => self.saved.push(self.state.clone()),
                "Q" => match self.saved.pop() {
                    Some(state) => self.state = state,
                    None => self.warn("Q without matching q".to_string()),
                },
                "cm" => {
                    if let Some([a, b, c, d, e, f]) = self.numbers::<6>("cm", operands) {
                        self.state.ctm = Matrix::new(a, b, c, d, e, f).concat(&self.state.ctm);
                    }
                }
                "w" => {
                    if let Some([w]) = self.numbers::<1>("w", operands) {
                        self.state.line_width = w;
                    }
                }

                // --- Text state ---
                "BT" => {
                    self.text_matrix = Matrix::IDENTITY;
                    self.line_matrix = Matrix::IDENTITY;
                }
                "ET" => {}
                "Tf" => self.set_font(operands, resources, &mut fonts),
                "Tc" => {
                    if let Some([v]) = self.numbers::<1>("Tc", operands) {
                        self.state.text.char_spacing = v;
                    }
                }
                "Tw" => {
                    if let Some([v]) = self.numbers::<1>("Tw", operands) {
                        self.state.text.word_spacing = v;
                    }
                }
                "Tz" => {
                    if let Some([v]) = self.numbers::<1>("Tz", operands) {
                        self.state.text.h_scaling = v;
                    }
                }
                "TL" => {
                    if let Some([v]) = self.numbers::<1>("TL", operands) {
                        self.state.text.leading = v;
                    }
                }
                "Ts" => {
                    if let Some([v]) = self.numbers::<1>("Ts", operands) {
                        self.state.text.rise = v;
                    }
                }

                // --- Text positioning ---
                "Td" => {
                    if let Some([tx, ty]) = self.numbers::<2>("Td", operands) {
                        self.move_text(tx, ty);
                    }
                }
                "TD" => {
                    if let Some([tx, ty]) = self.numbers::<2>("TD", operands) {
                        self.state.text.leading = -ty;
                        self.move_text(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some([a, b, c, d, e, f]) = self.numbers::<6>("Tm", operands) {
                        self.text_matrix = Matrix::new(a, b, c, d, e, f);
                        self.line_matrix = self.text_matrix;
                    }
                }
                "T*" => self.next_line(),

                // --- Text showing ---
                "Tj" => match operands.first() {
                    Some(Object::String(bytes, _)) => self.show_string(bytes, &fonts),
                    _ => self.warn("Tj: expected a string operand".to_string()),
                },
                "TJ" => match operands.first() {
                    Some(Object::Array(items)) => self.show_array(items, &fonts),
                    _ => self.warn("TJ: expected an array operand".to_string()),
                },
                "'" => {
                    self.next_line();
                    match operands.first() {
                        Some(Object::String(bytes, _)) => self.show_string(bytes, &fonts),
                        _ => self.warn("': expected a string operand".to_string()),
                    }
                }
                "\"" => match operands {
                    [aw, ac, Object::String(bytes, _)] => {
                        if let (Ok(aw), Ok(ac)) = (object_to_f64(aw), object_to_f64(ac)) {
                            self.state.text.word_spacing = aw;
                            self.state.text.char_spacing = ac;
                        }
                        self.next_line();
                        self.show_string(bytes, &fonts);
                    }
                    _ => self.warn("\": expected two numbers and a string".to_string()),
                },

                // --- Path construction ---
                "m" => {
                    if let Some([x, y]) = self.numbers::<2>("m", operands) {
                        let p = self.user_point(x, y);
                        self.path.move_to(p);
                    }
                }
                "l" => {
                    if let Some([x, y]) = self.numbers::<2>("l", operands) {
                        let p = self.user_point(x, y);
                        self.path.line_to(p);
                    }
                }
                "c" => {
                    if let Some([x1, y1, x2, y2, x3, y3]) = self.numbers::<6>("c", operands) {
                        let (c1, c2, end) = (
                            self.user_point(x1, y1),
                            self.user_point(x2, y2),
                            self.user_point(x3, y3),
                        );
                        self.path.curve_to(c1, c2, end);
                    }
                }
                "v" => {
                    if let Some([x2, y2, x3, y3]) = self.numbers::<4>("v", operands) {
                        let (c2, end) = (self.user_point(x2, y2), self.user_point(x3, y3));
                        let c1 = self.path.current.unwrap_or(c2);
                        self.path.curve_to(c1, c2, end);
                    }
                }
                "y" => {
                    if let Some([x1, y1, x3, y3]) = self.numbers::<4>("y", operands) {
                        let (c1, end) = (self.user_point(x1, y1), self.user_point(x3, y3));
                        self.path.curve_to(c1, end, end);
                    }
                }
                "re" => {
                    if let Some([x, y, w, h]) = self.numbers::<4>("re", operands) {
                        let corners = [
                            self.user_point(x, y),
                            self.user_point(x + w, y),
                            self.user_point(x + w, y + h),
                            self.user_point(x, y + h),
                        ];
                        self.path.move_to(corners[0]);
                        for &p in &corners[1..] {
                            self.path.line_to(p);
                        }
                        self.path.close();
                    }
                }
                "h" => self.path.close(),

                // --- Path painting ---
                "S" => self.paint(PaintOp::Stroke, false),
                "s" => self.paint(PaintOp::Stroke, true),
                "f" | "F" | "f*" => self.paint(PaintOp::Fill, false),
                "B" | "B*" => self.paint(PaintOp::FillAndStroke, false),
                "b" | "b*" => self.paint(PaintOp::FillAndStroke, true),
                "n" => {
                    self.path.take();
                }

                // --- XObjects ---
                "Do" => match operands.first() {
                    Some(Object::Name(name)) => self.draw_xobject(name, resources, depth)?,
                    _ => self.warn("Do: expected a name operand".to_string()),
                },

                _ => {}
            }
        }
        Ok(())
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.handler.on_warning(message);
    }

    /// The first `N` operands as numbers, warning when they are missing.
    fn numbers<const N: usize>(&mut self, op: &str, operands: &[Object]) -> Option<[f64; N]> {
        let mut out = [0.0; N];
        if operands.len() >= N {
            let parsed = operands
                .iter()
                .zip(out.iter_mut())
                .all(|(obj, slot)| match object_to_f64(obj) {
                    Ok(v) => {
                        *slot = v;
                        true
                    }
                    Err(_) => false,
                });
            if parsed {
                return Some(out);
            }
        }
        self.warn(format!("{op}: expected {N} numeric operands"));
        None
    }

    fn user_point(&self, x: f64, y: f64) -> Point {
        self.state.ctm.transform(x, y)
    }

    fn move_text(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).concat(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_text(0.0, -leading);
    }

    fn set_font(
        &mut self,
        operands: &[Object],
        resources: &Dictionary,
        fonts: &mut HashMap<String, Font>,
    ) {
        let (Some(Object::Name(name)), Some(size)) = (operands.first(), operands.get(1)) else {
            self.warn("Tf: expected a font name and size".to_string());
            return;
        };
        let name = String::from_utf8_lossy(name).into_owned();
        self.state.text.font_size = object_to_f64(size).unwrap_or(0.0);
        if !fonts.contains_key(&name) {
            let font = match self.load_font(&name, resources) {
                Ok(font) => font,
                Err(e) => {
                    self.warn(format!("font /{name}: {e}; using fallback metrics"));
                    Font::fallback(&name)
                }
            };
            fonts.insert(name.clone(), font);
        }
        self.state.text.font = Some(name);
    }

    fn load_font(&self, name: &str, resources: &Dictionary) -> Result<Font, BackendError> {
        let doc = self.doc;
        let dict = resources
            .get(b"Font")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .and_then(|fonts| fonts.get(name.as_bytes()).ok())
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .ok_or_else(|| BackendError::Font("not found in resources".to_string()))?;
        Font::load(doc, dict)
    }

    fn show_string(&mut self, bytes: &[u8], fonts: &HashMap<String, Font>) {
        let Some(font) = self.state.text.font.as_ref().and_then(|n| fonts.get(n)) else {
            self.warn("text shown before Tf".to_string());
            return;
        };
        let text = self.state.text.clone();
        let h_scaling = text.h_scaling / 100.0;
        let space_width = font.space_width();

        for code in font.codes(bytes) {
            let width = font.width(code);
            self.handler.on_glyph(GlyphEvent {
                char_code: code,
                unicode: font.decode(code),
                font_name: font.base_name().to_string(),
                font_size: text.font_size,
                width,
                space_width,
                ascent: font.ascent(),
                descent: font.descent(),
                text_matrix: self.text_matrix.to_array(),
                ctm: self.state.ctm.to_array(),
                h_scaling,
                rise: text.rise,
            });

            // Word spacing applies to the single-byte code 32 only.
            let word_spacing = if code == 32 && !font.is_composite() {
                text.word_spacing
            } else {
                0.0
            };
            let tx =
                (width / 1000.0 * text.font_size + text.char_spacing + word_spacing) * h_scaling;
            self.text_matrix = Matrix::translation(tx, 0.0).concat(&self.text_matrix);
        }
    }

    fn show_array(&mut self, items: &[Object], fonts: &HashMap<String, Font>) {
        for item in items {
            match item {
                Object::String(bytes, _) => self.show_string(bytes, fonts),
                other => {
                    if let Ok(adjust) = object_to_f64(other) {
                        let text = &self.state.text;
                        let tx = -adjust / 1000.0 * text.font_size * (text.h_scaling / 100.0);
                        self.text_matrix = Matrix::translation(tx, 0.0).concat(&self.text_matrix);
                    }
                }
            }
        }
    }

    fn paint(&mut self, paint_op: PaintOp, close: bool) {
        if close {
            self.path.close();
        }
        let segments = self.path.take();
        if segments.is_empty() {
            return;
        }
        self.handler.on_path_painted(PathEvent {
            segments,
            paint_op,
            line_width: self.state.line_width,
        });
    }

    fn draw_xobject(
        &mut self,
        name: &[u8],
        resources: &Dictionary,
        depth: usize,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let display = String::from_utf8_lossy(name).into_owned();
        let stream = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|o| resolve(doc, o).as_stream().ok());
        let Some(stream) = stream else {
            self.warn(format!("XObject /{display} not found in resources"));
            return Ok(());
        };

        let is_form = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|s| s == b"Form");
        if !is_form {
            return Ok(());
        }

        let content = decode_stream(stream)?;
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .unwrap_or(resources);

        self.saved.push(self.state.clone());
        if let Some(m) = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|arr| form_matrix(arr))
        {
            self.state.ctm = m.concat(&self.state.ctm);
        }
        let result = self.run(&content, form_resources, depth + 1);
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
        result
    }
}

fn form_matrix(arr: &[Object]) -> Option<Matrix> {
    let values: Vec<f64> = arr.iter().map(object_to_f64).collect::<Result<_, _>>().ok()?;
    let m: [f64; 6] = values.try_into().ok()?;
    Some(Matrix::from_array(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::CollectingHandler;
    use lopdf::{Stream, dictionary};

    fn run(content: &[u8]) -> CollectingHandler {
        let doc = Document::with_version("1.5");
        run_with(&doc, content, &Dictionary::new())
    }

    fn run_with(doc: &Document, content: &[u8], resources: &Dictionary) -> CollectingHandler {
        let mut handler = CollectingHandler::new();
        interpret_content(doc, content, resources, &mut handler, &InterpretOptions::default())
            .unwrap();
        handler
    }

    fn helvetica_resources(doc: &mut Document) -> Dictionary {
        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        dictionary! { "Font" => dictionary! { "F1" => font } }
    }

    // --- Paths ---

    #[test]
    fn stroked_line_is_reported_in_user_space() {
        let h = run(b"2 0 0 2 10 10 cm 0 0 m 50 0 l S");
        assert_eq!(h.paths.len(), 1);
        assert_eq!(
            h.paths[0].segments,
            vec![
                PathSegment::MoveTo(Point::new(10.0, 10.0)),
                PathSegment::LineTo(Point::new(110.0, 10.0)),
            ]
        );
        assert_eq!(h.paths[0].paint_op, PaintOp::Stroke);
    }

    #[test]
    fn rectangle_becomes_closed_subpath() {
        let h = run(b"10 20 30 40 re f");
        let segs = &h.paths[0].segments;
        assert_eq!(segs.len(), 5);
        assert_eq!(segs[2], PathSegment::LineTo(Point::new(40.0, 60.0)));
        assert_eq!(segs[4], PathSegment::ClosePath);
        assert_eq!(h.paths[0].paint_op, PaintOp::Fill);
    }

    #[test]
    fn end_path_discards_without_painting() {
        let h = run(b"0 0 m 10 10 l n 0 0 m 5 0 l S");
        assert_eq!(h.paths.len(), 1);
        assert_eq!(h.paths[0].segments.len(), 2);
    }

    #[test]
    fn q_and_q_restore_ctm_and_line_width() {
        let h = run(b"q 3 w 1 0 0 1 100 0 cm 0 0 m 1 0 l S Q 0 0 m 1 0 l S");
        assert_eq!(h.paths[0].line_width, 3.0);
        assert_eq!(h.paths[0].segments[0], PathSegment::MoveTo(Point::new(100.0, 0.0)));
        assert_eq!(h.paths[1].line_width, 1.0);
        assert_eq!(h.paths[1].segments[0], PathSegment::MoveTo(Point::new(0.0, 0.0)));
    }

    #[test]
    fn bad_operands_warn_and_continue() {
        let h = run(b"0 m 0 0 m 5 0 l S");
        assert_eq!(h.warnings.len(), 1);
        assert!(h.warnings[0].starts_with("m:"));
        assert_eq!(h.paths.len(), 1);
    }

    // --- Text ---

    #[test]
    fn glyphs_advance_by_width() {
        let mut doc = Document::with_version("1.5");
        let resources = helvetica_resources(&mut doc);
        let h = run_with(&doc, b"BT /F1 10 Tf 72 700 Td (AB) Tj ET", &resources);
        assert_eq!(h.text(), "AB");
        assert_eq!(h.glyphs[0].text_matrix[4], 72.0);
        // 'A' is 667 units wide in Helvetica.
        assert!((h.glyphs[1].text_matrix[4] - 78.67).abs() < 1e-9);
        assert_eq!(h.glyphs[0].space_width, Some(278.0));
    }

    #[test]
    fn tj_array_adjustments_move_left() {
        let mut doc = Document::with_version("1.5");
        let resources = helvetica_resources(&mut doc);
        let h = run_with(&doc, b"BT /F1 10 Tf [(A) -1000 (B)] TJ ET", &resources);
        let gap = h.glyphs[1].text_matrix[4] - h.glyphs[0].text_matrix[4];
        assert!((gap - 16.67).abs() < 1e-9);
    }

    #[test]
    fn quote_operators_move_to_next_line() {
        let mut doc = Document::with_version("1.5");
        let resources = helvetica_resources(&mut doc);
        let h = run_with(
            &doc,
            b"BT /F1 10 Tf 12 TL 0 100 Td (a) Tj (b) ' 2 1 (c) \" ET",
            &resources,
        );
        assert_eq!(h.text(), "abc");
        assert_eq!(h.glyphs[1].text_matrix[5], 88.0);
        assert_eq!(h.glyphs[2].text_matrix[5], 76.0);
        assert_eq!(h.glyphs[2].text_matrix[4], 0.0);
    }

    #[test]
    fn missing_font_falls_back_with_warning() {
        let h = run(b"BT /F9 12 Tf (x) Tj ET");
        assert_eq!(h.text(), "x");
        assert_eq!(h.glyphs[0].font_name, "F9");
        assert!(h.warnings.iter().any(|w| w.contains("/F9")));
    }

    #[test]
    fn text_before_tf_is_skipped() {
        let h = run(b"BT (x) Tj ET");
        assert!(h.glyphs.is_empty());
        assert_eq!(h.warnings.len(), 1);
    }

    // --- Form XObjects ---

    fn form_doc(form_content: &[u8], matrix: Option<Vec<Object>>) -> (Document, Dictionary) {
        let mut doc = Document::with_version("1.5");
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
        };
        if let Some(m) = matrix {
            dict.set("Matrix", m);
        }
        let form = doc.add_object(Object::Stream(Stream::new(dict, form_content.to_vec())));
        let resources = dictionary! { "XObject" => dictionary! { "Fm1" => form } };
        (doc, resources)
    }

    #[test]
    fn form_xobject_applies_matrix() {
        let matrix = vec![1.into(), 0.into(), 0.into(), 1.into(), 50.into(), 0.into()];
        let (doc, resources) = form_doc(b"0 0 m 10 0 l S", Some(matrix));
        let h = run_with(&doc, b"q /Fm1 Do Q 0 0 m 1 0 l S", &resources);
        assert_eq!(h.paths.len(), 2);
        assert_eq!(h.paths[0].segments[0], PathSegment::MoveTo(Point::new(50.0, 0.0)));
        assert_eq!(h.paths[1].segments[0], PathSegment::MoveTo(Point::new(0.0, 0.0)));
    }

    #[test]
    fn missing_xobject_warns() {
        let h = run(b"/Nope Do");
        assert!(h.warnings[0].contains("/Nope"));
    }

    #[test]
    fn self_referencing_form_hits_depth_limit() {
        let mut doc = Document::with_version("1.5");
        let form_id = doc.new_object_id();
        let resources = dictionary! { "XObject" => dictionary! { "Fm1" => form_id } };
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "Resources" => resources.clone(),
        };
        doc.objects.insert(
            form_id,
            Object::Stream(Stream::new(dict, b"/Fm1 Do".to_vec())),
        );

        let mut handler = CollectingHandler::new();
        let err = interpret_content(
            &doc,
            b"/Fm1 Do",
            &resources,
            &mut handler,
            &InterpretOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BackendError::Interpreter(ref m) if m.contains("depth")));
    }
}
