//! Font loading: glyph widths, vertical metrics and code-to-text decoding.
//!
//! Simple fonts take widths from `/FirstChar` + `/Widths`, then
//! `/FontDescriptor /MissingWidth`, then the built-in standard 14 tables.
//! Composite (Type0) fonts use two-byte codes and the descendant's `/W`
//! and `/DW`. Text comes from `/ToUnicode` when present; simple fonts fall
//! back to Windows-1252.

use std::collections::HashMap;

use tracing::warn;

use crate::cmap::ToUnicode;
use crate::error::BackendError;
use crate::lopdf_backend::{decode_stream, object_to_f64, resolve};

/// Default glyph width when a font gives no information.
const DEFAULT_WIDTH: f64 = 600.0;

/// Default descent, in glyph space, when no descriptor provides one.
const DEFAULT_DESCENT: f64 = -250.0;

/// Default `/DW` for composite fonts.
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Largest CID a two-byte code can select.
const MAX_CID: u32 = 0xFFFF;

/// A font resolved from a page's resources.
#[derive(Debug, Clone)]
pub struct Font {
    base_name: String,
    composite: bool,
    first_char: u32,
    widths: Vec<f64>,
    missing_width: f64,
    cid_widths: HashMap<u32, f64>,
    standard: Option<&'static [u16; 95]>,
    descent: f64,
    to_unicode: Option<ToUnicode>,
}

impl Font {
    /// Metrics for a font known only by name (missing or broken resource).
    pub fn fallback(name: &str) -> Self {
        Font {
            base_name: name.to_string(),
            composite: false,
            first_char: 0,
            widths: Vec::new(),
            missing_width: 0.0,
            cid_widths: HashMap::new(),
            standard: standard_widths(name),
            descent: DEFAULT_DESCENT,
            to_unicode: None,
        }
    }

    /// Load a font from its dictionary.
    pub fn load(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Result<Self, BackendError> {
        let base_name = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| resolve(doc, o).as_name().ok())
            .map(|n| String::from_utf8_lossy(n).into_owned())
            .unwrap_or_default();
        let subtype = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"");

        let to_unicode = match dict.get(b"ToUnicode") {
            Ok(obj) => match resolve(doc, obj).as_stream() {
                Ok(stream) => Some(ToUnicode::parse(&decode_stream(stream)?)?),
                Err(_) => None,
            },
            Err(_) => None,
        };

        if subtype == b"Type0" {
            return Self::load_composite(doc, dict, base_name, to_unicode);
        }

        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| object_to_f64(resolve(doc, o)).ok())
            .map_or(0, |v| v as u32);
        let widths = number_array(doc, dict.get(b"Widths").ok());
        let descriptor = descriptor(doc, dict);

        Ok(Font {
            standard: standard_widths(&base_name),
            base_name,
            composite: false,
            first_char,
            widths,
            missing_width: descriptor.missing_width,
            cid_widths: HashMap::new(),
            descent: descriptor.descent,
            to_unicode,
        })
    }

    fn load_composite(
        doc: &lopdf::Document,
        dict: &lopdf::Dictionary,
        base_name: String,
        to_unicode: Option<ToUnicode>,
    ) -> Result<Self, BackendError> {
        let descendant = dict
            .get(b"DescendantFonts")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .and_then(|arr| arr.first())
            .and_then(|o| resolve(doc, o).as_dict().ok())
            .ok_or_else(|| {
                BackendError::Font(format!("Type0 font {base_name} has no descendant font"))
            })?;

        let default_width = descendant
            .get(b"DW")
            .ok()
            .and_then(|o| object_to_f64(resolve(doc, o)).ok())
            .unwrap_or(DEFAULT_CID_WIDTH);
        let cid_widths = match descendant.get(b"W") {
            Ok(obj) => match resolve(doc, obj).as_array() {
                Ok(arr) => parse_cid_widths(doc, arr),
                Err(_) => HashMap::new(),
            },
            Err(_) => HashMap::new(),
        };
        let descriptor = descriptor(doc, descendant);

        Ok(Font {
            base_name,
            composite: true,
            first_char: 0,
            widths: Vec::new(),
            missing_width: default_width,
            cid_widths,
            standard: None,
            descent: descriptor.descent,
            to_unicode,
        })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn is_composite(&self) -> bool {
        self.composite
    }

    /// Split a shown string into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.composite {
            bytes
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => (u32::from(*hi) << 8) | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }

    /// Advance width of `code` in glyph space.
    pub fn width(&self, code: u32) -> f64 {
        if self.composite {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.missing_width);
        }
        if let Some(w) = code
            .checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
        {
            return *w;
        }
        if self.missing_width > 0.0 {
            return self.missing_width;
        }
        match self.standard {
            Some(table) => (32..=126)
                .contains(&code)
                .then(|| f64::from(table[(code - 32) as usize]))
                .unwrap_or(DEFAULT_WIDTH),
            None if self.base_name.starts_with("Courier") => 600.0,
            None => DEFAULT_WIDTH,
        }
    }

    /// Decoded text for `code`.
    pub fn decode(&self, code: u32) -> Option<String> {
        if let Some(text) = self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
            return Some(text.to_string());
        }
        if self.composite {
            return None;
        }
        let bytes = [u8::try_from(code).ok()?];
        let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(&bytes);
        (!had_errors).then(|| text.into_owned())
    }

    /// Advance width of the space glyph, if the font has one.
    pub fn space_width(&self) -> Option<f64> {
        let code = if self.composite {
            // Composite fonts expose the space only through ToUnicode.
            self.to_unicode.as_ref()?.code_for(" ")?
        } else {
            32
        };
        let w = self.width(code);
        (w > 0.0).then_some(w)
    }

    /// Glyph box bottom relative to the baseline, in glyph space.
    pub fn descent(&self) -> f64 {
        self.descent
    }

    /// Glyph box top; the box is one em tall.
    pub fn ascent(&self) -> f64 {
        1000.0 + self.descent
    }
}

struct Descriptor {
    missing_width: f64,
    descent: f64,
}

fn descriptor(doc: &lopdf::Document, font: &lopdf::Dictionary) -> Descriptor {
    let dict = font
        .get(b"FontDescriptor")
        .ok()
        .and_then(|o| resolve(doc, o).as_dict().ok());
    let number = |key: &[u8]| {
        dict.and_then(|d| d.get(key).ok())
            .and_then(|o| object_to_f64(resolve(doc, o)).ok())
    };
    let descent = match (number(b"Ascent"), number(b"Descent")) {
        (Some(a), Some(d)) if a == 0.0 && d == 0.0 => 0.0,
        (_, Some(d)) => d.min(0.0),
        _ => DEFAULT_DESCENT,
    };
    Descriptor {
        missing_width: number(b"MissingWidth").unwrap_or(0.0),
        descent,
    }
}

fn number_array(doc: &lopdf::Document, obj: Option<&lopdf::Object>) -> Vec<f64> {
    obj.and_then(|o| resolve(doc, o).as_array().ok())
        .map(|arr| {
            arr.iter()
                .map(|o| object_to_f64(resolve(doc, o)).unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse a `/W` array: `c [w1 w2 ...]` or `c_first c_last w` entries.
fn parse_cid_widths(doc: &lopdf::Document, arr: &[lopdf::Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < arr.len() {
        let Ok(first) = object_to_f64(resolve(doc, &arr[i])) else {
            warn!("skipping malformed /W entry at index {i}");
            i += 1;
            continue;
        };
        let first = first as u32;
        match arr.get(i + 1).map(|o| resolve(doc, o)) {
            Some(lopdf::Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    let Some(code) = u32::try_from(offset)
                        .ok()
                        .and_then(|o| first.checked_add(o))
                        .filter(|&c| c <= MAX_CID)
                    else {
                        break;
                    };
                    if let Ok(w) = object_to_f64(resolve(doc, w)) {
                        widths.insert(code, w);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = object_to_f64(last).map_or(first, |v| v as u32).min(MAX_CID);
                let w = arr
                    .get(i + 2)
                    .and_then(|o| object_to_f64(resolve(doc, o)).ok())
                    .unwrap_or(DEFAULT_CID_WIDTH);
                // Empty when `first` is past the last valid CID.
                for code in first..=last {
                    widths.insert(code, w);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// Widths for ASCII 32..=126 of the proportional standard 14 fonts.
fn standard_widths(name: &str) -> Option<&'static [u16; 95]> {
    // Subset prefixes like "ABCDEF+" never name a standard font.
    match name {
        "Helvetica" | "Helvetica-Oblique" | "Arial" | "ArialMT" => Some(&HELVETICA),
        "Helvetica-Bold" | "Helvetica-BoldOblique" | "Arial-BoldMT" => Some(&HELVETICA_BOLD),
        "Times-Roman" | "Times-Italic" | "TimesNewRomanPSMT" => Some(&TIMES_ROMAN),
        "Times-Bold" | "Times-BoldItalic" | "TimesNewRomanPS-BoldMT" => Some(&TIMES_BOLD),
        _ => None,
    }
}

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];
