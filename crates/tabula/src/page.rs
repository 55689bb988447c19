//! Page type: a page's glyphs and rulings, plus the extraction operations.

use std::sync::OnceLock;

use tabula_core::{
    Rectangle, Result, Ruling, Settings, TabulaError, Table, TextElement, crop_to_area,
    dedupe_elements, extract_basic, extract_spreadsheets, normalize,
};
use tracing::debug;

use crate::options::{ExtractionMethod, ExtractionOptions, TableOptions};

/// A single page, or a rectangular view of one.
///
/// Content is fixed at construction. Normalized rulings and spreadsheets
/// are computed on first access and cached for the page's lifetime.
#[derive(Debug)]
pub struct Page {
    /// Page number (1-based).
    page_number: usize,
    width: f64,
    height: f64,
    rotation: i32,
    /// The region this page covers; the full page unless it is a view.
    area: Rectangle,
    settings: Settings,
    text: Vec<TextElement>,
    raw_rulings: Vec<Ruling>,
    rulings: OnceLock<Vec<Ruling>>,
    spreadsheets: OnceLock<Vec<Table>>,
}

impl Page {
    /// Create a page from extracted content.
    ///
    /// Stacked duplicate glyphs are removed here, so every later operation
    /// sees deduplicated text.
    pub fn new(
        page_number: usize,
        width: f64,
        height: f64,
        rotation: i32,
        text: Vec<TextElement>,
        rulings: Vec<Ruling>,
        settings: Settings,
    ) -> Self {
        let text = dedupe_elements(&text, &settings.dedupe);
        Self {
            page_number,
            width,
            height,
            rotation,
            area: Rectangle::new(0.0, 0.0, width, height),
            settings,
            text,
            raw_rulings: rulings,
            rulings: OnceLock::new(),
            spreadsheets: OnceLock::new(),
        }
    }

    /// Returns the page number (1-based).
    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// Returns the page width in points.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Returns the page height in points.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Returns the page's `/Rotate` value in degrees.
    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// The region this page covers.
    pub fn area(&self) -> Rectangle {
        self.area
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Glyphs on the page, or those whose center lies inside `area`.
    pub fn text(&self, area: Option<&Rectangle>) -> Vec<&TextElement> {
        match area {
            Some(area) => self
                .text
                .iter()
                .filter(|e| area.contains_point(e.rect.center(), 0.0))
                .collect(),
            None => self.text.iter().collect(),
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Normalized rulings: snapped, merged, obliques removed.
    pub fn rulings(&self) -> &[Ruling] {
        self.rulings.get_or_init(|| {
            let rulings = normalize(&self.raw_rulings, &self.settings.ruling);
            debug!(
                page = self.page_number,
                raw = self.raw_rulings.len(),
                normalized = rulings.len(),
                "normalized rulings"
            );
            rulings
        })
    }

    pub fn horizontal_rulings(&self) -> Vec<Ruling> {
        self.rulings()
            .iter()
            .filter(|r| r.is_horizontal())
            .copied()
            .collect()
    }

    pub fn vertical_rulings(&self) -> Vec<Ruling> {
        self.rulings()
            .iter()
            .filter(|r| r.is_vertical())
            .copied()
            .collect()
    }

    /// A read-only view of the part of this page inside `area`.
    ///
    /// The view keeps glyphs whose center lies inside the area and rulings
    /// cropped to it. Areas reaching past the page are clipped to it.
    ///
    /// # Errors
    ///
    /// Returns [`TabulaError::InvalidArea`] when the area has a non-finite
    /// or non-positive dimension, or does not intersect the page.
    pub fn get_area(&self, area: Rectangle) -> Result<Page> {
        if !area.is_valid() {
            return Err(TabulaError::InvalidArea {
                area,
                reason: "dimensions must be finite and positive".to_string(),
            });
        }
        let clipped = area
            .intersection(&self.area)
            .ok_or_else(|| TabulaError::InvalidArea {
                area,
                reason: "area does not intersect the page".to_string(),
            })?;

        let text = self.text(Some(&clipped)).into_iter().cloned().collect();
        let rulings = crop_to_area(self.rulings(), &clipped);
        Ok(Page {
            page_number: self.page_number,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            area: clipped,
            settings: self.settings,
            text,
            raw_rulings: rulings.clone(),
            rulings: OnceLock::from(rulings),
            spreadsheets: OnceLock::new(),
        })
    }

    /// Whether this page's region looks like a ruled table.
    pub fn is_tabular(&self) -> bool {
        self.settings.heuristic.is_tabular(self.rulings(), &self.area)
    }

    /// Ruled tables on this page, ordered by position.
    pub fn spreadsheets(&self) -> &[Table] {
        self.spreadsheets.get_or_init(|| {
            let tables = extract_spreadsheets(&self.text, self.rulings(), &self.settings);
            debug!(
                page = self.page_number,
                count = tables.len(),
                "found spreadsheets"
            );
            tables
        })
    }

    /// Whitespace-column table over this page's region.
    pub fn get_table(&self, options: &TableOptions) -> Table {
        let vertical_rulings =
            (!options.vertical_rulings.is_empty()).then_some(options.vertical_rulings.as_slice());
        extract_basic(&self.text, self.area, vertical_rulings, &self.settings)
    }

    /// Extract one table from this page's region.
    ///
    /// The spreadsheet path returns the spreadsheet with the most grid slots
    /// (the first one on ties), or an empty table when there is none. The basic
    /// path uses explicit vertical rulings when given, else detected ones
    /// when detection is enabled and the region looks ruled.
    pub fn extract(&self, options: &ExtractionOptions) -> Table {
        let use_spreadsheet = match options.extraction_method {
            ExtractionMethod::Spreadsheet => true,
            ExtractionMethod::Basic => false,
            ExtractionMethod::Guess => self.is_tabular(),
        };
        debug!(
            page = self.page_number,
            method = ?options.extraction_method,
            spreadsheet = use_spreadsheet,
            "extracting table"
        );

        if use_spreadsheet {
            return self
                .spreadsheets()
                .iter()
                .map(|t| (t.slot_count(), t))
                .fold(None::<(usize, &Table)>, |best, (slots, t)| match best {
                    Some((most, _)) if most >= slots => best,
                    _ => Some((slots, t)),
                })
                .map(|(_, t)| t.clone())
                .unwrap_or_else(|| Table::empty(self.area));
        }

        let vertical_rulings = if !options.vertical_rulings.is_empty() {
            options.vertical_rulings.clone()
        } else if options.detect_ruling_lines && self.is_tabular() {
            // The leftmost ruling is the table's outer edge, not a column break.
            self.vertical_rulings()
                .iter()
                .skip(1)
                .map(Ruling::position)
                .collect()
        } else {
            Vec::new()
        };
        self.get_table(&TableOptions { vertical_rulings })
    }
}
