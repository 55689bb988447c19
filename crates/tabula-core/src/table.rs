//! Extracted tables and their serialization.

use std::io::Write;

use crate::cells::Cell;
use crate::error::{Result, TabulaError};
use crate::geometry::{Rectangle, feq};

#[derive(Debug, Clone)]
enum Layout {
    /// Resolved cells from ruling inference.
    Cells(Vec<Cell>),
    /// Literal rows, as produced by whitespace extraction.
    Array(Vec<Vec<String>>),
}

/// A table extracted from a page region.
///
/// Built either from resolved [`Cell`]s (the ruled path) or from a raw 2-D
/// array of strings (the whitespace path). Both expose the same
/// [`Table::rows`] view. Equality compares rows with trailing empty fields
/// trimmed.
#[derive(Debug, Clone)]
pub struct Table {
    area: Rectangle,
    layout: Layout,
}

impl Table {
    /// A table with no rows.
    pub fn empty(area: Rectangle) -> Self {
        Self {
            area,
            layout: Layout::Array(Vec::new()),
        }
    }

    /// Build a table directly from rows of strings.
    pub fn from_array<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        Self {
            area: Rectangle::default(),
            layout: Layout::Array(rows),
        }
    }

    /// Build a table from cells covering `area`.
    pub fn from_cells(area: Rectangle, cells: Vec<Cell>) -> Self {
        Self {
            area,
            layout: Layout::Cells(cells),
        }
    }

    pub fn with_area(mut self, area: Rectangle) -> Self {
        self.area = area;
        self
    }

    pub fn area(&self) -> Rectangle {
        self.area
    }

    /// The underlying cells; empty for array-built tables.
    pub fn cells(&self) -> &[Cell] {
        match &self.layout {
            Layout::Cells(cells) => cells,
            Layout::Array(_) => &[],
        }
    }

    /// Number of cells, or of grid slots for array-built tables.
    pub fn cell_count(&self) -> usize {
        match &self.layout {
            Layout::Cells(cells) => cells.len(),
            Layout::Array(rows) => rows.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Number of slots in the padded grid returned by [`Table::rows`].
    /// A spanning cell counts once per slot it covers.
    pub fn slot_count(&self) -> usize {
        self.rows().iter().map(Vec::len).sum()
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    pub fn col_count(&self) -> usize {
        self.rows().first().map_or(0, Vec::len)
    }

    /// Cell text in row order, every row padded to the same width.
    ///
    /// A spanning cell's text appears once, at its top-left position; the
    /// positions it covers follow as empty strings.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows_with(false)
    }

    /// Like [`Table::rows`], joining wrapped lines inside a cell with `'\r'`
    /// when `use_line_returns` is set.
    pub fn rows_with(&self, use_line_returns: bool) -> Vec<Vec<String>> {
        match &self.layout {
            Layout::Cells(cells) => cell_grid(cells, use_line_returns),
            Layout::Array(rows) => {
                let width = rows.iter().map(Vec::len).max().unwrap_or(0);
                rows.iter()
                    .map(|r| {
                        let mut r = r.clone();
                        r.resize(width, String::new());
                        r
                    })
                    .collect()
            }
        }
    }

    /// Write comma-separated rows with RFC 4180 quoting.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        self.write_delimited(writer, b',')
    }

    /// Write tab-separated rows.
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<()> {
        self.write_delimited(writer, b'\t')
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| TabulaError::Csv(e.to_string()))
    }

    pub fn to_tsv(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_tsv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| TabulaError::Csv(e.to_string()))
    }

    fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);
        for row in self.rows() {
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        fn trimmed(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
            rows.into_iter()
                .map(|mut r| {
                    while r.last().is_some_and(|s| s.is_empty()) {
                        r.pop();
                    }
                    r
                })
                .collect()
        }
        trimmed(self.rows()) == trimmed(other.rows())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Table {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.rows(), serializer)
    }
}

/// Sorted distinct values, merging those within float tolerance.
fn boundaries(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(f64::total_cmp);
    v.dedup_by(|a, b| feq(*a, *b));
    v
}

/// Index of the boundary nearest to `value`.
fn slot(bounds: &[f64], value: f64) -> usize {
    bounds
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - value).abs().total_cmp(&(*b - value).abs()))
        .map_or(0, |(i, _)| i)
}

/// Lay cells out on the grid formed by all of their edges.
fn cell_grid(cells: &[Cell], use_line_returns: bool) -> Vec<Vec<String>> {
    let xs = boundaries(cells.iter().flat_map(|c| [c.rect.left, c.rect.right()]));
    let ys = boundaries(cells.iter().flat_map(|c| [c.rect.top, c.rect.bottom()]));
    if xs.len() < 2 || ys.len() < 2 {
        return Vec::new();
    }

    let mut grid: Vec<Vec<Option<String>>> = vec![vec![None; xs.len() - 1]; ys.len() - 1];
    let mut ordered: Vec<&Cell> = cells.iter().collect();
    ordered.sort_by(|a, b| a.rect.cmp_position(&b.rect));

    for cell in ordered {
        let (r0, r1) = (slot(&ys, cell.rect.top), slot(&ys, cell.rect.bottom()));
        let (c0, c1) = (slot(&xs, cell.rect.left), slot(&xs, cell.rect.right()));
        for (r, row) in grid.iter_mut().enumerate().take(r1.max(r0 + 1)).skip(r0) {
            for (c, entry) in row.iter_mut().enumerate().take(c1.max(c0 + 1)).skip(c0) {
                if r == r0 && c == c0 {
                    *entry = Some(cell.text(use_line_returns));
                } else if entry.is_none() {
                    *entry = Some(String::new());
                }
            }
        }
    }

    grid.into_iter()
        .map(|row| row.into_iter().map(Option::unwrap_or_default).collect())
        .collect()
}
