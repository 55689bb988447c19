//! tabula: Extract tables from PDF documents.
//!
//! This is the public API facade crate for tabula-rs. It re-exports types from
//! tabula-core and uses tabula-parse for PDF reading and interpretation.
//!
//! # Architecture
//!
//! - **tabula-core**: Geometry, cell inference, text merging and table output
//! - **tabula-parse**: PDF parsing and content stream interpretation
//! - **tabula** (this crate): Documents, pages and the extraction entry points

mod document;
mod options;
mod page;

use std::path::Path;

use tracing::debug;

pub use document::{Document, Pages};
pub use options::{ExtractionMethod, ExtractionOptions, OptionParseError, PageSelector, TableOptions};
pub use page::Page;
pub use tabula_core;
pub use tabula_core::{Rectangle, Result, Ruling, Settings, TabulaError, Table, TextElement};
pub use tabula_parse;

/// Extract one table from the first selected page of the PDF at `path`.
///
/// `area` limits extraction to a region of the page; use
/// [`Rectangle::from_corners`] for `[top, left, bottom, right]` input.
///
/// # Errors
///
/// Returns [`TabulaError::FileNotFound`], [`TabulaError::DecryptionError`],
/// [`TabulaError::PageOutOfRange`] (also when the selector is empty) or
/// [`TabulaError::InvalidArea`].
pub fn extract_table(
    path: impl AsRef<Path>,
    pages: &PageSelector,
    area: Option<Rectangle>,
    options: &ExtractionOptions,
) -> Result<Table> {
    let document = Document::open(path, &options.password)?;
    let count = document.page_count();
    let number = pages
        .page_numbers(count)
        .first()
        .copied()
        .ok_or(TabulaError::PageOutOfRange {
            requested: 0,
            count,
        })?;
    extract_from_page(&document, number, area, options)
}

/// Extract one table from every selected page of the PDF at `path`.
///
/// Failures opening the document are returned directly. Per-page failures,
/// such as an area that misses a smaller page, only affect that page's
/// entry.
///
/// # Errors
///
/// Returns [`TabulaError::FileNotFound`] or [`TabulaError::DecryptionError`]
/// when the document cannot be opened.
pub fn extract_tables(
    path: impl AsRef<Path>,
    pages: &PageSelector,
    area: Option<Rectangle>,
    options: &ExtractionOptions,
) -> Result<Vec<Result<Table>>> {
    let document = Document::open(path, &options.password)?;
    let numbers = pages.page_numbers(document.page_count());
    debug!(pages = numbers.len(), "extracting tables");
    Ok(numbers
        .into_iter()
        .map(|n| extract_from_page(&document, n, area, options))
        .collect())
}

fn extract_from_page(
    document: &Document,
    number: usize,
    area: Option<Rectangle>,
    options: &ExtractionOptions,
) -> Result<Table> {
    let page = document.page(number)?;
    match area {
        Some(area) => Ok(page.get_area(area)?.extract(options)),
        None => Ok(page.extract(options)),
    }
}
