//! Error type shared by every tabula-rs crate.
//!
//! [`TabulaError`] covers fatal conditions only. An empty ruling set or an
//! uncertain tabular classification is a normal result, never an error.

use std::fmt;
use std::path::PathBuf;

use crate::geometry::Rectangle;

/// Fatal error types for table extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum TabulaError {
    /// The requested document path does not exist.
    FileNotFound(PathBuf),
    /// The password is wrong or missing for an encrypted document.
    DecryptionError(String),
    /// A requested region is degenerate or does not touch the page.
    InvalidArea {
        area: Rectangle,
        reason: String,
    },
    /// A one-indexed page number outside the document.
    PageOutOfRange {
        requested: usize,
        count: usize,
    },
    /// Malformed PDF structure or syntax.
    Parse(String),
    /// I/O error reading or writing data.
    Io(String),
    /// Failure writing CSV/TSV output.
    Csv(String),
}

impl fmt::Display for TabulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabulaError::FileNotFound(path) => write!(f, "file not found: {}", path.display()),
            TabulaError::DecryptionError(msg) => write!(f, "could not decrypt document: {msg}"),
            TabulaError::InvalidArea { area, reason } => write!(
                f,
                "invalid area [top {}, left {}, width {}, height {}]: {reason}",
                area.top, area.left, area.width, area.height
            ),
            TabulaError::PageOutOfRange { requested, count } => {
                write!(f, "page {requested} out of range (document has {count} pages)")
            }
            TabulaError::Parse(msg) => write!(f, "parse error: {msg}"),
            TabulaError::Io(msg) => write!(f, "I/O error: {msg}"),
            TabulaError::Csv(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for TabulaError {}

impl From<std::io::Error> for TabulaError {
    fn from(err: std::io::Error) -> Self {
        TabulaError::Io(err.to_string())
    }
}

impl From<csv::Error> for TabulaError {
    fn from(err: csv::Error) -> Self {
        TabulaError::Csv(err.to_string())
    }
}

/// Result alias used throughout tabula-rs.
pub type Result<T> = std::result::Result<T, TabulaError>;
