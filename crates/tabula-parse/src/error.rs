//! Error types for the parsing and interpreter layers.
//!
//! Uses [`thiserror`] for the derive. [`BackendError`] converts into
//! [`TabulaError`] so callers above this crate see a single error type.

use tabula_core::TabulaError;
use thiserror::Error;

/// Error type for PDF backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is encrypted and the password did not open it.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Error resolving font or encoding information.
    #[error("font error: {0}")]
    Font(String),

    /// Error during content stream interpretation.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] TabulaError),
}

impl From<BackendError> for TabulaError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => TabulaError::Parse(msg),
            BackendError::Io(e) => TabulaError::Io(e.to_string()),
            BackendError::Decryption(msg) => TabulaError::DecryptionError(msg),
            BackendError::Font(msg) => TabulaError::Parse(format!("font: {msg}")),
            BackendError::Interpreter(msg) => TabulaError::Parse(format!("content stream: {msg}")),
            BackendError::Core(e) => e,
        }
    }
}
