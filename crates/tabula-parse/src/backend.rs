//! PDF parsing backend trait.
//!
//! Defines the [`PdfBackend`] trait that abstracts opening documents,
//! reading page boxes and interpreting page content. [`LopdfBackend`] is
//! the implementation shipped with this crate.
//!
//! [`LopdfBackend`]: crate::LopdfBackend

use tabula_core::TabulaError;

use crate::handler::ContentHandler;
use crate::interpreter::InterpretOptions;
use crate::page_geometry::PageBox;

/// Trait abstracting PDF parsing operations.
///
/// # Usage
///
/// ```ignore
/// let doc = MyBackend::open(pdf_bytes)?;
/// let page = MyBackend::get_page(&doc, 0)?;
/// let media_box = MyBackend::page_media_box(&doc, &page)?;
/// MyBackend::interpret_page(&doc, &page, &mut handler, &options)?;
/// ```
pub trait PdfBackend {
    /// The parsed PDF document type.
    type Document;

    /// A reference to a single page within a document.
    type Page;

    /// Backend-specific error type, convertible to [`TabulaError`].
    type Error: std::error::Error + Into<TabulaError>;

    /// Parse PDF bytes into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a PDF, or if the document is
    /// encrypted and cannot be opened with the empty password.
    fn open(bytes: &[u8]) -> Result<Self::Document, Self::Error> {
        Self::open_with_password(bytes, "")
    }

    /// Parse PDF bytes, decrypting with `password` when encrypted.
    ///
    /// # Errors
    ///
    /// Returns a decryption error if the password is wrong.
    fn open_with_password(bytes: &[u8], password: &str) -> Result<Self::Document, Self::Error>;

    /// Return the number of pages in the document.
    fn page_count(doc: &Self::Document) -> usize;

    /// Access a page by 0-based index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the page cannot be loaded.
    fn get_page(doc: &Self::Document, index: usize) -> Result<Self::Page, Self::Error>;

    /// The page's MediaBox, inherited through the page tree when needed.
    ///
    /// # Errors
    ///
    /// Returns an error if no MediaBox is found or it is malformed.
    fn page_media_box(doc: &Self::Document, page: &Self::Page) -> Result<PageBox, Self::Error>;

    /// The page's CropBox, if one is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the CropBox is present but malformed.
    fn page_crop_box(
        doc: &Self::Document,
        page: &Self::Page,
    ) -> Result<Option<PageBox>, Self::Error>;

    /// The page's `/Rotate` value in degrees (0 when absent).
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an integer.
    fn page_rotate(doc: &Self::Document, page: &Self::Page) -> Result<i32, Self::Error>;

    /// Interpret the page's content streams, reporting to `handler`.
    ///
    /// # Errors
    ///
    /// Returns an error if content stream parsing fails or a resource limit
    /// is exceeded.
    fn interpret_page(
        doc: &Self::Document,
        page: &Self::Page,
        handler: &mut dyn ContentHandler,
        options: &InterpretOptions,
    ) -> Result<(), Self::Error>;
}
