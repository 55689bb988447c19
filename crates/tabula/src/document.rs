//! Top-level document type for opening PDFs and reading pages.

use std::path::Path;

use tabula_core::{Result, Settings, TabulaError};
use tabula_parse::{
    InterpretOptions, LopdfBackend, LopdfDocument, PdfBackend, extract_page_content,
};
use tracing::debug;

use crate::Page;

/// Iterator over the pages of a [`Document`], extracting each on demand.
///
/// Created by [`Document::pages`]. Pages are not retained after being
/// yielded.
pub struct Pages<'a> {
    document: &'a Document,
    next: usize,
    count: usize,
}

impl Iterator for Pages<'_> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.count {
            return None;
        }
        let page = self.document.page(self.next);
        self.next += 1;
        Some(page)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count + 1 - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pages<'_> {}

/// A PDF document opened for table extraction.
///
/// # Example
///
/// ```ignore
/// let doc = Document::open("report.pdf", "")?;
/// let page = doc.page(1)?;
/// for table in page.spreadsheets() {
///     println!("{}", table.to_csv()?);
/// }
/// ```
pub struct Document {
    inner: LopdfDocument,
    settings: Settings,
    interpret: InterpretOptions,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("page_count", &self.page_count())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Open a PDF file, decrypting it with `password` when encrypted.
    ///
    /// # Errors
    ///
    /// Returns [`TabulaError::FileNotFound`] if `path` does not exist,
    /// [`TabulaError::DecryptionError`] if the password is wrong, and
    /// [`TabulaError::Parse`] if the file is not a readable PDF.
    pub fn open(path: impl AsRef<Path>, password: &str) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TabulaError::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, password)
    }

    /// Open a PDF from bytes, decrypting it with `password` when encrypted.
    ///
    /// The password is ignored for unencrypted documents.
    ///
    /// # Errors
    ///
    /// Returns [`TabulaError::DecryptionError`] if the password is wrong and
    /// [`TabulaError::Parse`] if the bytes are not a readable PDF.
    pub fn from_bytes(bytes: &[u8], password: &str) -> Result<Self> {
        let inner = LopdfBackend::open_with_password(bytes, password)?;
        Ok(Self {
            inner,
            settings: Settings::default(),
            interpret: InterpretOptions::default(),
        })
    }

    /// Use `settings` for every page read from now on.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Override content interpretation limits.
    pub fn with_interpret_options(mut self, options: InterpretOptions) -> Self {
        self.interpret = options;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn page_count(&self) -> usize {
        LopdfBackend::page_count(&self.inner)
    }

    /// Read a page by 1-based number.
    ///
    /// # Errors
    ///
    /// Returns [`TabulaError::PageOutOfRange`] for `0` or numbers past the
    /// last page, and parse errors if the page content is malformed.
    pub fn page(&self, number: usize) -> Result<Page> {
        let count = self.page_count();
        if number == 0 || number > count {
            return Err(TabulaError::PageOutOfRange {
                requested: number,
                count,
            });
        }
        let page = LopdfBackend::get_page(&self.inner, number - 1)?;
        let content = extract_page_content::<LopdfBackend>(&self.inner, &page, &self.interpret)?;
        debug!(
            page = number,
            glyphs = content.text.len(),
            rulings = content.rulings.len(),
            "read page"
        );

        Ok(Page::new(
            number,
            content.geometry.width(),
            content.geometry.height(),
            content.geometry.rotation(),
            content.text,
            content.rulings,
            self.settings,
        ))
    }

    /// Lazily iterate over every page in order.
    pub fn pages(&self) -> Pages<'_> {
        Pages {
            document: self,
            next: 1,
            count: self.page_count(),
        }
    }

    /// Read every page in parallel with rayon, ordered by page number.
    #[cfg(feature = "parallel")]
    pub fn pages_parallel(&self) -> Vec<Result<Page>> {
        use rayon::prelude::*;

        (1..=self.page_count())
            .into_par_iter()
            .map(|n| self.page(n))
            .collect()
    }
}
