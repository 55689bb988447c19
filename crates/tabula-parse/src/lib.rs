//! tabula-parse: PDF parsing backend and content stream interpreter.
//!
//! Opens documents through a pluggable [`PdfBackend`], interprets page
//! content streams into glyph and path events, and converts those into the
//! page-space text elements and rulings that `tabula-core` works on.

pub mod backend;
pub mod cmap;
pub mod error;
pub mod extract;
pub mod fonts;
pub mod handler;
pub mod interpreter;
pub mod lopdf_backend;
pub mod matrix;
pub mod page_geometry;

pub use backend::PdfBackend;
pub use error::BackendError;
pub use extract::{
    PageContent, PageContentCollector, extract_page_content, rulings_from_path,
    text_element_from_glyph,
};
pub use handler::{
    CollectingHandler, ContentHandler, GlyphEvent, PaintOp, PathEvent, PathSegment,
};
pub use interpreter::{InterpretOptions, interpret_content};
pub use lopdf_backend::{LopdfBackend, LopdfDocument, LopdfPage};
pub use matrix::Matrix;
pub use page_geometry::{PageBox, PageGeometry};
pub use tabula_core;
