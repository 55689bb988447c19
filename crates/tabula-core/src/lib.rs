//! tabula-core: Backend-independent table extraction.
//!
//! This crate provides the geometry types (Point, Rectangle, Ruling), the
//! cell inference engine, the tabular classifier, text merging, and the
//! [`Table`] type with CSV/TSV serialization. It knows nothing about PDF
//! syntax; `tabula-parse` supplies glyphs and rulings.

pub mod cells;
pub mod classifier;
pub mod dedupe;
pub mod error;
pub mod extraction;
pub mod geometry;
pub mod lines;
pub mod ruling;
pub mod settings;
pub mod table;
pub mod text;
pub mod words;

pub use cells::{Cell, assign_text, find_cells, find_spreadsheet_areas};
pub use classifier::TabularHeuristic;
pub use dedupe::{DedupeOptions, dedupe_elements};
pub use error::{Result, TabulaError};
pub use extraction::{extract_basic, extract_spreadsheets};
pub use geometry::{EPSILON, Point, Rectangle, bounding_box, feq, within};
pub use lines::{Line, LineSettings, column_positions, group_by_lines};
pub use ruling::{
    Crossing, Intersections, Orientation, Ruling, RulingSettings, crop_to_area, find_intersections,
    normalize, partition,
};
pub use settings::Settings;
pub use table::Table;
pub use text::{TextChunk, TextDirection, TextElement, normalize_text};
pub use words::{WordSettings, merge_words, reading_order, split_by_rulings};
