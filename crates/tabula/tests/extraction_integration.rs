//! End-to-end tests: generated PDFs through document, page and extraction.

mod common;

use common::{
    BODY, HEADER, PageSpec, build_encrypted_pdf, build_pdf, expected_rows, ruled_table_content,
    whitespace_table_content, write_temp,
};
use tabula::{
    Document, ExtractionMethod, ExtractionOptions, PageSelector, Rectangle, TabulaError,
    TableOptions, extract_table, extract_tables,
};

/// `[top, left, bottom, right]` just around the ruled fixture table.
const TABLE_AREA: [f64; 4] = [90.0, 95.0, 155.0, 405.0];

fn spreadsheet_options() -> ExtractionOptions {
    ExtractionOptions {
        extraction_method: ExtractionMethod::Spreadsheet,
        ..ExtractionOptions::default()
    }
}

// --- Document ---

#[test]
fn document_pages_are_one_indexed() {
    let pdf = build_pdf(&[
        PageSpec::letter(ruled_table_content()),
        PageSpec::letter(whitespace_table_content()),
    ]);
    let doc = Document::from_bytes(&pdf, "").unwrap();
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.pages().len(), 2);

    let page = doc.page(2).unwrap();
    assert_eq!(page.page_number(), 2);
    assert_eq!(page.width(), 612.0);
    assert_eq!(page.height(), 792.0);
    assert!(page.has_text());

    assert!(matches!(
        doc.page(0),
        Err(TabulaError::PageOutOfRange {
            requested: 0,
            count: 2
        })
    ));
    assert!(matches!(
        doc.page(3),
        Err(TabulaError::PageOutOfRange { requested: 3, .. })
    ));
}

#[test]
fn pages_iterator_reads_every_page() {
    let pdf = build_pdf(&[
        PageSpec::letter(ruled_table_content()),
        PageSpec::letter(Vec::new()),
    ]);
    let doc = Document::from_bytes(&pdf, "").unwrap();
    let pages: Vec<_> = doc.pages().collect::<Result<_, _>>().unwrap();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].has_text());
    assert!(!pages[1].has_text());
}

#[test]
fn missing_file_is_reported() {
    let err = Document::open("/definitely/not/here.pdf", "").unwrap_err();
    assert!(matches!(err, TabulaError::FileNotFound(_)));
    let err = extract_table(
        "/definitely/not/here.pdf",
        &PageSelector::Single(1),
        None,
        &ExtractionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TabulaError::FileNotFound(_)));
}

#[test]
fn garbage_bytes_are_a_parse_error() {
    assert!(matches!(
        Document::from_bytes(b"hello", ""),
        Err(TabulaError::Parse(_))
    ));
}

#[test]
fn encrypted_document_requires_password() {
    let pdf = build_encrypted_pdf(&[PageSpec::letter(ruled_table_content())], "s3cret");
    assert!(matches!(
        Document::from_bytes(&pdf, ""),
        Err(TabulaError::DecryptionError(_))
    ));
    assert!(matches!(
        Document::from_bytes(&pdf, "nope"),
        Err(TabulaError::DecryptionError(_))
    ));

    let path = write_temp("encrypted", &pdf);
    let options = ExtractionOptions {
        password: "s3cret".to_string(),
        ..spreadsheet_options()
    };
    let table = extract_table(&path, &PageSelector::Single(1), None, &options).unwrap();
    assert_eq!(table.rows(), expected_rows());
}

// --- Rulings ---

#[test]
fn ruled_page_rulings() {
    let pdf = build_pdf(&[PageSpec::letter(ruled_table_content())]);
    let page = Document::from_bytes(&pdf, "").unwrap().page(1).unwrap();
    assert_eq!(page.horizontal_rulings().len(), 4);
    assert_eq!(page.vertical_rulings().len(), 4);
    // Rulings span 60pt of a 792pt page.
    assert!(!page.is_tabular());
    let view = page.get_area(Rectangle::from_corners(TABLE_AREA)).unwrap();
    assert!(view.is_tabular());
}

// --- Spreadsheet ---

#[test]
fn spreadsheet_extraction_yields_header_row() {
    let pdf = build_pdf(&[PageSpec::letter(ruled_table_content())]);
    let path = write_temp("spreadsheet", &pdf);
    let table = extract_table(&path, &PageSelector::Single(1), None, &spreadsheet_options()).unwrap();
    let rows = table.rows();
    assert_eq!(rows[0], HEADER);
    assert_eq!(rows, expected_rows());
    assert_eq!(table.cell_count(), 9);
}

#[test]
fn spreadsheets_are_memoized_per_page() {
    let pdf = build_pdf(&[PageSpec::letter(ruled_table_content())]);
    let page = Document::from_bytes(&pdf, "").unwrap().page(1).unwrap();
    let first = page.spreadsheets();
    assert_eq!(first.len(), 1);
    assert!(std::ptr::eq(first, page.spreadsheets()));
}

#[test]
fn guess_picks_spreadsheet_for_ruled_area() {
    let pdf = build_pdf(&[PageSpec::letter(ruled_table_content())]);
    let path = write_temp("guess-ruled", &pdf);
    let table = extract_table(
        &path,
        &PageSelector::Single(1),
        Some(Rectangle::from_corners(TABLE_AREA)),
        &ExtractionOptions::default(),
    )
    .unwrap();
    assert_eq!(table.rows(), expected_rows());
    assert!(!table.cells().is_empty());
}

#[test]
fn csv_output_of_spreadsheet() {
    let pdf = build_pdf(&[PageSpec::letter(ruled_table_content())]);
    let page = Document::from_bytes(&pdf, "").unwrap().page(1).unwrap();
    let csv = page.spreadsheets()[0].to_csv().unwrap();
    assert!(csv.starts_with("Name,Qty,Price"));
    assert!(csv.contains("Pear,10,0.85"));
}

// --- Basic ---

#[test]
fn basic_extraction_of_whitespace_columns() {
    let pdf = build_pdf(&[PageSpec::letter(whitespace_table_content())]);
    let path = write_temp("whitespace", &pdf);
    let table = extract_table(
        &path,
        &"1".parse().unwrap(),
        None,
        &ExtractionOptions::default(),
    )
    .unwrap();
    assert!(table.cells().is_empty());
    assert_eq!(table.rows(), expected_rows());
}

#[test]
fn basic_with_explicit_vertical_rulings() {
    let pdf = build_pdf(&[PageSpec::letter(whitespace_table_content())]);
    let page = Document::from_bytes(&pdf, "").unwrap().page(1).unwrap();
    let table = page.get_table(&TableOptions::with_vertical_rulings(vec![200.0, 350.0]));
    assert_eq!(table.rows()[1], BODY[0]);
    assert_eq!(table.col_count(), 3);
}

#[test]
fn forced_basic_on_ruled_area_uses_detected_columns() {
    let pdf = build_pdf(&[PageSpec::letter(ruled_table_content())]);
    let page = Document::from_bytes(&pdf, "").unwrap().page(1).unwrap();
    let view = page.get_area(Rectangle::from_corners(TABLE_AREA)).unwrap();
    let table = view.extract(&ExtractionOptions {
        extraction_method: ExtractionMethod::Basic,
        ..ExtractionOptions::default()
    });
    assert!(table.cells().is_empty());
    assert_eq!(table.rows(), expected_rows());
}

// --- Multiple pages ---

#[test]
fn extract_tables_reports_per_page_failures() {
    let pdf = build_pdf(&[
        PageSpec::letter(ruled_table_content()),
        PageSpec {
            content: whitespace_table_content(),
            media_box: [0, 0, 200, 200],
        },
    ]);
    let path = write_temp("multi", &pdf);
    let results = extract_tables(
        &path,
        &PageSelector::All,
        Some(Rectangle::from_corners([300.0, 300.0, 400.0, 400.0])),
        &ExtractionOptions::default(),
    )
    .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(TabulaError::InvalidArea { .. })));
}

#[test]
fn out_of_range_selection() {
    let pdf = build_pdf(&[PageSpec::letter(ruled_table_content())]);
    let path = write_temp("out-of-range", &pdf);
    let err = extract_table(
        &path,
        &PageSelector::Single(5),
        None,
        &ExtractionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::PageOutOfRange {
            requested: 5,
            count: 1
        }
    ));
    let err = extract_table(
        &path,
        &PageSelector::List(Vec::new()),
        None,
        &ExtractionOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TabulaError::PageOutOfRange { .. }));
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_pages_keep_order() {
    let pdf = build_pdf(&[
        PageSpec::letter(ruled_table_content()),
        PageSpec::letter(whitespace_table_content()),
        PageSpec::letter(Vec::new()),
    ]);
    let doc = Document::from_bytes(&pdf, "").unwrap();
    let numbers: Vec<usize> = doc
        .pages_parallel()
        .into_iter()
        .map(|p| p.unwrap().page_number())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}
