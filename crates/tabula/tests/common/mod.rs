//! Shared PDF builders for the integration tests.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::PathBuf;

use lopdf::{Object, Stream, dictionary};

/// Column edges of the ruled fixture table, in PDF user space.
pub const COLUMNS: [f64; 4] = [100.0, 200.0, 300.0, 400.0];
/// Row edges of the ruled fixture table, top to bottom, in PDF user space.
pub const ROWS: [f64; 4] = [700.0, 680.0, 660.0, 640.0];

pub const HEADER: [&str; 3] = ["Name", "Qty", "Price"];
pub const BODY: [[&str; 3]; 2] = [["Apple", "3", "1.20"], ["Pear", "10", "0.85"]];

/// A page to put in a fixture document.
pub struct PageSpec {
    pub content: Vec<u8>,
    pub media_box: [i64; 4],
}

impl PageSpec {
    pub fn letter(content: Vec<u8>) -> Self {
        Self {
            content,
            media_box: [0, 0, 612, 792],
        }
    }
}

/// Build a PDF with Helvetica as `/F1` on every page.
pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    save(build_document(pages))
}

/// Build the same PDF, encrypted so that `user_password` opens it.
pub fn build_encrypted_pdf(pages: &[PageSpec], user_password: &str) -> Vec<u8> {
    let mut doc = build_document(pages);
    doc.trailer.set(
        "ID",
        vec![
            Object::string_literal(vec![1u8; 16]),
            Object::string_literal(vec![2u8; 16]),
        ],
    );
    let version = lopdf::EncryptionVersion::V2 {
        document: &doc,
        owner_password: "owner",
        user_password,
        key_length: 128,
        permissions: lopdf::Permissions::all(),
    };
    let state = lopdf::EncryptionState::try_from(version).expect("valid encryption state");
    doc.encrypt(&state).expect("failed to encrypt test PDF");
    save(doc)
}

fn build_document(pages: &[PageSpec]) -> lopdf::Document {
    let mut doc = lopdf::Document::with_version("1.5");
    let font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for spec in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, spec.content.clone()));
        let media_box: Vec<Object> = spec.media_box.iter().map(|&v| Object::Integer(v)).collect();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(kids.len() as i64),
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save(mut doc: lopdf::Document) -> Vec<u8> {
    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("failed to save test PDF");
    buf
}

fn show_text(content: &mut String, x: f64, y: f64, text: &str) {
    let _ = writeln!(content, "BT /F1 10 Tf {x} {y} Td ({text}) Tj ET");
}

fn table_rows() -> Vec<[&'static str; 3]> {
    std::iter::once(HEADER).chain(BODY).collect()
}

/// A fully ruled three-by-three table with one word per cell.
pub fn ruled_table_content() -> Vec<u8> {
    let mut content = String::from("0.5 w\n");
    for y in ROWS {
        let _ = writeln!(content, "{} {y} m {} {y} l S", COLUMNS[0], COLUMNS[3]);
    }
    for x in COLUMNS {
        let _ = writeln!(content, "{x} {} m {x} {} l S", ROWS[3], ROWS[0]);
    }
    for (r, row) in table_rows().iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            show_text(&mut content, COLUMNS[c] + 5.0, ROWS[r] - 14.0, text);
        }
    }
    content.into_bytes()
}

/// The same rows laid out in whitespace-separated columns, no rulings.
pub fn whitespace_table_content() -> Vec<u8> {
    let xs = [72.0, 250.0, 400.0];
    let mut content = String::new();
    for (r, row) in table_rows().iter().enumerate() {
        let y = 700.0 - 20.0 * r as f64;
        for (c, text) in row.iter().enumerate() {
            show_text(&mut content, xs[c], y, text);
        }
    }
    content.into_bytes()
}

/// Write `bytes` to a per-process temporary file and return its path.
pub fn write_temp(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tabula-{}-{name}.pdf", std::process::id()));
    std::fs::write(&path, bytes).expect("failed to write temp PDF");
    path
}

pub fn expected_rows() -> Vec<Vec<String>> {
    table_rows()
        .iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect()
}
