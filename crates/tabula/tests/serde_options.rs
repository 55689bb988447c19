//! Serde round-trips for the facade option types.

#![cfg(feature = "serde")]

use tabula::{ExtractionMethod, ExtractionOptions, PageSelector, TableOptions};

#[test]
fn extraction_options_round_trip() {
    let options = ExtractionOptions {
        password: "secret".to_string(),
        detect_ruling_lines: false,
        vertical_rulings: vec![120.5, 300.0],
        extraction_method: ExtractionMethod::Basic,
    };
    let json = serde_json::to_string(&options).unwrap();
    assert!(json.contains("\"basic\""));
    let back: ExtractionOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(back, options);
}

#[test]
fn missing_fields_take_defaults() {
    let options: ExtractionOptions =
        serde_json::from_str(r#"{"extraction_method":"spreadsheet"}"#).unwrap();
    assert_eq!(options.extraction_method, ExtractionMethod::Spreadsheet);
    assert!(options.detect_ruling_lines);
    assert_eq!(options.password, "");
}

#[test]
fn selectors_and_table_options() {
    let selector = PageSelector::List(vec![1, 3]);
    let json = serde_json::to_string(&selector).unwrap();
    assert_eq!(serde_json::from_str::<PageSelector>(&json).unwrap(), selector);

    let table = TableOptions::with_vertical_rulings(vec![10.0]);
    let json = serde_json::to_string(&table).unwrap();
    assert_eq!(serde_json::from_str::<TableOptions>(&json).unwrap(), table);
}
