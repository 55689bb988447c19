//! Serde round-trip tests for the public data types.

#![cfg(feature = "serde")]

use tabula_core::*;

fn roundtrip<T>(value: &T)
where
    T: serde::Serialize + serde::de::DeserializeOwned + PartialEq + std::fmt::Debug,
{
    let json = serde_json::to_string(value).expect("serialize failed");
    let restored: T = serde_json::from_str(&json).expect("deserialize failed");
    assert_eq!(*value, restored, "round-trip mismatch for JSON: {json}");
}

// --- Geometry ---

#[test]
fn test_serde_point() {
    roundtrip(&Point::new(3.5, 2.25));
}

#[test]
fn test_serde_rectangle() {
    roundtrip(&Rectangle::new(52.3, 15.5, 752.4, 76.4));
}

#[test]
fn test_serde_ruling_keeps_orientation() {
    let r = Ruling::vertical(70.0, 44.0, 80.0);
    roundtrip(&r);
    let json = serde_json::to_string(&r).unwrap();
    let back: Ruling = serde_json::from_str(&json).unwrap();
    assert!(back.is_vertical());
}

// --- Text ---

#[test]
fn test_serde_text_element() {
    let e = TextElement::new(Rectangle::new(1.0, 2.0, 3.0, 4.0), "Jeremy").with_font("F1", 12.0);
    let json = serde_json::to_string(&e).unwrap();
    let back: TextElement = serde_json::from_str(&json).unwrap();
    assert_eq!(back, e);
    assert!(back.same_geometry(&e, 1e-9));
}

// --- Settings ---

#[test]
fn test_serde_settings() {
    roundtrip(&Settings::default());
}

// --- Tables ---

#[test]
fn test_table_serializes_as_rows() {
    let t = Table::from_array(vec![vec!["a", "b"], vec!["c"]]);
    let json = serde_json::to_string(&t).unwrap();
    assert_eq!(json, r#"[["a","b"],["c",""]]"#);
}
