//! Tests for the per-field error store.

use date_guard::{ErrorAccumulator, ErrorKind};
use serde_json::json;

#[test]
fn set_error_is_an_upsert() {
    let mut errors = ErrorAccumulator::new();
    errors.set_error("f", ErrorKind::Required, "first", None);
    errors.set_error("f", ErrorKind::PastDate, "second", Some(json!({ "n": 1 })));

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.get_kind("f"), Some(ErrorKind::PastDate));
    assert_eq!(errors.get_message("f"), "second");
    assert_eq!(errors.get_error("f").unwrap().details, Some(json!({ "n": 1 })));
}

#[test]
fn missing_key_reads_as_empty() {
    let errors = ErrorAccumulator::new();
    assert!(!errors.has_error("nope"));
    assert!(!errors.has_any_error());
    assert_eq!(errors.get_message("nope"), "");
    assert!(errors.get_kind("nope").is_none());
}

#[test]
fn clear_error_removes_only_that_key() {
    let mut errors = ErrorAccumulator::new();
    errors.set_error("a", ErrorKind::Weekend, "weekend", None);
    errors.set_error("b", ErrorKind::Holiday, "holiday", None);

    errors.clear_error("a");

    assert!(!errors.has_error("a"));
    assert!(errors.has_error("b"));
    assert!(errors.has_any_error());
}

#[test]
fn reset_all_clears_everything() {
    let mut errors = ErrorAccumulator::new();
    for key in ["a", "b", "c"] {
        errors.set_error(key, ErrorKind::Other, "x", None);
    }

    errors.reset_all();
    errors.reset_all();

    assert!(errors.is_empty());
    for key in ["a", "b", "c"] {
        assert!(!errors.has_error(key));
    }
}

#[test]
fn iterates_in_key_order_and_serializes_as_map() {
    let mut errors = ErrorAccumulator::new();
    errors.set_error("z", ErrorKind::Other, "last", None);
    errors.set_error("a", ErrorKind::Required, "first", None);

    let keys: Vec<&str> = errors.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["a", "z"]);

    let value = serde_json::to_value(&errors).unwrap();
    assert_eq!(value["a"]["kind"], "required");
    assert_eq!(value["z"]["message"], "last");
}
