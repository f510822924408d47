//! Sanitizer Tests
//!
//! Binary payloads are stripped from document trees before they leave the
//! process. The JSON rendering of a sanitized document carries no binary
//! data at any depth.

use docdb_utils::document::sanitize_all;
use docdb_utils::{sanitize, sanitize_document, Document, DocumentId, Value};
use serde_json::json;

fn upload() -> Document {
    Document::with_id("f1")
        .field("name", "report.pdf")
        .field("content", Value::binary(b"%PDF-1.7".to_vec()))
        .field(
            "preview",
            Document::new()
                .field("png", Value::binary(vec![0x89, 0x50]))
                .field("width", 120),
        )
        .field(
            "pages",
            vec![
                Value::from(Document::new().field("raw", Value::binary(vec![1]))),
                Value::from(Document::new().field("number", 2)),
            ],
        )
        .field("owner", Value::Ref(DocumentId::new("u1")))
        .field("meta", Document::new())
}

#[test]
fn test_sanitized_json_has_no_binary() {
    let mut doc = upload();
    let rendered = sanitize_document(&mut doc).to_json();

    assert_eq!(
        rendered,
        json!({
            "_id": "f1",
            "name": "report.pdf",
            "preview": { "width": 120 },
            "pages": [{}, { "number": 2 }],
            "owner": { "$ref": "u1" },
            "meta": {}
        })
    );
}

#[test]
fn test_unsanitized_json_still_carries_binary() {
    let rendered = upload().to_json();
    assert_eq!(rendered["content"], json!({ "$binary": "JVBERi0xLjc=" }));
}

#[test]
fn test_sanitize_is_idempotent() {
    let mut once = upload();
    sanitize_document(&mut once);
    let mut twice = once.clone();
    sanitize_document(&mut twice);
    assert_eq!(once, twice);
}

#[test]
fn test_sanitize_array_value() {
    let mut value = Value::Array(vec![Value::binary(vec![1]), Value::from("keep")]);
    let rendered = sanitize(&mut value).to_json();
    assert_eq!(rendered, json!([null, "keep"]));
}

#[test]
fn test_sanitize_result_set() {
    let mut docs = vec![upload(), upload(), Document::new().field("plain", true)];
    // content, preview.png and pages[0].raw per upload
    assert_eq!(sanitize_all(&mut docs), 6);
    assert!(docs.iter().all(|d| d.get("content") != Some(&Value::binary(b"%PDF-1.7".to_vec()))));
}
