//! Unit tests for the `hotspots` CLI commands.

use super::*;

mod helpers;

#[rstest::rstest]
fn write_json_terminates_with_newline() {
    let mut buffer = Vec::new();
    write_json(&mut buffer, &serde_json::json!({ "count": 2 })).expect("write json");
    let text = String::from_utf8(buffer).expect("utf-8 output");
    assert!(text.ends_with("}\n"), "{text:?}");
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(value["count"], 2);
}
