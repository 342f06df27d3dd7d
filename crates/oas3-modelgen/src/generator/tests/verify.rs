use serde_json::{Value, json};

use super::support::{convert_section, obj};
use crate::{
  generator::{
    ast::VerificationItem,
    verify::{VerificationMismatch, VerificationReport, format_report, verify_sections},
  },
  naming::operations::HttpMethod,
};

fn item_for(schema: Value) -> VerificationItem {
  VerificationItem {
    endpoint_name: "users".to_string(),
    method: HttpMethod::Get,
    section_name: "body".to_string(),
    class_name: "Body".to_string(),
    source_schema: obj(schema),
    module_path: "models/users/get/body.rs".to_string(),
  }
}

#[test]
fn test_round_trip_verifies_clean() {
  let schema = json!({
    "type": "object",
    "additionalProperties": false,
    "properties": {
      "id": { "type": "integer" },
      "name": { "type": "string", "description": "Display name" },
      "status": { "enum": ["active", "inactive"] },
      "tags": { "type": "array", "items": { "type": "string" } },
      "address": {
        "type": "object",
        "properties": { "street": { "type": "string" } }
      }
    },
    "required": ["id", "name"]
  });

  let section = convert_section(schema.clone());
  let report = verify_sections(&[(item_for(schema), section)]).unwrap();

  assert!(report.is_clean(), "unexpected mismatches: {:?}", report.mismatches);
  assert_eq!(report.verified_count, 1);
}

#[test]
fn test_nullable_and_union_sections_verify_clean() {
  let schema = json!({
    "type": "object",
    "properties": {
      "note": { "type": ["string", "null"] },
      "value": { "oneOf": [{ "type": "integer" }, { "type": "string" }] }
    }
  });

  let section = convert_section(schema.clone());
  let report = verify_sections(&[(item_for(schema), section)]).unwrap();
  assert!(report.is_clean(), "unexpected mismatches: {:?}", report.mismatches);
}

#[test]
fn test_type_conflict_is_reported() {
  // Section built from an integer field, verified against a source that
  // declares it as a string.
  let section = convert_section(json!({
    "type": "object",
    "properties": { "name": { "type": "integer" } }
  }));
  let item = item_for(json!({
    "type": "object",
    "properties": { "name": { "type": "string" } }
  }));

  let report = verify_sections(&[(item, section)]).unwrap();
  assert_eq!(report.verified_count, 0);
  assert_eq!(report.mismatch_count(), 1);

  let mismatch = &report.mismatches[0];
  assert_eq!(mismatch.endpoint_name, "users");
  assert_eq!(mismatch.method, "get");
  assert_eq!(mismatch.path, "$.properties.name.type");
  assert_eq!(mismatch.expected, json!("string"));
  assert_eq!(mismatch.actual, Some(json!("integer")));
}

#[test]
fn test_missing_property_is_reported_as_absent() {
  let section = convert_section(json!({
    "type": "object",
    "properties": { "id": { "type": "integer" } }
  }));
  let item = item_for(json!({
    "type": "object",
    "properties": {
      "id": { "type": "integer" },
      "name": { "type": "string" }
    }
  }));

  let report = verify_sections(&[(item, section)]).unwrap();
  assert_eq!(report.mismatch_count(), 1);
  assert_eq!(report.mismatches[0].path, "$.properties.name");
  assert_eq!(report.mismatches[0].actual, None);
}

#[test]
fn test_format_report_layout() {
  let report = VerificationReport {
    verified_count: 3,
    mismatches: vec![VerificationMismatch {
      endpoint_name: "users".to_string(),
      method: "post".to_string(),
      section_name: "body".to_string(),
      class_name: "Body".to_string(),
      module_path: "models/users/post/body.rs".to_string(),
      path: "$.properties.name.type".to_string(),
      expected: json!("string"),
      actual: None,
    }],
  };

  let rendered = format_report(&report);
  let lines: Vec<&str> = rendered.lines().collect();
  assert_eq!(lines[0], "Verified models: 3");
  assert_eq!(lines[1], "Mismatches: 1");
  assert_eq!(lines[3], "users.post.body.Body (models/users/post/body.rs)");
  assert_eq!(lines[4], "  at $.properties.name.type");
  assert_eq!(lines[5], "  expected: \"string\"");
  assert_eq!(lines[6], "  actual:   <absent>");
}

#[test]
fn test_format_report_truncates_long_values() {
  let report = VerificationReport {
    verified_count: 0,
    mismatches: vec![VerificationMismatch {
      endpoint_name: "users".to_string(),
      method: "get".to_string(),
      section_name: "body".to_string(),
      class_name: "Body".to_string(),
      module_path: "models/users/get/body.rs".to_string(),
      path: "$.description".to_string(),
      expected: json!("x".repeat(400)),
      actual: Some(json!("y".repeat(400))),
    }],
  };

  let rendered = format_report(&report);
  let expected_line = rendered
    .lines()
    .find(|line| line.starts_with("  expected:"))
    .unwrap();
  assert!(expected_line.ends_with("..."));
  assert!(expected_line.len() < 200);
}
