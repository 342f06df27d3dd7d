use serde_json::json;

use super::support::{convert_section, obj};
use crate::generator::{codegen::render_section, schema_converter::SchemaConverter};

#[test]
fn test_closed_object_renders_struct() {
  let section = convert_section(json!({
    "type": "object",
    "description": "A user record.",
    "properties": {
      "id": { "type": "integer" },
      "name": { "type": "string", "description": "Display name" }
    },
    "required": ["id"],
    "additionalProperties": false
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("use serde::{Deserialize, Serialize};"));
  assert!(code.contains("/// A user record."));
  assert!(code.contains("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]"));
  assert!(code.contains("#[serde(deny_unknown_fields)]"));
  assert!(code.contains("pub struct Body {"));
  assert!(code.contains("pub id: i64,"));
  assert!(code.contains("/// Display name"));
  assert!(code.contains("#[serde(default, skip_serializing_if = \"Option::is_none\")]"));
  assert!(code.contains("pub name: Option<String>,"));
}

#[test]
fn test_open_object_gets_extras_bag() {
  let section = convert_section(json!({
    "type": "object",
    "properties": { "id": { "type": "integer" } }
  }));

  let code = render_section(&section).unwrap();
  assert!(!code.contains("deny_unknown_fields"));
  assert!(code.contains("#[serde(flatten)]"));
  assert!(code.contains("pub extra: serde_json::Map<String, serde_json::Value>,"));
}

#[test]
fn test_declared_additional_schema_types_the_extras_bag() {
  let section = convert_section(json!({
    "type": "object",
    "properties": { "id": { "type": "integer" } },
    "additionalProperties": { "type": "string" }
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("#[serde(flatten)]"));
  assert!(code.contains("pub extra: std::collections::BTreeMap<String, String>,"));
}

#[test]
fn test_renamed_field_keeps_wire_alias() {
  let section = convert_section(json!({
    "type": "object",
    "properties": { "user-name": { "type": "string" } },
    "required": ["user-name"]
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("#[serde(rename = \"user-name\")]"));
  assert!(code.contains("pub user_name: String,"));
}

#[test]
fn test_string_enum_lifts_to_named_enum() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "status": { "enum": ["active", "on-hold"] }
    },
    "required": ["status"]
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("pub enum BodyStatus {"));
  assert!(code.contains("#[serde(rename = \"active\")]"));
  assert!(code.contains("Active,"));
  assert!(code.contains("#[serde(rename = \"on-hold\")]"));
  assert!(code.contains("OnHold,"));
  assert!(code.contains("pub status: BodyStatus,"));
}

#[test]
fn test_integer_enum_stays_primitive() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "level": { "enum": [1, 2, 3] }
    },
    "required": ["level"]
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("pub level: i64,"));
  assert!(!code.contains("pub enum"));
}

#[test]
fn test_untagged_union_field() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "value": { "oneOf": [{ "type": "integer" }, { "type": "string" }] }
    },
    "required": ["value"]
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("#[serde(untagged)]"));
  assert!(code.contains("pub enum BodyValue {"));
  assert!(code.contains("Integer(i64),"));
  assert!(code.contains("String(String),"));
  assert!(code.contains("pub value: BodyValue,"));
}

#[test]
fn test_discriminated_union_is_internally_tagged() {
  let section = convert_section(json!({
    "oneOf": [
      {
        "type": "object",
        "properties": { "pet_type": { "const": "cat" }, "meows": { "type": "boolean" } },
        "required": ["pet_type"]
      },
      {
        "type": "object",
        "properties": { "pet_type": { "const": "dog" }, "barks": { "type": "boolean" } },
        "required": ["pet_type"]
      }
    ],
    "discriminator": { "propertyName": "pet_type" }
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("#[serde(tag = \"pet_type\")]"));
  assert!(code.contains("#[serde(rename = \"cat\")]"));
  assert!(code.contains("#[serde(rename = \"dog\")]"));
  assert!(code.contains("pub enum Body {"));
}

#[test]
fn test_array_root_is_transparent_newtype() {
  let converter = SchemaConverter::new("3.1.0");
  let section = converter.build_section_from_schema(
    "response",
    "Response",
    &obj(json!({ "type": "array", "items": { "type": "string" } })),
  );

  let code = render_section(&section).unwrap();
  assert!(code.contains("#[serde(transparent)]"));
  assert!(code.contains("pub struct Response(pub Vec<String>);"));
}

#[test]
fn test_multi_status_root_enumerates_statuses() {
  let converter = SchemaConverter::new("3.1.0");
  let ok = "200".to_string();
  let not_found = "404".to_string();
  let ok_schema = obj(json!({ "type": "object", "properties": { "ok": { "type": "boolean" } } }));
  let err_schema = obj(json!({ "type": "object", "properties": { "message": { "type": "string" } } }));
  let section =
    converter.build_section_from_status_map("response", "Response", &[(&ok, &ok_schema), (&not_found, &err_schema)]);

  let code = render_section(&section).unwrap();
  assert!(code.contains("pub struct Response200 {"));
  assert!(code.contains("pub struct Response404 {"));
  assert!(code.contains("pub enum Response {"));
  assert!(code.contains("Response200(Response200),"));
  assert!(code.contains("Response404(Response404),"));
  assert!(code.contains("#[serde(untagged)]"));
}

#[test]
fn test_typed_map_and_any_fallback() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "scores": { "type": "object", "additionalProperties": { "type": "number" } },
      "payload": {}
    },
    "required": ["scores", "payload"]
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("pub scores: std::collections::BTreeMap<String, f64>,"));
  assert!(code.contains("pub payload: serde_json::Value,"));
}

#[test]
fn test_explicit_optional_is_not_double_wrapped() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "note": { "type": ["string", "null"] }
    }
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("pub note: Option<String>,"));
  assert!(!code.contains("Option<Option<"));
}

#[test]
fn test_default_is_documented() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "limit": { "type": "integer", "default": 25 }
    }
  }));

  let code = render_section(&section).unwrap();
  assert!(code.contains("/// Defaults to `25`."));
}

#[test]
fn test_nested_models_render_before_root() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "address": {
        "type": "object",
        "properties": { "street": { "type": "string" } }
      }
    }
  }));

  let code = render_section(&section).unwrap();
  let nested = code.find("pub struct BodyAddress {").unwrap();
  let root = code.find("pub struct Body {").unwrap();
  assert!(nested < root);
  assert!(code.contains("pub address: Option<BodyAddress>,"));
}
