use serde_json::{Value, json};

use crate::{
  generator::{ast::SectionModel, schema_converter::SchemaConverter},
  naming::operations::{OperationSpec, resolve_operations},
  utils::JsonMap,
};

pub(super) fn obj(value: Value) -> JsonMap {
  value.as_object().expect("fixture must be a JSON object").clone()
}

pub(super) fn convert_section(schema: Value) -> SectionModel {
  SchemaConverter::new("3.1.0").build_section_from_schema("body", "Body", &obj(schema))
}

pub(super) fn operations_of(document: &Value) -> Vec<OperationSpec> {
  let paths = document
    .get("paths")
    .and_then(Value::as_object)
    .cloned()
    .unwrap_or_default();
  resolve_operations(&paths).0
}

/// A small but representative document: path and query parameters, a
/// referenced body schema, and both a success and an error response.
pub(super) fn users_document() -> Value {
  json!({
    "openapi": "3.1.0",
    "info": { "title": "Users API", "version": "1.0.0" },
    "paths": {
      "/users/{id}": {
        "parameters": [
          {
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer" },
            "description": "User identifier"
          }
        ],
        "get": {
          "parameters": [
            { "name": "expand", "in": "query", "schema": { "type": "boolean" } }
          ],
          "responses": {
            "200": {
              "description": "The user",
              "content": {
                "application/json": {
                  "schema": { "$ref": "#/components/schemas/User" }
                }
              }
            },
            "404": {
              "description": "Not found",
              "content": {
                "application/json": {
                  "schema": { "$ref": "#/components/schemas/Error" }
                }
              }
            }
          }
        }
      }
    },
    "components": {
      "schemas": {
        "User": {
          "type": "object",
          "properties": {
            "id": { "type": "integer" },
            "name": { "type": "string" },
            "address": { "$ref": "#/components/schemas/Address" }
          },
          "required": ["id", "name"],
          "additionalProperties": false
        },
        "Address": {
          "type": "object",
          "properties": {
            "street": { "type": "string" },
            "city": { "type": "string" }
          },
          "required": ["street"]
        },
        "Error": {
          "type": "object",
          "properties": {
            "code": { "type": "integer" },
            "message": { "type": "string" }
          },
          "required": ["code", "message"],
          "additionalProperties": false
        }
      }
    }
  })
}
