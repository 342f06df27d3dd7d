use serde_json::json;

use super::support::{convert_section, obj};
use crate::generator::{
  ast::{ExtraPolicy, TypeExpr},
  schema_converter::{SchemaConverter, make_union},
};

#[test]
fn test_simple_object_section() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "id": { "type": "integer" },
      "name": { "type": "string" }
    },
    "required": ["id"],
    "additionalProperties": false
  }));

  assert_eq!(section.root_model_name, "Body");
  assert_eq!(section.models.len(), 1);

  let root = &section.models[0];
  assert_eq!(root.fields.len(), 2);
  assert_eq!(root.config.extra_policy, Some(ExtraPolicy::Forbid));

  let id = &root.fields[0];
  assert_eq!(id.name, "id");
  assert!(id.required);
  assert_eq!(id.type_expr, TypeExpr::Integer);

  let name = &root.fields[1];
  assert!(!name.required);
  assert_eq!(name.type_expr, TypeExpr::String);
}

#[test]
fn test_nested_object_becomes_named_model() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "address": {
        "type": "object",
        "properties": { "street": { "type": "string" } }
      }
    }
  }));

  // Nested models are emitted before their dependents.
  assert_eq!(section.models.len(), 2);
  assert_eq!(section.models[0].name, "BodyAddress");
  assert_eq!(section.models[1].name, "Body");
  assert_eq!(
    section.models[1].fields[0].type_expr,
    TypeExpr::Model("BodyAddress".to_string())
  );
}

#[test]
fn test_field_rename_keeps_source_name() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "user-name": { "type": "string" },
      "extra": { "type": "string" }
    }
  }));

  let root = &section.models[0];
  assert_eq!(root.fields[0].name, "user_name");
  assert_eq!(root.fields[0].source_name, "user-name");
  // The extras-bag name is reserved for open models.
  assert_eq!(root.fields[1].name, "extra_field");
  assert_eq!(root.fields[1].source_name, "extra");
}

#[test]
fn test_required_default_is_metadata_only() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "limit": { "type": "integer", "default": 10 },
      "offset": { "type": "integer", "default": 0 }
    },
    "required": ["limit"]
  }));

  let root = &section.models[0];
  let limit = &root.fields[0];
  assert!(limit.required);
  assert_eq!(limit.default, None);
  assert_eq!(limit.metadata.schema_extra.get("default"), Some(&json!(10)));

  let offset = &root.fields[1];
  assert!(!offset.required);
  assert_eq!(offset.default, Some(json!(0)));
}

#[test]
fn test_enum_becomes_literal() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "status": { "enum": ["active", "inactive"] },
      "kind": { "const": "user" }
    }
  }));

  let root = &section.models[0];
  assert_eq!(
    root.fields[0].type_expr,
    TypeExpr::Literal(vec![json!("active"), json!("inactive")])
  );
  assert_eq!(root.fields[1].type_expr, TypeExpr::Literal(vec![json!("user")]));
}

#[test]
fn test_nullable_type_list_becomes_optional() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "note": { "type": ["string", "null"] }
    }
  }));

  assert_eq!(
    section.models[0].fields[0].type_expr,
    TypeExpr::Optional(Box::new(TypeExpr::String))
  );
}

#[test]
fn test_openapi_30_nullable_flag() {
  let converter = SchemaConverter::new("3.0.3");
  let section = converter.build_section_from_schema(
    "body",
    "Body",
    &obj(json!({
      "type": "object",
      "properties": {
        "note": { "type": "string", "nullable": true }
      }
    })),
  );
  assert_eq!(
    section.models[0].fields[0].type_expr,
    TypeExpr::Optional(Box::new(TypeExpr::String))
  );
}

#[test]
fn test_nullable_flag_ignored_on_31_documents() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "note": { "type": "string", "nullable": true }
    }
  }));
  assert_eq!(section.models[0].fields[0].type_expr, TypeExpr::String);
}

#[test]
fn test_one_of_with_discriminator() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "pet": {
        "oneOf": [
          {
            "type": "object",
            "properties": { "pet_type": { "const": "cat" }, "meows": { "type": "boolean" } },
            "required": ["pet_type"]
          },
          {
            "type": "object",
            "properties": { "pet_type": { "enum": ["dog"] }, "barks": { "type": "boolean" } },
            "required": ["pet_type"]
          }
        ],
        "discriminator": { "propertyName": "pet_type" }
      }
    }
  }));

  let root = section.find_model("Body").unwrap();
  let TypeExpr::Union(union) = &root.fields[0].type_expr else {
    panic!("expected a union, got {:?}", root.fields[0].type_expr);
  };
  assert_eq!(union.discriminator.as_deref(), Some("pet_type"));
  assert_eq!(union.options.len(), 2);
}

#[test]
fn test_discriminator_dropped_when_options_lack_tag_literal() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "pet": {
        "oneOf": [
          { "type": "object", "properties": { "meows": { "type": "boolean" } } },
          { "type": "object", "properties": { "barks": { "type": "boolean" } } }
        ],
        "discriminator": { "propertyName": "pet_type" }
      }
    }
  }));

  let root = section.find_model("Body").unwrap();
  let TypeExpr::Union(union) = &root.fields[0].type_expr else {
    panic!("expected a union");
  };
  assert_eq!(union.discriminator, None);
}

#[test]
fn test_all_of_merges_into_one_model() {
  let section = convert_section(json!({
    "allOf": [
      {
        "type": "object",
        "properties": { "a": { "type": "string" } },
        "required": ["a"]
      },
      {
        "type": "object",
        "properties": { "b": { "type": "integer" } },
        "required": ["b"],
        "additionalProperties": false
      }
    ]
  }));

  assert_eq!(section.models.len(), 1);
  let root = &section.models[0];
  assert_eq!(root.fields.len(), 2);
  assert!(root.fields.iter().all(|field| field.required));
  assert_eq!(root.config.extra_policy, Some(ExtraPolicy::Forbid));
}

#[test]
fn test_array_root_model() {
  let section = convert_section(json!({
    "type": "array",
    "items": { "type": "string" }
  }));

  assert_eq!(section.models.len(), 1);
  let root = &section.models[0];
  assert!(root.is_root);
  assert_eq!(root.root_type, Some(TypeExpr::Array(Box::new(TypeExpr::String))));
}

#[test]
fn test_malformed_array_with_properties() {
  // An array schema that carries `properties` instead of `items`
  // describes its own elements.
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "value": {
        "type": "array",
        "properties": { "x": { "type": "integer" } },
        "required": ["x"]
      }
    }
  }));

  let root = section.find_model("Body").unwrap();
  assert_eq!(
    root.fields[0].type_expr,
    TypeExpr::Array(Box::new(TypeExpr::Model("BodyValueItem".to_string())))
  );
  let item = section.find_model("BodyValueItem").unwrap();
  assert!(item.fields[0].required);
}

#[test]
fn test_map_with_typed_values() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "scores": {
        "type": "object",
        "additionalProperties": { "type": "number" }
      }
    }
  }));

  assert_eq!(
    section.models[0].fields[0].type_expr,
    TypeExpr::Map(Box::new(TypeExpr::Number))
  );
}

#[test]
fn test_status_map_single_status_is_plain_section() {
  let converter = SchemaConverter::new("3.1.0");
  let status = "200".to_string();
  let schema = obj(json!({ "type": "object", "properties": { "ok": { "type": "boolean" } } }));
  let section = converter.build_section_from_status_map("response", "Response", &[(&status, &schema)]);

  assert_eq!(section.root_model_name, "Response");
  assert_eq!(section.models.len(), 1);
  assert!(section.models[0].root_type.is_none());
}

#[test]
fn test_status_map_multi_status_builds_union_root() {
  let converter = SchemaConverter::new("3.1.0");
  let ok = "200".to_string();
  let created = "201".to_string();
  let ok_schema = obj(json!({ "type": "object", "properties": { "ok": { "type": "boolean" } } }));
  let created_schema = obj(json!({ "type": "object", "properties": { "id": { "type": "integer" } } }));

  // Insertion order deliberately reversed; output must be status-ascending.
  let section =
    converter.build_section_from_status_map("response", "Response", &[(&created, &created_schema), (&ok, &ok_schema)]);

  let names: Vec<&str> = section.models.iter().map(|model| model.name.as_str()).collect();
  assert_eq!(names, ["Response200", "Response201", "Response"]);

  let root = section.find_model("Response").unwrap();
  let Some(TypeExpr::Union(union)) = &root.root_type else {
    panic!("expected a union root");
  };
  assert_eq!(
    union.options,
    vec![
      TypeExpr::Model("Response200".to_string()),
      TypeExpr::Model("Response201".to_string())
    ]
  );
}

#[test]
fn test_make_union_dedup_and_null_folding() {
  assert_eq!(make_union(vec![]), TypeExpr::Any);
  assert_eq!(make_union(vec![TypeExpr::String, TypeExpr::String]), TypeExpr::String);
  assert_eq!(
    make_union(vec![TypeExpr::String, TypeExpr::Null]),
    TypeExpr::Optional(Box::new(TypeExpr::String))
  );
  assert_eq!(make_union(vec![TypeExpr::Null]), TypeExpr::Null);

  let mixed = make_union(vec![TypeExpr::String, TypeExpr::Integer, TypeExpr::Null]);
  let TypeExpr::Optional(inner) = mixed else {
    panic!("expected optional");
  };
  let TypeExpr::Union(union) = *inner else {
    panic!("expected union inside optional");
  };
  assert_eq!(union.options, vec![TypeExpr::String, TypeExpr::Integer]);
}

#[test]
fn test_duplicate_nested_names_get_suffixes() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "item": { "type": "object", "properties": { "a": { "type": "string" } } },
      "Item": { "type": "object", "properties": { "b": { "type": "string" } } }
    }
  }));

  let names: Vec<&str> = section.models.iter().map(|model| model.name.as_str()).collect();
  assert!(names.contains(&"BodyItem"));
  assert!(names.contains(&"BodyItem2"));
}

#[test]
fn test_unknown_schema_falls_back_to_any() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "anything": {}
    }
  }));
  assert_eq!(section.models[0].fields[0].type_expr, TypeExpr::Any);
}

#[test]
fn test_field_metadata_carries_docs_and_extras() {
  let section = convert_section(json!({
    "type": "object",
    "properties": {
      "name": {
        "type": "string",
        "description": "Display name",
        "example": "Ada",
        "maxLength": 64
      }
    }
  }));

  let field = &section.models[0].fields[0];
  assert_eq!(field.metadata.description(), Some("Display name"));
  assert_eq!(field.metadata.docs.get("example"), Some(&json!("Ada")));
  assert_eq!(field.metadata.schema_extra.get("maxLength"), Some(&json!(64)));
}

#[test]
fn test_open_model_with_declared_additional_schema() {
  let section = convert_section(json!({
    "type": "object",
    "properties": { "id": { "type": "integer" } },
    "additionalProperties": { "type": "string" }
  }));

  let root = &section.models[0];
  assert_eq!(root.config.extra_policy, Some(ExtraPolicy::Allow));
  assert_eq!(
    root.config.additional_value_type,
    Some(TypeExpr::Map(Box::new(TypeExpr::String)))
  );
  assert_eq!(
    root.config.schema_extra.get("additionalProperties"),
    Some(&json!({ "type": "string" }))
  );
}

#[test]
fn test_section_is_deterministic() {
  let schema = json!({
    "type": "object",
    "properties": {
      "b": { "type": "string" },
      "a": { "oneOf": [{ "type": "integer" }, { "type": "string" }] }
    }
  });
  let first = convert_section(schema.clone());
  let second = convert_section(schema);
  assert_eq!(first, second);
}
