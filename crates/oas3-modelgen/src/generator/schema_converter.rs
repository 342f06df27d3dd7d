//! Structural compiler from resolved JSON schemas into model definitions.

use std::collections::HashSet;

use serde_json::Value;

use super::ast::{ExtraPolicy, FieldDef, FieldMetadata, ModelConfig, ModelDef, SectionModel, TypeExpr, UnionType};
use crate::{
  naming::identifiers::{sanitize_identifier, type_name},
  reserved::is_reserved_field_name,
  utils::{
    JsonMap,
    schema_ext::{is_object_schema, merge_all_of_schema},
  },
};

/// Schema keys treated as documentation rather than structure.
const DOC_FIELDS: [&str; 11] = [
  "title",
  "description",
  "example",
  "examples",
  "deprecated",
  "readOnly",
  "writeOnly",
  "xml",
  "externalDocs",
  "contentMediaType",
  "contentEncoding",
];

/// Doc keys demoted from field docs into passthrough schema extras.
const DOC_FIELDS_AS_EXTRA: [&str; 6] = [
  "xml",
  "externalDocs",
  "contentMediaType",
  "contentEncoding",
  "readOnly",
  "writeOnly",
];

/// Keys the converter itself consumes when building a field type.
const FIELD_STRUCTURAL_KEYS: [&str; 15] = [
  "$ref",
  "type",
  "properties",
  "required",
  "items",
  "additionalProperties",
  "allOf",
  "anyOf",
  "oneOf",
  "discriminator",
  "nullable",
  "title",
  "default",
  "enum",
  "const",
];

/// Keys the converter consumes when building a model; `description` is also
/// structural here because it becomes the model docstring.
const MODEL_STRUCTURAL_KEYS: [&str; 16] = [
  "$ref",
  "type",
  "properties",
  "required",
  "items",
  "additionalProperties",
  "allOf",
  "anyOf",
  "oneOf",
  "discriminator",
  "nullable",
  "title",
  "description",
  "default",
  "enum",
  "const",
];

/// Model-level keys re-applied verbatim to the derived schema.
const MODEL_EXTRA_KEYS: [&str; 9] = [
  "xml",
  "externalDocs",
  "contentMediaType",
  "contentEncoding",
  "example",
  "examples",
  "readOnly",
  "writeOnly",
  "deprecated",
];

#[derive(Default)]
struct SectionContext {
  models: Vec<ModelDef>,
  used_names: HashSet<String>,
}

impl SectionContext {
  fn unique_name(&mut self, base_name: String) -> String {
    if self.used_names.insert(base_name.clone()) {
      return base_name;
    }
    let mut suffix = 2usize;
    loop {
      let candidate = format!("{base_name}{suffix}");
      if self.used_names.insert(candidate.clone()) {
        return candidate;
      }
      suffix += 1;
    }
  }
}

struct PropertySpec<'a> {
  source_name: &'a str,
  raw_schema: &'a JsonMap,
  required: bool,
}

/// Creates model definitions from resolved schema nodes.
pub(crate) struct SchemaConverter {
  openapi_version: String,
}

impl SchemaConverter {
  pub(crate) fn new(openapi_version: impl Into<String>) -> Self {
    Self {
      openapi_version: openapi_version.into(),
    }
  }

  /// Builds the model set for a single-schema section.
  pub(crate) fn build_section_from_schema(
    &self,
    section_name: &str,
    root_model_name: &str,
    schema: &JsonMap,
  ) -> SectionModel {
    let mut context = SectionContext::default();
    let normalized = self.normalize_nullable(schema.clone());

    let root_name = context.unique_name(type_name(root_model_name));
    if is_object_schema(&normalized) {
      self.build_object_model(root_name.clone(), &normalized, &mut context);
    } else {
      self.append_root_model(root_name.clone(), &normalized, &mut context);
    }

    SectionModel {
      section_name: section_name.to_string(),
      root_model_name: root_name,
      models: context.models,
    }
  }

  /// Builds the model set for a status-code-keyed section.
  ///
  /// A single status behaves exactly like a plain section. Multiple
  /// statuses produce one `<Root>_<status>` model per status (ascending)
  /// plus a union root over them in that same order.
  pub(crate) fn build_section_from_status_map(
    &self,
    section_name: &str,
    root_model_name: &str,
    schemas_by_status: &[(&String, &JsonMap)],
  ) -> SectionModel {
    let mut context = SectionContext::default();
    let mut ordered: Vec<(&String, &JsonMap)> = schemas_by_status.to_vec();
    ordered.sort_by(|a, b| a.0.cmp(b.0));

    if let [(_, only_schema)] = ordered.as_slice() {
      let schema = self.normalize_nullable((*only_schema).clone());
      let root_name = context.unique_name(type_name(root_model_name));
      if is_object_schema(&schema) {
        self.build_object_model(root_name.clone(), &schema, &mut context);
      } else {
        self.append_root_model(root_name.clone(), &schema, &mut context);
      }
      return SectionModel {
        section_name: section_name.to_string(),
        root_model_name: root_name,
        models: context.models,
      };
    }

    let mut options = Vec::with_capacity(ordered.len());
    for (status, status_schema) in ordered {
      let schema = self.normalize_nullable(status_schema.clone());
      let status_name = context.unique_name(type_name(&format!("{root_model_name}_{status}")));
      if is_object_schema(&schema) {
        self.build_object_model(status_name.clone(), &schema, &mut context);
      } else {
        self.append_root_model(status_name.clone(), &schema, &mut context);
      }
      options.push(TypeExpr::Model(status_name));
    }

    let union = make_union(options);
    let root_name = context.unique_name(type_name(root_model_name));
    context.models.push(ModelDef {
      name: root_name.clone(),
      is_root: true,
      root_type: Some(union),
      fields: Vec::new(),
      config: ModelConfig::default(),
    });

    SectionModel {
      section_name: section_name.to_string(),
      root_model_name: root_name,
      models: context.models,
    }
  }

  fn build_object_model(&self, model_name: String, schema: &JsonMap, context: &mut SectionContext) -> String {
    let merged = self.merge_all_of(schema);
    let fields = self.build_model_fields(&model_name, &merged, context);
    let config = self.object_model_config(&model_name, &merged, context);

    context.models.push(ModelDef {
      name: model_name.clone(),
      is_root: false,
      root_type: None,
      fields,
      config,
    });
    model_name
  }

  fn append_root_model(&self, model_name: String, schema: &JsonMap, context: &mut SectionContext) {
    let annotation = self.schema_to_annotation(schema, &format!("{model_name}Value"), context);
    let config = ModelConfig {
      docstring: string_or_none(schema.get("description")),
      title: string_or_none(schema.get("title")),
      extra_policy: None,
      additional_value_type: None,
      schema_extra: model_schema_extra(schema),
    };
    context.models.push(ModelDef {
      name: model_name,
      is_root: true,
      root_type: Some(annotation),
      fields: Vec::new(),
      config,
    });
  }

  fn build_model_fields(&self, model_name: &str, schema: &JsonMap, context: &mut SectionContext) -> Vec<FieldDef> {
    let Some(Value::Object(properties)) = schema.get("properties") else {
      return Vec::new();
    };

    let required_names: HashSet<&str> = match schema.get("required") {
      Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
      _ => HashSet::new(),
    };

    let mut fields = Vec::with_capacity(properties.len());
    let mut used_field_names: HashSet<String> = HashSet::new();
    for (source_name, raw_prop) in properties {
      let Some(raw_schema) = raw_prop.as_object() else {
        continue;
      };
      let prop = PropertySpec {
        source_name,
        raw_schema,
        required: required_names.contains(source_name.as_str()),
      };
      fields.push(self.build_model_field(model_name, &prop, context, &mut used_field_names));
    }
    fields
  }

  fn build_model_field(
    &self,
    model_name: &str,
    prop: &PropertySpec<'_>,
    context: &mut SectionContext,
    used_field_names: &mut HashSet<String>,
  ) -> FieldDef {
    let prop_schema = self.normalize_nullable(prop.raw_schema.clone());
    let field_name = field_name(prop.source_name, used_field_names);
    used_field_names.insert(field_name.clone());

    let annotation = self.schema_to_annotation(&prop_schema, &format!("{model_name}_{}", prop.source_name), context);

    let mut metadata = field_metadata(&prop_schema);
    if prop.required && prop_schema.contains_key("default") {
      // A required field never gets a runtime default; the declared value
      // survives as documentation metadata only.
      if let Some(default) = prop_schema.get("default") {
        metadata.schema_extra.insert("default".to_string(), default.clone());
      }
    }

    let default = if prop.required {
      None
    } else {
      prop_schema.get("default").cloned()
    };

    FieldDef {
      name: field_name,
      source_name: prop.source_name.to_string(),
      type_expr: annotation,
      required: prop.required,
      default,
      metadata,
    }
  }

  fn object_model_config(&self, model_name: &str, schema: &JsonMap, context: &mut SectionContext) -> ModelConfig {
    let additional = schema.get("additionalProperties");
    let extra_policy = if additional == Some(&Value::Bool(false)) {
      ExtraPolicy::Forbid
    } else {
      ExtraPolicy::Allow
    };
    let additional_value_type = match additional {
      Some(Value::Object(value_schema)) => {
        let annotation = self.schema_to_annotation(
          &self.normalize_nullable(value_schema.clone()),
          &format!("{model_name}Additional"),
          context,
        );
        Some(TypeExpr::Map(Box::new(annotation)))
      }
      _ => None,
    };

    let mut schema_extra = model_schema_extra(schema);
    if let Some(Value::Object(additional_schema)) = additional {
      schema_extra.insert(
        "additionalProperties".to_string(),
        strip_refs(&Value::Object(additional_schema.clone())),
      );
    }

    ModelConfig {
      docstring: string_or_none(schema.get("description")),
      title: string_or_none(schema.get("title")),
      extra_policy: Some(extra_policy),
      additional_value_type,
      schema_extra,
    }
  }

  /// Lowers one schema node into a type expression, emitting nested models
  /// into the section context along the way. Priority order matters: a
  /// list-typed `type` wins over everything, then literals, then
  /// combinators, then arrays/objects/primitives.
  fn schema_to_annotation(&self, schema: &JsonMap, hint: &str, context: &mut SectionContext) -> TypeExpr {
    if let Some(annotation) = self.annotation_from_type_list(schema, hint, context) {
      return annotation;
    }
    if let Some(annotation) = annotation_from_literal(schema) {
      return annotation;
    }
    if let Some(annotation) = self.annotation_from_combinators(schema, hint, context) {
      return annotation;
    }

    match schema.get("type").and_then(Value::as_str) {
      Some("array") => self.annotation_for_array(schema, hint, context),
      Some("object") => self.annotation_for_object(schema, hint, context),
      Some("string") => TypeExpr::String,
      Some("integer") => TypeExpr::Integer,
      Some("number") => TypeExpr::Number,
      Some("boolean") => TypeExpr::Boolean,
      Some("null") => TypeExpr::Null,
      _ if is_object_schema(schema) => self.annotation_for_object(schema, hint, context),
      _ => TypeExpr::Any,
    }
  }

  fn annotation_from_type_list(&self, schema: &JsonMap, hint: &str, context: &mut SectionContext) -> Option<TypeExpr> {
    let Some(Value::Array(schema_type)) = schema.get("type") else {
      return None;
    };
    let mut members = Vec::new();
    for member in schema_type.iter().filter_map(Value::as_str) {
      if member == "null" {
        members.push(TypeExpr::Null);
        continue;
      }
      let mut member_schema = schema.clone();
      member_schema.insert("type".to_string(), Value::String(member.to_string()));
      members.push(self.schema_to_annotation(&member_schema, hint, context));
    }
    Some(make_union(members))
  }

  fn annotation_from_combinators(&self, schema: &JsonMap, hint: &str, context: &mut SectionContext) -> Option<TypeExpr> {
    if let Some(Value::Array(one_of)) = schema.get("oneOf")
      && !one_of.is_empty()
    {
      let union = self.union_from_schema_list(one_of, &format!("{hint}Option"), context);
      return Some(apply_discriminator(schema, one_of, union));
    }

    if let Some(Value::Array(any_of)) = schema.get("anyOf")
      && !any_of.is_empty()
    {
      return Some(self.union_from_schema_list(any_of, &format!("{hint}Any"), context));
    }

    if let Some(Value::Array(all_of)) = schema.get("allOf")
      && !all_of.is_empty()
    {
      let merged = self.merge_all_of(schema);
      if is_object_schema(&merged) {
        let nested_name = context.unique_name(type_name(hint));
        self.build_object_model(nested_name.clone(), &merged, context);
        return Some(TypeExpr::Model(nested_name));
      }
      // Non-mergeable branches keep union semantics; nothing is dropped.
      return Some(self.union_from_schema_list(all_of, &format!("{hint}All"), context));
    }
    None
  }

  fn union_from_schema_list(&self, schemas: &[Value], hint_prefix: &str, context: &mut SectionContext) -> TypeExpr {
    let options = schemas
      .iter()
      .enumerate()
      .map(|(index, item)| {
        let item_schema = match item.as_object() {
          Some(map) => self.normalize_nullable(map.clone()),
          None => JsonMap::new(),
        };
        self.schema_to_annotation(&item_schema, &format!("{hint_prefix}{}", index + 1), context)
      })
      .collect();
    make_union(options)
  }

  fn annotation_for_array(&self, schema: &JsonMap, hint: &str, context: &mut SectionContext) -> TypeExpr {
    let item_schema = match schema.get("items") {
      Some(Value::Object(items)) => items.clone(),
      _ => {
        // Tolerated malformed shape: an array schema carrying object keys
        // at the top level describes its own items.
        let mut synthesized = JsonMap::new();
        if let Some(Value::Object(properties)) = schema.get("properties") {
          synthesized.insert("type".to_string(), Value::String("object".to_string()));
          synthesized.insert("properties".to_string(), Value::Object(properties.clone()));
          if let Some(Value::Array(required)) = schema.get("required") {
            let names: Vec<Value> = required
              .iter()
              .filter(|name| name.is_string())
              .cloned()
              .collect();
            synthesized.insert("required".to_string(), Value::Array(names));
          }
        }
        synthesized
      }
    };

    let item_annotation =
      self.schema_to_annotation(&self.normalize_nullable(item_schema.clone()), &format!("{hint}Item"), context);
    let item_extra = model_schema_extra(&item_schema);
    let inner = if item_extra.is_empty() {
      item_annotation
    } else {
      TypeExpr::Annotated {
        inner: Box::new(item_annotation),
        extras: item_extra,
      }
    };
    TypeExpr::Array(Box::new(inner))
  }

  fn annotation_for_object(&self, schema: &JsonMap, hint: &str, context: &mut SectionContext) -> TypeExpr {
    if matches!(schema.get("properties"), Some(Value::Object(_))) {
      let nested_name = context.unique_name(type_name(hint));
      self.build_object_model(nested_name.clone(), schema, context);
      return TypeExpr::Model(nested_name);
    }

    match schema.get("additionalProperties") {
      Some(Value::Object(additional)) => {
        let value_annotation =
          self.schema_to_annotation(&self.normalize_nullable(additional.clone()), &format!("{hint}Additional"), context);
        TypeExpr::Map(Box::new(value_annotation))
      }
      Some(Value::Bool(false)) => {
        let nested_name = context.unique_name(type_name(hint));
        let mut closed = JsonMap::new();
        closed.insert("type".to_string(), Value::String("object".to_string()));
        closed.insert("properties".to_string(), Value::Object(JsonMap::new()));
        closed.insert("additionalProperties".to_string(), Value::Bool(false));
        self.build_object_model(nested_name.clone(), &closed, context);
        TypeExpr::Model(nested_name)
      }
      _ => TypeExpr::Map(Box::new(TypeExpr::Any)),
    }
  }

  fn merge_all_of(&self, schema: &JsonMap) -> JsonMap {
    let normalize = |item: JsonMap| self.normalize_nullable(item);
    merge_all_of_schema(schema, Some(&normalize))
  }

  /// Rewrites an OpenAPI 3.0 `nullable: true` flag into a type-list null.
  fn normalize_nullable(&self, mut schema: JsonMap) -> JsonMap {
    if !self.openapi_version.starts_with("3.0") || schema.get("nullable") != Some(&Value::Bool(true)) {
      return schema;
    }
    schema.shift_remove("nullable");
    match schema.get("type").cloned() {
      Some(Value::String(single)) => {
        schema.insert(
          "type".to_string(),
          Value::Array(vec![Value::String(single), Value::String("null".to_string())]),
        );
      }
      Some(Value::Array(mut members)) => {
        if !members.iter().any(|member| member.as_str() == Some("null")) {
          members.push(Value::String("null".to_string()));
        }
        schema.insert("type".to_string(), Value::Array(members));
      }
      _ => {
        let original = schema.clone();
        let mut null_option = JsonMap::new();
        null_option.insert("type".to_string(), Value::String("null".to_string()));
        schema.clear();
        schema.insert(
          "anyOf".to_string(),
          Value::Array(vec![Value::Object(original), Value::Object(null_option)]),
        );
      }
    }
    schema
  }
}

/// Deduplicates union members by structural identity (first-seen order) and
/// folds a null member into an explicit-optional wrapper.
pub(crate) fn make_union(options: Vec<TypeExpr>) -> TypeExpr {
  let mut deduped: Vec<TypeExpr> = Vec::with_capacity(options.len());
  for option in options {
    if !deduped.contains(&option) {
      deduped.push(option);
    }
  }

  if deduped.is_empty() {
    return TypeExpr::Any;
  }
  if deduped.len() == 1 {
    return deduped.into_iter().next().unwrap_or(TypeExpr::Any);
  }

  let nullable = deduped.contains(&TypeExpr::Null);
  if !nullable {
    return TypeExpr::Union(UnionType {
      options: deduped,
      discriminator: None,
    });
  }

  let mut members: Vec<TypeExpr> = deduped.into_iter().filter(|option| *option != TypeExpr::Null).collect();
  match members.len() {
    0 => TypeExpr::Null,
    1 => TypeExpr::Optional(Box::new(members.remove(0))),
    _ => TypeExpr::Optional(Box::new(TypeExpr::Union(UnionType {
      options: members,
      discriminator: None,
    }))),
  }
}

fn annotation_from_literal(schema: &JsonMap) -> Option<TypeExpr> {
  if let Some(const_value) = schema.get("const") {
    return Some(TypeExpr::Literal(vec![const_value.clone()]));
  }
  if let Some(Value::Array(values)) = schema.get("enum")
    && !values.is_empty()
  {
    return Some(TypeExpr::Literal(values.clone()));
  }
  None
}

/// Tags a union with its discriminant property when every `oneOf` option
/// declares that property as a `const` or single-element `enum`.
fn apply_discriminator(schema: &JsonMap, one_of: &[Value], annotation: TypeExpr) -> TypeExpr {
  let Some(Value::Object(discriminator)) = schema.get("discriminator") else {
    return annotation;
  };
  let Some(property_name) = discriminator
    .get("propertyName")
    .and_then(Value::as_str)
    .filter(|name| !name.is_empty())
  else {
    return annotation;
  };
  if !is_discriminator_compatible(one_of, property_name) {
    return annotation;
  }
  match annotation {
    TypeExpr::Union(mut union) => {
      union.discriminator = Some(property_name.to_string());
      TypeExpr::Union(union)
    }
    other => other,
  }
}

fn is_discriminator_compatible(one_of: &[Value], property_name: &str) -> bool {
  one_of.iter().all(|option| {
    let Some(discriminator_schema) = option
      .as_object()
      .and_then(|map| map.get("properties"))
      .and_then(Value::as_object)
      .and_then(|props| props.get(property_name))
      .and_then(Value::as_object)
    else {
      return false;
    };
    if discriminator_schema.contains_key("const") {
      return true;
    }
    matches!(discriminator_schema.get("enum"), Some(Value::Array(values)) if values.len() == 1)
  })
}

fn field_name(source_name: &str, used_names: &HashSet<String>) -> String {
  let mut candidate = sanitize_identifier(source_name);
  if is_reserved_field_name(&candidate) {
    candidate = format!("{candidate}_field");
  }
  if !used_names.contains(&candidate) && !is_reserved_field_name(&candidate) {
    return candidate;
  }
  let mut suffix = 2usize;
  loop {
    let renamed = format!("{candidate}{suffix}");
    if !used_names.contains(&renamed) && !is_reserved_field_name(&renamed) {
      return renamed;
    }
    suffix += 1;
  }
}

fn field_metadata(schema: &JsonMap) -> FieldMetadata {
  let mut docs = JsonMap::new();
  for key in DOC_FIELDS {
    if let Some(value) = schema.get(key) {
      docs.insert(key.to_string(), value.clone());
    }
  }

  let mut schema_extra = JsonMap::new();
  for key in DOC_FIELDS_AS_EXTRA {
    if let Some(value) = docs.shift_remove(key) {
      schema_extra.insert(key.to_string(), value);
    }
  }

  for (key, value) in schema {
    if DOC_FIELDS.contains(&key.as_str()) || FIELD_STRUCTURAL_KEYS.contains(&key.as_str()) {
      continue;
    }
    schema_extra.insert(key.clone(), strip_refs(value));
  }
  if let Some(items) = schema.get("items").filter(|items| items.is_object()) {
    schema_extra.insert("items".to_string(), strip_refs(items));
  }
  if let Some(additional) = schema.get("additionalProperties").filter(|value| value.is_object()) {
    schema_extra.insert("additionalProperties".to_string(), strip_refs(additional));
  }

  FieldMetadata { docs, schema_extra }
}

fn model_schema_extra(schema: &JsonMap) -> JsonMap {
  let mut extra = JsonMap::new();
  for key in MODEL_EXTRA_KEYS {
    if let Some(value) = schema.get(key) {
      extra.insert(key.to_string(), strip_refs(value));
    }
  }
  for (key, value) in schema {
    if DOC_FIELDS.contains(&key.as_str()) || MODEL_STRUCTURAL_KEYS.contains(&key.as_str()) {
      continue;
    }
    extra.insert(key.clone(), strip_refs(value));
  }
  extra
}

/// Drops `$ref` entries from metadata payloads; an unresolved reference
/// inside passthrough extras is not representable downstream.
fn strip_refs(value: &Value) -> Value {
  match value {
    Value::Object(map) => Value::Object(
      map
        .iter()
        .filter(|(key, _)| key.as_str() != "$ref")
        .map(|(key, item)| (key.clone(), strip_refs(item)))
        .collect(),
    ),
    Value::Array(items) => Value::Array(items.iter().map(strip_refs).collect()),
    other => other.clone(),
  }
}

fn string_or_none(value: Option<&Value>) -> Option<String> {
  value
    .and_then(Value::as_str)
    .filter(|text| !text.is_empty())
    .map(str::to_string)
}
