//! Derives a JSON Schema directly from the model IR.
//!
//! Verification never loads emitted source. Each section's root model is
//! turned into the schema its generated representation describes, with
//! named model references rendered as `#/$defs/…` pointers — the same
//! shape runtime model introspection would produce, so the normalizer's
//! definition-inlining pre-step applies to it unchanged.

use std::collections::HashSet;

use serde_json::Value;

use super::{
  ast::{ExtraPolicy, FieldDef, ModelDef, SectionModel, TypeExpr, UnionType},
  errors::GeneratorError,
};
use crate::utils::JsonMap;

const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Derives the JSON Schema of a section's root model, with every referenced
/// model collected under `$defs`.
pub(crate) fn section_root_schema(section: &SectionModel) -> Result<JsonMap, GeneratorError> {
  let root = section.find_model(&section.root_model_name).ok_or_else(|| {
    GeneratorError::Invariant(format!(
      "section '{}' has no model named '{}'",
      section.section_name, section.root_model_name
    ))
  })?;

  let mut collector = DefsCollector {
    section,
    defs: JsonMap::new(),
    in_progress: HashSet::new(),
  };
  let mut schema = collector.model_schema(root)?;
  if !collector.defs.is_empty() {
    schema.insert("$defs".to_string(), Value::Object(collector.defs));
  }
  schema.insert("$schema".to_string(), Value::String(SCHEMA_DIALECT.to_string()));
  Ok(schema)
}

struct DefsCollector<'a> {
  section: &'a SectionModel,
  defs: JsonMap,
  in_progress: HashSet<String>,
}

impl DefsCollector<'_> {
  fn model_schema(&mut self, model: &ModelDef) -> Result<JsonMap, GeneratorError> {
    let mut schema = if model.is_root {
      let Some(root_type) = model.root_type.as_ref() else {
        return Err(GeneratorError::Invariant(format!(
          "root model '{}' has no wrapped type",
          model.name
        )));
      };
      self.type_schema(root_type)?
    } else {
      self.object_schema(model)?
    };

    let title = model.config.title.clone().unwrap_or_else(|| model.name.clone());
    schema.insert("title".to_string(), Value::String(title));
    if let Some(docstring) = model.config.docstring.as_ref() {
      schema.insert("description".to_string(), Value::String(docstring.clone()));
    }
    for (key, value) in &model.config.schema_extra {
      schema.insert(key.clone(), value.clone());
    }
    Ok(schema)
  }

  fn object_schema(&mut self, model: &ModelDef) -> Result<JsonMap, GeneratorError> {
    let mut schema = JsonMap::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));

    let mut properties = JsonMap::new();
    let mut required = Vec::new();
    for field in &model.fields {
      properties.insert(field.source_name.clone(), Value::Object(self.field_schema(field)?));
      if field.required {
        required.push(Value::String(field.source_name.clone()));
      }
    }
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
      schema.insert("required".to_string(), Value::Array(required));
    }

    let additional = match model.config.extra_policy {
      Some(ExtraPolicy::Forbid) => Value::Bool(false),
      _ => Value::Bool(true),
    };
    schema.insert("additionalProperties".to_string(), additional);
    Ok(schema)
  }

  fn field_schema(&mut self, field: &FieldDef) -> Result<JsonMap, GeneratorError> {
    let mut schema = self.type_schema(&field.type_expr)?;
    for (key, value) in &field.metadata.docs {
      schema.insert(key.clone(), value.clone());
    }
    if let Some(default) = field.default.as_ref() {
      schema.insert("default".to_string(), default.clone());
    }
    for (key, value) in &field.metadata.schema_extra {
      schema.insert(key.clone(), value.clone());
    }
    Ok(schema)
  }

  fn type_schema(&mut self, expr: &TypeExpr) -> Result<JsonMap, GeneratorError> {
    let mut schema = JsonMap::new();
    match expr {
      TypeExpr::String => {
        schema.insert("type".to_string(), Value::String("string".to_string()));
      }
      TypeExpr::Integer => {
        schema.insert("type".to_string(), Value::String("integer".to_string()));
      }
      TypeExpr::Number => {
        schema.insert("type".to_string(), Value::String("number".to_string()));
      }
      TypeExpr::Boolean => {
        schema.insert("type".to_string(), Value::String("boolean".to_string()));
      }
      TypeExpr::Null => {
        schema.insert("type".to_string(), Value::String("null".to_string()));
      }
      // The generic JSON value accepts anything; an empty schema states
      // exactly that.
      TypeExpr::Any => {}
      TypeExpr::Literal(values) => {
        schema.insert("enum".to_string(), Value::Array(values.clone()));
      }
      TypeExpr::Model(name) => {
        self.ensure_def(name)?;
        schema.insert("$ref".to_string(), Value::String(format!("#/$defs/{name}")));
      }
      TypeExpr::Array(inner) => {
        schema.insert("type".to_string(), Value::String("array".to_string()));
        schema.insert("items".to_string(), Value::Object(self.type_schema(inner)?));
      }
      TypeExpr::Map(inner) => {
        schema.insert("type".to_string(), Value::String("object".to_string()));
        let additional = if **inner == TypeExpr::Any {
          Value::Bool(true)
        } else {
          Value::Object(self.type_schema(inner)?)
        };
        schema.insert("additionalProperties".to_string(), additional);
      }
      TypeExpr::Optional(inner) => {
        let mut null_schema = JsonMap::new();
        null_schema.insert("type".to_string(), Value::String("null".to_string()));
        schema.insert(
          "anyOf".to_string(),
          Value::Array(vec![
            Value::Object(self.type_schema(inner)?),
            Value::Object(null_schema),
          ]),
        );
      }
      TypeExpr::Union(UnionType { options, discriminator }) => {
        let rendered = options
          .iter()
          .map(|option| self.type_schema(option).map(Value::Object))
          .collect::<Result<Vec<_>, _>>()?;
        schema.insert("anyOf".to_string(), Value::Array(rendered));
        if let Some(property_name) = discriminator {
          let mut tag = JsonMap::new();
          tag.insert("propertyName".to_string(), Value::String(property_name.clone()));
          schema.insert("discriminator".to_string(), Value::Object(tag));
        }
      }
      TypeExpr::Annotated { inner, extras } => {
        schema = self.type_schema(inner)?;
        for (key, value) in extras {
          schema.insert(key.clone(), value.clone());
        }
      }
    }
    Ok(schema)
  }

  fn ensure_def(&mut self, name: &str) -> Result<(), GeneratorError> {
    if self.defs.contains_key(name) {
      return Ok(());
    }
    if !self.in_progress.insert(name.to_string()) {
      return Err(GeneratorError::Invariant(format!(
        "cyclic model reference while deriving schema for '{name}'"
      )));
    }
    let model = self
      .section
      .find_model(name)
      .ok_or_else(|| GeneratorError::Invariant(format!("unknown model reference '{name}'")))?;
    let schema = self.model_schema(model)?;
    self.in_progress.remove(name);
    self.defs.insert(name.to_string(), Value::Object(schema));
    Ok(())
  }
}
