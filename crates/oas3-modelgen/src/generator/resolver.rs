//! Local reference resolution and per-operation section schema extraction.

use std::collections::{HashMap, HashSet};

use mediatype::MediaTypeBuf;
use serde_json::Value;

use super::{ast::StatusSchemaMap, errors::GeneratorError};
use crate::{naming::operations::OperationSpec, utils::JsonMap};

const HTTP_SUCCESS_PREFIX: char = '2';

/// Parameter keys copied onto the synthesized property schema when the
/// schema itself does not already carry them.
const PARAMETER_DOC_KEYS: [&str; 6] = [
  "description",
  "deprecated",
  "example",
  "examples",
  "contentMediaType",
  "contentEncoding",
];

/// Resolved schemas for one endpoint operation, one entry per section.
/// A `None`/empty entry means the section has no schema material and is
/// not emitted.
#[derive(Debug, Clone, Default)]
pub(crate) struct SectionSchemas {
  pub url_params: Option<JsonMap>,
  pub query_params: Option<JsonMap>,
  pub headers: Option<JsonMap>,
  pub cookies: Option<JsonMap>,
  pub body: Option<JsonMap>,
  pub responses: StatusSchemaMap,
  pub errors: StatusSchemaMap,
}

/// Inlines local `$ref` pointers and builds section schemas.
///
/// The resolution cache and cycle set are explicit, per-resolver state
/// scoped to one document load. A reference that points back into an
/// in-progress resolution is left as a `{"$ref": …}` placeholder node,
/// which keeps recursive structures representable without infinite
/// expansion.
pub(crate) struct Resolver {
  document: Value,
  cache: HashMap<String, Value>,
  cycle_refs: HashSet<String>,
}

impl Resolver {
  pub(crate) fn new(document: Value) -> Self {
    Self {
      document,
      cache: HashMap::new(),
      cycle_refs: HashSet::new(),
    }
  }

  /// Recursively inlines references in a node, returning a self-contained
  /// copy.
  pub(crate) fn resolve_node(&mut self, node: &Value) -> Result<Value, GeneratorError> {
    let mut stack = Vec::new();
    self.resolve(node, &mut stack)
  }

  fn resolve(&mut self, node: &Value, stack: &mut Vec<String>) -> Result<Value, GeneratorError> {
    match node {
      Value::Array(items) => {
        let resolved = items
          .iter()
          .map(|item| self.resolve(item, stack))
          .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(resolved))
      }
      Value::Object(map) => {
        if let Some(ref_path) = map.get("$ref").and_then(Value::as_str) {
          let ref_path = ref_path.to_string();
          let resolved_ref = self.resolve_ref(&ref_path, stack)?;
          let siblings: Vec<(&String, &Value)> = map.iter().filter(|(key, _)| key.as_str() != "$ref").collect();
          if siblings.is_empty() {
            return Ok(resolved_ref);
          }
          // Sibling keys override the referenced target.
          let mut merged = match resolved_ref {
            Value::Object(target) => target,
            other => return Ok(other),
          };
          for (key, value) in siblings {
            merged.insert(key.clone(), self.resolve(value, stack)?);
          }
          return Ok(Value::Object(merged));
        }
        let mut resolved = JsonMap::new();
        for (key, value) in map {
          resolved.insert(key.clone(), self.resolve(value, stack)?);
        }
        Ok(Value::Object(resolved))
      }
      other => Ok(other.clone()),
    }
  }

  fn resolve_ref(&mut self, ref_path: &str, stack: &mut Vec<String>) -> Result<Value, GeneratorError> {
    if stack.iter().any(|entry| entry == ref_path) {
      self.cycle_refs.insert(ref_path.to_string());
      let mut placeholder = JsonMap::new();
      placeholder.insert("$ref".to_string(), Value::String(ref_path.to_string()));
      return Ok(Value::Object(placeholder));
    }

    if let Some(cached) = self.cache.get(ref_path) {
      return Ok(cached.clone());
    }

    let Some(pointer) = ref_path.strip_prefix("#/") else {
      return Err(GeneratorError::Resolve(format!(
        "only local references are supported: {ref_path}"
      )));
    };

    let mut current = &self.document;
    for token in pointer.split('/') {
      let token = token.replace("~1", "/").replace("~0", "~");
      current = current
        .as_object()
        .and_then(|map| map.get(&token))
        .ok_or_else(|| GeneratorError::Resolve(format!("unresolvable reference: {ref_path}")))?;
    }
    let target = current.clone();

    stack.push(ref_path.to_string());
    let resolved = self.resolve(&target, stack)?;
    stack.pop();

    self.cache.insert(ref_path.to_string(), resolved.clone());
    Ok(resolved)
  }

  /// Builds all section schemas for a single operation.
  pub(crate) fn build_section_schemas(&mut self, operation: &OperationSpec) -> Result<SectionSchemas, GeneratorError> {
    let mut parameters = self.collect_parameters(&operation.path_item)?;
    parameters.extend(self.collect_parameters(&operation.operation)?);

    let url_params = parameters_to_schema(&parameters, "path");
    let query_params = parameters_to_schema(&parameters, "query");
    let headers = parameters_to_schema(&parameters, "header");
    let cookies = parameters_to_schema(&parameters, "cookie");

    let body = match operation.operation.get("requestBody") {
      Some(request_body) => self.request_body_to_schema(request_body)?,
      None => None,
    };

    let mut responses = StatusSchemaMap::new();
    let mut errors = StatusSchemaMap::new();
    if let Some(Value::Object(raw_responses)) = operation.operation.get("responses") {
      for (status_code, response_node) in raw_responses {
        let Some(schema) = self.response_to_schema(response_node)? else {
          continue;
        };
        if status_code.starts_with(HTTP_SUCCESS_PREFIX) {
          responses.insert(status_code.clone(), schema);
        } else {
          errors.insert(status_code.clone(), schema);
        }
      }
    }
    responses.sort_keys();
    errors.sort_keys();

    Ok(SectionSchemas {
      url_params,
      query_params,
      headers,
      cookies,
      body,
      responses,
      errors,
    })
  }

  fn collect_parameters(&mut self, node: &JsonMap) -> Result<Vec<JsonMap>, GeneratorError> {
    let Some(Value::Array(raw)) = node.get("parameters") else {
      return Ok(Vec::new());
    };
    let mut parameters = Vec::new();
    for parameter in raw {
      if !parameter.is_object() {
        continue;
      }
      if let Value::Object(resolved) = self.resolve_node(parameter)? {
        parameters.push(resolved);
      }
    }
    Ok(parameters)
  }

  fn request_body_to_schema(&mut self, request_body: &Value) -> Result<Option<JsonMap>, GeneratorError> {
    if !request_body.is_object() {
      return Ok(None);
    }
    let resolved = self.resolve_node(request_body)?;
    let Some(content) = resolved.get("content").and_then(Value::as_object) else {
      return Ok(None);
    };
    self.first_content_schema(content)
  }

  fn response_to_schema(&mut self, response_node: &Value) -> Result<Option<JsonMap>, GeneratorError> {
    if !response_node.is_object() {
      return Ok(None);
    }
    let resolved = self.resolve_node(response_node)?;
    let Some(content) = resolved.get("content").and_then(Value::as_object) else {
      return Ok(None);
    };
    self.first_content_schema(content)
  }

  fn first_content_schema(&mut self, content: &JsonMap) -> Result<Option<JsonMap>, GeneratorError> {
    let mut candidates: Vec<(u8, usize, &Value)> = content
      .iter()
      .enumerate()
      .filter_map(|(index, (media_type, media))| {
        media.is_object().then(|| (media_type_rank(media_type), index, media))
      })
      .collect();
    candidates.sort_by_key(|(rank, index, _)| (*rank, *index));

    for (_, _, media) in candidates {
      let Some(schema_node) = media.get("schema") else {
        continue;
      };
      if !schema_node.is_object() {
        continue;
      }
      if let Value::Object(resolved) = self.resolve_node(schema_node)? {
        return Ok(Some(resolved));
      }
    }
    Ok(None)
  }
}

/// Preference order for picking one media type out of a content map:
/// `application/json` first, then any `+json` suffixed type, then form
/// encodings, then everything else in document order.
fn media_type_rank(media_type: &str) -> u8 {
  use mediatype::names::{x_::WWW_FORM_URLENCODED, APPLICATION, FORM_DATA, JSON, MULTIPART};

  let Ok(parsed) = media_type.parse::<MediaTypeBuf>() else {
    return 5;
  };
  if parsed.ty() == APPLICATION && parsed.subty() == JSON && parsed.suffix().is_none() {
    return 0;
  }
  if parsed.suffix() == Some(JSON) {
    return 1;
  }
  if parsed.ty() == APPLICATION && parsed.subty() == WWW_FORM_URLENCODED {
    return 2;
  }
  if parsed.ty() == MULTIPART && parsed.subty() == FORM_DATA {
    return 3;
  }
  4
}

/// Folds the parameters of one location into a closed object schema.
/// Returns `None` when no parameter targets the location.
fn parameters_to_schema(parameters: &[JsonMap], location: &str) -> Option<JsonMap> {
  let mut properties = JsonMap::new();
  let mut required: Vec<String> = Vec::new();

  for parameter in parameters {
    if parameter.get("in").and_then(Value::as_str) != Some(location) {
      continue;
    }
    let Some(name) = parameter.get("name").and_then(Value::as_str).filter(|n| !n.is_empty()) else {
      continue;
    };

    let mut schema = match parameter.get("schema") {
      Some(Value::Object(schema_node)) => schema_node.clone(),
      _ => {
        let mut fallback = JsonMap::new();
        fallback.insert("type".to_string(), Value::String("string".to_string()));
        fallback
      }
    };

    for doc_key in PARAMETER_DOC_KEYS {
      if let Some(doc_value) = parameter.get(doc_key)
        && !schema.contains_key(doc_key)
      {
        schema.insert(doc_key.to_string(), doc_value.clone());
      }
    }

    properties.insert(name.to_string(), Value::Object(schema));
    if parameter.get("required") == Some(&Value::Bool(true)) {
      required.push(name.to_string());
    }
  }

  if properties.is_empty() {
    return None;
  }

  required.sort_unstable();
  required.dedup();

  let mut schema = JsonMap::new();
  schema.insert("type".to_string(), Value::String("object".to_string()));
  schema.insert("properties".to_string(), Value::Object(properties));
  schema.insert(
    "required".to_string(),
    Value::Array(required.into_iter().map(Value::String).collect()),
  );
  schema.insert("additionalProperties".to_string(), Value::Bool(false));
  Some(schema)
}
