//! Schema canonicalization and subset-equivalence checking.
//!
//! Both the hand-authored source schema and the schema derived from the
//! model IR are brought into one canonical shape before comparison. Two
//! deliberate relaxations live here and are easy to miss:
//!
//! - `oneOf` is rewritten to `anyOf`: pure subset comparison never needs to
//!   distinguish mutual exclusivity from simple alternation, so a source
//!   `oneOf` that is not satisfiable as non-overlapping in the generated
//!   form is still accepted.
//! - A bare `type: object` node gains `additionalProperties: true`, because
//!   the generated object representation is permissive by default. A source
//!   schema that accidentally omitted an intended
//!   `additionalProperties: false` therefore never surfaces as a mismatch.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde_json::Value;

use super::errors::GeneratorError;
use crate::utils::{JsonMap, schema_ext::merge_all_of_schema};

const ORDER_INSENSITIVE_KEYS: [&str; 5] = ["required", "enum", "allOf", "anyOf", "oneOf"];

/// Keys that carry no comparison-relevant information. A `$ref` surviving to
/// this stage is a dangling reference, not a comparable value.
const IGNORED_KEYS: [&str; 3] = ["$comment", "$ref", "format"];

static DESC_BULLET_SPACING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]+\*").unwrap());

/// First point where an expected constraint is absent or contradicted.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SchemaMismatch {
  /// Dotted/bracketed JSON-pointer-like location.
  pub path: String,
  pub expected: Value,
  /// `None` marks an absent key or an unmatched array element.
  pub actual: Option<Value>,
}

/// Canonicalizes a source schema coming from the OpenAPI document.
pub(crate) fn normalize_source_schema(schema: &JsonMap) -> Result<JsonMap, GeneratorError> {
  let normalized = normalize_nullable(&Value::Object(schema.clone()));
  let normalized = normalize_all_of(&normalized);
  as_schema_object(normalize_structural(&normalized, None))
}

/// Canonicalizes a schema derived from the model IR.
///
/// Local `#/$defs/…` references are fully inlined first (a cycle here is a
/// converter bug and fails loudly), then the definitions container and
/// dialect marker are stripped before the shared pipeline runs.
pub(crate) fn normalize_generated_schema(schema: &JsonMap) -> Result<JsonMap, GeneratorError> {
  let inlined = inline_local_defs(schema)?;
  let mut inlined = match inlined {
    Value::Object(map) => map,
    other => return as_schema_object(other),
  };
  inlined.shift_remove("$defs");
  inlined.shift_remove("$schema");

  let normalized = normalize_nullable(&Value::Object(inlined));
  let normalized = normalize_all_of(&normalized);
  as_schema_object(normalize_structural(&normalized, None))
}

/// Returns the first point where `expected` is not a subset of `actual`.
///
/// The comparison is asymmetric by design: `actual` may carry any amount of
/// undeclared detail, but everything `expected` states must be present and
/// equal.
pub(crate) fn subset_mismatch(expected: &Value, actual: &Value, path: &str) -> Option<SchemaMismatch> {
  match expected {
    Value::Object(expected_map) => {
      let Some(actual_map) = actual.as_object() else {
        return Some(SchemaMismatch {
          path: path.to_string(),
          expected: expected.clone(),
          actual: Some(actual.clone()),
        });
      };
      for (key, expected_value) in expected_map {
        let key_path = format!("{path}.{key}");
        let Some(actual_value) = actual_map.get(key) else {
          return Some(SchemaMismatch {
            path: key_path,
            expected: expected_value.clone(),
            actual: None,
          });
        };
        if let Some(mismatch) = subset_mismatch(expected_value, actual_value, &key_path) {
          return Some(mismatch);
        }
      }
      None
    }
    Value::Array(expected_items) => {
      let Some(actual_items) = actual.as_array() else {
        return Some(SchemaMismatch {
          path: path.to_string(),
          expected: expected.clone(),
          actual: Some(actual.clone()),
        });
      };
      if expected_items.len() > actual_items.len() {
        return Some(SchemaMismatch {
          path: path.to_string(),
          expected: expected.clone(),
          actual: Some(actual.clone()),
        });
      }
      list_subset_mismatch(expected_items, actual_items, path)
    }
    _ => {
      if expected == actual {
        None
      } else {
        Some(SchemaMismatch {
          path: path.to_string(),
          expected: expected.clone(),
          actual: Some(actual.clone()),
        })
      }
    }
  }
}

/// Matches expected elements to distinct actual elements via backtracking.
///
/// Canonical sorting does not always fully disambiguate member order (two
/// options can tie on their sort key), so index-for-index comparison is not
/// enough. When no full assignment exists, the first expected element's
/// least-bad attempted mismatch is reported.
fn list_subset_mismatch(expected: &[Value], actual: &[Value], path: &str) -> Option<SchemaMismatch> {
  fn backtrack(
    index: usize,
    expected: &[Value],
    actual: &[Value],
    used: &mut Vec<bool>,
    path: &str,
  ) -> Option<SchemaMismatch> {
    if index >= expected.len() {
      return None;
    }
    let item_path = format!("{path}[{index}]");
    let mut best: Option<SchemaMismatch> = None;

    for (candidate, actual_item) in actual.iter().enumerate() {
      if used[candidate] {
        continue;
      }
      match subset_mismatch(&expected[index], actual_item, &item_path) {
        Some(mismatch) => {
          if best.is_none() {
            best = Some(mismatch);
          }
        }
        None => {
          used[candidate] = true;
          match backtrack(index + 1, expected, actual, used, path) {
            None => return None,
            Some(downstream) => {
              used[candidate] = false;
              if best.is_none() {
                best = Some(downstream);
              }
            }
          }
        }
      }
    }

    Some(best.unwrap_or(SchemaMismatch {
      path: item_path,
      expected: expected[index].clone(),
      actual: None,
    }))
  }

  let mut used = vec![false; actual.len()];
  backtrack(0, expected, actual, &mut used, path)
}

/// Rewrites `nullable: true` into a null-bearing type, recursively. Applied
/// to both entry points: hand-authored and tool-derived schemas can mix
/// OpenAPI 3.0 and 3.1 styles.
fn normalize_nullable(node: &Value) -> Value {
  match node {
    Value::Array(items) => Value::Array(items.iter().map(normalize_nullable).collect()),
    Value::Object(map) => {
      let mut normalized: JsonMap = map
        .iter()
        .map(|(key, value)| (key.clone(), normalize_nullable(value)))
        .collect();

      let nullable = matches!(normalized.get("nullable"), Some(Value::Bool(_)))
        .then(|| normalized.shift_remove("nullable") == Some(Value::Bool(true)))
        .unwrap_or(false);
      if !nullable {
        return Value::Object(normalized);
      }

      match normalized.get("type").cloned() {
        Some(Value::String(single)) => {
          let mut members = vec![single, "null".to_string()];
          members.sort_unstable();
          normalized.insert(
            "type".to_string(),
            Value::Array(members.into_iter().map(Value::String).collect()),
          );
        }
        Some(Value::Array(raw_members)) => {
          let mut members: Vec<String> = raw_members
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
          if !members.iter().any(|member| member == "null") {
            members.push("null".to_string());
          }
          members.sort_unstable();
          members.dedup();
          normalized.insert(
            "type".to_string(),
            Value::Array(members.into_iter().map(Value::String).collect()),
          );
        }
        _ => {
          let mut null_option = JsonMap::new();
          null_option.insert("type".to_string(), Value::String("null".to_string()));
          let mut options: Vec<Value> = Vec::new();
          if let Some(Value::Array(any_of)) = normalized.get("anyOf") {
            options.extend(any_of.iter().cloned());
          } else {
            let wrapped: JsonMap = normalized
              .iter()
              .filter(|(key, _)| key.as_str() != "anyOf")
              .map(|(key, value)| (key.clone(), value.clone()))
              .collect();
            options.push(Value::Object(wrapped));
          }
          options.push(Value::Object(null_option));
          let mut replacement = JsonMap::new();
          replacement.insert("anyOf".to_string(), Value::Array(options));
          return Value::Object(replacement);
        }
      }
      Value::Object(normalized)
    }
    other => other.clone(),
  }
}

/// Merges `allOf` chains bottom-up; an `allOf` of empty members is a no-op
/// constraint and is dropped outright.
fn normalize_all_of(node: &Value) -> Value {
  match node {
    Value::Array(items) => Value::Array(items.iter().map(normalize_all_of).collect()),
    Value::Object(map) => {
      let normalized: JsonMap = map
        .iter()
        .map(|(key, value)| (key.clone(), normalize_all_of(value)))
        .collect();

      let Some(Value::Array(all_of)) = normalized.get("allOf") else {
        return Value::Object(normalized);
      };
      if all_of.is_empty() {
        return Value::Object(normalized);
      }
      if all_of.iter().all(is_empty_object) {
        let without: JsonMap = normalized
          .iter()
          .filter(|(key, _)| key.as_str() != "allOf")
          .map(|(key, value)| (key.clone(), value.clone()))
          .collect();
        return Value::Object(without);
      }
      Value::Object(merge_all_of_schema(&normalized, None))
    }
    other => other.clone(),
  }
}

fn normalize_structural(node: &Value, parent_key: Option<&str>) -> Value {
  match node {
    Value::Array(items) => {
      let mut normalized: Vec<Value> = items.iter().map(|item| normalize_structural(item, None)).collect();
      if parent_key.is_some_and(|key| ORDER_INSENSITIVE_KEYS.contains(&key)) {
        normalized.sort_by_cached_key(|item| canonical_json(item));
      }
      Value::Array(normalized)
    }
    Value::Object(map) => {
      let mut normalized = JsonMap::new();
      let mut keys: Vec<&String> = map.keys().collect();
      keys.sort_unstable();
      for key in keys {
        if IGNORED_KEYS.contains(&key.as_str()) {
          continue;
        }
        if let Some(value) = map.get(key) {
          normalized.insert(key.clone(), normalize_structural(value, Some(key)));
        }
      }

      if normalized.contains_key("oneOf") && !normalized.contains_key("anyOf") {
        if let Some(one_of) = normalized.shift_remove("oneOf") {
          normalized.insert("anyOf".to_string(), one_of);
        }
      }

      collapse_singleton_any_of(&mut normalized);
      collapse_nullable_any_of(&mut normalized);
      normalize_type_list_forms(&mut normalized);
      collapse_any_of_simple_types(&mut normalized);
      normalize_const_enum(&mut normalized);
      normalize_malformed_array_schema(&mut normalized);
      normalize_required_properties(&mut normalized);
      normalize_enum_type_conflict(&mut normalized);
      drop_empty_all_of(&mut normalized);
      drop_any_of_option_descriptions(&mut normalized);
      strip_discriminator_mapping(&mut normalized);

      if let Some(Value::String(description)) = normalized.get("description") {
        let cleaned = normalize_description(description);
        normalized.insert("description".to_string(), Value::String(cleaned));
      }

      if normalized.get("type").and_then(Value::as_str) == Some("object")
        && !normalized.contains_key("additionalProperties")
      {
        normalized.insert("additionalProperties".to_string(), Value::Bool(true));
      }
      if normalized.get("required") == Some(&Value::Array(Vec::new())) {
        normalized.shift_remove("required");
      }
      Value::Object(normalized)
    }
    other => other.clone(),
  }
}

/// Collapses an `anyOf` with exactly one option by merging the option's
/// keys into the parent; parent keys win on conflict.
fn collapse_singleton_any_of(node: &mut JsonMap) {
  let Some(Value::Array(any_of)) = node.get("anyOf") else {
    return;
  };
  if any_of.len() != 1 {
    return;
  }
  let Some(option) = any_of[0].as_object().cloned() else {
    return;
  };
  node.shift_remove("anyOf");
  for (key, value) in option {
    node.entry(key).or_insert(value);
  }
}

/// Collapses `anyOf: [{type: null}, simple-typed option]` into one node
/// carrying the option's keys and a null-augmented type list.
fn collapse_nullable_any_of(node: &mut JsonMap) {
  let Some(Value::Array(any_of)) = node.get("anyOf") else {
    return;
  };
  if any_of.len() != 2 {
    return;
  }

  let mut null_option: Option<&JsonMap> = None;
  let mut typed_option: Option<&JsonMap> = None;
  for option in any_of {
    let Some(option_map) = option.as_object() else {
      return;
    };
    if option_map.get("type").and_then(Value::as_str) == Some("null") && option_map.len() == 1 {
      null_option = Some(option_map);
      continue;
    }
    if option_map.get("type").is_some_and(Value::is_string)
      && !option_map.contains_key("anyOf")
      && !option_map.contains_key("oneOf")
    {
      typed_option = Some(option_map);
      continue;
    }
    return;
  }
  let (Some(_), Some(typed_option)) = (null_option, typed_option) else {
    return;
  };
  let typed_option = typed_option.clone();

  node.shift_remove("anyOf");
  let option_type = typed_option.get("type").and_then(Value::as_str).map(str::to_string);
  for (key, value) in typed_option {
    if key == "type" {
      continue;
    }
    node.entry(key).or_insert(value);
  }
  if let Some(single) = option_type {
    let mut members = vec![single, "null".to_string()];
    members.sort_unstable();
    node.insert(
      "type".to_string(),
      Value::Array(members.into_iter().map(Value::String).collect()),
    );
  }
}

/// Collapses an `anyOf` whose options are all simple schemas differing only
/// by `type` (plus `default`/`description`/`title`) into one sorted union
/// type list.
fn collapse_any_of_simple_types(node: &mut JsonMap) {
  let Some(Value::Array(any_of)) = node.get("anyOf") else {
    return;
  };
  if any_of.is_empty() {
    return;
  }
  const ALLOWED_META: [&str; 3] = ["default", "description", "title"];

  let mut members: Vec<String> = Vec::with_capacity(any_of.len());
  for option in any_of {
    let Some(option_map) = option.as_object() else {
      return;
    };
    if option_map
      .keys()
      .any(|key| key != "type" && !ALLOWED_META.contains(&key.as_str()))
    {
      return;
    }
    let Some(option_type) = option_map.get("type").and_then(Value::as_str) else {
      return;
    };
    members.push(option_type.to_string());
  }
  members.sort_unstable();
  members.dedup();
  node.insert(
    "type".to_string(),
    Value::Array(members.into_iter().map(Value::String).collect()),
  );
  node.shift_remove("anyOf");
}

fn normalize_type_list_forms(node: &mut JsonMap) {
  let Some(Value::Array(schema_type)) = node.get("type") else {
    return;
  };
  let mut members: Vec<String> = schema_type
    .iter()
    .filter_map(Value::as_str)
    .map(str::to_string)
    .collect();
  if members.is_empty() {
    node.shift_remove("type");
    return;
  }
  if members.len() == 1 {
    node.insert("type".to_string(), Value::String(members.remove(0)));
    return;
  }
  members.sort_unstable();
  members.dedup();
  node.insert(
    "type".to_string(),
    Value::Array(members.into_iter().map(Value::String).collect()),
  );
}

fn normalize_const_enum(node: &mut JsonMap) {
  if node.contains_key("enum") {
    return;
  }
  if let Some(const_value) = node.shift_remove("const") {
    node.insert("enum".to_string(), Value::Array(vec![const_value]));
  }
}

/// Reinterprets an array schema that carries `properties`/`required` but no
/// `items` as array-of-that-object.
fn normalize_malformed_array_schema(node: &mut JsonMap) {
  if node.get("type").and_then(Value::as_str) != Some("array") {
    return;
  }
  if node.contains_key("items") || !node.contains_key("properties") {
    return;
  }
  let Some(Value::Object(properties)) = node.shift_remove("properties") else {
    return;
  };
  let mut item_schema = JsonMap::new();
  item_schema.insert("type".to_string(), Value::String("object".to_string()));
  item_schema.insert("properties".to_string(), Value::Object(properties));
  if let Some(required @ Value::Array(_)) = node.shift_remove("required") {
    item_schema.insert("required".to_string(), required);
  }
  node.insert("items".to_string(), Value::Object(item_schema));
}

/// Keeps only `required` entries naming a currently-declared property.
fn normalize_required_properties(node: &mut JsonMap) {
  let Some(Value::Object(properties)) = node.get("properties") else {
    return;
  };
  let declared: HashSet<String> = properties.keys().cloned().collect();
  let Some(Value::Array(required)) = node.get("required") else {
    return;
  };
  let filtered: Vec<Value> = required
    .iter()
    .filter(|name| name.as_str().is_some_and(|name| declared.contains(name)))
    .cloned()
    .collect();
  if filtered.is_empty() {
    node.shift_remove("required");
  } else {
    node.insert("required".to_string(), Value::Array(filtered));
  }
}

/// Resolves `enum`-vs-`type` conflicts by inferring the narrowest type
/// consistent with the enum's actual values.
fn normalize_enum_type_conflict(node: &mut JsonMap) {
  let Some(Value::Array(enum_values)) = node.get("enum") else {
    return;
  };
  if enum_values.is_empty() {
    return;
  }
  let enum_values = enum_values.clone();
  let schema_type = node.get("type").and_then(Value::as_str);

  let all_strings = enum_values.iter().all(Value::is_string);
  if matches!(schema_type, Some("boolean" | "integer" | "number")) && all_strings {
    node.insert("type".to_string(), Value::String("string".to_string()));
    return;
  }

  if schema_type != Some("object") {
    return;
  }

  let inferred = if all_strings {
    Some("string")
  } else if enum_values.iter().all(Value::is_boolean) {
    Some("boolean")
  } else if enum_values.iter().all(|item| item.is_i64() || item.is_u64()) {
    Some("integer")
  } else if enum_values.iter().all(Value::is_number) {
    Some("number")
  } else if enum_values.iter().all(Value::is_null) {
    Some("null")
  } else {
    None
  };

  if let Some(inferred) = inferred {
    node.insert("type".to_string(), Value::String(inferred.to_string()));
  }
}

fn drop_empty_all_of(node: &mut JsonMap) {
  let Some(Value::Array(all_of)) = node.get("allOf") else {
    return;
  };
  if all_of.iter().all(is_empty_object) {
    node.shift_remove("allOf");
  }
}

/// Descriptions on union alternatives are not comparison-relevant; only the
/// containing node's description is.
fn drop_any_of_option_descriptions(node: &mut JsonMap) {
  let Some(Value::Array(any_of)) = node.get_mut("anyOf") else {
    return;
  };
  for option in any_of {
    if let Some(option_map) = option.as_object_mut() {
      option_map.shift_remove("description");
    }
  }
}

/// The `mapping` table holds raw reference strings that cannot survive
/// inlining; only the property name is comparable.
fn strip_discriminator_mapping(node: &mut JsonMap) {
  if let Some(Value::Object(discriminator)) = node.get_mut("discriminator") {
    discriminator.shift_remove("mapping");
  }
}

fn normalize_description(value: &str) -> String {
  let lines: Vec<&str> = value.lines().map(str::trim_end).collect();
  let collapsed = lines.join("\n");
  DESC_BULLET_SPACING.replace_all(collapsed.trim(), "\n*").to_string()
}

/// Fully inlines `#/$defs/…` references before normalization. A cycle or a
/// missing definition is a converter bug, not a user-input problem.
fn inline_local_defs(schema: &JsonMap) -> Result<Value, GeneratorError> {
  let defs = match schema.get("$defs") {
    Some(Value::Object(defs)) => defs.clone(),
    _ => JsonMap::new(),
  };
  let mut stack = Vec::new();
  resolve_def_node(&Value::Object(schema.clone()), &defs, &mut stack)
}

fn resolve_def_node(node: &Value, defs: &JsonMap, stack: &mut Vec<String>) -> Result<Value, GeneratorError> {
  match node {
    Value::Array(items) => {
      let resolved = items
        .iter()
        .map(|item| resolve_def_node(item, defs, stack))
        .collect::<Result<Vec<_>, _>>()?;
      Ok(Value::Array(resolved))
    }
    Value::Object(map) => {
      if let Some(ref_path) = map.get("$ref").and_then(Value::as_str)
        && let Some(key) = ref_path.strip_prefix("#/$defs/")
      {
        if stack.iter().any(|entry| entry == ref_path) {
          return Err(GeneratorError::Invariant(format!(
            "cyclic local schema reference detected: {} -> {ref_path}",
            stack.join(" -> ")
          )));
        }
        let Some(target) = defs.get(key) else {
          return Err(GeneratorError::Invariant(format!(
            "missing local schema definition for {ref_path}"
          )));
        };
        stack.push(ref_path.to_string());
        let resolved = resolve_def_node(target, defs, stack)?;
        stack.pop();

        let siblings: Vec<(&String, &Value)> = map.iter().filter(|(key, _)| key.as_str() != "$ref").collect();
        if siblings.is_empty() {
          return Ok(resolved);
        }
        let Value::Object(mut merged) = resolved else {
          return Ok(resolved);
        };
        for (key, value) in siblings {
          merged.insert(key.clone(), resolve_def_node(value, defs, stack)?);
        }
        return Ok(Value::Object(merged));
      }

      let mut resolved = JsonMap::new();
      for (key, value) in map {
        resolved.insert(key.clone(), resolve_def_node(value, defs, stack)?);
      }
      Ok(Value::Object(resolved))
    }
    other => Ok(other.clone()),
  }
}

fn canonical_json(value: &Value) -> String {
  json_canon::to_string(value).unwrap_or_default()
}

fn is_empty_object(value: &Value) -> bool {
  value.as_object().is_some_and(JsonMap::is_empty)
}

fn as_schema_object(value: Value) -> Result<JsonMap, GeneratorError> {
  match value {
    Value::Object(map) => Ok(map),
    other => Err(GeneratorError::Invariant(format!(
      "normalization produced a non-object schema: {other}"
    ))),
  }
}
