use serde_json::Value;

use super::JsonMap;

/// Decides whether object modeling rules apply to a schema.
///
/// A schema is object-shaped when it declares `type: object`, a `properties`
/// map, any `additionalProperties` key, or is an `allOf` whose members are
/// all themselves object-shaped (recursively).
pub(crate) fn is_object_schema(schema: &JsonMap) -> bool {
  if schema.get("type").and_then(Value::as_str) == Some("object") {
    return true;
  }
  if matches!(schema.get("properties"), Some(Value::Object(_))) {
    return true;
  }
  if schema.contains_key("additionalProperties") {
    return true;
  }
  if let Some(Value::Array(all_of)) = schema.get("allOf")
    && !all_of.is_empty()
  {
    return all_of
      .iter()
      .all(|item| item.as_object().is_some_and(is_object_schema));
  }
  false
}

/// Merges object-only `allOf` chains into one object schema when possible.
///
/// Properties concatenate with last-write-wins on key collisions, `required`
/// sets union, and the merged schema closes (`additionalProperties: false`)
/// as soon as any branch closes. Returns a clone of the original schema when
/// any branch is not object-shaped after its own recursive merge, so a
/// failed merge never drops a branch silently.
pub(crate) fn merge_all_of_schema(schema: &JsonMap, normalize_item: Option<&dyn Fn(JsonMap) -> JsonMap>) -> JsonMap {
  let Some(Value::Array(all_of)) = schema.get("allOf") else {
    return schema.clone();
  };
  if all_of.is_empty() {
    return schema.clone();
  }

  let Some(children) = collect_mergeable_children(all_of, normalize_item) else {
    return schema.clone();
  };

  let mut merged: JsonMap = schema
    .iter()
    .filter(|(key, _)| key.as_str() != "allOf")
    .map(|(key, value)| (key.clone(), value.clone()))
    .collect();

  let mut merged_properties = JsonMap::new();
  let mut merged_required: Vec<String> = Vec::new();
  let mut additional_properties = merged.get("additionalProperties").cloned();

  for child in &children {
    if let Some(Value::Object(child_properties)) = child.get("properties") {
      for (name, prop) in child_properties {
        merged_properties.insert(name.clone(), prop.clone());
      }
    }
    if let Some(Value::Array(child_required)) = child.get("required") {
      for name in child_required.iter().filter_map(Value::as_str) {
        if !merged_required.iter().any(|existing| existing == name) {
          merged_required.push(name.to_string());
        }
      }
    }
    if child.get("additionalProperties") == Some(&Value::Bool(false)) {
      additional_properties = Some(Value::Bool(false));
    }
  }

  merged.insert("type".to_string(), Value::String("object".to_string()));
  if !merged_properties.is_empty() {
    merged.insert("properties".to_string(), Value::Object(merged_properties));
  }
  if !merged_required.is_empty() {
    merged_required.sort_unstable();
    merged.insert(
      "required".to_string(),
      Value::Array(merged_required.into_iter().map(Value::String).collect()),
    );
  }
  if let Some(additional) = additional_properties {
    merged.insert("additionalProperties".to_string(), additional);
  }
  merged
}

fn collect_mergeable_children(
  all_of: &[Value],
  normalize_item: Option<&dyn Fn(JsonMap) -> JsonMap>,
) -> Option<Vec<JsonMap>> {
  let mut children = Vec::with_capacity(all_of.len());
  for item in all_of {
    let mut child = item.as_object()?.clone();
    if let Some(normalize) = normalize_item {
      child = normalize(child);
    }
    let merged_child = merge_all_of_schema(&child, normalize_item);
    if !is_object_schema(&merged_child) {
      return None;
    }
    children.push(merged_child);
  }
  Some(children)
}
