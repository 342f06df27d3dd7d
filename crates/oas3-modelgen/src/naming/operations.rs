use std::collections::HashMap;

use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

use super::identifiers::{path_endpoint_name, sanitize_identifier};
use crate::utils::JsonMap;

/// The eight operation keys a path item may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum HttpMethod {
  Get,
  Put,
  Post,
  Delete,
  Patch,
  Head,
  Options,
  Trace,
}

/// Normalized operation record extracted from the `paths` map.
///
/// `endpoint_name` is decided once by [`resolve_operations`] and never
/// mutated afterward; every later stage keys its output on it.
#[derive(Debug, Clone)]
pub(crate) struct OperationSpec {
  pub path: String,
  pub method: HttpMethod,
  pub endpoint_name: String,
  pub operation: JsonMap,
  pub path_item: JsonMap,
}

/// Extracts operations and assigns endpoint names with the global
/// operationId-with-fallback policy.
///
/// Naming is a two-pass decision: first every operation's sanitized
/// `operationId` candidate is collected, then any candidate shared by two or
/// more operations disqualifies *all* of them, and the affected operations
/// fall back to path-derived names. A single advisory warning lists the
/// conflicting ids.
pub(crate) fn resolve_operations(raw_paths: &JsonMap) -> (Vec<OperationSpec>, Vec<String>) {
  struct Candidate<'a> {
    path: &'a str,
    method: HttpMethod,
    operation: &'a JsonMap,
    path_item: &'a JsonMap,
    operation_id: Option<String>,
  }

  let mut candidates: Vec<Candidate<'_>> = Vec::new();
  for (path, path_item_value) in raw_paths {
    let Some(path_item) = path_item_value.as_object() else {
      continue;
    };
    for method in HttpMethod::iter() {
      let Some(Value::Object(operation)) = path_item.get(method.as_ref()) else {
        continue;
      };
      let operation_id = operation
        .get("operationId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(sanitize_identifier);
      candidates.push(Candidate {
        path,
        method,
        operation,
        path_item,
        operation_id,
      });
    }
  }

  let mut id_counts: HashMap<String, usize> = HashMap::new();
  for candidate in &candidates {
    if let Some(id) = candidate.operation_id.as_deref() {
      *id_counts.entry(id.to_string()).or_insert(0) += 1;
    }
  }
  let conflicting: Vec<String> = {
    let mut ids: Vec<String> = id_counts
      .into_iter()
      .filter(|(_, count)| *count > 1)
      .map(|(id, _)| id)
      .collect();
    ids.sort_unstable();
    ids
  };

  let mut warnings = Vec::new();
  if !conflicting.is_empty() {
    warnings.push(format!(
      "Conflicting operationId values detected; using path-based naming for conflicts: {}",
      conflicting.join(", ")
    ));
  }

  let operations = candidates
    .into_iter()
    .map(|candidate| {
      let endpoint_name = match candidate.operation_id {
        Some(ref id) if !conflicting.contains(id) => id.clone(),
        _ => path_endpoint_name(candidate.path),
      };
      OperationSpec {
        path: candidate.path.to_string(),
        method: candidate.method,
        endpoint_name,
        operation: candidate.operation.clone(),
        path_item: candidate.path_item.clone(),
      }
    })
    .collect();

  (operations, warnings)
}
