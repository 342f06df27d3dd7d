use serde_json::json;

use crate::{
  naming::operations::{HttpMethod, resolve_operations},
  utils::JsonMap,
};

fn paths(value: serde_json::Value) -> JsonMap {
  value.as_object().expect("paths fixture must be an object").clone()
}

#[test]
fn test_operation_id_used_when_unique() {
  let paths = paths(json!({
    "/users": {
      "get": { "operationId": "listUsers", "responses": {} },
      "post": { "operationId": "createUser", "responses": {} }
    }
  }));
  let (operations, warnings) = resolve_operations(&paths);

  assert!(warnings.is_empty());
  assert_eq!(operations.len(), 2);
  assert_eq!(operations[0].endpoint_name, "list_users");
  assert_eq!(operations[0].method, HttpMethod::Get);
  assert_eq!(operations[1].endpoint_name, "create_user");
  assert_eq!(operations[1].method, HttpMethod::Post);
}

#[test]
fn test_conflicting_operation_ids_fall_back_to_path_names() {
  let paths = paths(json!({
    "/users": {
      "get": { "operationId": "doIt", "responses": {} }
    },
    "/orders": {
      "get": { "operationId": "doIt", "responses": {} },
      "delete": { "operationId": "removeOrder", "responses": {} }
    }
  }));
  let (operations, warnings) = resolve_operations(&paths);

  assert_eq!(warnings.len(), 1);
  assert!(
    warnings[0].contains("do_it"),
    "warning should name the conflict: {}",
    warnings[0]
  );

  let by_path: Vec<(&str, &str)> = operations
    .iter()
    .map(|op| (op.path.as_str(), op.endpoint_name.as_str()))
    .collect();
  // Both holders of the conflicting id fall back; the unique id survives.
  assert!(by_path.contains(&("/users", "users")));
  assert!(by_path.contains(&("/orders", "orders")));
  assert!(by_path.contains(&("/orders", "remove_order")));
}

#[test]
fn test_missing_operation_id_uses_path_name() {
  let paths = paths(json!({
    "/users/{id}/posts": {
      "get": { "responses": {} }
    }
  }));
  let (operations, warnings) = resolve_operations(&paths);

  assert!(warnings.is_empty());
  assert_eq!(operations.len(), 1);
  assert_eq!(operations[0].endpoint_name, "users__by_id__posts");
}

#[test]
fn test_blank_operation_id_is_treated_as_missing() {
  let paths = paths(json!({
    "/things": {
      "get": { "operationId": "  ", "responses": {} }
    }
  }));
  let (operations, warnings) = resolve_operations(&paths);

  assert!(warnings.is_empty());
  assert_eq!(operations[0].endpoint_name, "things");
}

#[test]
fn test_non_operation_keys_are_ignored() {
  let paths = paths(json!({
    "/users": {
      "summary": "User collection",
      "parameters": [],
      "get": { "responses": {} }
    }
  }));
  let (operations, _) = resolve_operations(&paths);

  assert_eq!(operations.len(), 1);
  assert_eq!(operations[0].method, HttpMethod::Get);
}
