use crate::generator::{errors::GeneratorError, writer::OutputWriter};

#[tokio::test]
async fn test_create_refuses_existing_output() {
  let temp = tempfile::tempdir().unwrap();
  let result = OutputWriter::create(temp.path()).await;
  let Err(GeneratorError::Write(message)) = result else {
    panic!("expected a write error for an existing directory");
  };
  assert!(message.contains("already exists"));
}

#[tokio::test]
async fn test_sections_land_under_models_tree() {
  let temp = tempfile::tempdir().unwrap();
  let output = temp.path().join("out");

  let mut writer = OutputWriter::create(&output).await.unwrap();
  let path = writer
    .write_section("users", "get", "body", "pub struct Body;\n")
    .await
    .unwrap();

  assert_eq!(path, output.join("models/users/get/body.rs"));
  let written = tokio::fs::read_to_string(&path).await.unwrap();
  assert_eq!(written, "pub struct Body;\n");
  assert_eq!(writer.section_count(), 1);
}

#[tokio::test]
async fn test_manifests_list_children_sorted() {
  let temp = tempfile::tempdir().unwrap();
  let output = temp.path().join("out");

  let mut writer = OutputWriter::create(&output).await.unwrap();
  writer.write_section("users", "post", "body", "").await.unwrap();
  writer.write_section("users", "get", "response", "").await.unwrap();
  writer.write_section("users", "get", "query_params", "").await.unwrap();
  writer.write_section("orders", "get", "response", "").await.unwrap();
  writer.write_manifests().await.unwrap();

  let root = tokio::fs::read_to_string(output.join("models/mod.rs")).await.unwrap();
  assert_eq!(root, "pub mod orders;\npub mod users;\n");

  let endpoint = tokio::fs::read_to_string(output.join("models/users/mod.rs")).await.unwrap();
  assert_eq!(endpoint, "pub mod get;\npub mod post;\n");

  let method = tokio::fs::read_to_string(output.join("models/users/get/mod.rs"))
    .await
    .unwrap();
  assert_eq!(method, "pub mod query_params;\npub mod response;\n");

  assert_eq!(writer.section_count(), 4);
}

#[tokio::test]
async fn test_duplicate_section_writes_count_once() {
  let temp = tempfile::tempdir().unwrap();
  let output = temp.path().join("out");

  let mut writer = OutputWriter::create(&output).await.unwrap();
  writer.write_section("users", "get", "body", "one").await.unwrap();
  writer.write_section("users", "get", "body", "two").await.unwrap();

  assert_eq!(writer.section_count(), 1);
  let written = tokio::fs::read_to_string(output.join("models/users/get/body.rs"))
    .await
    .unwrap();
  assert_eq!(written, "two");
}
