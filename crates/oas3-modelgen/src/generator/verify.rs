//! Structural verification of generated section models.
//!
//! Each generated section root is re-derived as a JSON schema and compared
//! against the (normalized) source schema it was built from. The check is a
//! subset check: the source's constraints must all be represented, while the
//! generated side is free to carry extra structure such as synthesized
//! titles.

use serde_json::Value;

use super::{
  ast::{SectionModel, VerificationItem},
  errors::GeneratorError,
  model_schema::section_root_schema,
  normalize::{normalize_generated_schema, normalize_source_schema, subset_mismatch},
};

const VALUE_PREVIEW_LIMIT: usize = 160;

#[derive(Debug, Clone)]
pub(crate) struct VerificationMismatch {
  pub endpoint_name: String,
  pub method: String,
  pub section_name: String,
  pub class_name: String,
  pub module_path: String,
  pub path: String,
  pub expected: Value,
  pub actual: Option<Value>,
}

#[derive(Debug, Default)]
pub(crate) struct VerificationReport {
  pub verified_count: usize,
  pub mismatches: Vec<VerificationMismatch>,
}

impl VerificationReport {
  pub fn mismatch_count(&self) -> usize {
    self.mismatches.len()
  }

  pub fn is_clean(&self) -> bool {
    self.mismatches.is_empty()
  }
}

/// Verifies every generated section against its source schema.
pub(crate) fn verify_sections(
  items: &[(VerificationItem, SectionModel)],
) -> Result<VerificationReport, GeneratorError> {
  let mut report = VerificationReport::default();
  for (item, section) in items {
    match verify_section(item, section)? {
      None => report.verified_count += 1,
      Some(mismatch) => report.mismatches.push(mismatch),
    }
  }
  Ok(report)
}

fn verify_section(
  item: &VerificationItem,
  section: &SectionModel,
) -> Result<Option<VerificationMismatch>, GeneratorError> {
  let expected = normalize_source_schema(&item.source_schema)?;
  let derived = section_root_schema(section)?;
  let actual = normalize_generated_schema(&derived)?;

  let mismatch = subset_mismatch(&Value::Object(expected), &Value::Object(actual), "$");
  Ok(mismatch.map(|mismatch| VerificationMismatch {
    endpoint_name: item.endpoint_name.clone(),
    method: item.method.to_string(),
    section_name: item.section_name.clone(),
    class_name: item.class_name.clone(),
    module_path: item.module_path.clone(),
    path: mismatch.path,
    expected: mismatch.expected,
    actual: mismatch.actual,
  }))
}

/// Renders a human-readable verification summary.
pub(crate) fn format_report(report: &VerificationReport) -> String {
  let mut lines = Vec::new();
  lines.push(format!("Verified models: {}", report.verified_count));
  lines.push(format!("Mismatches: {}", report.mismatch_count()));
  for mismatch in &report.mismatches {
    lines.push(String::new());
    lines.push(format!(
      "{}.{}.{}.{} ({})",
      mismatch.endpoint_name, mismatch.method, mismatch.section_name, mismatch.class_name, mismatch.module_path
    ));
    lines.push(format!("  at {}", mismatch.path));
    lines.push(format!("  expected: {}", short_repr(&mismatch.expected)));
    match &mismatch.actual {
      Some(actual) => lines.push(format!("  actual:   {}", short_repr(actual))),
      None => lines.push("  actual:   <absent>".to_string()),
    }
  }
  lines.join("\n")
}

/// Single-line preview of a JSON value, truncated with an ellipsis marker.
fn short_repr(value: &Value) -> String {
  let rendered = value.to_string();
  if rendered.chars().count() <= VALUE_PREVIEW_LIMIT {
    return rendered;
  }
  let truncated: String = rendered.chars().take(VALUE_PREVIEW_LIMIT - 3).collect();
  format!("{truncated}...")
}
