//! End-to-end generation pipeline.
//!
//! For every operation in the document: resolve references, extract the
//! per-section schemas, convert each to a model tree, render it, and write
//! it into the output layout. Verification, when requested, runs against the
//! in-memory model trees after all files are written.

use std::path::Path;

use serde_json::Value;

use super::{
  ast::{SectionModel, StatusSchemaMap, VerificationItem},
  codegen::render_section,
  errors::GeneratorError,
  resolver::{Resolver, SectionSchemas},
  schema_converter::SchemaConverter,
  verify::{VerificationReport, verify_sections},
  writer::OutputWriter,
};
use crate::{
  naming::operations::{OperationSpec, resolve_operations},
  utils::{JsonMap, spec::document_version},
};

/// Section order within an operation: request surfaces first, then body,
/// then the status-keyed response and error sections.
const SINGLE_SECTIONS: [(&str, &str); 5] = [
  ("url_params", "UrlParams"),
  ("query_params", "QueryParams"),
  ("headers", "Headers"),
  ("cookies", "Cookies"),
  ("body", "Body"),
];

#[derive(Debug, Default)]
pub(crate) struct GenerationStats {
  pub operations: usize,
  pub sections_written: usize,
  pub models_generated: usize,
  pub warnings: Vec<String>,
}

pub(crate) struct GenerationRun {
  pub stats: GenerationStats,
  pub report: Option<VerificationReport>,
}

pub(crate) struct ModelGenerator {
  document: Value,
  openapi_version: String,
  document_title: String,
}

impl ModelGenerator {
  pub(crate) fn new(document: Value) -> Result<Self, GeneratorError> {
    let openapi_version = document_version(&document)?;
    let document_title = document
      .get("info")
      .and_then(|info| info.get("title"))
      .and_then(Value::as_str)
      .unwrap_or("untitled API")
      .to_string();
    Ok(Self {
      document,
      openapi_version,
      document_title,
    })
  }

  /// Generates the full model tree under `output_dir`.
  pub(crate) async fn generate(&self, output_dir: &Path, verify: bool) -> Result<GenerationRun, GeneratorError> {
    let paths = match self.document.get("paths") {
      Some(Value::Object(paths)) => paths.clone(),
      _ => JsonMap::new(),
    };
    let (operations, warnings) = resolve_operations(&paths);

    let mut resolver = Resolver::new(self.document.clone());
    let converter = SchemaConverter::new(self.openapi_version.clone());
    let mut writer = OutputWriter::create(output_dir).await?;

    let mut stats = GenerationStats {
      operations: operations.len(),
      warnings,
      ..GenerationStats::default()
    };
    let mut verification_items: Vec<(VerificationItem, SectionModel)> = Vec::new();

    for operation in &operations {
      let sections = resolver.build_section_schemas(operation)?;

      for (section_name, class_name) in SINGLE_SECTIONS {
        let Some(schema) = single_section_schema(&sections, section_name) else {
          continue;
        };
        let section = converter.build_section_from_schema(section_name, class_name, schema);
        self
          .emit_section(&mut writer, operation, &section, schema.clone(), verify, &mut verification_items)
          .await?;
        stats.sections_written += 1;
        stats.models_generated += section.models.len();
      }

      for (section_name, class_name, status_map) in [
        ("response", "Response", &sections.responses),
        ("errors", "Errors", &sections.errors),
      ] {
        if status_map.is_empty() {
          continue;
        }
        let pairs: Vec<(&String, &JsonMap)> = status_map.iter().collect();
        let section = converter.build_section_from_status_map(section_name, class_name, &pairs);
        let source = status_map_verification_schema(status_map);
        self
          .emit_section(&mut writer, operation, &section, source, verify, &mut verification_items)
          .await?;
        stats.sections_written += 1;
        stats.models_generated += section.models.len();
      }
    }

    writer.write_manifests().await?;

    let report = if verify {
      Some(verify_sections(&verification_items)?)
    } else {
      None
    };
    Ok(GenerationRun { stats, report })
  }

  async fn emit_section(
    &self,
    writer: &mut OutputWriter,
    operation: &OperationSpec,
    section: &SectionModel,
    source_schema: JsonMap,
    verify: bool,
    verification_items: &mut Vec<(VerificationItem, SectionModel)>,
  ) -> Result<(), GeneratorError> {
    let method = operation.method.to_string();
    let module_path = format!(
      "models/{}/{}/{}.rs",
      operation.endpoint_name, method, section.section_name
    );

    let body = render_section(section)?;
    let code = format!(
      "//! {} {} `{}` models.\n//! Generated from \"{}\" (OpenAPI {}). Do not edit.\n\n{body}",
      method.to_uppercase(),
      operation.path,
      section.section_name,
      self.document_title,
      self.openapi_version
    );
    writer
      .write_section(&operation.endpoint_name, &method, &section.section_name, &code)
      .await?;

    if verify {
      verification_items.push((
        VerificationItem {
          endpoint_name: operation.endpoint_name.clone(),
          method: operation.method,
          section_name: section.section_name.clone(),
          class_name: section.root_model_name.clone(),
          source_schema,
          module_path,
        },
        section.clone(),
      ));
    }
    Ok(())
  }
}

fn single_section_schema<'a>(sections: &'a SectionSchemas, name: &str) -> Option<&'a JsonMap> {
  match name {
    "url_params" => sections.url_params.as_ref(),
    "query_params" => sections.query_params.as_ref(),
    "headers" => sections.headers.as_ref(),
    "cookies" => sections.cookies.as_ref(),
    "body" => sections.body.as_ref(),
    _ => None,
  }
}

/// The source schema a status-keyed section is verified against: the lone
/// schema for a single status, otherwise a union over all statuses in
/// ascending status order.
pub(super) fn status_map_verification_schema(status_map: &StatusSchemaMap) -> JsonMap {
  let mut ordered: Vec<(&String, &JsonMap)> = status_map.iter().collect();
  ordered.sort_by(|a, b| a.0.cmp(b.0));
  if let [(_, only)] = ordered.as_slice() {
    return (*only).clone();
  }
  let options: Vec<Value> = ordered
    .into_iter()
    .map(|(_, schema)| Value::Object(schema.clone()))
    .collect();
  let mut union = JsonMap::new();
  union.insert("oneOf".to_string(), Value::Array(options));
  union
}
