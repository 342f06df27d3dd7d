use std::{ffi::OsStr, path::Path};

use fmmap::tokio::{AsyncMmapFile, AsyncMmapFileExt};
use serde_json::Value;

use crate::generator::errors::GeneratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SpecFormat {
  #[default]
  Json,
  Yaml,
}

impl SpecFormat {
  #[must_use]
  pub(crate) fn from_extension(ext: &str) -> Self {
    match ext {
      "yaml" | "yml" => Self::Yaml,
      _ => Self::Json,
    }
  }
}

/// Memory-mapped OpenAPI document loader.
///
/// Parsing produces the raw JSON tree the pipeline operates on; a separate
/// [`SpecLoader::validate`] pass deserializes the same tree into the typed
/// `oas3` spec so top-level schema validation stays an external-library
/// concern.
pub(crate) struct SpecLoader {
  file: AsyncMmapFile,
  format: SpecFormat,
}

impl SpecLoader {
  pub(crate) async fn open(path: &Path) -> Result<Self, GeneratorError> {
    let format = path
      .extension()
      .and_then(OsStr::to_str)
      .map_or(SpecFormat::default(), SpecFormat::from_extension);

    let file = AsyncMmapFile::open(path)
      .await
      .map_err(|err| GeneratorError::Load(format!("failed to read {}: {err}", path.display())))?;

    Ok(Self { file, format })
  }

  pub(crate) fn parse(&self) -> Result<Value, GeneratorError> {
    let document: Value = match self.format {
      SpecFormat::Json => serde_json::from_slice(self.file.as_slice())
        .map_err(|err| GeneratorError::Load(format!("invalid JSON document: {err}")))?,
      SpecFormat::Yaml => serde_yaml::from_slice(self.file.as_slice())
        .map_err(|err| GeneratorError::Load(format!("invalid YAML document: {err}")))?,
    };
    if !document.is_object() {
      return Err(GeneratorError::Load(
        "OpenAPI document must deserialize to a mapping".to_string(),
      ));
    }
    Ok(document)
  }
}

/// Validates the document against the typed OpenAPI v3 schema.
pub(crate) fn validate_document(document: &Value) -> Result<(), GeneratorError> {
  serde_json::from_value::<oas3::OpenApiV3Spec>(document.clone())
    .map_err(|err| GeneratorError::Load(format!("OpenAPI schema validation failed: {err}")))?;
  Ok(())
}

/// Returns the declared `openapi` version string.
pub(crate) fn document_version(document: &Value) -> Result<String, GeneratorError> {
  document
    .get("openapi")
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|version| !version.is_empty())
    .map(str::to_string)
    .ok_or_else(|| GeneratorError::Load("missing or invalid 'openapi' version field".to_string()))
}

/// Rejects documents below OpenAPI major version 3.
pub(crate) fn ensure_supported_version(version: &str) -> Result<(), GeneratorError> {
  let major_text = version.split('.').next().unwrap_or_default();
  let major: u32 = major_text
    .parse()
    .map_err(|_| GeneratorError::Load(format!("unable to parse OpenAPI version: {version}")))?;
  if major < 3 {
    return Err(GeneratorError::Load(format!(
      "unsupported OpenAPI version {version}; only v3+ is supported"
    )));
  }
  Ok(())
}
