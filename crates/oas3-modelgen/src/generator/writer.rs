//! Output tree construction.
//!
//! Generated files land under `<output>/models/<endpoint>/<method>/` with one
//! file per section. Every directory level gets a `mod.rs` manifest listing
//! its children in sorted order, so regenerating the same document yields a
//! byte-identical tree.

use std::{
  collections::{BTreeMap, BTreeSet},
  path::{Path, PathBuf},
};

use super::errors::GeneratorError;

pub(crate) struct OutputWriter {
  models_dir: PathBuf,
  /// endpoint -> method -> section file stems.
  entries: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl OutputWriter {
  /// Prepares the output directory. Refuses to touch a path that already
  /// exists so a stale tree is never silently mixed with a fresh one.
  pub async fn create(output_dir: &Path) -> Result<Self, GeneratorError> {
    if tokio::fs::try_exists(output_dir)
      .await
      .map_err(|error| GeneratorError::Write(format!("cannot inspect {}: {error}", output_dir.display())))?
    {
      return Err(GeneratorError::Write(format!(
        "output directory already exists: {}",
        output_dir.display()
      )));
    }
    let models_dir = output_dir.join("models");
    tokio::fs::create_dir_all(&models_dir)
      .await
      .map_err(|error| GeneratorError::Write(format!("cannot create {}: {error}", models_dir.display())))?;
    Ok(Self {
      models_dir,
      entries: BTreeMap::new(),
    })
  }

  /// Writes one section file and records it for the manifest pass.
  pub async fn write_section(
    &mut self,
    endpoint: &str,
    method: &str,
    section: &str,
    code: &str,
  ) -> Result<PathBuf, GeneratorError> {
    let dir = self.models_dir.join(endpoint).join(method);
    tokio::fs::create_dir_all(&dir)
      .await
      .map_err(|error| GeneratorError::Write(format!("cannot create {}: {error}", dir.display())))?;

    let file_path = dir.join(format!("{section}.rs"));
    tokio::fs::write(&file_path, code)
      .await
      .map_err(|error| GeneratorError::Write(format!("cannot write {}: {error}", file_path.display())))?;

    self
      .entries
      .entry(endpoint.to_string())
      .or_default()
      .entry(method.to_string())
      .or_default()
      .insert(section.to_string());
    Ok(file_path)
  }

  /// Emits the `mod.rs` manifests for every directory level.
  pub async fn write_manifests(&self) -> Result<(), GeneratorError> {
    let endpoints: Vec<&String> = self.entries.keys().collect();
    write_manifest(&self.models_dir, &endpoints).await?;

    for (endpoint, methods) in &self.entries {
      let endpoint_dir = self.models_dir.join(endpoint);
      let method_names: Vec<&String> = methods.keys().collect();
      write_manifest(&endpoint_dir, &method_names).await?;

      for (method, sections) in methods {
        let method_dir = endpoint_dir.join(method);
        let section_names: Vec<&String> = sections.iter().collect();
        write_manifest(&method_dir, &section_names).await?;
      }
    }
    Ok(())
  }

  pub fn section_count(&self) -> usize {
    self
      .entries
      .values()
      .flat_map(BTreeMap::values)
      .map(BTreeSet::len)
      .sum()
  }
}

async fn write_manifest(dir: &Path, children: &[&String]) -> Result<(), GeneratorError> {
  let mut contents = String::new();
  for child in children {
    contents.push_str("pub mod ");
    contents.push_str(child);
    contents.push_str(";\n");
  }
  let path = dir.join("mod.rs");
  tokio::fs::write(&path, contents)
    .await
    .map_err(|error| GeneratorError::Write(format!("cannot write {}: {error}", path.display())))
}
