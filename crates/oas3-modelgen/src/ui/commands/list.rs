use std::path::PathBuf;

use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Row, Table};
use itertools::Itertools;
use serde_json::Value;

use crate::{
  naming::operations::resolve_operations,
  ui::{Colors, colors::IntoComfyColor, term_width},
  utils::{JsonMap, spec::SpecLoader},
};

/// Lists every operation with the endpoint name the generator will use for
/// it, after the operationId conflict policy has been applied.
pub async fn list_operations(input: &PathBuf, colors: &Colors) -> anyhow::Result<()> {
  let document = SpecLoader::open(input).await?.parse()?;
  let paths = match document.get("paths") {
    Some(Value::Object(paths)) => paths.clone(),
    _ => JsonMap::new(),
  };
  let (operations, warnings) = resolve_operations(&paths);

  let rows: Vec<(String, String, String)> = operations
    .into_iter()
    .map(|operation| {
      (
        operation.endpoint_name,
        operation.method.to_string().to_uppercase(),
        operation.path,
      )
    })
    .sorted_by(|a, b| a.0.cmp(&b.0))
    .collect();

  let mut table = Table::new();
  table
    .load_preset("  ── ──            ")
    .set_content_arrangement(ContentArrangement::Dynamic)
    .set_width(term_width());

  let mut header = Row::new();
  header.add_cell(Cell::new("ENDPOINT").fg(IntoComfyColor::into(colors.label())));
  header.add_cell(Cell::new("METHOD").fg(IntoComfyColor::into(colors.label())));
  header.add_cell(Cell::new("PATH").fg(IntoComfyColor::into(colors.label())));
  table.set_header(header);

  for (endpoint, method, path) in rows {
    let mut row = Row::new();
    row.add_cell(
      Cell::new(endpoint)
        .fg(IntoComfyColor::into(colors.value()))
        .add_attribute(Attribute::Bold),
    );
    row.add_cell(
      Cell::new(method)
        .fg(IntoComfyColor::into(colors.accent()))
        .set_alignment(CellAlignment::Right),
    );
    row.add_cell(Cell::new(path).fg(IntoComfyColor::into(colors.primary())));
    table.add_row(row);
  }

  println!("{table}");

  for warning in warnings {
    eprintln!("Warning: {warning}");
  }

  Ok(())
}
