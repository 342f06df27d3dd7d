use std::sync::LazyLock;

use any_ascii::any_ascii;
use inflections::Inflect;
use regex::Regex;

use crate::reserved::{is_reserved_type_name, is_rust_keyword};

static INVALID_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9a-zA-Z_]+").unwrap());
static MULTI_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());
static CAMEL_BOUNDARY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
static PATH_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{(?P<name>[^{}]+)\}$").unwrap());

/// Shared cleanup: transliterate to ASCII, split camelCase boundaries,
/// lowercase, replace invalid characters with underscores, collapse runs
/// and trim them from both ends. May return an empty string.
fn clean_identifier(raw: &str) -> String {
  let ascii = any_ascii(raw);
  let split = CAMEL_BOUNDARY_RE.replace_all(&ascii, "${1}_${2}");
  let lowered = split.to_lowercase();
  let replaced = INVALID_CHARS_RE.replace_all(&lowered, "_");
  let collapsed = MULTI_UNDERSCORE_RE.replace_all(&replaced, "_");
  collapsed.trim_matches('_').to_string()
}

/// Converts arbitrary text into a valid lowercase identifier.
///
/// An empty result becomes `root`, a leading digit is prefixed with `x_`,
/// and Rust keywords get a trailing underscore so the result is always
/// usable as a plain (non-raw) identifier.
pub(crate) fn sanitize_identifier(raw: &str) -> String {
  let mut text = clean_identifier(raw);

  if text.is_empty() {
    text = "root".to_string();
  }
  if text.starts_with(|c: char| c.is_ascii_digit()) {
    text = format!("x_{text}");
  }
  if is_rust_keyword(&text) {
    text.push('_');
  }
  text
}

/// Converts a name into a PascalCase type name, falling back to `Model` when
/// nothing survives sanitization.
pub(crate) fn type_name(raw: &str) -> String {
  let clean = clean_identifier(raw);
  if clean.is_empty() {
    return "Model".to_string();
  }
  let mut name = clean.to_pascal_case();
  if name.starts_with(|c: char| c.is_ascii_digit()) {
    name = format!("X{name}");
  }
  if is_reserved_type_name(&name) {
    return format!("{name}Model");
  }
  name
}

/// Derives an endpoint grouping name from a URL path.
///
/// `/users/{id}/posts` becomes `users__by_id__posts`; parameter segments turn
/// into `by_<name>` so the result stays readable while remaining unique per
/// path shape.
pub(crate) fn path_endpoint_name(path: &str) -> String {
  let segments: Vec<String> = path
    .split('/')
    .filter(|segment| !segment.is_empty())
    .map(|segment| match PATH_PARAM_RE.captures(segment) {
      Some(captures) => format!("by_{}", sanitize_identifier(&captures["name"])),
      None => sanitize_identifier(segment),
    })
    .collect();

  let mut endpoint_name = segments.join("__");
  if endpoint_name.is_empty() {
    endpoint_name = "root".to_string();
  }
  if endpoint_name.starts_with(|c: char| c.is_ascii_digit()) {
    endpoint_name = format!("x_{endpoint_name}");
  }
  endpoint_name
}
