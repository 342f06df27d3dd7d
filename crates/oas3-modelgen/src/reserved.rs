use std::{collections::HashSet, sync::LazyLock};

static RUST_KEYWORDS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  [
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in",
    "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "async", "await", "dyn", "try", "abstract", "become", "box", "do",
    "final", "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "gen", "self", "Self",
  ]
  .into_iter()
  .collect()
});

/// Field identifiers the generated model shape claims for itself. Open models
/// expose an `extra` bag for undeclared keys, so a source property named
/// `extra` must be rewritten (its wire alias keeps the original spelling).
static RESERVED_FIELD_NAMES: LazyLock<HashSet<&str>> = LazyLock::new(|| ["extra"].into_iter().collect());

/// Type names that would shadow prelude or generated-support types when used
/// for a model.
static RESERVED_TYPE_NAMES: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  ["Option", "Result", "String", "Vec", "Box", "Value", "Self", "Send", "Sync"]
    .into_iter()
    .collect()
});

pub(crate) fn is_rust_keyword(candidate: &str) -> bool {
  RUST_KEYWORDS.contains(candidate)
}

pub(crate) fn is_reserved_field_name(candidate: &str) -> bool {
  RUST_KEYWORDS.contains(candidate) || RESERVED_FIELD_NAMES.contains(candidate)
}

pub(crate) fn is_reserved_type_name(candidate: &str) -> bool {
  RESERVED_TYPE_NAMES.contains(candidate)
}
