//! Intermediate representation for generated data models.
//!
//! The converter lowers resolved JSON schemas into this IR; the codegen
//! layer renders it to Rust source and the verifier derives a JSON Schema
//! back out of it. All nodes are plain data created once per run.

use indexmap::IndexMap;
use serde_json::Value;

use crate::{naming::operations::HttpMethod, utils::JsonMap};

/// Structured type expression attached to fields and root models.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TypeExpr {
  String,
  Integer,
  Number,
  Boolean,
  Null,
  /// The generic JSON value fallback for schemas that declare no usable
  /// shape. Fully recursive on the emission side (`serde_json::Value`).
  Any,
  /// Literal type over `const`/`enum` values, order preserved as declared.
  Literal(Vec<Value>),
  /// Reference to a model generated earlier in the same section.
  Model(String),
  Array(Box<TypeExpr>),
  /// String-keyed map with typed values.
  Map(Box<TypeExpr>),
  /// Explicit-optional wrapper produced when a union carried a null member.
  Optional(Box<TypeExpr>),
  Union(UnionType),
  /// A type expression carrying schema metadata that must not be dropped
  /// (array item docs, examples, passthrough extras).
  Annotated { inner: Box<TypeExpr>, extras: JsonMap },
}

/// Union over deduplicated member types, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UnionType {
  pub options: Vec<TypeExpr>,
  /// Discriminant property name when every option declares it as a
  /// single-value literal. Advisory metadata: deserialization can dispatch
  /// on it instead of trying every variant.
  pub discriminator: Option<String>,
}

/// One generated model field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldDef {
  /// Collision-free identifier within the owning model.
  pub name: String,
  /// Original JSON key, preserved as the wire alias whenever it differs
  /// from `name`.
  pub source_name: String,
  pub type_expr: TypeExpr,
  pub required: bool,
  /// Runtime default. Never set for required fields; their declared
  /// default survives only inside `metadata.schema_extra`.
  pub default: Option<Value>,
  pub metadata: FieldMetadata,
}

/// Documentation and passthrough metadata attached to a field.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct FieldMetadata {
  /// Doc-level keys (title, description, example, examples, deprecated).
  pub docs: JsonMap,
  /// Non-structural schema keys carried through to the derived schema.
  pub schema_extra: JsonMap,
}

impl FieldMetadata {
  pub(crate) fn description(&self) -> Option<&str> {
    self.docs.get("description").and_then(Value::as_str)
  }
}

/// Policy for input keys the model does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExtraPolicy {
  /// Unknown keys are rejected at validation time.
  Forbid,
  /// Unknown keys are accepted and retrievable from the extras bag.
  Allow,
}

/// Model-level configuration shared by object and root models.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ModelConfig {
  pub docstring: Option<String>,
  pub title: Option<String>,
  pub extra_policy: Option<ExtraPolicy>,
  /// Value type for the extras bag when `additionalProperties` declared a
  /// concrete schema.
  pub additional_value_type: Option<TypeExpr>,
  /// Passthrough schema keys re-applied verbatim to the derived schema.
  pub schema_extra: JsonMap,
}

/// One generated model definition.
///
/// Either `fields` describes a record shape, or `is_root` is set and
/// `root_type` wraps a single non-object value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ModelDef {
  pub name: String,
  pub is_root: bool,
  pub root_type: Option<TypeExpr>,
  pub fields: Vec<FieldDef>,
  pub config: ModelConfig,
}

/// Ordered model set for one section; dependencies precede dependents.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SectionModel {
  pub section_name: String,
  pub root_model_name: String,
  pub models: Vec<ModelDef>,
}

impl SectionModel {
  pub(crate) fn find_model(&self, name: &str) -> Option<&ModelDef> {
    self.models.iter().find(|model| model.name == name)
  }
}

/// Join key between a generated section and the schema it must stay
/// equivalent to.
#[derive(Debug, Clone)]
pub(crate) struct VerificationItem {
  pub endpoint_name: String,
  pub method: HttpMethod,
  pub section_name: String,
  pub class_name: String,
  pub source_schema: JsonMap,
  /// Relative path of the emitted module, for diagnostics.
  pub module_path: String,
}

/// Section schemas keyed by HTTP status code, sorted ascending.
pub(crate) type StatusSchemaMap = IndexMap<String, JsonMap>;
