//! Rust source emission for section model trees.
//!
//! Each [`SectionModel`] becomes one source file: the nested object models
//! first, then the section root. Union and literal annotations have no
//! anonymous form in Rust, so they are lifted into named auxiliary enums
//! alongside the structs that use them.

use std::collections::HashSet;

use inflections::Inflect;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use serde_json::Value;

use super::{
  ast::{ExtraPolicy, FieldDef, ModelDef, SectionModel, TypeExpr, UnionType},
  errors::GeneratorError,
};

/// Renders a complete section model tree to formatted Rust source.
pub(crate) fn render_section(section: &SectionModel) -> Result<String, GeneratorError> {
  let mut renderer = SectionRenderer::new(section);
  let mut items: Vec<TokenStream> = Vec::with_capacity(section.models.len());
  for model in &section.models {
    items.push(renderer.render_model(model));
  }
  let aux = renderer.aux;

  let code = quote! {
    use serde::{Deserialize, Serialize};

    #(#aux)*

    #(#items)*
  };

  let syntax_tree = syn::parse2::<syn::File>(code)
    .map_err(|error| GeneratorError::Invariant(format!("emitted code failed to parse: {error}")))?;
  Ok(prettyplease::unparse(&syntax_tree))
}

struct SectionRenderer<'a> {
  section: &'a SectionModel,
  /// Lifted union/literal enums, emitted ahead of the structs.
  aux: Vec<TokenStream>,
  used_names: HashSet<String>,
}

impl<'a> SectionRenderer<'a> {
  fn new(section: &'a SectionModel) -> Self {
    Self {
      section,
      aux: Vec::new(),
      used_names: section.models.iter().map(|model| model.name.clone()).collect(),
    }
  }

  fn render_model(&mut self, model: &ModelDef) -> TokenStream {
    if let Some(root_type) = &model.root_type {
      return self.render_root_model(model, root_type);
    }

    let name = format_ident!("{}", model.name);
    let docs = doc_attrs(model.config.docstring.as_deref());
    let container_serde = match model.config.extra_policy {
      Some(ExtraPolicy::Forbid) => quote! { #[serde(deny_unknown_fields)] },
      _ => quote! {},
    };

    let mut fields: Vec<TokenStream> = model
      .fields
      .iter()
      .map(|field| self.render_field(&model.name, field))
      .collect();
    if matches!(model.config.extra_policy, Some(ExtraPolicy::Allow)) {
      let bag = match &model.config.additional_value_type {
        Some(expr) => self.rust_type(expr, &format!("{}Additional", model.name)),
        None => quote! { serde_json::Map<String, serde_json::Value> },
      };
      fields.push(quote! {
        /// Properties not declared by the schema.
        #[serde(flatten)]
        pub extra: #bag
      });
    }

    quote! {
      #docs
      #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
      #container_serde
      pub struct #name {
        #(#fields),*
      }
    }
  }

  /// A root model wrapping a non-object annotation. Unions become enums in
  /// their own right; everything else is a transparent newtype.
  fn render_root_model(&mut self, model: &ModelDef, root_type: &TypeExpr) -> TokenStream {
    let name = format_ident!("{}", model.name);
    let docs = doc_attrs(model.config.docstring.as_deref());

    if let TypeExpr::Union(union) = root_type {
      let tagging = union_tagging(union);
      let body = self.render_union_body(union);
      return quote! {
        #docs
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #tagging
        pub enum #name {
          #body
        }
      };
    }

    let inner = self.rust_type(root_type, &format!("{}Value", model.name));
    quote! {
      #docs
      #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
      #[serde(transparent)]
      pub struct #name(pub #inner);
    }
  }

  fn render_field(&mut self, model_name: &str, field: &FieldDef) -> TokenStream {
    let name = format_ident!("{}", field.name);
    let hint = format!("{model_name}{}", field.name.to_pascal_case());
    let base = self.rust_type(&field.type_expr, &hint);

    let mut docs: Vec<String> = Vec::new();
    if let Some(description) = field.metadata.description() {
      docs.extend(description.lines().map(str::to_string));
    }
    if let Some(default) = &field.default {
      docs.push(format!("Defaults to `{default}`."));
    }
    let doc_tokens = doc_lines(&docs);

    let mut serde_parts: Vec<TokenStream> = Vec::new();
    if field.name != field.source_name {
      let source_name = &field.source_name;
      serde_parts.push(quote! { rename = #source_name });
    }

    let type_tokens = if field.required || matches!(field.type_expr, TypeExpr::Optional(_)) {
      base
    } else {
      serde_parts.push(quote! { default });
      serde_parts.push(quote! { skip_serializing_if = "Option::is_none" });
      quote! { Option<#base> }
    };

    let serde_attr = if serde_parts.is_empty() {
      quote! {}
    } else {
      quote! { #[serde(#(#serde_parts),*)] }
    };

    quote! {
      #doc_tokens
      #serde_attr
      pub #name: #type_tokens
    }
  }

  fn rust_type(&mut self, expr: &TypeExpr, hint: &str) -> TokenStream {
    match expr {
      TypeExpr::String => quote! { String },
      TypeExpr::Integer => quote! { i64 },
      TypeExpr::Number => quote! { f64 },
      TypeExpr::Boolean => quote! { bool },
      TypeExpr::Null => quote! { () },
      TypeExpr::Any => quote! { serde_json::Value },
      TypeExpr::Model(name) => {
        let ident = format_ident!("{name}");
        quote! { #ident }
      }
      TypeExpr::Array(inner) => {
        let inner = self.rust_type(inner, &format!("{hint}Item"));
        quote! { Vec<#inner> }
      }
      TypeExpr::Map(inner) => {
        if matches!(inner.as_ref(), TypeExpr::Any) {
          quote! { serde_json::Map<String, serde_json::Value> }
        } else {
          let inner = self.rust_type(inner, &format!("{hint}Value"));
          quote! { std::collections::BTreeMap<String, #inner> }
        }
      }
      TypeExpr::Optional(inner) => {
        let inner = self.rust_type(inner, hint);
        quote! { Option<#inner> }
      }
      TypeExpr::Annotated { inner, .. } => self.rust_type(inner, hint),
      TypeExpr::Literal(values) => self.lift_literal(values, hint),
      TypeExpr::Union(union) => self.lift_union(union, hint),
    }
  }

  /// Uniform string literals become a unit enum; uniform scalar literals
  /// keep the underlying primitive; mixed values stay dynamic.
  fn lift_literal(&mut self, values: &[Value], hint: &str) -> TokenStream {
    if values.iter().all(Value::is_string) && !values.is_empty() {
      let name = self.unique_aux_name(hint);
      let ident = format_ident!("{name}");
      let variants: Vec<TokenStream> = values
        .iter()
        .filter_map(Value::as_str)
        .map(|literal| {
          let variant = format_ident!("{}", variant_name_for(literal));
          quote! {
            #[serde(rename = #literal)]
            #variant
          }
        })
        .collect();
      self.aux.push(quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum #ident {
          #(#variants),*
        }
      });
      return quote! { #ident };
    }
    if values.iter().all(|value| value.is_i64() || value.is_u64()) {
      return quote! { i64 };
    }
    if values.iter().all(Value::is_number) {
      return quote! { f64 };
    }
    if values.iter().all(Value::is_boolean) {
      return quote! { bool };
    }
    quote! { serde_json::Value }
  }

  fn lift_union(&mut self, union: &UnionType, hint: &str) -> TokenStream {
    let name = self.unique_aux_name(hint);
    let ident = format_ident!("{name}");
    let body = self.render_union_body(union);
    let tagging = union_tagging(union);

    self.aux.push(quote! {
      #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
      #tagging
      pub enum #ident {
        #body
      }
    });
    quote! { #ident }
  }

  fn render_union_body(&mut self, union: &UnionType) -> TokenStream {
    let mut seen = HashSet::new();
    let variants: Vec<TokenStream> = union
      .options
      .iter()
      .enumerate()
      .map(|(index, option)| {
        let mut variant = union_variant_name(option);
        while !seen.insert(variant.clone()) {
          variant = format!("{variant}{}", index + 1);
        }
        let variant_ident = format_ident!("{variant}");
        let rename = self.discriminant_rename(union, option, &variant);
        let payload = self.rust_type(option, &variant);
        quote! {
          #rename
          #variant_ident(#payload)
        }
      })
      .collect();
    quote! { #(#variants),* }
  }

  /// For a tagged union, the variant name must match the tag value carried
  /// by the option's discriminant field. The converter guarantees that
  /// field is a single-value literal.
  fn discriminant_rename(&self, union: &UnionType, option: &TypeExpr, variant: &str) -> TokenStream {
    let Some(discriminator) = &union.discriminator else {
      return quote! {};
    };
    let TypeExpr::Model(model_name) = option else {
      return quote! {};
    };
    let Some(model) = self.section.find_model(model_name) else {
      return quote! {};
    };
    let tag_value = model.fields.iter().find_map(|field| {
      if &field.source_name != discriminator {
        return None;
      }
      match &field.type_expr {
        TypeExpr::Literal(values) => values.first().and_then(Value::as_str),
        _ => None,
      }
    });
    match tag_value {
      Some(tag) if tag != variant => quote! { #[serde(rename = #tag)] },
      _ => quote! {},
    }
  }

  fn unique_aux_name(&mut self, hint: &str) -> String {
    let base = if hint.is_empty() { "Variant".to_string() } else { hint.to_string() };
    if self.used_names.insert(base.clone()) {
      return base;
    }
    let mut suffix = 2usize;
    loop {
      let candidate = format!("{base}{suffix}");
      if self.used_names.insert(candidate.clone()) {
        return candidate;
      }
      suffix += 1;
    }
  }
}

/// Internally-tagged when a discriminator is declared, untagged otherwise.
fn union_tagging(union: &UnionType) -> TokenStream {
  match &union.discriminator {
    Some(property) => quote! { #[serde(tag = #property)] },
    None => quote! { #[serde(untagged)] },
  }
}

fn union_variant_name(option: &TypeExpr) -> String {
  match option {
    TypeExpr::String => "String".to_string(),
    TypeExpr::Integer => "Integer".to_string(),
    TypeExpr::Number => "Number".to_string(),
    TypeExpr::Boolean => "Boolean".to_string(),
    TypeExpr::Null => "Null".to_string(),
    TypeExpr::Any => "Other".to_string(),
    TypeExpr::Literal(_) => "Literal".to_string(),
    TypeExpr::Model(name) => name.clone(),
    TypeExpr::Array(_) => "Array".to_string(),
    TypeExpr::Map(_) => "Map".to_string(),
    TypeExpr::Optional(inner) => format!("Optional{}", union_variant_name(inner)),
    TypeExpr::Union(_) => "Union".to_string(),
    TypeExpr::Annotated { inner, .. } => union_variant_name(inner),
  }
}

fn variant_name_for(literal: &str) -> String {
  let cleaned: String = literal
    .chars()
    .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { ' ' })
    .collect();
  let pascal = cleaned.to_pascal_case();
  if pascal.is_empty() {
    "Empty".to_string()
  } else if pascal.starts_with(|ch: char| ch.is_ascii_digit()) {
    format!("V{pascal}")
  } else {
    pascal
  }
}

fn doc_attrs(docstring: Option<&str>) -> TokenStream {
  match docstring {
    Some(text) => doc_lines(&text.lines().map(str::to_string).collect::<Vec<_>>()),
    None => quote! {},
  }
}

fn doc_lines(lines: &[String]) -> TokenStream {
  if lines.is_empty() {
    return quote! {};
  }
  let attrs: Vec<TokenStream> = lines
    .iter()
    .map(|line| {
      let padded = format!(" {}", line.trim_end());
      quote! { #[doc = #padded] }
    })
    .collect();
  quote! { #(#attrs)* }
}
