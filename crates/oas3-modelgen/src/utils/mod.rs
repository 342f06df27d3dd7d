pub(crate) mod schema_ext;
pub(crate) mod spec;

/// Untyped JSON object as every pipeline stage sees it. The `preserve_order`
/// feature keeps key order equal to the source document, which is what makes
/// repeated runs emit fields in an identical order.
pub(crate) type JsonMap = serde_json::Map<String, serde_json::Value>;
