pub(crate) mod ast;
pub(crate) mod codegen;
pub(crate) mod errors;
pub(crate) mod model_schema;
pub(crate) mod normalize;
pub(crate) mod orchestrator;
pub(crate) mod resolver;
pub(crate) mod schema_converter;
pub(crate) mod verify;
pub(crate) mod writer;

#[cfg(test)]
mod tests;
