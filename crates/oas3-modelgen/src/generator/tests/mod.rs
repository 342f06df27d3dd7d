mod codegen;
mod schema_converter;
mod support;
mod verify;
mod writer;
