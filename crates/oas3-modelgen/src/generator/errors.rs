use thiserror::Error;

/// Phase-typed failures raised by the generation pipeline.
///
/// `Load`, `Resolve` and `Write` are user-actionable and rendered as clean
/// CLI messages. `Invariant` marks programming-error-class conditions
/// (cyclic definition inlining, a normalization result that is not an
/// object, malformed root-model construction) and is allowed to surface
/// unsoftened.
#[derive(Debug, Error)]
pub(crate) enum GeneratorError {
  #[error("failed to load OpenAPI document: {0}")]
  Load(String),

  #[error("failed to resolve reference: {0}")]
  Resolve(String),

  #[error("failed to write output: {0}")]
  Write(String),

  #[error("internal invariant violated: {0}")]
  Invariant(String),
}
