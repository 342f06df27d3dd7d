pub(crate) mod identifiers;
pub(crate) mod operations;

#[cfg(test)]
mod tests;
