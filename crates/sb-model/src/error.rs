// error.rs — Error types for the data model.

use thiserror::Error;

/// Errors raised when constructing or normalizing model values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A required identifier was empty (or whitespace-only).
    #[error("identifier '{field}' cannot be empty")]
    EmptyIdentifier { field: &'static str },
}
