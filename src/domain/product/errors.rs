use thiserror::Error;

use crate::domain::emitter::EmitterError;
use crate::domain::invoice::value_objects::ValueObjectError;

#[derive(Debug, Error)]
pub enum ProductError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Invalid {field}: {message}")]
  InvalidField {
    field: &'static str,
    message: String,
  },

  #[error("Product with SKU '{0}' already exists")]
  SkuAlreadyExists(String),

  #[error("Emitter error: {0}")]
  Emitter(#[from] EmitterError),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}
