use thiserror::Error;
use uuid::Uuid;

use super::value_objects::ValueObjectError;
use crate::domain::invoice::value_objects::DocumentKind;

#[derive(Debug, Error)]
pub enum EmitterError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Invalid document kind: {0}")]
  InvalidDocumentKind(String),

  #[error("Emitter not found: {0}")]
  EmitterNotFound(Uuid),

  #[error("Emitter with company code '{0}' already exists")]
  EmitterAlreadyExists(String),

  #[error("Series already exists for issuing point {issuing_point} and kind {document_kind}")]
  SeriesAlreadyExists {
    issuing_point: String,
    document_kind: DocumentKind,
  },

  #[error("Series not found: {0}")]
  SeriesNotFound(Uuid),

  #[error("Invalid API key")]
  InvalidApiKey,

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}
