use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::value_objects::{ArtifactKind, DocumentKind, DocumentStatus, ValueObjectError};
use crate::domain::emitter::EmitterError;

#[derive(Debug, Error)]
pub enum InvoiceError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Invalid request: {0}")]
  InvalidRequest(String),

  #[error("Invalid tax rate '{code}' on line {line_no}")]
  InvalidTaxRate { line_no: usize, code: String },

  #[error("Amount out of range on line {line_no}: {message}")]
  AmountOutOfRange { line_no: usize, message: String },

  #[error("Computed total {computed} does not match declared payment {declared}")]
  AmountMismatch { computed: Decimal, declared: Decimal },

  #[error("No active series for issuing point {issuing_point} and kind {document_kind}")]
  SeriesNotFound {
    emitter_id: Uuid,
    issuing_point: String,
    document_kind: DocumentKind,
  },

  #[error("Emitter not found: {0}")]
  EmitterNotFound(Uuid),

  #[error("Customer not found: {0}")]
  CustomerNotFound(Uuid),

  #[error("Invoice not found: {0}")]
  InvoiceNotFound(Uuid),

  #[error("Artifact {kind} not available for invoice {invoice_id}")]
  ArtifactNotFound {
    invoice_id: Uuid,
    kind: ArtifactKind,
  },

  #[error("Idempotency key already used by invoice {existing_id}")]
  DuplicateIdempotencyKey { existing_id: Uuid },

  #[error("Invalid status transition from {from} to {to}")]
  InvalidStatusTransition {
    from: DocumentStatus,
    to: DocumentStatus,
  },

  #[error("Invoice {0} was modified concurrently")]
  ConcurrentModification(Uuid),

  #[error("Invoice {0} belongs to another emitter")]
  Forbidden(Uuid),

  #[error("Emitter error: {0}")]
  Emitter(#[from] EmitterError),

  #[error("Artifact generation failed: {0}")]
  Generation(#[from] ArtifactError),

  #[error("Blob storage error: {0}")]
  Storage(#[from] BlobStoreError),

  #[error("Operation timed out: {0}")]
  Timeout(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Internal error: {0}")]
  Internal(String),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("PDF rendering failed: {0}")]
  Pdf(String),

  #[error("XML rendering failed: {0}")]
  Xml(String),
}

#[derive(Debug, Error)]
pub enum BlobStoreError {
  #[error("Blob storage is not configured")]
  Unavailable,

  #[error("Object not found: {0}")]
  NotFound(String),

  #[error("Upload of '{key}' failed: {message}")]
  Upload { key: String, message: String },

  #[error("Download of '{key}' failed: {message}")]
  Download { key: String, message: String },

  #[error("Delete of '{key}' failed: {message}")]
  Delete { key: String, message: String },

  #[error("Blob storage call timed out for '{0}'")]
  Timeout(String),
}

#[derive(Debug, Error)]
pub enum EmailError {
  #[error("Email delivery is disabled")]
  Disabled,

  #[error("Email provider rejected the message: {0}")]
  Rejected(String),

  #[error("Email provider unreachable: {0}")]
  Transport(String),
}
