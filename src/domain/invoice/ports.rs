use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entities::{
  AuthorityResponse, Customer, CustomerDetails, GeneratedArtifacts, Invoice, InvoiceArtifacts,
  InvoiceDocument, NewInvoice,
};
use super::errors::{ArtifactError, BlobStoreError, EmailError, InvoiceError};
use super::value_objects::{DocumentStatus, EmailStatus};

/// Transactional persistence of invoices and their items.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
  /// Allocates the next number of the matching active series, upserts the
  /// customer and inserts the invoice with all items in one transaction.
  ///
  /// Fails with `SeriesNotFound` when no active series matches and with
  /// `DuplicateIdempotencyKey` when the key is already committed.
  async fn commit(&self, invoice: NewInvoice) -> Result<Invoice, InvoiceError>;

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError>;

  /// Loads the invoice with its emitter, customer and items.
  async fn find_document(&self, id: Uuid) -> Result<Option<InvoiceDocument>, InvoiceError>;

  async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Invoice>, InvoiceError>;

  /// Moves `expected -> new` with a conditional single-row update and bumps the
  /// series authorized/rejected tally when `new` is terminal.
  ///
  /// Fails with `InvoiceNotFound` if the row is missing and with
  /// `ConcurrentModification` if the status was no longer `expected`.
  async fn update_status(
    &self,
    id: Uuid,
    expected: DocumentStatus,
    new: DocumentStatus,
    response: Option<&AuthorityResponse>,
  ) -> Result<Invoice, InvoiceError>;

  /// Fails with `InvoiceNotFound` if no row was updated.
  async fn update_email_status(&self, id: Uuid, status: EmailStatus) -> Result<(), InvoiceError>;

  /// Counts the emitter's invoices created at or after `since`, per status.
  /// Statuses without invoices are omitted.
  async fn count_by_status(
    &self,
    emitter_id: Uuid,
    since: DateTime<Utc>,
  ) -> Result<Vec<(DocumentStatus, i64)>, InvoiceError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
  /// Get-or-create by (emitter, email); refreshes contact data on an existing row.
  async fn upsert(
    &self,
    emitter_id: Uuid,
    details: &CustomerDetails,
  ) -> Result<Customer, InvoiceError>;

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, InvoiceError>;
}

/// Renders the PDF and XML representations of a committed invoice.
pub trait ArtifactGenerator: Send + Sync {
  fn generate(&self, document: &InvoiceDocument) -> Result<GeneratedArtifacts, ArtifactError>;
}

/// Durable object storage reached over the network.
#[async_trait]
pub trait BlobStore: Send + Sync {
  async fn put(&self, key: &str, data: Vec<u8>, content_type: &str)
  -> Result<(), BlobStoreError>;

  async fn get(&self, key: &str) -> Result<Vec<u8>, BlobStoreError>;

  async fn delete(&self, key: &str) -> Result<(), BlobStoreError>;
}

/// Artifact metadata rows, one per invoice.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
  async fn upsert(&self, artifacts: InvoiceArtifacts) -> Result<InvoiceArtifacts, InvoiceError>;

  async fn find_by_invoice_id(
    &self,
    invoice_id: Uuid,
  ) -> Result<Option<InvoiceArtifacts>, InvoiceError>;
}

/// Outgoing email message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
  pub to: Vec<String>,
  pub cc: Vec<String>,
  pub subject: String,
  pub body_html: String,
  pub body_text: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
  async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;

  fn is_enabled(&self) -> bool;

  fn provider_name(&self) -> &'static str;
}
