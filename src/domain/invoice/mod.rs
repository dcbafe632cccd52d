pub mod artifact_store;
pub mod entities;
pub mod errors;
pub mod idempotency;
pub mod notifications;
pub mod ports;
pub mod services;
pub mod totals;
pub mod value_objects;

pub use artifact_store::ArtifactStore;
pub use entities::{
  AuthorityResponse, Customer, CustomerDetails, DocumentReference, GeneratedArtifacts, Invoice,
  InvoiceArtifacts, InvoiceDocument, InvoiceItem, InvoiceRequest, InvoiceTotals, LineRequest,
  NewInvoice, NewInvoiceItem, Overrides,
};
pub use errors::{ArtifactError, BlobStoreError, EmailError, InvoiceError};
pub use idempotency::{IdempotencyGuard, Reservation};
pub use notifications::{NotificationDispatcher, Recipients};
pub use ports::{
  ArtifactGenerator, ArtifactRepository, BlobStore, CustomerRepository, EmailMessage, EmailSender,
  InvoiceStore,
};
pub use services::{
  InvoiceService, InvoiceServiceDependencies, IssuedInvoice, PostCommitOutcome, ResolvedCodes,
};
pub use totals::{ComputedTotals, PAYMENT_TOLERANCE, TotalsCalculator};
pub use value_objects::{
  ArtifactKind, DocumentKind, DocumentStatus, EmailStatus, LineItemDescription, Payment,
  PaymentMethod, Quantity, RetryCheckpoint, TaxRate, UnitPrice, ValueObjectError,
};
