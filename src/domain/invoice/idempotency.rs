use std::sync::Arc;
use uuid::Uuid;

use super::errors::InvoiceError;
use super::ports::InvoiceStore;

/// Outcome of an idempotency pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
  Fresh,
  Duplicate { existing_id: Uuid },
}

/// Short-circuits requests whose key already belongs to a committed invoice.
///
/// This lookup only saves work; two racing requests with the same fresh key
/// are settled by the unique constraint checked in [`InvoiceStore::commit`].
pub struct IdempotencyGuard {
  store: Arc<dyn InvoiceStore>,
}

impl IdempotencyGuard {
  pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
    Self { store }
  }

  pub async fn reserve(&self, key: Option<&str>) -> Result<Reservation, InvoiceError> {
    let Some(key) = key else {
      return Ok(Reservation::Fresh);
    };

    match self.store.find_by_idempotency_key(key).await? {
      Some(existing) => Ok(Reservation::Duplicate {
        existing_id: existing.id,
      }),
      None => Ok(Reservation::Fresh),
    }
  }

  /// Same as [`reserve`](Self::reserve) but turns a duplicate into an error.
  pub async fn ensure_fresh(&self, key: Option<&str>) -> Result<(), InvoiceError> {
    match self.reserve(key).await? {
      Reservation::Fresh => Ok(()),
      Reservation::Duplicate { existing_id } => {
        tracing::info!(
          existing_id = %existing_id,
          "Duplicate idempotency key, returning existing invoice"
        );
        Err(InvoiceError::DuplicateIdempotencyKey { existing_id })
      }
    }
  }
}
