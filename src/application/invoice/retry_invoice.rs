use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, InvoiceService, RetryCheckpoint};

#[derive(Debug, Clone)]
pub struct RetryInvoiceCommand {
  pub invoice_id: Uuid,
  pub emitter_id: Uuid,
  /// Defaults to `send_to_pac`
  pub resume_from: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetryInvoiceResponse {
  pub status: String,
  pub resume_from: String,
}

pub struct RetryInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl RetryInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: RetryInvoiceCommand,
  ) -> Result<RetryInvoiceResponse, InvoiceError> {
    let checkpoint = match command.resume_from.as_deref() {
      Some(value) => RetryCheckpoint::from_str(value)?,
      None => RetryCheckpoint::default(),
    };

    self
      .invoice_service
      .retry(command.invoice_id, command.emitter_id, checkpoint)
      .await?;

    Ok(RetryInvoiceResponse {
      status: "ENQUEUED".to_string(),
      resume_from: checkpoint.as_str().to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::invoice::{DocumentStatus, InvoiceStore};
  use crate::domain::testing::Fixture;

  #[tokio::test]
  async fn test_retry_from_error_resumes_at_send_to_pac() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let id = document.invoice.id;
    fixture
      .store
      .update_status(id, DocumentStatus::Received, DocumentStatus::Error, None)
      .await
      .unwrap();
    let use_case = RetryInvoiceUseCase::new(Arc::new(fixture.service()));

    let response = use_case
      .execute(RetryInvoiceCommand {
        invoice_id: id,
        emitter_id: fixture.emitter.id,
        resume_from: None,
      })
      .await
      .unwrap();

    assert_eq!(response.status, "ENQUEUED");
    assert_eq!(response.resume_from, "send_to_pac");
    let invoice = fixture.store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(invoice.status, DocumentStatus::SendingToPac);
  }

  #[tokio::test]
  async fn test_retry_outside_error_is_conflict() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let use_case = RetryInvoiceUseCase::new(Arc::new(fixture.service()));

    let result = use_case
      .execute(RetryInvoiceCommand {
        invoice_id: document.invoice.id,
        emitter_id: fixture.emitter.id,
        resume_from: Some("prepare".to_string()),
      })
      .await;

    assert!(matches!(
      result,
      Err(InvoiceError::InvalidStatusTransition { .. })
    ));
  }
}
