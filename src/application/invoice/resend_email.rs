use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{InvoiceError, InvoiceService, Recipients};

#[derive(Debug, Clone)]
pub struct ResendEmailCommand {
  pub invoice_id: Uuid,
  pub emitter_id: Uuid,
  pub to: Option<String>,
  pub cc: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResendEmailResponse {
  pub status: String,
  pub email_status: String,
}

pub struct ResendEmailUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl ResendEmailUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: ResendEmailCommand,
  ) -> Result<ResendEmailResponse, InvoiceError> {
    let email_status = self
      .invoice_service
      .resend_email(
        command.invoice_id,
        command.emitter_id,
        Recipients {
          to: command.to,
          cc: command.cc,
        },
      )
      .await?;

    Ok(ResendEmailResponse {
      status: "ENQUEUED".to_string(),
      email_status: email_status.as_str().to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::testing::Fixture;

  #[tokio::test]
  async fn test_resend_is_enqueued() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let use_case = ResendEmailUseCase::new(Arc::new(fixture.service()));

    let response = use_case
      .execute(ResendEmailCommand {
        invoice_id: document.invoice.id,
        emitter_id: fixture.emitter.id,
        to: Some("contabilidad@example.com".to_string()),
        cc: vec![],
      })
      .await
      .unwrap();

    assert_eq!(response.status, "ENQUEUED");
    assert_eq!(response.email_status, "PENDING");
  }
}
