use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{AuthorityResponse, DocumentStatus, InvoiceError, InvoiceService};

#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceStatusCommand {
  pub invoice_id: Uuid,
  pub status: String,
  pub cufe: Option<String>,
  pub url_cufe: Option<String>,
  pub xml_response: Option<String>,
  pub xml_fe: Option<String>,
  pub xml_protocolo: Option<String>,
  pub cafe_pdf_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateInvoiceStatusResponse {
  pub id: Uuid,
  pub status: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cufe: Option<String>,
}

pub struct UpdateInvoiceStatusUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl UpdateInvoiceStatusUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: UpdateInvoiceStatusCommand,
  ) -> Result<UpdateInvoiceStatusResponse, InvoiceError> {
    let status = DocumentStatus::from_str(&command.status)?;

    let response = AuthorityResponse {
      cufe: command.cufe,
      url_cufe: command.url_cufe,
      xml_response: command.xml_response,
      xml_fe: command.xml_fe,
      xml_protocolo: command.xml_protocolo,
      cafe_pdf_url: command.cafe_pdf_url,
    };
    let response = (response != AuthorityResponse::default()).then_some(response);

    let invoice = self
      .invoice_service
      .update_status(command.invoice_id, status, response)
      .await?;

    Ok(UpdateInvoiceStatusResponse {
      id: invoice.id,
      status: invoice.status.as_str().to_string(),
      cufe: invoice.authority.cufe,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::testing::Fixture;

  #[tokio::test]
  async fn test_walks_the_happy_path_to_authorized() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let use_case = UpdateInvoiceStatusUseCase::new(Arc::new(fixture.service()));
    let id = document.invoice.id;

    for status in ["PREPARING", "SENDING_TO_PAC"] {
      use_case
        .execute(UpdateInvoiceStatusCommand {
          invoice_id: id,
          status: status.to_string(),
          ..Default::default()
        })
        .await
        .unwrap();
    }
    let response = use_case
      .execute(UpdateInvoiceStatusCommand {
        invoice_id: id,
        status: "AUTHORIZED".to_string(),
        cufe: Some("FE0120000155596713-2-2015-5900".to_string()),
        ..Default::default()
      })
      .await
      .unwrap();

    assert_eq!(response.status, "AUTHORIZED");
    assert_eq!(
      response.cufe.as_deref(),
      Some("FE0120000155596713-2-2015-5900")
    );
    assert_eq!(
      fixture.emitters.series_by_id(fixture.series.id).authorized_count,
      1
    );
  }

  #[tokio::test]
  async fn test_backward_move_is_rejected() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let use_case = UpdateInvoiceStatusUseCase::new(Arc::new(fixture.service()));

    let result = use_case
      .execute(UpdateInvoiceStatusCommand {
        invoice_id: document.invoice.id,
        status: "AUTHORIZED".to_string(),
        ..Default::default()
      })
      .await;

    assert!(matches!(
      result,
      Err(InvoiceError::InvalidStatusTransition { .. })
    ));
  }
}
