use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::create_invoice::{LinksDto, TotalsDto};
use crate::domain::invoice::{InvoiceError, InvoiceService};

#[derive(Debug, Clone)]
pub struct GetInvoiceCommand {
  pub invoice_id: Uuid,
  pub emitter_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmitterInfoDto {
  pub ruc: String,
  pub pto_fac_df: String,
  pub nrodf: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceStatusResponse {
  pub id: Uuid,
  pub status: String,
  pub email_status: String,
  pub document_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub cufe: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url_cufe: Option<String>,
  pub emitter: EmitterInfoDto,
  pub totals: TotalsDto,
  pub created_at: DateTime<Utc>,
  pub links: LinksDto,
}

pub struct GetInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl GetInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: GetInvoiceCommand,
  ) -> Result<InvoiceStatusResponse, InvoiceError> {
    let document = self
      .invoice_service
      .get_document(command.invoice_id, Some(command.emitter_id))
      .await?;
    let invoice = &document.invoice;

    Ok(InvoiceStatusResponse {
      id: invoice.id,
      status: invoice.status.as_str().to_string(),
      email_status: invoice.email_status.as_str().to_string(),
      document_type: invoice.document_kind.as_str().to_string(),
      cufe: invoice.authority.cufe.clone(),
      url_cufe: invoice.authority.url_cufe.clone(),
      emitter: EmitterInfoDto {
        ruc: document.emitter.ruc_display(),
        pto_fac_df: invoice.issuing_point.clone(),
        nrodf: invoice.document_number.clone(),
      },
      totals: TotalsDto::from(invoice),
      created_at: invoice.created_at,
      links: LinksDto::from(invoice),
    })
  }
}
