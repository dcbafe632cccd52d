use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{ArtifactKind, InvoiceError, InvoiceService};

#[derive(Debug, Clone)]
pub struct GetInvoiceFilesCommand {
  pub invoice_id: Uuid,
  pub emitter_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceFilesResponse {
  pub pdf_url: String,
  pub xml_url: String,
  pub pdf_size: i64,
  pub xml_size: i64,
  pub generated_at: DateTime<Utc>,
  pub disposition: String,
}

pub struct GetInvoiceFilesUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl GetInvoiceFilesUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  /// Artifacts are generated on the spot when the background job has not
  /// produced them yet.
  pub async fn execute(
    &self,
    command: GetInvoiceFilesCommand,
  ) -> Result<InvoiceFilesResponse, InvoiceError> {
    let artifacts = self
      .invoice_service
      .ensure_artifacts(command.invoice_id, Some(command.emitter_id))
      .await?;

    let link = |kind: ArtifactKind| {
      format!(
        "/v1/invoices/{}/files?file_type={}",
        command.invoice_id,
        kind.extension()
      )
    };

    Ok(InvoiceFilesResponse {
      pdf_url: link(ArtifactKind::Pdf),
      xml_url: link(ArtifactKind::Xml),
      pdf_size: artifacts.pdf_size,
      xml_size: artifacts.xml_size,
      generated_at: artifacts.generated_at,
      disposition: "inline".to_string(),
    })
  }
}
