use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{ArtifactKind, InvoiceError, InvoiceService};

#[derive(Debug, Clone)]
pub struct DownloadArtifactCommand {
  pub invoice_id: Uuid,
  pub file_type: String,
  /// `None` for the public download link sent by email
  pub emitter_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct DownloadArtifactResponse {
  pub bytes: Vec<u8>,
  pub filename: String,
  pub content_type: &'static str,
}

pub struct DownloadArtifactUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl DownloadArtifactUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: DownloadArtifactCommand,
  ) -> Result<DownloadArtifactResponse, InvoiceError> {
    let kind = ArtifactKind::from_str(&command.file_type)?;

    let (bytes, filename) = self
      .invoice_service
      .download_artifact(command.invoice_id, kind, command.emitter_id)
      .await?;

    Ok(DownloadArtifactResponse {
      bytes,
      filename,
      content_type: kind.content_type(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::testing::Fixture;

  #[tokio::test]
  async fn test_public_download_of_xml() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let use_case = DownloadArtifactUseCase::new(Arc::new(fixture.service()));

    let response = use_case
      .execute(DownloadArtifactCommand {
        invoice_id: document.invoice.id,
        file_type: "xml".to_string(),
        emitter_id: None,
      })
      .await
      .unwrap();

    assert_eq!(response.content_type, "application/xml");
    assert_eq!(
      response.filename,
      format!("factura_{}.xml", document.invoice.id)
    );
    assert!(response.bytes.starts_with(b"<factura>"));
  }

  #[tokio::test]
  async fn test_unknown_file_type_is_rejected() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let use_case = DownloadArtifactUseCase::new(Arc::new(fixture.service()));

    let result = use_case
      .execute(DownloadArtifactCommand {
        invoice_id: document.invoice.id,
        file_type: "docx".to_string(),
        emitter_id: None,
      })
      .await;

    assert!(matches!(result, Err(InvoiceError::Validation(_))));
  }
}
