use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::entities::{GeneratedArtifacts, InvoiceArtifacts};
use super::errors::{BlobStoreError, InvoiceError};
use super::ports::{ArtifactRepository, BlobStore};
use super::value_objects::ArtifactKind;

/// Persists generated artifacts: payloads in blob storage, metadata in the
/// relational store. When blob storage fails the payloads are kept inline in
/// the metadata row instead.
pub struct ArtifactStore {
  blobs: Arc<dyn BlobStore>,
  repo: Arc<dyn ArtifactRepository>,
}

impl ArtifactStore {
  pub fn new(blobs: Arc<dyn BlobStore>, repo: Arc<dyn ArtifactRepository>) -> Self {
    Self { blobs, repo }
  }

  /// Upserts the artifact set of an invoice, replacing any previous one.
  pub async fn store(
    &self,
    invoice_id: Uuid,
    generated: &GeneratedArtifacts,
  ) -> Result<InvoiceArtifacts, InvoiceError> {
    let now = Utc::now();
    let mut artifacts = InvoiceArtifacts {
      id: Uuid::new_v4(),
      invoice_id,
      pdf_data: None,
      xml_data: None,
      pdf_size: generated.pdf.len() as i64,
      xml_size: generated.xml.len() as i64,
      pdf_url: None,
      xml_url: None,
      generated_at: now,
      updated_at: now,
    };

    let uploaded = match self.upload_pair(invoice_id, generated).await {
      Ok((pdf_key, xml_key)) => {
        artifacts.pdf_url = Some(pdf_key);
        artifacts.xml_url = Some(xml_key);
        true
      }
      Err(e) => {
        tracing::warn!(
          invoice_id = %invoice_id,
          error = %e,
          "Blob storage unavailable, keeping artifacts inline"
        );
        artifacts.pdf_data = Some(generated.pdf.clone());
        artifacts.xml_data = Some(generated.xml.clone());
        false
      }
    };

    match self.repo.upsert(artifacts).await {
      Ok(stored) => {
        tracing::info!(
          invoice_id = %invoice_id,
          pdf_size = stored.pdf_size,
          xml_size = stored.xml_size,
          inline = !uploaded,
          "Invoice artifacts stored"
        );
        Ok(stored)
      }
      Err(e) => {
        if uploaded {
          for kind in [ArtifactKind::Pdf, ArtifactKind::Xml] {
            self.remove_orphan(&kind.blob_key(invoice_id)).await;
          }
        }
        Err(e)
      }
    }
  }

  /// Uploads PDF then XML. A failed XML upload removes the already uploaded
  /// PDF before the error is returned.
  async fn upload_pair(
    &self,
    invoice_id: Uuid,
    generated: &GeneratedArtifacts,
  ) -> Result<(String, String), BlobStoreError> {
    let pdf_key = ArtifactKind::Pdf.blob_key(invoice_id);
    let xml_key = ArtifactKind::Xml.blob_key(invoice_id);

    self
      .blobs
      .put(
        &pdf_key,
        generated.pdf.clone(),
        ArtifactKind::Pdf.content_type(),
      )
      .await?;

    if let Err(e) = self
      .blobs
      .put(
        &xml_key,
        generated.xml.clone(),
        ArtifactKind::Xml.content_type(),
      )
      .await
    {
      self.remove_orphan(&pdf_key).await;
      return Err(e);
    }

    Ok((pdf_key, xml_key))
  }

  async fn remove_orphan(&self, key: &str) {
    if let Err(e) = self.blobs.delete(key).await {
      tracing::error!(key = %key, error = %e, "Failed to remove orphaned artifact blob");
    }
  }

  pub async fn find(&self, invoice_id: Uuid) -> Result<Option<InvoiceArtifacts>, InvoiceError> {
    self.repo.find_by_invoice_id(invoice_id).await
  }

  /// Reads one payload, preferring inline bytes over the blob copy.
  pub async fn fetch(
    &self,
    artifacts: &InvoiceArtifacts,
    kind: ArtifactKind,
  ) -> Result<Vec<u8>, InvoiceError> {
    if let Some(data) = artifacts.inline_data(kind) {
      return Ok(data.to_vec());
    }

    match artifacts.blob_key(kind) {
      Some(key) => Ok(self.blobs.get(key).await?),
      None => Err(InvoiceError::ArtifactNotFound {
        invoice_id: artifacts.invoice_id,
        kind,
      }),
    }
  }
}
