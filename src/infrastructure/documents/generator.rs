use crate::domain::invoice::{
  GeneratedArtifacts, InvoiceDocument, errors::ArtifactError, ports::ArtifactGenerator,
};

use super::pdf_renderer::render_pdf;
use super::xml_renderer::render_xml;

/// Renders both artifacts from the persisted invoice; nothing is recomputed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentGenerator;

impl DocumentGenerator {
  pub fn new() -> Self {
    Self
  }
}

impl ArtifactGenerator for DocumentGenerator {
  fn generate(&self, document: &InvoiceDocument) -> Result<GeneratedArtifacts, ArtifactError> {
    let pdf = render_pdf(document)?;
    let xml = render_xml(document)?;

    tracing::debug!(
      invoice_id = %document.invoice.id,
      pdf_size = pdf.len(),
      xml_size = xml.len(),
      "Rendered invoice artifacts"
    );

    Ok(GeneratedArtifacts { pdf, xml })
  }
}
