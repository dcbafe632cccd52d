use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::value_objects::{
  ArtifactKind, DocumentKind, DocumentStatus, EmailStatus, LineItemDescription, Payment, Quantity,
  TaxRate, UnitPrice,
};
use crate::domain::emitter::Emitter;

// Customer - recipient of documents, unique per (emitter, email)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
  pub id: Uuid,
  pub emitter_id: Uuid,
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub address_line: Option<String>,
  pub ubi_code: Option<String>,
  pub tax_id: Option<String>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Contact data supplied with a request; resolved to a [`Customer`] by email.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDetails {
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub address_line: Option<String>,
  pub ubi_code: Option<String>,
  pub tax_id: Option<String>,
}

impl Customer {
  pub fn new(emitter_id: Uuid, details: CustomerDetails) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      emitter_id,
      name: details.name,
      email: details.email.to_lowercase(),
      phone: details.phone,
      address_line: details.address_line,
      ubi_code: details.ubi_code,
      tax_id: details.tax_id,
      is_active: true,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Original document a credit/debit note corrects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReference {
  pub cufe: String,
  pub number: String,
  pub issuing_point: String,
}

/// Fields filled in once the tax authority has answered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorityResponse {
  pub cufe: Option<String>,
  pub url_cufe: Option<String>,
  pub xml_response: Option<String>,
  pub xml_fe: Option<String>,
  pub xml_protocolo: Option<String>,
  pub cafe_pdf_url: Option<String>,
}

/// One line as requested, before totals are computed.
#[derive(Debug, Clone)]
pub struct LineRequest {
  pub sku: Option<String>,
  pub description: LineItemDescription,
  pub quantity: Quantity,
  pub unit_price: UnitPrice,
  /// Fiscal tax code as received; validated by the totals calculator
  pub tax_rate_code: String,
  pub cpbs_abr: Option<String>,
  pub cpbs_cmp: Option<String>,
}

/// Values that override the emitter defaults for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
  pub issuing_point: Option<String>,
  pub emission_type: Option<String>,
  pub document_code: Option<String>,
}

/// Everything a caller provides to issue a document.
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
  pub emitter_id: Uuid,
  pub document_kind: DocumentKind,
  pub reference: Option<DocumentReference>,
  pub customer: CustomerDetails,
  pub items: Vec<LineRequest>,
  pub payment: Payment,
  pub overrides: Overrides,
  pub idempotency_key: Option<String>,
}

// Invoice line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
  pub id: Uuid,
  pub invoice_id: Uuid,
  pub line_no: i32,
  pub sku: Option<String>,
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  #[serde(serialize_with = "serialize_tax_rate")]
  pub tax_rate: TaxRate,
  pub cpbs_abr: Option<String>,
  pub cpbs_cmp: Option<String>,
  pub line_total: Decimal,
  pub created_at: DateTime<Utc>,
}

fn serialize_tax_rate<S: serde::Serializer>(rate: &TaxRate, s: S) -> Result<S::Ok, S::Error> {
  s.serialize_str(rate.code())
}

/// Line ready to be persisted together with its invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceItem {
  pub line_no: i32,
  pub sku: Option<String>,
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub tax_rate: TaxRate,
  pub cpbs_abr: Option<String>,
  pub cpbs_cmp: Option<String>,
  pub line_total: Decimal,
}

impl NewInvoiceItem {
  pub fn into_item(self, invoice_id: Uuid, created_at: DateTime<Utc>) -> InvoiceItem {
    InvoiceItem {
      id: Uuid::new_v4(),
      invoice_id,
      line_no: self.line_no,
      sku: self.sku,
      description: self.description,
      quantity: self.quantity,
      unit_price: self.unit_price,
      tax_rate: self.tax_rate,
      cpbs_abr: self.cpbs_abr,
      cpbs_cmp: self.cpbs_cmp,
      line_total: self.line_total,
      created_at,
    }
  }
}

/// Document totals, rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
  pub subtotal: Decimal,
  pub itbms_amount: Decimal,
  pub total_amount: Decimal,
}

/// Invoice as handed to the store. Series, number, status and the customer
/// row are resolved during the commit.
#[derive(Debug, Clone)]
pub struct NewInvoice {
  pub id: Uuid,
  pub emitter_id: Uuid,
  pub customer: CustomerDetails,
  pub document_kind: DocumentKind,
  pub issuing_point: String,
  pub environment: i16,
  pub emission_type: String,
  pub document_code: String,
  pub reference: Option<DocumentReference>,
  pub totals: InvoiceTotals,
  pub idempotency_key: Option<String>,
  pub items: Vec<NewInvoiceItem>,
}

// Invoice - the persisted fiscal document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
  pub id: Uuid,
  pub emitter_id: Uuid,
  pub series_id: Uuid,
  pub customer_id: Uuid,
  pub document_kind: DocumentKind,
  pub document_number: String,
  pub issuing_point: String,
  pub status: DocumentStatus,
  pub email_status: EmailStatus,
  pub reference: Option<DocumentReference>,
  pub authority: AuthorityResponse,
  pub environment: i16,
  pub emission_type: String,
  pub document_code: String,
  pub subtotal: Decimal,
  pub itbms_amount: Decimal,
  pub total_amount: Decimal,
  pub idempotency_key: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Invoice {
  pub fn totals(&self) -> InvoiceTotals {
    InvoiceTotals {
      subtotal: self.subtotal,
      itbms_amount: self.itbms_amount,
      total_amount: self.total_amount,
    }
  }

  pub fn self_link(&self) -> String {
    format!("/v1/invoices/{}", self.id)
  }

  pub fn files_link(&self) -> String {
    format!("/v1/invoices/{}/files", self.id)
  }
}

/// Invoice joined with the data needed to render or notify it.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
  pub invoice: Invoice,
  pub emitter: Emitter,
  pub customer: Customer,
  pub items: Vec<InvoiceItem>,
}

/// Freshly rendered artifact payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
  pub pdf: Vec<u8>,
  pub xml: Vec<u8>,
}

impl GeneratedArtifacts {
  pub fn get(&self, kind: ArtifactKind) -> &[u8] {
    match kind {
      ArtifactKind::Pdf => &self.pdf,
      ArtifactKind::Xml => &self.xml,
    }
  }
}

// Artifact metadata row; payloads live in blob storage or inline as fallback
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceArtifacts {
  pub id: Uuid,
  pub invoice_id: Uuid,
  pub pdf_data: Option<Vec<u8>>,
  pub xml_data: Option<Vec<u8>>,
  pub pdf_size: i64,
  pub xml_size: i64,
  pub pdf_url: Option<String>,
  pub xml_url: Option<String>,
  pub generated_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl InvoiceArtifacts {
  pub fn inline_data(&self, kind: ArtifactKind) -> Option<&[u8]> {
    let data = match kind {
      ArtifactKind::Pdf => self.pdf_data.as_deref(),
      ArtifactKind::Xml => self.xml_data.as_deref(),
    };
    data.filter(|d| !d.is_empty())
  }

  pub fn blob_key(&self, kind: ArtifactKind) -> Option<&str> {
    match kind {
      ArtifactKind::Pdf => self.pdf_url.as_deref(),
      ArtifactKind::Xml => self.xml_url.as_deref(),
    }
  }

  pub fn is_inline(&self) -> bool {
    self.pdf_url.is_none() && self.xml_url.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_customer_email_is_normalized() {
    let customer = Customer::new(
      Uuid::new_v4(),
      CustomerDetails {
        name: "Cliente".to_string(),
        email: "Cliente@Example.COM".to_string(),
        phone: None,
        address_line: None,
        ubi_code: None,
        tax_id: None,
      },
    );
    assert_eq!(customer.email, "cliente@example.com");
    assert!(customer.is_active);
  }

  #[test]
  fn test_inline_data_ignores_empty_payloads() {
    let now = Utc::now();
    let artifacts = InvoiceArtifacts {
      id: Uuid::new_v4(),
      invoice_id: Uuid::new_v4(),
      pdf_data: Some(Vec::new()),
      xml_data: Some(b"<factura/>".to_vec()),
      pdf_size: 0,
      xml_size: 10,
      pdf_url: Some("invoices/x/factura_x.pdf".to_string()),
      xml_url: None,
      generated_at: now,
      updated_at: now,
    };
    assert_eq!(artifacts.inline_data(ArtifactKind::Pdf), None);
    assert_eq!(
      artifacts.inline_data(ArtifactKind::Xml),
      Some(&b"<factura/>"[..])
    );
    assert_eq!(
      artifacts.blob_key(ArtifactKind::Pdf),
      Some("invoices/x/factura_x.pdf")
    );
    assert!(!artifacts.is_inline());
  }
}
