use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::invoice::{
  CustomerDetails, DocumentKind, DocumentReference, Invoice, InvoiceError, InvoiceRequest,
  InvoiceService, LineItemDescription, LineRequest, Overrides, Payment, Quantity, UnitPrice,
};

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDto {
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub address_line: Option<String>,
  pub ubi_code: Option<String>,
  pub tax_id: Option<String>,
}

impl From<CustomerDto> for CustomerDetails {
  fn from(dto: CustomerDto) -> Self {
    CustomerDetails {
      name: dto.name,
      email: dto.email,
      phone: dto.phone,
      address_line: dto.address_line,
      ubi_code: dto.ubi_code,
      tax_id: dto.tax_id,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceItemDto {
  pub sku: Option<String>,
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub tax_rate: String,
  pub cpbs_abr: Option<String>,
  pub cpbs_cmp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceDto {
  pub cufe: String,
  pub nrodf: String,
  pub pto_fac_df: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInvoiceCommand {
  pub emitter_id: Uuid,
  pub document_type: String,
  pub reference: Option<ReferenceDto>,
  pub customer: CustomerDto,
  pub items: Vec<CreateInvoiceItemDto>,
  pub payment_method: String,
  pub payment_amount: Decimal,
  pub pto_fac_df: Option<String>,
  pub i_tp_emis: Option<String>,
  pub i_doc: Option<String>,
  pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsDto {
  pub net: Decimal,
  pub itbms: Decimal,
  pub total: Decimal,
}

impl From<&Invoice> for TotalsDto {
  fn from(invoice: &Invoice) -> Self {
    TotalsDto {
      net: invoice.subtotal,
      itbms: invoice.itbms_amount,
      total: invoice.total_amount,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinksDto {
  #[serde(rename = "self")]
  pub self_link: String,
  pub files: String,
}

impl From<&Invoice> for LinksDto {
  fn from(invoice: &Invoice) -> Self {
    LinksDto {
      self_link: invoice.self_link(),
      files: invoice.files_link(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateInvoiceResponse {
  pub invoice_id: Uuid,
  pub status: String,
  pub document_type: String,
  pub emitter_ruc: String,
  pub pto_fac_df: String,
  pub nrodf: String,
  pub totals: TotalsDto,
  pub links: LinksDto,
}

pub struct CreateInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl CreateInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: CreateInvoiceCommand,
  ) -> Result<CreateInvoiceResponse, InvoiceError> {
    let document_kind = DocumentKind::from_str(&command.document_type)?;
    let payment = Payment::new(&command.payment_method, command.payment_amount)?;

    let items = command
      .items
      .into_iter()
      .map(|item| {
        Ok(LineRequest {
          sku: item.sku,
          description: LineItemDescription::new(item.description)?,
          quantity: Quantity::new(item.quantity)?,
          unit_price: UnitPrice::new(item.unit_price)?,
          tax_rate_code: item.tax_rate,
          cpbs_abr: item.cpbs_abr,
          cpbs_cmp: item.cpbs_cmp,
        })
      })
      .collect::<Result<Vec<_>, InvoiceError>>()?;

    let reference = command.reference.map(|r| DocumentReference {
      cufe: r.cufe,
      number: r.nrodf,
      issuing_point: r.pto_fac_df,
    });

    let issued = self
      .invoice_service
      .create_invoice(InvoiceRequest {
        emitter_id: command.emitter_id,
        document_kind,
        reference,
        customer: command.customer.into(),
        items,
        payment,
        overrides: Overrides {
          issuing_point: command.pto_fac_df,
          emission_type: command.i_tp_emis,
          document_code: command.i_doc,
        },
        idempotency_key: command.idempotency_key,
      })
      .await?;

    // Artifacts and email finish in the background
    let invoice = issued.invoice;
    Ok(CreateInvoiceResponse {
      invoice_id: invoice.id,
      status: invoice.status.as_str().to_string(),
      document_type: invoice.document_kind.as_str().to_string(),
      emitter_ruc: issued.emitter.ruc_display(),
      pto_fac_df: invoice.issuing_point.clone(),
      nrodf: invoice.document_number.clone(),
      totals: TotalsDto::from(&invoice),
      links: LinksDto::from(&invoice),
    })
  }
}
