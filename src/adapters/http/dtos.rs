use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

lazy_static! {
  static ref ISSUING_POINT_RE: Regex = Regex::new(r"^[0-9]{3}$").unwrap();
  static ref FISCAL_CODE_RE: Regex = Regex::new(r"^[0-9]{2}$").unwrap();
  static ref BRANCH_CODE_RE: Regex = Regex::new(r"^[0-9]{4}$").unwrap();
}

fn positive(value: &Decimal) -> Result<(), ValidationError> {
  if *value <= Decimal::ZERO {
    return Err(ValidationError::new("positive").with_message("must be greater than zero".into()));
  }
  Ok(())
}

fn email_list(values: &[String]) -> Result<(), ValidationError> {
  use validator::ValidateEmail;

  if values.iter().all(|v| v.validate_email()) {
    Ok(())
  } else {
    Err(ValidationError::new("email").with_message("contains an invalid email address".into()))
  }
}

// ============================================================================
// Invoices
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerRequest {
  #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
  pub name: String,

  #[validate(email(message = "Invalid email format"))]
  pub email: String,

  #[validate(length(max = 50))]
  pub phone: Option<String>,

  #[validate(length(max = 500))]
  pub address_line: Option<String>,

  #[validate(length(max = 20))]
  pub ubi_code: Option<String>,

  #[validate(length(max = 50))]
  pub tax_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InvoiceItemRequest {
  #[validate(length(max = 50))]
  pub sku: Option<String>,

  #[validate(length(min = 1, max = 500, message = "Description is required"))]
  pub description: String,

  #[validate(custom(function = "positive"))]
  pub quantity: Decimal,

  #[validate(custom(function = "positive"))]
  pub unit_price: Decimal,

  /// ITBMS code `00`..`03`; unknown codes are reported per line by the calculator
  #[validate(length(equal = 2, message = "Tax rate must be a two-digit code"))]
  pub tax_rate: String,

  pub cpbs_abr: Option<String>,
  pub cpbs_cmp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentRequest {
  #[validate(regex(path = *FISCAL_CODE_RE, message = "Payment method must be a two-digit code"))]
  pub method: String,

  #[validate(custom(function = "positive"))]
  pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReferenceRequest {
  #[validate(length(min = 1, message = "CUFE is required"))]
  pub cufe: String,

  #[validate(length(min = 1, max = 10))]
  pub nrodf: String,

  #[validate(regex(path = *ISSUING_POINT_RE, message = "Issuing point must be 3 digits"))]
  pub pto_fac_df: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
  #[validate(length(min = 1, message = "Document type is required"))]
  pub document_type: String,

  #[validate(nested)]
  pub reference: Option<ReferenceRequest>,

  #[validate(nested)]
  pub customer: CustomerRequest,

  #[validate(length(min = 1, message = "At least one item is required"), nested)]
  pub items: Vec<InvoiceItemRequest>,

  #[validate(nested)]
  pub payment: PaymentRequest,

  #[validate(regex(path = *ISSUING_POINT_RE, message = "Issuing point must be 3 digits"))]
  pub pto_fac_df: Option<String>,

  #[validate(regex(path = *FISCAL_CODE_RE, message = "Emission type must be a two-digit code"))]
  pub i_tp_emis: Option<String>,

  #[validate(regex(path = *FISCAL_CODE_RE, message = "Document code must be a two-digit code"))]
  pub i_doc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ResendEmailRequest {
  #[validate(email(message = "Invalid email format"))]
  pub to: Option<String>,

  #[serde(default)]
  #[validate(custom(function = "email_list"))]
  pub cc: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetryRequest {
  pub resume_from: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateStatusRequest {
  #[validate(length(min = 1, message = "Status is required"))]
  pub status: String,
  pub cufe: Option<String>,
  #[validate(url(message = "Invalid CUFE URL"))]
  pub url_cufe: Option<String>,
  pub xml_response: Option<String>,
  pub xml_fe: Option<String>,
  pub xml_protocolo: Option<String>,
  pub cafe_pdf_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesQuery {
  pub file_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicFileQuery {
  pub file_type: String,
}

// ============================================================================
// Emitters and series
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RucRequest {
  #[validate(length(min = 1, max = 1))]
  pub tipo: String,

  #[validate(length(min = 1, max = 30))]
  pub numero: String,

  #[validate(length(min = 1, max = 2))]
  pub dv: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandingRequest {
  pub logo_url: Option<String>,
  pub primary_color: Option<String>,
  pub footer_html: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmitterRequest {
  #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
  pub name: String,

  #[validate(length(min = 2, max = 50, message = "Company code must be between 2 and 50 characters"))]
  pub company_code: String,

  #[validate(nested)]
  pub ruc: RucRequest,

  #[validate(regex(path = *BRANCH_CODE_RE, message = "Branch code must be 4 digits"))]
  pub suc_em: String,

  #[validate(regex(path = *ISSUING_POINT_RE, message = "Issuing point must be 3 digits"))]
  pub pto_fac_default: String,

  #[validate(range(min = 1, max = 2, message = "Environment must be 1 (test) or 2 (production)"))]
  pub iamb: i16,

  #[validate(regex(path = *FISCAL_CODE_RE))]
  pub itpemis_default: String,

  #[validate(regex(path = *FISCAL_CODE_RE))]
  pub idoc_default: String,

  #[validate(email(message = "Invalid email format"))]
  pub email: String,

  pub phone: Option<String>,
  pub address_line: Option<String>,
  pub ubi_code: Option<String>,

  #[serde(default)]
  pub branding: BrandingRequest,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSeriesRequest {
  #[validate(regex(path = *ISSUING_POINT_RE, message = "Issuing point must be 3 digits"))]
  pub pto_fac_df: String,

  #[validate(length(min = 1, message = "Document kind is required"))]
  pub doc_kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListSeriesQuery {
  pub page: Option<usize>,
  pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductRequest {
  #[validate(length(min = 1, max = 50, message = "SKU must be between 1 and 50 characters"))]
  pub sku: String,

  #[validate(length(min = 1, max = 500, message = "Description is required"))]
  pub description: String,

  #[validate(length(max = 10))]
  pub cpbs_abr: Option<String>,

  #[validate(length(max = 10))]
  pub cpbs_cmp: Option<String>,

  #[validate(custom(function = "positive"))]
  pub unit_price: Decimal,

  #[validate(regex(path = *FISCAL_CODE_RE, message = "Tax rate must be a two-digit code"))]
  pub tax_rate: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApiKeyRequest {
  #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
  pub name: String,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
  pub status: &'static str,
  pub database: &'static str,
}

/// One offending field in an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
  pub field: String,
  pub issue: String,
}

impl FieldIssue {
  pub fn new(field: &str, issue: impl Into<String>) -> Self {
    Self {
      field: field.to_string(),
      issue: issue.into(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
  pub code: &'static str,
  pub message: String,
  pub details: Vec<FieldIssue>,
}

/// Error envelope: `{"error": {"code", "message", "details"}}`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
  pub error: ErrorBody,
}
