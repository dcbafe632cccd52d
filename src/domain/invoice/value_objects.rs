use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
  #[error("Invalid document kind: {0}")]
  InvalidDocumentKind(String),
  #[error("Invalid document status: {0}")]
  InvalidDocumentStatus(String),
  #[error("Invalid email status: {0}")]
  InvalidEmailStatus(String),
  #[error("Invalid tax rate: {0}")]
  InvalidTaxRate(String),
  #[error("Invalid payment method: {0}")]
  InvalidPaymentMethod(String),
  #[error("Invalid amount: {0}")]
  InvalidAmount(String),
  #[error("Invalid quantity: {0}")]
  InvalidQuantity(String),
  #[error("Invalid line item description: {0}")]
  InvalidDescription(String),
  #[error("Invalid file type: {0}")]
  InvalidArtifactKind(String),
  #[error("Invalid retry checkpoint: {0}")]
  InvalidCheckpoint(String),
}

/// Largest amount the `NUMERIC(14, 2)` money columns hold.
pub const MAX_MONEY: Decimal = dec!(999999999999.99);
/// Bound of `invoice_items.qty NUMERIC(18, 4)`.
pub const MAX_QUANTITY: Decimal = dec!(99999999999999.9999);
/// Bound of `invoice_items.unit_price NUMERIC(18, 6)`.
pub const MAX_UNIT_PRICE: Decimal = dec!(999999999999.999999);

/// Rounds a monetary amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
  amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

// Document Kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
  Invoice,
  ImportInvoice,
  ExportInvoice,
  CreditNote,
  DebitNote,
  ZoneFranca,
  Reembolso,
  ForeignInvoice,
}

impl DocumentKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      DocumentKind::Invoice => "invoice",
      DocumentKind::ImportInvoice => "import_invoice",
      DocumentKind::ExportInvoice => "export_invoice",
      DocumentKind::CreditNote => "credit_note",
      DocumentKind::DebitNote => "debit_note",
      DocumentKind::ZoneFranca => "zone_franca",
      DocumentKind::Reembolso => "reembolso",
      DocumentKind::ForeignInvoice => "foreign_invoice",
    }
  }

  /// Printable title used on rendered documents.
  pub fn label(&self) -> &'static str {
    match self {
      DocumentKind::Invoice => "Factura",
      DocumentKind::ImportInvoice => "Factura de Importación",
      DocumentKind::ExportInvoice => "Factura de Exportación",
      DocumentKind::CreditNote => "Nota de Crédito",
      DocumentKind::DebitNote => "Nota de Débito",
      DocumentKind::ZoneFranca => "Factura de Zona Franca",
      DocumentKind::Reembolso => "Reembolso",
      DocumentKind::ForeignInvoice => "Factura de Operación Extranjera",
    }
  }

  /// Credit and debit notes must point at the document they correct.
  pub fn requires_reference(&self) -> bool {
    matches!(self, DocumentKind::CreditNote | DocumentKind::DebitNote)
  }
}

impl FromStr for DocumentKind {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "invoice" => Ok(DocumentKind::Invoice),
      "import_invoice" => Ok(DocumentKind::ImportInvoice),
      "export_invoice" => Ok(DocumentKind::ExportInvoice),
      "credit_note" => Ok(DocumentKind::CreditNote),
      "debit_note" => Ok(DocumentKind::DebitNote),
      "zone_franca" => Ok(DocumentKind::ZoneFranca),
      "reembolso" => Ok(DocumentKind::Reembolso),
      "foreign_invoice" => Ok(DocumentKind::ForeignInvoice),
      _ => Err(ValueObjectError::InvalidDocumentKind(s.to_string())),
    }
  }
}

impl fmt::Display for DocumentKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// Document Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
  Received,
  Preparing,
  SendingToPac,
  Authorized,
  Rejected,
  Error,
}

impl DocumentStatus {
  /// Forward moves driven by the authority workflow. Leaving `Error` is only
  /// possible through [`RetryCheckpoint`].
  pub fn can_transition_to(&self, new_status: DocumentStatus) -> bool {
    match (self, new_status) {
      (DocumentStatus::Received, DocumentStatus::Preparing) => true,
      (DocumentStatus::Preparing, DocumentStatus::SendingToPac) => true,
      (DocumentStatus::SendingToPac, DocumentStatus::Authorized) => true,
      (DocumentStatus::SendingToPac, DocumentStatus::Rejected) => true,
      (DocumentStatus::Received, DocumentStatus::Error) => true,
      (DocumentStatus::Preparing, DocumentStatus::Error) => true,
      (DocumentStatus::SendingToPac, DocumentStatus::Error) => true,
      _ => false,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, DocumentStatus::Authorized | DocumentStatus::Rejected)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      DocumentStatus::Received => "RECEIVED",
      DocumentStatus::Preparing => "PREPARING",
      DocumentStatus::SendingToPac => "SENDING_TO_PAC",
      DocumentStatus::Authorized => "AUTHORIZED",
      DocumentStatus::Rejected => "REJECTED",
      DocumentStatus::Error => "ERROR",
    }
  }
}

impl FromStr for DocumentStatus {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "RECEIVED" => Ok(DocumentStatus::Received),
      "PREPARING" => Ok(DocumentStatus::Preparing),
      "SENDING_TO_PAC" => Ok(DocumentStatus::SendingToPac),
      "AUTHORIZED" => Ok(DocumentStatus::Authorized),
      "REJECTED" => Ok(DocumentStatus::Rejected),
      "ERROR" => Ok(DocumentStatus::Error),
      _ => Err(ValueObjectError::InvalidDocumentStatus(s.to_string())),
    }
  }
}

impl fmt::Display for DocumentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Named step a failed document resumes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryCheckpoint {
  Prepare,
  #[default]
  SendToPac,
}

impl RetryCheckpoint {
  pub fn as_str(&self) -> &'static str {
    match self {
      RetryCheckpoint::Prepare => "prepare",
      RetryCheckpoint::SendToPac => "send_to_pac",
    }
  }

  /// Status the document re-enters when resuming from this checkpoint.
  pub fn resume_status(&self) -> DocumentStatus {
    match self {
      RetryCheckpoint::Prepare => DocumentStatus::Preparing,
      RetryCheckpoint::SendToPac => DocumentStatus::SendingToPac,
    }
  }
}

impl FromStr for RetryCheckpoint {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "prepare" => Ok(RetryCheckpoint::Prepare),
      "send_to_pac" => Ok(RetryCheckpoint::SendToPac),
      _ => Err(ValueObjectError::InvalidCheckpoint(s.to_string())),
    }
  }
}

// Email Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailStatus {
  Pending,
  Sent,
  Failed,
  Retrying,
}

impl EmailStatus {
  pub fn can_transition_to(&self, new_status: EmailStatus) -> bool {
    match (self, new_status) {
      (EmailStatus::Pending, EmailStatus::Sent) => true,
      (EmailStatus::Pending, EmailStatus::Failed) => true,
      (EmailStatus::Sent, EmailStatus::Retrying) => true,
      (EmailStatus::Failed, EmailStatus::Retrying) => true,
      (EmailStatus::Retrying, EmailStatus::Sent) => true,
      (EmailStatus::Retrying, EmailStatus::Failed) => true,
      _ => false,
    }
  }

  /// Status recorded when a new delivery attempt is requested.
  pub fn next_attempt(&self) -> EmailStatus {
    match self {
      EmailStatus::Sent | EmailStatus::Failed => EmailStatus::Retrying,
      other => *other,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      EmailStatus::Pending => "PENDING",
      EmailStatus::Sent => "SENT",
      EmailStatus::Failed => "FAILED",
      EmailStatus::Retrying => "RETRYING",
    }
  }
}

impl FromStr for EmailStatus {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "PENDING" => Ok(EmailStatus::Pending),
      "SENT" => Ok(EmailStatus::Sent),
      "FAILED" => Ok(EmailStatus::Failed),
      "RETRYING" => Ok(EmailStatus::Retrying),
      _ => Err(ValueObjectError::InvalidEmailStatus(s.to_string())),
    }
  }
}

impl fmt::Display for EmailStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ITBMS tax rate, identified by its fiscal code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxRate {
  Exempt,
  Seven,
  Ten,
  Fifteen,
}

impl TaxRate {
  pub fn from_code(code: &str) -> Result<Self, ValueObjectError> {
    match code {
      "00" => Ok(TaxRate::Exempt),
      "01" => Ok(TaxRate::Seven),
      "02" => Ok(TaxRate::Ten),
      "03" => Ok(TaxRate::Fifteen),
      _ => Err(ValueObjectError::InvalidTaxRate(code.to_string())),
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      TaxRate::Exempt => "00",
      TaxRate::Seven => "01",
      TaxRate::Ten => "02",
      TaxRate::Fifteen => "03",
    }
  }

  pub fn rate(&self) -> Decimal {
    match self {
      TaxRate::Exempt => Decimal::ZERO,
      TaxRate::Seven => dec!(0.07),
      TaxRate::Ten => dec!(0.10),
      TaxRate::Fifteen => dec!(0.15),
    }
  }
}

impl FromStr for TaxRate {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    TaxRate::from_code(s)
  }
}

// Payment method codes 01..10
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
  Cash,
  Check,
  BankTransfer,
  CreditCard,
  DebitCard,
  Compensation,
  Barter,
  CreditSale,
  PrepaidCard,
  Mixed,
}

impl PaymentMethod {
  pub fn from_code(code: &str) -> Result<Self, ValueObjectError> {
    match code {
      "01" => Ok(PaymentMethod::Cash),
      "02" => Ok(PaymentMethod::Check),
      "03" => Ok(PaymentMethod::BankTransfer),
      "04" => Ok(PaymentMethod::CreditCard),
      "05" => Ok(PaymentMethod::DebitCard),
      "06" => Ok(PaymentMethod::Compensation),
      "07" => Ok(PaymentMethod::Barter),
      "08" => Ok(PaymentMethod::CreditSale),
      "09" => Ok(PaymentMethod::PrepaidCard),
      "10" => Ok(PaymentMethod::Mixed),
      _ => Err(ValueObjectError::InvalidPaymentMethod(code.to_string())),
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      PaymentMethod::Cash => "01",
      PaymentMethod::Check => "02",
      PaymentMethod::BankTransfer => "03",
      PaymentMethod::CreditCard => "04",
      PaymentMethod::DebitCard => "05",
      PaymentMethod::Compensation => "06",
      PaymentMethod::Barter => "07",
      PaymentMethod::CreditSale => "08",
      PaymentMethod::PrepaidCard => "09",
      PaymentMethod::Mixed => "10",
    }
  }
}

// Declared payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
  pub method: PaymentMethod,
  pub amount: Decimal,
}

impl Payment {
  pub fn new(method_code: &str, amount: Decimal) -> Result<Self, ValueObjectError> {
    let method = PaymentMethod::from_code(method_code)?;
    if amount <= Decimal::ZERO {
      return Err(ValueObjectError::InvalidAmount(
        "Payment amount must be positive".to_string(),
      ));
    }
    Ok(Self { method, amount })
  }
}

// Quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value <= Decimal::ZERO {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity must be positive".to_string(),
      ));
    }
    if value.normalize().scale() > 4 {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity cannot have more than 4 decimal places".to_string(),
      ));
    }
    if value > MAX_QUANTITY {
      return Err(ValueObjectError::InvalidQuantity(format!(
        "Quantity cannot exceed {}",
        MAX_QUANTITY
      )));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }
}

// Unit price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPrice(Decimal);

impl UnitPrice {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value <= Decimal::ZERO {
      return Err(ValueObjectError::InvalidAmount(
        "Unit price must be positive".to_string(),
      ));
    }
    if value.normalize().scale() > 6 {
      return Err(ValueObjectError::InvalidAmount(
        "Unit price cannot have more than 6 decimal places".to_string(),
      ));
    }
    if value > MAX_UNIT_PRICE {
      return Err(ValueObjectError::InvalidAmount(format!(
        "Unit price cannot exceed {}",
        MAX_UNIT_PRICE
      )));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }
}

// Line Item Description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDescription(String);

impl LineItemDescription {
  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot be empty".to_string(),
      ));
    }
    if trimmed.chars().count() > 500 {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot exceed 500 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

/// Generated artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
  Pdf,
  Xml,
}

impl ArtifactKind {
  pub fn extension(&self) -> &'static str {
    match self {
      ArtifactKind::Pdf => "pdf",
      ArtifactKind::Xml => "xml",
    }
  }

  pub fn content_type(&self) -> &'static str {
    match self {
      ArtifactKind::Pdf => "application/pdf",
      ArtifactKind::Xml => "application/xml",
    }
  }

  /// Download name, `factura_{id}.{ext}`.
  pub fn file_name(&self, invoice_id: uuid::Uuid) -> String {
    format!("factura_{}.{}", invoice_id, self.extension())
  }

  /// Object key inside the artifact bucket.
  pub fn blob_key(&self, invoice_id: uuid::Uuid) -> String {
    format!("invoices/{}/{}", invoice_id, self.file_name(invoice_id))
  }
}

impl FromStr for ArtifactKind {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "pdf" => Ok(ArtifactKind::Pdf),
      "xml" => Ok(ArtifactKind::Xml),
      _ => Err(ValueObjectError::InvalidArtifactKind(s.to_string())),
    }
  }
}

impl fmt::Display for ArtifactKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.extension())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  #[test]
  fn test_tax_rate_codes() {
    assert_eq!(TaxRate::from_code("00").unwrap().rate(), dec!(0));
    assert_eq!(TaxRate::from_code("01").unwrap().rate(), dec!(0.07));
    assert_eq!(TaxRate::from_code("02").unwrap().rate(), dec!(0.10));
    assert_eq!(TaxRate::from_code("03").unwrap().rate(), dec!(0.15));
    assert_eq!(
      TaxRate::from_code("99"),
      Err(ValueObjectError::InvalidTaxRate("99".to_string()))
    );
  }

  #[test]
  fn test_document_status_forward_transitions() {
    use DocumentStatus::*;
    assert!(Received.can_transition_to(Preparing));
    assert!(Preparing.can_transition_to(SendingToPac));
    assert!(SendingToPac.can_transition_to(Authorized));
    assert!(SendingToPac.can_transition_to(Rejected));
    assert!(SendingToPac.can_transition_to(Error));
  }

  #[test]
  fn test_document_status_never_regresses() {
    use DocumentStatus::*;
    assert!(!Preparing.can_transition_to(Received));
    assert!(!SendingToPac.can_transition_to(Preparing));
    assert!(!Authorized.can_transition_to(Error));
    assert!(!Rejected.can_transition_to(SendingToPac));
    // ERROR only leaves through an explicit retry
    assert!(!Error.can_transition_to(SendingToPac));
    assert_eq!(
      RetryCheckpoint::SendToPac.resume_status(),
      DocumentStatus::SendingToPac
    );
  }

  #[test]
  fn test_document_status_round_trips_through_strings() {
    for status in [
      DocumentStatus::Received,
      DocumentStatus::SendingToPac,
      DocumentStatus::Error,
    ] {
      assert_eq!(status.as_str().parse::<DocumentStatus>().unwrap(), status);
    }
    assert!("UNKNOWN".parse::<DocumentStatus>().is_err());
  }

  #[test]
  fn test_email_status_machine() {
    use EmailStatus::*;
    assert!(Pending.can_transition_to(Sent));
    assert!(Pending.can_transition_to(Failed));
    assert!(Failed.can_transition_to(Retrying));
    assert!(Retrying.can_transition_to(Sent));
    assert!(!Sent.can_transition_to(Pending));
    assert_eq!(Failed.next_attempt(), Retrying);
    assert_eq!(Pending.next_attempt(), Pending);
  }

  #[test]
  fn test_payment_requires_known_method_and_positive_amount() {
    assert!(Payment::new("02", dec!(26.40)).is_ok());
    assert!(Payment::new("11", dec!(26.40)).is_err());
    assert!(Payment::new("01", dec!(0)).is_err());
  }

  #[test]
  fn test_quantity_and_price_must_be_positive() {
    assert!(Quantity::new(dec!(1.5)).is_ok());
    assert!(Quantity::new(dec!(0)).is_err());
    assert!(Quantity::new(dec!(1.00001)).is_err());
    assert!(UnitPrice::new(dec!(-1)).is_err());
  }

  #[test]
  fn test_quantity_and_price_fit_their_columns() {
    assert!(Quantity::new(MAX_QUANTITY).is_ok());
    assert!(Quantity::new(dec!(100000000000000)).is_err());

    assert!(UnitPrice::new(dec!(0.000001)).is_ok());
    assert!(UnitPrice::new(dec!(0.0000001)).is_err());
    assert!(UnitPrice::new(dec!(1.1234567)).is_err());
    assert!(UnitPrice::new(MAX_UNIT_PRICE).is_ok());
    assert!(UnitPrice::new(dec!(1000000000000)).is_err());
  }

  #[test]
  fn test_artifact_naming() {
    let id = Uuid::nil();
    assert_eq!(
      ArtifactKind::Pdf.blob_key(id),
      format!("invoices/{id}/factura_{id}.pdf")
    );
    assert_eq!(ArtifactKind::Xml.file_name(id), format!("factura_{id}.xml"));
    assert_eq!(ArtifactKind::Xml.content_type(), "application/xml");
    assert!("doc".parse::<ArtifactKind>().is_err());
  }

  #[test]
  fn test_round_money() {
    assert_eq!(round_money(dec!(1.405)), dec!(1.41));
    assert_eq!(round_money(dec!(1.404)), dec!(1.40));
  }

  #[test]
  fn test_reference_required_only_for_notes() {
    assert!(DocumentKind::CreditNote.requires_reference());
    assert!(DocumentKind::DebitNote.requires_reference());
    assert!(!DocumentKind::Invoice.requires_reference());
    assert_eq!(
      "zone_franca".parse::<DocumentKind>().unwrap(),
      DocumentKind::ZoneFranca
    );
  }
}
