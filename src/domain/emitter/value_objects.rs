use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
  #[error("Invalid RUC: {0}")]
  InvalidRuc(String),
  #[error("Invalid branch code: {0}")]
  InvalidBranchCode(String),
  #[error("Invalid issuing point: {0}")]
  InvalidIssuingPoint(String),
  #[error("Invalid fiscal code: {0}")]
  InvalidFiscalCode(String),
  #[error("Invalid environment: {0}")]
  InvalidEnvironment(i16),
  #[error("Invalid API key format")]
  InvalidApiKey,
}

lazy_static! {
  static ref RUC_NUMBER: Regex = Regex::new(r"^[0-9A-Z]+(-[0-9A-Z]+)*$").unwrap();
  static ref RUC_DV: Regex = Regex::new(r"^[0-9]{1,2}$").unwrap();
  static ref BRANCH_CODE: Regex = Regex::new(r"^[0-9]{4}$").unwrap();
  static ref ISSUING_POINT: Regex = Regex::new(r"^[0-9]{3}$").unwrap();
  static ref FISCAL_CODE: Regex = Regex::new(r"^[0-9]{2}$").unwrap();
}

/// Taxpayer identifier: type, number and check digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruc {
  tipo: String,
  numero: String,
  dv: String,
}

impl Ruc {
  pub fn new(tipo: &str, numero: &str, dv: &str) -> Result<Self, ValueObjectError> {
    let tipo = tipo.trim();
    if !matches!(tipo, "1" | "2" | "3") {
      return Err(ValueObjectError::InvalidRuc(format!(
        "type must be 1, 2 or 3, got '{}'",
        tipo
      )));
    }
    let numero = numero.trim().to_uppercase();
    if !RUC_NUMBER.is_match(&numero) {
      return Err(ValueObjectError::InvalidRuc(format!(
        "malformed number '{}'",
        numero
      )));
    }
    let dv = dv.trim();
    if !RUC_DV.is_match(dv) {
      return Err(ValueObjectError::InvalidRuc(format!(
        "check digit must be 1-2 digits, got '{}'",
        dv
      )));
    }
    Ok(Self {
      tipo: tipo.to_string(),
      numero,
      dv: dv.to_string(),
    })
  }

  pub fn tipo(&self) -> &str {
    &self.tipo
  }

  pub fn numero(&self) -> &str {
    &self.numero
  }

  pub fn dv(&self) -> &str {
    &self.dv
  }

  /// `tipo-numero-dv-branch`, the form printed on documents and API responses.
  pub fn display_with_branch(&self, branch: &BranchCode) -> String {
    format!("{}-{}-{}-{}", self.tipo, self.numero, self.dv, branch.value())
  }
}

// Branch (sucursal) code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchCode(String);

impl BranchCode {
  pub fn new(value: &str) -> Result<Self, ValueObjectError> {
    let value = value.trim();
    if !BRANCH_CODE.is_match(value) {
      return Err(ValueObjectError::InvalidBranchCode(value.to_string()));
    }
    Ok(Self(value.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

// Issuing point (punto de facturación)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuingPoint(String);

impl IssuingPoint {
  pub fn new(value: &str) -> Result<Self, ValueObjectError> {
    let value = value.trim();
    if !ISSUING_POINT.is_match(value) {
      return Err(ValueObjectError::InvalidIssuingPoint(value.to_string()));
    }
    Ok(Self(value.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for IssuingPoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Two-digit fiscal code (emission type, document code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalCode(String);

impl FiscalCode {
  pub fn new(value: &str) -> Result<Self, ValueObjectError> {
    let value = value.trim();
    if !FISCAL_CODE.is_match(value) {
      return Err(ValueObjectError::InvalidFiscalCode(value.to_string()));
    }
    Ok(Self(value.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

// Authority environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
  Test,
  Production,
}

impl Environment {
  pub fn from_code(code: i16) -> Result<Self, ValueObjectError> {
    match code {
      1 => Ok(Environment::Test),
      2 => Ok(Environment::Production),
      other => Err(ValueObjectError::InvalidEnvironment(other)),
    }
  }

  pub fn code(&self) -> i16 {
    match self {
      Environment::Test => 1,
      Environment::Production => 2,
    }
  }
}

/// Value handed out by a series allocation; printed as ten zero-padded digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentNumber(i64);

impl DocumentNumber {
  pub fn new(value: i64) -> Self {
    Self(value)
  }

  pub fn value(&self) -> i64 {
    self.0
  }
}

impl fmt::Display for DocumentNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:010}", self.0)
  }
}

// ============================================================================
// API key (shown once, stored as a SHA-256 hash)
// ============================================================================

#[derive(Clone)]
pub struct ApiKeySecret(String);

impl ApiKeySecret {
  const PREFIX: &'static str = "dgi_";
  const KEY_LENGTH: usize = 32;

  pub fn generate() -> Self {
    use rand::Rng;

    let bytes: [u8; Self::KEY_LENGTH] = rand::rngs::OsRng.sample(rand::distributions::Standard);
    Self(format!("{}{}", Self::PREFIX, hex::encode(bytes)))
  }

  pub fn parse(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into();
    let body = value
      .strip_prefix(Self::PREFIX)
      .ok_or(ValueObjectError::InvalidApiKey)?;
    if body.len() != Self::KEY_LENGTH * 2 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
      return Err(ValueObjectError::InvalidApiKey);
    }
    Ok(Self(value))
  }

  pub fn hash(&self) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(self.0.as_bytes());
    hex::encode(hasher.finalize())
  }

  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for ApiKeySecret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("ApiKeySecret([REDACTED])")
  }
}
