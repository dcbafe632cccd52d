use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::value_objects::{BranchCode, Environment, FiscalCode, IssuingPoint, Ruc};
use crate::domain::invoice::value_objects::DocumentKind;

/// Optional presentation metadata used on rendered documents and emails.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Branding {
  pub logo_url: Option<String>,
  pub primary_color: Option<String>,
  pub footer_html: Option<String>,
}

// Emitter - business entity issuing fiscal documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emitter {
  pub id: Uuid,
  pub name: String,
  pub company_code: String,
  pub ruc: Ruc,
  pub branch: BranchCode,
  pub default_issuing_point: IssuingPoint,
  pub environment: Environment,
  pub default_emission_type: FiscalCode,
  pub default_document_code: FiscalCode,
  pub email: String,
  pub phone: Option<String>,
  pub address_line: Option<String>,
  pub ubi_code: Option<String>,
  pub branding: Branding,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Data needed to register a new emitter.
#[derive(Debug, Clone)]
pub struct NewEmitter {
  pub name: String,
  pub company_code: String,
  pub ruc: Ruc,
  pub branch: BranchCode,
  pub default_issuing_point: IssuingPoint,
  pub environment: Environment,
  pub default_emission_type: FiscalCode,
  pub default_document_code: FiscalCode,
  pub email: String,
  pub phone: Option<String>,
  pub address_line: Option<String>,
  pub ubi_code: Option<String>,
  pub branding: Branding,
}

impl Emitter {
  pub fn new(data: NewEmitter) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      name: data.name,
      company_code: data.company_code,
      ruc: data.ruc,
      branch: data.branch,
      default_issuing_point: data.default_issuing_point,
      environment: data.environment,
      default_emission_type: data.default_emission_type,
      default_document_code: data.default_document_code,
      email: data.email,
      phone: data.phone,
      address_line: data.address_line,
      ubi_code: data.ubi_code,
      branding: data.branding,
      is_active: true,
      created_at: now,
      updated_at: now,
    }
  }

  /// RUC as printed on documents, including the branch.
  pub fn ruc_display(&self) -> String {
    self.ruc.display_with_branch(&self.branch)
  }
}

// Series - numbering scope for (emitter, issuing point, document kind)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
  pub id: Uuid,
  pub emitter_id: Uuid,
  pub issuing_point: IssuingPoint,
  pub document_kind: DocumentKind,
  pub next_number: i64,
  pub issued_count: i64,
  pub authorized_count: i64,
  pub rejected_count: i64,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Series {
  pub fn new(emitter_id: Uuid, issuing_point: IssuingPoint, document_kind: DocumentKind) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      emitter_id,
      issuing_point,
      document_kind,
      next_number: 1,
      issued_count: 0,
      authorized_count: 0,
      rejected_count: 0,
      is_active: true,
      created_at: now,
      updated_at: now,
    }
  }

  /// Highest number handed out so far, zero for an unused series.
  pub fn last_assigned(&self) -> i64 {
    self.next_number - 1
  }
}

// API key bound to one emitter
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKey {
  pub id: Uuid,
  pub emitter_id: Uuid,
  pub name: String,
  pub key_hash: String,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub last_used_at: Option<DateTime<Utc>>,
}

impl ApiKey {
  pub fn new(emitter_id: Uuid, name: String, key_hash: String) -> Self {
    Self {
      id: Uuid::new_v4(),
      emitter_id,
      name,
      key_hash,
      is_active: true,
      created_at: Utc::now(),
      last_used_at: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_series_starts_at_one() {
    let series = Series::new(
      Uuid::new_v4(),
      IssuingPoint::new("001").unwrap(),
      DocumentKind::Invoice,
    );
    assert_eq!(series.next_number, 1);
    assert_eq!(series.last_assigned(), 0);
    assert_eq!(series.issued_count, 0);
    assert!(series.is_active);
  }
}
