use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::errors::ProductError;
use crate::domain::invoice::value_objects::{LineItemDescription, TaxRate, UnitPrice};

const MAX_SKU_LENGTH: usize = 50;
const MAX_CPBS_LENGTH: usize = 10;

/// Catalog entry input, validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
  pub sku: String,
  pub description: LineItemDescription,
  pub cpbs_abr: Option<String>,
  pub cpbs_cmp: Option<String>,
  pub unit_price: UnitPrice,
  pub tax_rate: TaxRate,
}

impl NewProduct {
  pub fn new(
    sku: &str,
    description: String,
    cpbs_abr: Option<String>,
    cpbs_cmp: Option<String>,
    unit_price: Decimal,
    tax_rate: &str,
  ) -> Result<Self, ProductError> {
    let sku = sku.trim();
    if sku.is_empty() || sku.chars().count() > MAX_SKU_LENGTH {
      return Err(ProductError::InvalidField {
        field: "sku",
        message: format!("must be between 1 and {} characters", MAX_SKU_LENGTH),
      });
    }

    Ok(Self {
      sku: sku.to_string(),
      description: LineItemDescription::new(description)?,
      cpbs_abr: cpbs_code("cpbs_abr", cpbs_abr)?,
      cpbs_cmp: cpbs_code("cpbs_cmp", cpbs_cmp)?,
      unit_price: UnitPrice::new(unit_price)?,
      tax_rate: TaxRate::from_code(tax_rate)?,
    })
  }
}

// Blank codes are treated as absent
fn cpbs_code(field: &'static str, value: Option<String>) -> Result<Option<String>, ProductError> {
  match value.map(|v| v.trim().to_string()) {
    Some(code) if code.chars().count() > MAX_CPBS_LENGTH => Err(ProductError::InvalidField {
      field,
      message: format!("cannot exceed {} characters", MAX_CPBS_LENGTH),
    }),
    Some(code) if code.is_empty() => Ok(None),
    other => Ok(other),
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
  pub id: Uuid,
  pub emitter_id: Uuid,
  pub sku: String,
  pub description: String,
  pub cpbs_abr: Option<String>,
  pub cpbs_cmp: Option<String>,
  pub unit_price: Decimal,
  #[serde(serialize_with = "tax_rate_code")]
  pub tax_rate: TaxRate,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

fn tax_rate_code<S: serde::Serializer>(rate: &TaxRate, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(rate.code())
}

impl Product {
  pub fn new(emitter_id: Uuid, data: NewProduct) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      emitter_id,
      sku: data.sku,
      description: data.description.into_inner(),
      cpbs_abr: data.cpbs_abr,
      cpbs_cmp: data.cpbs_cmp,
      unit_price: data.unit_price.value(),
      tax_rate: data.tax_rate,
      is_active: true,
      created_at: now,
      updated_at: now,
    }
  }
}
