use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::invoice::value_objects::TaxRate;
use crate::domain::product::{Product, ProductError, ProductRepository};

const PRODUCT_COLUMNS: &str = r#"
  id, emitter_id, sku, description, cpbs_abr, cpbs_cmp, unit_price, tax_rate,
  is_active, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct ProductRow {
  id: Uuid,
  emitter_id: Uuid,
  sku: String,
  description: String,
  cpbs_abr: Option<String>,
  cpbs_cmp: Option<String>,
  unit_price: Decimal,
  tax_rate: String,
  is_active: bool,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
  type Error = ProductError;

  fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
    Ok(Product {
      id: row.id,
      emitter_id: row.emitter_id,
      sku: row.sku,
      description: row.description,
      cpbs_abr: row.cpbs_abr,
      cpbs_cmp: row.cpbs_cmp,
      unit_price: row.unit_price,
      tax_rate: TaxRate::from_code(&row.tax_rate)?,
      is_active: row.is_active,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

pub struct PostgresProductRepository {
  pool: PgPool,
}

impl PostgresProductRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
  async fn create(&self, product: Product) -> Result<Product, ProductError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
      r#"
      INSERT INTO products (
        id, emitter_id, sku, description, cpbs_abr, cpbs_cmp, unit_price, tax_rate,
        is_active, created_at, updated_at
      )
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
      RETURNING {}
      "#,
      PRODUCT_COLUMNS
    ))
    .bind(product.id)
    .bind(product.emitter_id)
    .bind(&product.sku)
    .bind(&product.description)
    .bind(&product.cpbs_abr)
    .bind(&product.cpbs_cmp)
    .bind(product.unit_price)
    .bind(product.tax_rate.code())
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| {
      if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23505")
          && db_err.constraint() == Some("uq_products_emitter_sku")
        {
          return ProductError::SkuAlreadyExists(product.sku.clone());
        }
      }
      ProductError::Database(e)
    })?;

    row.try_into()
  }

  async fn find_by_sku(
    &self,
    emitter_id: Uuid,
    sku: &str,
  ) -> Result<Option<Product>, ProductError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
      "SELECT {} FROM products WHERE emitter_id = $1 AND sku = $2 AND is_active",
      PRODUCT_COLUMNS
    ))
    .bind(emitter_id)
    .bind(sku)
    .fetch_optional(&self.pool)
    .await?;

    row.map(|r| r.try_into()).transpose()
  }
}
