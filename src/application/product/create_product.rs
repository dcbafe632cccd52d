use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::product::{NewProduct, ProductError, ProductService};

#[derive(Debug, Clone)]
pub struct CreateProductCommand {
  pub emitter_id: Uuid,
  pub sku: String,
  pub description: String,
  pub cpbs_abr: Option<String>,
  pub cpbs_cmp: Option<String>,
  pub unit_price: Decimal,
  pub tax_rate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateProductResponse {
  pub id: Uuid,
}

pub struct CreateProductUseCase {
  product_service: Arc<ProductService>,
}

impl CreateProductUseCase {
  pub fn new(product_service: Arc<ProductService>) -> Self {
    Self { product_service }
  }

  pub async fn execute(
    &self,
    command: CreateProductCommand,
  ) -> Result<CreateProductResponse, ProductError> {
    let data = NewProduct::new(
      &command.sku,
      command.description,
      command.cpbs_abr,
      command.cpbs_cmp,
      command.unit_price,
      &command.tax_rate,
    )?;

    let product = self
      .product_service
      .create_product(command.emitter_id, data)
      .await?;

    Ok(CreateProductResponse { id: product.id })
  }
}
