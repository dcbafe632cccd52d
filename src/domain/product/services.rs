use std::sync::Arc;
use uuid::Uuid;

use super::entities::{NewProduct, Product};
use super::errors::ProductError;
use super::ports::ProductRepository;
use crate::domain::emitter::{EmitterError, EmitterRepository};

/// Per-emitter catalog of billable products and services.
pub struct ProductService {
  product_repo: Arc<dyn ProductRepository>,
  emitter_repo: Arc<dyn EmitterRepository>,
}

impl ProductService {
  pub fn new(
    product_repo: Arc<dyn ProductRepository>,
    emitter_repo: Arc<dyn EmitterRepository>,
  ) -> Self {
    Self {
      product_repo,
      emitter_repo,
    }
  }

  pub async fn create_product(
    &self,
    emitter_id: Uuid,
    data: NewProduct,
  ) -> Result<Product, ProductError> {
    self
      .emitter_repo
      .find_by_id(emitter_id)
      .await?
      .ok_or(EmitterError::EmitterNotFound(emitter_id))?;

    if let Some(existing) = self.product_repo.find_by_sku(emitter_id, &data.sku).await? {
      tracing::warn!(
        emitter_id = %emitter_id,
        sku = %existing.sku,
        product_id = %existing.id,
        "Product with SKU already exists"
      );
      return Err(ProductError::SkuAlreadyExists(existing.sku));
    }

    let product = self
      .product_repo
      .create(Product::new(emitter_id, data))
      .await?;

    tracing::info!(
      emitter_id = %emitter_id,
      product_id = %product.id,
      sku = %product.sku,
      unit_price = %product.unit_price,
      "Product created"
    );

    Ok(product)
  }
}
