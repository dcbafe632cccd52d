use async_trait::async_trait;
use uuid::Uuid;

use super::entities::Product;
use super::errors::ProductError;

#[async_trait]
pub trait ProductRepository: Send + Sync {
  /// Fails with `SkuAlreadyExists` when the emitter has an active product with the same SKU
  async fn create(&self, product: Product) -> Result<Product, ProductError>;

  /// Active products only
  async fn find_by_sku(&self, emitter_id: Uuid, sku: &str)
  -> Result<Option<Product>, ProductError>;
}
