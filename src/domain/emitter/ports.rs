use async_trait::async_trait;
use uuid::Uuid;

use super::entities::{ApiKey, Emitter, Series};
use super::errors::EmitterError;

#[async_trait]
pub trait EmitterRepository: Send + Sync {
  /// Fails with `EmitterAlreadyExists` when the company code is taken
  async fn create(&self, emitter: Emitter) -> Result<Emitter, EmitterError>;

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Emitter>, EmitterError>;
}

/// Administrative access to numbering series. Allocation itself happens inside
/// the invoice commit transaction, not through this port.
#[async_trait]
pub trait SeriesRepository: Send + Sync {
  /// Fails with `SeriesAlreadyExists` on a duplicate (emitter, point, kind)
  async fn create(&self, series: Series) -> Result<Series, EmitterError>;

  async fn list_by_emitter(&self, emitter_id: Uuid) -> Result<Vec<Series>, EmitterError>;

  /// Returns false when no series matched
  async fn deactivate(&self, series_id: Uuid) -> Result<bool, EmitterError>;
}

#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
  async fn create(&self, key: ApiKey) -> Result<ApiKey, EmitterError>;

  async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, EmitterError>;

  async fn touch(&self, id: Uuid) -> Result<(), EmitterError>;
}
