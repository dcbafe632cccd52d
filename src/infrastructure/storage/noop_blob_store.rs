use async_trait::async_trait;

use crate::domain::invoice::{errors::BlobStoreError, ports::BlobStore};

/// Blob store used when object storage is not configured. Every call reports
/// unavailability, so artifacts are kept inline in the metadata row.
#[derive(Debug, Default)]
pub struct NoopBlobStore;

impl NoopBlobStore {
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl BlobStore for NoopBlobStore {
  async fn put(&self, key: &str, _data: Vec<u8>, _content_type: &str) -> Result<(), BlobStoreError> {
    tracing::debug!(key = %key, "Blob storage disabled, skipping upload");
    Err(BlobStoreError::Unavailable)
  }

  async fn get(&self, _key: &str) -> Result<Vec<u8>, BlobStoreError> {
    Err(BlobStoreError::Unavailable)
  }

  async fn delete(&self, _key: &str) -> Result<(), BlobStoreError> {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::invoice::{ArtifactStore, GeneratedArtifacts, value_objects::ArtifactKind};
  use crate::domain::testing::InMemoryArtifacts;
  use std::sync::Arc;
  use uuid::Uuid;

  #[tokio::test]
  async fn test_disabled_storage_keeps_artifacts_inline() {
    let store = ArtifactStore::new(
      Arc::new(NoopBlobStore::new()),
      Arc::new(InMemoryArtifacts::default()),
    );
    let generated = GeneratedArtifacts {
      pdf: b"%PDF-1.5".to_vec(),
      xml: b"<factura/>".to_vec(),
    };

    let stored = store.store(Uuid::new_v4(), &generated).await.unwrap();

    assert!(stored.is_inline());
    assert_eq!(
      store.fetch(&stored, ArtifactKind::Xml).await.unwrap(),
      generated.xml
    );
  }
}
