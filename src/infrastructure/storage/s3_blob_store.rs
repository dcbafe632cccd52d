use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use std::future::Future;
use std::time::Duration;

use crate::domain::invoice::{errors::BlobStoreError, ports::BlobStore};
use crate::infrastructure::config::StorageConfig;

/// Invoice files on S3-compatible object storage.
pub struct S3BlobStore {
  client: S3Client,
  bucket: String,
  timeout: Duration,
}

impl S3BlobStore {
  pub fn new(client: S3Client, bucket: impl Into<String>, timeout: Duration) -> Self {
    Self {
      client,
      bucket: bucket.into(),
      timeout,
    }
  }

  /// Builds the client from configuration. Static credentials are used when
  /// both parts are configured, otherwise the default AWS provider chain.
  pub async fn from_config(config: &StorageConfig) -> Self {
    let mut loader =
      aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

    if let (Some(access_key_id), Some(secret_access_key)) =
      (&config.access_key_id, &config.secret_access_key)
    {
      loader = loader.credentials_provider(Credentials::new(
        access_key_id.clone(),
        secret_access_key.clone(),
        None,
        None,
        "dgi-config",
      ));
    }

    let shared = loader.load().await;
    let mut builder =
      aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.force_path_style);
    if let Some(endpoint) = &config.endpoint {
      builder = builder.endpoint_url(endpoint);
    }

    tracing::info!(
      bucket = %config.bucket,
      region = %config.region,
      endpoint = ?config.endpoint,
      "S3 blob store configured"
    );

    Self::new(
      S3Client::from_conf(builder.build()),
      config.bucket.clone(),
      Duration::from_secs(config.timeout_seconds),
    )
  }

  async fn bounded<T>(
    &self,
    key: &str,
    call: impl Future<Output = Result<T, BlobStoreError>>,
  ) -> Result<T, BlobStoreError> {
    tokio::time::timeout(self.timeout, call)
      .await
      .map_err(|_| BlobStoreError::Timeout(key.to_string()))?
  }
}

#[async_trait]
impl BlobStore for S3BlobStore {
  async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), BlobStoreError> {
    let size = data.len();
    let request = self
      .client
      .put_object()
      .bucket(&self.bucket)
      .key(key)
      .content_type(content_type)
      .body(ByteStream::from(data))
      .send();

    self
      .bounded(key, async {
        request.await.map_err(|e| BlobStoreError::Upload {
          key: key.to_string(),
          message: e.to_string(),
        })
      })
      .await?;

    tracing::debug!(bucket = %self.bucket, key = %key, size = size, "Uploaded blob");
    Ok(())
  }

  async fn get(&self, key: &str) -> Result<Vec<u8>, BlobStoreError> {
    let request = self
      .client
      .get_object()
      .bucket(&self.bucket)
      .key(key)
      .send();

    self
      .bounded(key, async {
        let output = request.await.map_err(|e| {
          if e
            .as_service_error()
            .map(|service| service.is_no_such_key())
            .unwrap_or(false)
          {
            BlobStoreError::NotFound(key.to_string())
          } else {
            BlobStoreError::Download {
              key: key.to_string(),
              message: e.to_string(),
            }
          }
        })?;

        let bytes = output
          .body
          .collect()
          .await
          .map_err(|e| BlobStoreError::Download {
            key: key.to_string(),
            message: e.to_string(),
          })?
          .into_bytes();

        Ok(bytes.to_vec())
      })
      .await
  }

  async fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
    let request = self
      .client
      .delete_object()
      .bucket(&self.bucket)
      .key(key)
      .send();

    self
      .bounded(key, async {
        request.await.map_err(|e| BlobStoreError::Delete {
          key: key.to_string(),
          message: e.to_string(),
        })
      })
      .await?;

    tracing::debug!(bucket = %self.bucket, key = %key, "Deleted blob");
    Ok(())
  }
}
