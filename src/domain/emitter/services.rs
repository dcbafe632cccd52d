use std::sync::Arc;
use uuid::Uuid;

use super::entities::{ApiKey, Emitter, NewEmitter, Series};
use super::errors::EmitterError;
use super::ports::{ApiKeyRepository, EmitterRepository, SeriesRepository};
use super::value_objects::{ApiKeySecret, IssuingPoint};
use crate::domain::invoice::value_objects::DocumentKind;

pub struct EmitterService {
  emitter_repo: Arc<dyn EmitterRepository>,
  series_repo: Arc<dyn SeriesRepository>,
  api_key_repo: Arc<dyn ApiKeyRepository>,
}

/// One page of series plus the unpaged total.
#[derive(Debug, Clone)]
pub struct SeriesPage {
  pub items: Vec<Series>,
  pub page: usize,
  pub page_size: usize,
  pub total: usize,
}

impl EmitterService {
  pub fn new(
    emitter_repo: Arc<dyn EmitterRepository>,
    series_repo: Arc<dyn SeriesRepository>,
    api_key_repo: Arc<dyn ApiKeyRepository>,
  ) -> Self {
    Self {
      emitter_repo,
      series_repo,
      api_key_repo,
    }
  }

  pub async fn register_emitter(&self, data: NewEmitter) -> Result<Emitter, EmitterError> {
    let emitter = self.emitter_repo.create(Emitter::new(data)).await?;

    tracing::info!(
      emitter_id = %emitter.id,
      company_code = %emitter.company_code,
      ruc = %emitter.ruc_display(),
      "Emitter registered"
    );

    Ok(emitter)
  }

  pub async fn get_emitter(&self, emitter_id: Uuid) -> Result<Emitter, EmitterError> {
    self
      .emitter_repo
      .find_by_id(emitter_id)
      .await?
      .ok_or(EmitterError::EmitterNotFound(emitter_id))
  }

  /// Opens a new numbering series starting at 1.
  pub async fn create_series(
    &self,
    emitter_id: Uuid,
    issuing_point: IssuingPoint,
    document_kind: DocumentKind,
  ) -> Result<Series, EmitterError> {
    let emitter = self.get_emitter(emitter_id).await?;

    if issuing_point != emitter.default_issuing_point {
      tracing::warn!(
        emitter_id = %emitter_id,
        issuing_point = %issuing_point,
        default = %emitter.default_issuing_point,
        "Creating series on a non-default issuing point"
      );
    }

    let series = self
      .series_repo
      .create(Series::new(emitter_id, issuing_point, document_kind))
      .await?;

    tracing::info!(
      emitter_id = %emitter_id,
      series_id = %series.id,
      issuing_point = %series.issuing_point,
      document_kind = %series.document_kind,
      "Series created"
    );

    Ok(series)
  }

  pub async fn list_series(
    &self,
    emitter_id: Uuid,
    page: usize,
    page_size: usize,
  ) -> Result<SeriesPage, EmitterError> {
    let page = page.max(1);
    let page_size = page_size.clamp(1, 100);
    let all = self.series_repo.list_by_emitter(emitter_id).await?;
    let total = all.len();

    let items = all
      .into_iter()
      .skip((page - 1) * page_size)
      .take(page_size)
      .collect();

    Ok(SeriesPage {
      items,
      page,
      page_size,
      total,
    })
  }

  /// Every series of the emitter, active or not.
  pub async fn all_series(&self, emitter_id: Uuid) -> Result<Vec<Series>, EmitterError> {
    self.series_repo.list_by_emitter(emitter_id).await
  }

  /// Stops allocation on a series. Issued numbers stay valid.
  pub async fn deactivate_series(&self, series_id: Uuid) -> Result<(), EmitterError> {
    if !self.series_repo.deactivate(series_id).await? {
      return Err(EmitterError::SeriesNotFound(series_id));
    }
    tracing::info!(series_id = %series_id, "Series deactivated");
    Ok(())
  }

  /// Issues a key for the emitter. The plaintext secret is only available here.
  pub async fn issue_api_key(
    &self,
    emitter_id: Uuid,
    name: String,
  ) -> Result<(ApiKey, ApiKeySecret), EmitterError> {
    self.get_emitter(emitter_id).await?;

    let secret = ApiKeySecret::generate();
    let key = self
      .api_key_repo
      .create(ApiKey::new(emitter_id, name, secret.hash()))
      .await?;

    tracing::info!(emitter_id = %emitter_id, api_key_id = %key.id, "API key issued");

    Ok((key, secret))
  }

  /// Resolves the active emitter owning the presented key.
  pub async fn authenticate(&self, raw_key: &str) -> Result<Emitter, EmitterError> {
    let secret = ApiKeySecret::parse(raw_key).map_err(|_| EmitterError::InvalidApiKey)?;

    let key = self
      .api_key_repo
      .find_active_by_hash(&secret.hash())
      .await?
      .ok_or(EmitterError::InvalidApiKey)?;

    let emitter = self
      .emitter_repo
      .find_by_id(key.emitter_id)
      .await?
      .filter(|e| e.is_active)
      .ok_or(EmitterError::InvalidApiKey)?;

    if let Err(e) = self.api_key_repo.touch(key.id).await {
      tracing::warn!(api_key_id = %key.id, error = %e, "Failed to record API key usage");
    }

    Ok(emitter)
  }
}
