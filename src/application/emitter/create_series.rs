use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::emitter::{EmitterError, EmitterService, IssuingPoint, Series};
use crate::domain::invoice::DocumentKind;

#[derive(Debug, Clone)]
pub struct CreateSeriesCommand {
  pub emitter_id: Uuid,
  pub pto_fac_df: String,
  pub doc_kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesDto {
  pub id: Uuid,
  pub pto_fac_df: String,
  pub doc_kind: String,
  pub last_assigned: i64,
  pub issued_count: i64,
  pub authorized_count: i64,
  pub rejected_count: i64,
  pub is_active: bool,
}

impl From<Series> for SeriesDto {
  fn from(series: Series) -> Self {
    SeriesDto {
      id: series.id,
      last_assigned: series.last_assigned(),
      pto_fac_df: series.issuing_point.into_inner(),
      doc_kind: series.document_kind.as_str().to_string(),
      issued_count: series.issued_count,
      authorized_count: series.authorized_count,
      rejected_count: series.rejected_count,
      is_active: series.is_active,
    }
  }
}

pub struct CreateSeriesUseCase {
  emitter_service: Arc<EmitterService>,
}

impl CreateSeriesUseCase {
  pub fn new(emitter_service: Arc<EmitterService>) -> Self {
    Self { emitter_service }
  }

  pub async fn execute(&self, command: CreateSeriesCommand) -> Result<SeriesDto, EmitterError> {
    let issuing_point = IssuingPoint::new(&command.pto_fac_df)?;
    let document_kind = DocumentKind::from_str(&command.doc_kind)
      .map_err(|_| EmitterError::InvalidDocumentKind(command.doc_kind.clone()))?;

    let series = self
      .emitter_service
      .create_series(command.emitter_id, issuing_point, document_kind)
      .await?;

    Ok(series.into())
  }
}
