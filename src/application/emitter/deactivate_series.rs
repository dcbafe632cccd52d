use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::emitter::{EmitterError, EmitterService};

#[derive(Debug, Clone)]
pub struct DeactivateSeriesCommand {
  pub series_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeactivateSeriesResponse {
  pub series_id: Uuid,
  pub is_active: bool,
}

pub struct DeactivateSeriesUseCase {
  emitter_service: Arc<EmitterService>,
}

impl DeactivateSeriesUseCase {
  pub fn new(emitter_service: Arc<EmitterService>) -> Self {
    Self { emitter_service }
  }

  pub async fn execute(
    &self,
    command: DeactivateSeriesCommand,
  ) -> Result<DeactivateSeriesResponse, EmitterError> {
    self
      .emitter_service
      .deactivate_series(command.series_id)
      .await?;

    Ok(DeactivateSeriesResponse {
      series_id: command.series_id,
      is_active: false,
    })
  }
}
