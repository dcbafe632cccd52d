use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::create_series::SeriesDto;
use crate::domain::emitter::{EmitterError, EmitterService};

#[derive(Debug, Clone)]
pub struct ListSeriesCommand {
  pub emitter_id: Uuid,
  pub page: usize,
  pub page_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
  pub page: usize,
  pub page_size: usize,
  pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListSeriesResponse {
  pub items: Vec<SeriesDto>,
  pub page_info: PageInfo,
}

pub struct ListSeriesUseCase {
  emitter_service: Arc<EmitterService>,
}

impl ListSeriesUseCase {
  pub fn new(emitter_service: Arc<EmitterService>) -> Self {
    Self { emitter_service }
  }

  pub async fn execute(
    &self,
    command: ListSeriesCommand,
  ) -> Result<ListSeriesResponse, EmitterError> {
    let page = self
      .emitter_service
      .list_series(command.emitter_id, command.page, command.page_size)
      .await?;

    Ok(ListSeriesResponse {
      items: page.items.into_iter().map(SeriesDto::from).collect(),
      page_info: PageInfo {
        page: page.page,
        page_size: page.page_size,
        total: page.total,
      },
    })
  }
}
