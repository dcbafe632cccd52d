use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;

use crate::{
  adapters::http::{dtos::ListSeriesQuery, errors::ApiError, middleware::AuthEmitter},
  application::emitter::{ListSeriesCommand, ListSeriesUseCase},
};

const DEFAULT_PAGE_SIZE: usize = 20;

/// Series of the authenticated emitter with their counters
/// GET /v1/series
pub async fn list_series_handler(
  query: web::Query<ListSeriesQuery>,
  use_case: web::Data<Arc<ListSeriesUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let emitter = http_req.authenticated_emitter()?;

  let response = use_case
    .execute(ListSeriesCommand {
      emitter_id: emitter.emitter_id,
      page: query.page.unwrap_or(1),
      page_size: query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}
