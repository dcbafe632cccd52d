use actix_web::{HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;

use super::invoices::file_response;
use crate::{
  adapters::http::{dtos::PublicFileQuery, errors::ApiError},
  application::invoice::{DownloadArtifactCommand, DownloadArtifactUseCase},
};

/// Unauthenticated download backing the links in notification emails
/// GET /v1/files/invoices/{id}?file_type=pdf|xml
pub async fn public_download_handler(
  invoice_id: web::Path<Uuid>,
  query: web::Query<PublicFileQuery>,
  use_case: web::Data<Arc<DownloadArtifactUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let download = use_case
    .execute(DownloadArtifactCommand {
      invoice_id: *invoice_id,
      file_type: query.into_inner().file_type,
      emitter_id: None,
    })
    .await?;

  Ok(file_response(download))
}
