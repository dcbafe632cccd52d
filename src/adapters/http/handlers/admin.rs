use actix_web::{HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
  adapters::http::{
    dtos::{
      CreateApiKeyRequest, CreateEmitterRequest, CreateProductRequest, CreateSeriesRequest,
      UpdateStatusRequest,
    },
    errors::ApiError,
  },
  application::{
    emitter::*,
    invoice::{UpdateInvoiceStatusCommand, UpdateInvoiceStatusUseCase},
    product::{CreateProductCommand, CreateProductUseCase},
  },
};

/// Register a new emitter
/// POST /v1/admin/emitters
pub async fn create_emitter_handler(
  request: web::Json<CreateEmitterRequest>,
  use_case: web::Data<Arc<CreateEmitterUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let command = CreateEmitterCommand {
    name: request.name,
    company_code: request.company_code,
    ruc_tipo: request.ruc.tipo,
    ruc_numero: request.ruc.numero,
    ruc_dv: request.ruc.dv,
    suc_em: request.suc_em,
    pto_fac_default: request.pto_fac_default,
    iamb: request.iamb,
    itpemis_default: request.itpemis_default,
    idoc_default: request.idoc_default,
    email: request.email,
    phone: request.phone,
    address_line: request.address_line,
    ubi_code: request.ubi_code,
    logo_url: request.branding.logo_url,
    primary_color: request.branding.primary_color,
    footer_html: request.branding.footer_html,
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Created().json(response))
}

/// Open a numbering series for an emitter
/// POST /v1/admin/emitters/{id}/series
pub async fn create_series_handler(
  emitter_id: web::Path<Uuid>,
  request: web::Json<CreateSeriesRequest>,
  use_case: web::Data<Arc<CreateSeriesUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let response = use_case
    .execute(CreateSeriesCommand {
      emitter_id: *emitter_id,
      pto_fac_df: request.pto_fac_df,
      doc_kind: request.doc_kind,
    })
    .await?;

  Ok(HttpResponse::Created().json(response))
}

/// POST /v1/admin/series/{id}/deactivate
pub async fn deactivate_series_handler(
  series_id: web::Path<Uuid>,
  use_case: web::Data<Arc<DeactivateSeriesUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case
    .execute(DeactivateSeriesCommand {
      series_id: *series_id,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Issue an API key. The plaintext key is only returned here.
/// POST /v1/admin/emitters/{id}/apikeys
pub async fn create_api_key_handler(
  emitter_id: web::Path<Uuid>,
  request: web::Json<CreateApiKeyRequest>,
  use_case: web::Data<Arc<CreateApiKeyUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let response = use_case
    .execute(CreateApiKeyCommand {
      emitter_id: *emitter_id,
      name: request.into_inner().name,
    })
    .await?;

  Ok(HttpResponse::Created().json(response))
}

/// Add a product to an emitter's catalog
/// POST /v1/admin/emitters/{id}/products
pub async fn create_product_handler(
  emitter_id: web::Path<Uuid>,
  request: web::Json<CreateProductRequest>,
  use_case: web::Data<Arc<CreateProductUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let response = use_case
    .execute(CreateProductCommand {
      emitter_id: *emitter_id,
      sku: request.sku,
      description: request.description,
      cpbs_abr: request.cpbs_abr,
      cpbs_cmp: request.cpbs_cmp,
      unit_price: request.unit_price,
      tax_rate: request.tax_rate,
    })
    .await?;

  Ok(HttpResponse::Created().json(response))
}

/// Series counters and this month's invoice tally
/// GET /v1/admin/emitters/{id}/dashboard
pub async fn dashboard_handler(
  emitter_id: web::Path<Uuid>,
  use_case: web::Data<Arc<GetDashboardUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case
    .execute(GetDashboardCommand {
      emitter_id: *emitter_id,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Record an authority outcome or move the invoice along its lifecycle
/// PATCH /v1/admin/invoices/{id}/status
pub async fn update_invoice_status_handler(
  invoice_id: web::Path<Uuid>,
  request: web::Json<UpdateStatusRequest>,
  use_case: web::Data<Arc<UpdateInvoiceStatusUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let response = use_case
    .execute(UpdateInvoiceStatusCommand {
      invoice_id: *invoice_id,
      status: request.status,
      cufe: request.cufe,
      url_cufe: request.url_cufe,
      xml_response: request.xml_response,
      xml_fe: request.xml_fe,
      xml_protocolo: request.xml_protocolo,
      cafe_pdf_url: request.cafe_pdf_url,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}
