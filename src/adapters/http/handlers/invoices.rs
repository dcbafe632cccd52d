use actix_web::{HttpRequest, HttpResponse, http::header, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
  adapters::http::{
    dtos::{CreateInvoiceRequest, CustomerRequest, FilesQuery, ResendEmailRequest, RetryRequest},
    errors::ApiError,
    middleware::AuthEmitter,
  },
  application::invoice::*,
};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

fn idempotency_key(req: &HttpRequest) -> Result<Option<String>, ApiError> {
  match req.headers().get(IDEMPOTENCY_KEY_HEADER) {
    None => Ok(None),
    Some(value) => {
      let key = value
        .to_str()
        .map_err(|_| {
          ApiError::invalid_field(
            "Invalid Idempotency-Key header",
            "Idempotency-Key",
            "must be visible ASCII",
          )
        })?
        .trim();
      if key.is_empty() || key.len() > 255 {
        return Err(ApiError::invalid_field(
          "Invalid Idempotency-Key header",
          "Idempotency-Key",
          "must be between 1 and 255 characters",
        ));
      }
      Ok(Some(key.to_string()))
    }
  }
}

fn customer_dto(customer: CustomerRequest) -> CustomerDto {
  CustomerDto {
    name: customer.name,
    email: customer.email,
    phone: customer.phone,
    address_line: customer.address_line,
    ubi_code: customer.ubi_code,
    tax_id: customer.tax_id,
  }
}

/// Issue a new fiscal document
/// POST /v1/invoices
pub async fn create_invoice_handler(
  request: web::Json<CreateInvoiceRequest>,
  use_case: web::Data<Arc<CreateInvoiceUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let emitter = http_req.authenticated_emitter()?;
  let idempotency_key = idempotency_key(&http_req)?;
  let request = request.into_inner();

  let command = CreateInvoiceCommand {
    emitter_id: emitter.emitter_id,
    document_type: request.document_type,
    reference: request.reference.map(|r| ReferenceDto {
      cufe: r.cufe,
      nrodf: r.nrodf,
      pto_fac_df: r.pto_fac_df,
    }),
    customer: customer_dto(request.customer),
    items: request
      .items
      .into_iter()
      .map(|item| CreateInvoiceItemDto {
        sku: item.sku,
        description: item.description,
        quantity: item.quantity,
        unit_price: item.unit_price,
        tax_rate: item.tax_rate,
        cpbs_abr: item.cpbs_abr,
        cpbs_cmp: item.cpbs_cmp,
      })
      .collect(),
    payment_method: request.payment.method,
    payment_amount: request.payment.amount,
    pto_fac_df: request.pto_fac_df,
    i_tp_emis: request.i_tp_emis,
    i_doc: request.i_doc,
    idempotency_key,
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Created().json(response))
}

/// Invoice status view
/// GET /v1/invoices/{id}
pub async fn get_invoice_handler(
  invoice_id: web::Path<Uuid>,
  use_case: web::Data<Arc<GetInvoiceUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let emitter = http_req.authenticated_emitter()?;

  let response = use_case
    .execute(GetInvoiceCommand {
      invoice_id: *invoice_id,
      emitter_id: emitter.emitter_id,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// File links, or the file itself when `file_type` is given
/// GET /v1/invoices/{id}/files
pub async fn get_invoice_files_handler(
  invoice_id: web::Path<Uuid>,
  query: web::Query<FilesQuery>,
  files_use_case: web::Data<Arc<GetInvoiceFilesUseCase>>,
  download_use_case: web::Data<Arc<DownloadArtifactUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let emitter = http_req.authenticated_emitter()?;

  match query.into_inner().file_type {
    Some(file_type) => {
      let download = download_use_case
        .execute(DownloadArtifactCommand {
          invoice_id: *invoice_id,
          file_type,
          emitter_id: Some(emitter.emitter_id),
        })
        .await?;
      Ok(file_response(download))
    }
    None => {
      let response = files_use_case
        .execute(GetInvoiceFilesCommand {
          invoice_id: *invoice_id,
          emitter_id: emitter.emitter_id,
        })
        .await?;
      Ok(HttpResponse::Ok().json(response))
    }
  }
}

pub(crate) fn file_response(download: DownloadArtifactResponse) -> HttpResponse {
  HttpResponse::Ok()
    .content_type(download.content_type)
    .insert_header((
      header::CONTENT_DISPOSITION,
      format!("inline; filename={}", download.filename),
    ))
    .body(download.bytes)
}

/// Queue another delivery of the invoice email
/// POST /v1/invoices/{id}/email
pub async fn resend_email_handler(
  invoice_id: web::Path<Uuid>,
  request: Option<web::Json<ResendEmailRequest>>,
  use_case: web::Data<Arc<ResendEmailUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let request = request.map(web::Json::into_inner).unwrap_or_default();
  request.validate()?;

  let emitter = http_req.authenticated_emitter()?;

  let response = use_case
    .execute(ResendEmailCommand {
      invoice_id: *invoice_id,
      emitter_id: emitter.emitter_id,
      to: request.to,
      cc: request.cc,
    })
    .await?;

  Ok(HttpResponse::Accepted().json(response))
}

/// Resume a failed invoice
/// POST /v1/invoices/{id}/retry
pub async fn retry_invoice_handler(
  invoice_id: web::Path<Uuid>,
  request: Option<web::Json<RetryRequest>>,
  use_case: web::Data<Arc<RetryInvoiceUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  let request = request.map(web::Json::into_inner).unwrap_or_default();
  let emitter = http_req.authenticated_emitter()?;

  let response = use_case
    .execute(RetryInvoiceCommand {
      invoice_id: *invoice_id,
      emitter_id: emitter.emitter_id,
      resume_from: request.resume_from,
    })
    .await?;

  Ok(HttpResponse::Accepted().json(response))
}

/// Create or refresh a customer of the authenticated emitter
/// POST /v1/customers
pub async fn create_customer_handler(
  request: web::Json<CustomerRequest>,
  use_case: web::Data<Arc<CreateCustomerUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let emitter = http_req.authenticated_emitter()?;

  let response = use_case
    .execute(CreateCustomerCommand {
      emitter_id: emitter.emitter_id,
      customer: customer_dto(request.into_inner()),
    })
    .await?;

  Ok(HttpResponse::Created().json(response))
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[test]
  fn test_idempotency_key_is_optional() {
    let req = TestRequest::default().to_http_request();
    assert_eq!(idempotency_key(&req).unwrap(), None);
  }

  #[test]
  fn test_idempotency_key_is_trimmed() {
    let req = TestRequest::default()
      .insert_header((IDEMPOTENCY_KEY_HEADER, " order-42 "))
      .to_http_request();
    assert_eq!(idempotency_key(&req).unwrap().as_deref(), Some("order-42"));
  }

  #[test]
  fn test_blank_idempotency_key_is_rejected() {
    let req = TestRequest::default()
      .insert_header((IDEMPOTENCY_KEY_HEADER, "   "))
      .to_http_request();
    assert!(matches!(
      idempotency_key(&req),
      Err(ApiError::InvalidRequest { .. })
    ));
  }
}
