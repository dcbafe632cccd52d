use actix_web::{HttpRequest, error, web};
use std::sync::Arc;

use crate::application::emitter::{
  CreateApiKeyUseCase, CreateEmitterUseCase, CreateSeriesUseCase, DeactivateSeriesUseCase,
  GetDashboardUseCase, ListSeriesUseCase,
};
use crate::application::invoice::{
  CreateCustomerUseCase, CreateInvoiceUseCase, DownloadArtifactUseCase, GetInvoiceFilesUseCase,
  GetInvoiceUseCase, ResendEmailUseCase, RetryInvoiceUseCase, UpdateInvoiceStatusUseCase,
};
use crate::application::product::CreateProductUseCase;
use crate::domain::emitter::EmitterService;
use crate::domain::invoice::InvoiceService;
use crate::domain::product::ProductService;

use super::errors::ApiError;
use super::handlers::{admin, files, health, invoices, series};
use super::middleware::{AdminTokenMiddleware, ApiKeyMiddleware};

/// Everything the `/v1` routes need, one use case per operation.
#[derive(Clone)]
pub struct ApiRouteDependencies {
  pub emitter_service: Arc<EmitterService>,
  pub admin_token: String,
  pub create_invoice: Arc<CreateInvoiceUseCase>,
  pub get_invoice: Arc<GetInvoiceUseCase>,
  pub get_invoice_files: Arc<GetInvoiceFilesUseCase>,
  pub download_artifact: Arc<DownloadArtifactUseCase>,
  pub resend_email: Arc<ResendEmailUseCase>,
  pub retry_invoice: Arc<RetryInvoiceUseCase>,
  pub update_invoice_status: Arc<UpdateInvoiceStatusUseCase>,
  pub create_customer: Arc<CreateCustomerUseCase>,
  pub create_emitter: Arc<CreateEmitterUseCase>,
  pub create_series: Arc<CreateSeriesUseCase>,
  pub list_series: Arc<ListSeriesUseCase>,
  pub deactivate_series: Arc<DeactivateSeriesUseCase>,
  pub create_api_key: Arc<CreateApiKeyUseCase>,
  pub create_product: Arc<CreateProductUseCase>,
  pub get_dashboard: Arc<GetDashboardUseCase>,
}

impl ApiRouteDependencies {
  pub fn new(
    invoice_service: Arc<InvoiceService>,
    emitter_service: Arc<EmitterService>,
    product_service: Arc<ProductService>,
    admin_token: impl Into<String>,
  ) -> Self {
    Self {
      admin_token: admin_token.into(),
      create_invoice: Arc::new(CreateInvoiceUseCase::new(invoice_service.clone())),
      get_invoice: Arc::new(GetInvoiceUseCase::new(invoice_service.clone())),
      get_invoice_files: Arc::new(GetInvoiceFilesUseCase::new(invoice_service.clone())),
      download_artifact: Arc::new(DownloadArtifactUseCase::new(invoice_service.clone())),
      resend_email: Arc::new(ResendEmailUseCase::new(invoice_service.clone())),
      retry_invoice: Arc::new(RetryInvoiceUseCase::new(invoice_service.clone())),
      update_invoice_status: Arc::new(UpdateInvoiceStatusUseCase::new(invoice_service.clone())),
      create_customer: Arc::new(CreateCustomerUseCase::new(invoice_service.clone())),
      get_dashboard: Arc::new(GetDashboardUseCase::new(
        emitter_service.clone(),
        invoice_service,
      )),
      create_product: Arc::new(CreateProductUseCase::new(product_service)),
      create_emitter: Arc::new(CreateEmitterUseCase::new(emitter_service.clone())),
      create_series: Arc::new(CreateSeriesUseCase::new(emitter_service.clone())),
      list_series: Arc::new(ListSeriesUseCase::new(emitter_service.clone())),
      deactivate_series: Arc::new(DeactivateSeriesUseCase::new(emitter_service.clone())),
      create_api_key: Arc::new(CreateApiKeyUseCase::new(emitter_service.clone())),
      emitter_service,
    }
  }
}

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  ApiError::invalid(format!("Malformed JSON body: {}", err)).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
  ApiError::invalid(format!("Invalid query string: {}", err)).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
  ApiError::invalid(format!("Invalid path parameter: {}", err)).into()
}

/// Configure the health check route
///
/// Expects a `web::Data<PgPool>` registered on the app.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
  cfg.route("/health", web::get().to(health::health_handler));
}

/// Configure the versioned API
///
/// # Routes
///
/// - POST /v1/invoices - Issue a document (API key)
/// - GET /v1/invoices/{id} - Status view (API key)
/// - GET /v1/invoices/{id}/files - File links or bytes with `file_type` (API key)
/// - POST /v1/invoices/{id}/email - Resend the notification (API key)
/// - POST /v1/invoices/{id}/retry - Resume a failed invoice (API key)
/// - GET /v1/series - Series and counters (API key)
/// - POST /v1/customers - Create or refresh a customer (API key)
/// - GET /v1/files/invoices/{id} - Public download for email links
/// - POST /v1/admin/emitters - Register an emitter (admin token)
/// - POST /v1/admin/emitters/{id}/series - Open a series (admin token)
/// - POST /v1/admin/series/{id}/deactivate - Stop a series (admin token)
/// - POST /v1/admin/emitters/{id}/apikeys - Issue an API key (admin token)
/// - PATCH /v1/admin/invoices/{id}/status - Lifecycle update (admin token)
/// - POST /v1/admin/emitters/{id}/products - Add a catalog product (admin token)
/// - GET /v1/admin/emitters/{id}/dashboard - Counters and monthly tally (admin token)
pub fn configure_api_routes(cfg: &mut web::ServiceConfig, deps: ApiRouteDependencies) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error))
    .app_data(web::QueryConfig::default().error_handler(query_error))
    .app_data(web::PathConfig::default().error_handler(path_error))
    .app_data(web::Data::new(deps.create_invoice))
    .app_data(web::Data::new(deps.get_invoice))
    .app_data(web::Data::new(deps.get_invoice_files))
    .app_data(web::Data::new(deps.download_artifact))
    .app_data(web::Data::new(deps.resend_email))
    .app_data(web::Data::new(deps.retry_invoice))
    .app_data(web::Data::new(deps.update_invoice_status))
    .app_data(web::Data::new(deps.create_customer))
    .app_data(web::Data::new(deps.create_emitter))
    .app_data(web::Data::new(deps.create_series))
    .app_data(web::Data::new(deps.list_series))
    .app_data(web::Data::new(deps.deactivate_series))
    .app_data(web::Data::new(deps.create_api_key))
    .app_data(web::Data::new(deps.create_product))
    .app_data(web::Data::new(deps.get_dashboard))
    .service(
      web::scope("/v1")
        .service(
          web::scope("/admin")
            .wrap(AdminTokenMiddleware::new(&deps.admin_token))
            .route("/emitters", web::post().to(admin::create_emitter_handler))
            .route(
              "/emitters/{id}/series",
              web::post().to(admin::create_series_handler),
            )
            .route(
              "/emitters/{id}/apikeys",
              web::post().to(admin::create_api_key_handler),
            )
            .route(
              "/emitters/{id}/products",
              web::post().to(admin::create_product_handler),
            )
            .route(
              "/emitters/{id}/dashboard",
              web::get().to(admin::dashboard_handler),
            )
            .route(
              "/series/{id}/deactivate",
              web::post().to(admin::deactivate_series_handler),
            )
            .route(
              "/invoices/{id}/status",
              web::patch().to(admin::update_invoice_status_handler),
            ),
        )
        .service(
          web::scope("/files")
            .route("/invoices/{id}", web::get().to(files::public_download_handler)),
        )
        // Registered last: the empty prefix matches everything under /v1
        .service(
          web::scope("")
            .wrap(ApiKeyMiddleware::new(deps.emitter_service))
            .route("/invoices", web::post().to(invoices::create_invoice_handler))
            .route("/invoices/{id}", web::get().to(invoices::get_invoice_handler))
            .route(
              "/invoices/{id}/files",
              web::get().to(invoices::get_invoice_files_handler),
            )
            .route(
              "/invoices/{id}/email",
              web::post().to(invoices::resend_email_handler),
            )
            .route(
              "/invoices/{id}/retry",
              web::post().to(invoices::retry_invoice_handler),
            )
            .route("/series", web::get().to(series::list_series_handler))
            .route("/customers", web::post().to(invoices::create_customer_handler)),
        ),
    );
}
