use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dgi_service::{
  adapters::http::{
    ApiRouteDependencies, RequestIdMiddleware, configure_api_routes, configure_health_routes,
  },
  domain::emitter::EmitterService,
  domain::invoice::{
    ArtifactStore, BlobStore, EmailSender, InvoiceService, InvoiceServiceDependencies,
    NotificationDispatcher,
  },
  domain::product::ProductService,
  infrastructure::{
    config::Config,
    documents::DocumentGenerator,
    email::{DisabledEmailSender, ResendEmailSender},
    persistence::postgres::{
      PostgresApiKeyRepository, PostgresArtifactRepository, PostgresCustomerRepository,
      PostgresEmitterRepository, PostgresInvoiceStore, PostgresProductRepository,
      PostgresSeriesRepository,
    },
    storage::{NoopBlobStore, S3BlobStore},
  },
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dgi_service=debug,actix_web=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tracing::info!("Starting DGI invoicing service");

  let config = Config::load().context("Failed to load configuration")?;
  tracing::info!("Configuration loaded successfully");

  // Every pooled connection carries the statement timeout
  let connect_options = PgConnectOptions::from_str(&config.database.url)
    .context("Invalid database URL")?
    .options([(
      "statement_timeout",
      format!("{}s", config.database.statement_timeout_seconds),
    )]);

  let db_pool = tokio::time::timeout(
    Duration::from_secs(config.database.connect_timeout_seconds),
    PgPoolOptions::new()
      .max_connections(config.database.max_connections)
      .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_seconds))
      .connect_with(connect_options),
  )
  .await
  .map_err(|_| {
    anyhow::anyhow!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      config.database.connect_timeout_seconds
    )
  })?
  .context("Failed to connect to database")?;

  tracing::info!("Database connection pool created");

  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .context("Failed to run database migrations")?;
  tracing::info!("Database migrations completed");

  let blob_store: Arc<dyn BlobStore> = if config.storage.enabled {
    Arc::new(S3BlobStore::from_config(&config.storage).await)
  } else {
    tracing::info!("Object storage disabled, invoice files are kept inline");
    Arc::new(NoopBlobStore::new())
  };

  let email_sender: Arc<dyn EmailSender> = match ResendEmailSender::from_config(&config.email)
    .context("Failed to configure email sender")?
  {
    Some(sender) => Arc::new(sender),
    None => {
      tracing::warn!("Email delivery disabled, notifications stay PENDING");
      Arc::new(DisabledEmailSender)
    }
  };

  // Repositories
  let emitter_repo = Arc::new(PostgresEmitterRepository::new(db_pool.clone()));
  let series_repo = Arc::new(PostgresSeriesRepository::new(db_pool.clone()));
  let api_key_repo = Arc::new(PostgresApiKeyRepository::new(db_pool.clone()));
  let customer_repo = Arc::new(PostgresCustomerRepository::new(db_pool.clone()));
  let artifact_repo = Arc::new(PostgresArtifactRepository::new(db_pool.clone()));
  let invoice_store = Arc::new(PostgresInvoiceStore::new(db_pool.clone()));
  let product_repo = Arc::new(PostgresProductRepository::new(db_pool.clone()));

  // Services
  let emitter_service = Arc::new(EmitterService::new(
    emitter_repo.clone(),
    series_repo,
    api_key_repo,
  ));

  let product_service = Arc::new(ProductService::new(product_repo, emitter_repo.clone()));

  let invoice_service = Arc::new(InvoiceService::new(InvoiceServiceDependencies {
    invoice_store: invoice_store.clone(),
    customer_repo,
    emitter_repo,
    artifact_generator: Arc::new(DocumentGenerator::new()),
    artifact_store: Arc::new(ArtifactStore::new(blob_store, artifact_repo)),
    notifier: Arc::new(NotificationDispatcher::new(
      email_sender,
      invoice_store,
      config.server.base_url.clone(),
    )),
  }));

  let route_deps = ApiRouteDependencies::new(
    invoice_service,
    emitter_service,
    product_service,
    config.security.admin_token.clone(),
  );

  let server_host = config.server.host.clone();
  let server_port = config.server.port;

  tracing::info!("Starting HTTP server on {}:{}", server_host, server_port);

  HttpServer::new(move || {
    let route_deps = route_deps.clone();
    App::new()
      .wrap(Logger::default())
      .wrap(RequestIdMiddleware::new())
      .app_data(web::Data::new(db_pool.clone()))
      .configure(configure_health_routes)
      .configure(|cfg| configure_api_routes(cfg, route_deps))
  })
  .bind((server_host.as_str(), server_port))?
  .run()
  .await?;

  Ok(())
}
