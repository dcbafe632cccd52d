//! Shared Postgres fixtures for repository tests.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::ImageExt;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::{ContainerAsync, runners::AsyncRunner};
use uuid::Uuid;

use super::{PostgresCustomerRepository, PostgresEmitterRepository, PostgresSeriesRepository};
use crate::domain::emitter::{Emitter, EmitterRepository, IssuingPoint, Series, SeriesRepository};
use crate::domain::invoice::ports::CustomerRepository;
use crate::domain::invoice::totals::TotalsCalculator;
use crate::domain::invoice::value_objects::DocumentKind;
use crate::domain::invoice::{Customer, NewInvoice};
use crate::domain::testing::{sample_customer, sample_new_emitter, sample_request};
use rust_decimal_macros::dec;

pub async fn setup_test_db() -> (PgPool, ContainerAsync<Postgres>) {
  let container = Postgres::default()
    .with_tag("16-alpine")
    .start()
    .await
    .expect("Failed to start postgres container");

  let host = container.get_host().await.expect("Failed to get host");
  let port = container
    .get_host_port_ipv4(5432)
    .await
    .expect("Failed to get port");
  let database_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

  let pool = PgPoolOptions::new()
    .max_connections(5)
    .connect(&database_url)
    .await
    .expect("Failed to connect to test database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  (pool, container)
}

pub async fn seed_emitter(pool: &PgPool, code: &str) -> Emitter {
  PostgresEmitterRepository::new(pool.clone())
    .create(Emitter::new(sample_new_emitter(code)))
    .await
    .expect("Failed to seed emitter")
}

pub async fn seed_series(pool: &PgPool, emitter_id: Uuid, point: &str, kind: DocumentKind) -> Series {
  PostgresSeriesRepository::new(pool.clone())
    .create(Series::new(
      emitter_id,
      IssuingPoint::new(point).expect("valid issuing point"),
      kind,
    ))
    .await
    .expect("Failed to seed series")
}

pub async fn seed_customer(pool: &PgPool, emitter_id: Uuid) -> Customer {
  PostgresCustomerRepository::new(pool.clone())
    .upsert(emitter_id, &sample_customer())
    .await
    .expect("Failed to seed customer")
}

/// The 26.40 sample invoice on the emitter's default point.
pub fn new_invoice(emitter: &Emitter, idempotency_key: Option<String>) -> NewInvoice {
  let request = sample_request(emitter.id, dec!(26.40), None);
  let computed = TotalsCalculator::calculate(&request.items).expect("valid sample lines");

  NewInvoice {
    id: Uuid::new_v4(),
    emitter_id: emitter.id,
    customer: sample_customer(),
    document_kind: DocumentKind::Invoice,
    issuing_point: emitter.default_issuing_point.value().to_string(),
    environment: emitter.environment.code(),
    emission_type: emitter.default_emission_type.value().to_string(),
    document_code: emitter.default_document_code.value().to_string(),
    reference: None,
    totals: computed.totals,
    idempotency_key,
    items: computed.items,
  }
}
