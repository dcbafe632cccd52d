use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::domain::invoice::{
  Customer, CustomerDetails, errors::InvoiceError, ports::CustomerRepository,
};

#[derive(Debug, FromRow)]
pub(crate) struct CustomerRow {
  id: Uuid,
  emitter_id: Uuid,
  name: String,
  email: String,
  phone: Option<String>,
  address_line: Option<String>,
  ubi_code: Option<String>,
  tax_id: Option<String>,
  is_active: bool,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
  fn from(row: CustomerRow) -> Self {
    Customer {
      id: row.id,
      emitter_id: row.emitter_id,
      name: row.name,
      email: row.email,
      phone: row.phone,
      address_line: row.address_line,
      ubi_code: row.ubi_code,
      tax_id: row.tax_id,
      is_active: row.is_active,
      created_at: row.created_at,
      updated_at: row.updated_at,
    }
  }
}

/// Inserts the customer or refreshes the row matching `(emitter_id, email)`.
/// Contact fields only overwrite when the new details carry them.
pub(crate) async fn upsert_customer<'e, E>(
  executor: E,
  emitter_id: Uuid,
  details: &CustomerDetails,
) -> Result<CustomerRow, sqlx::Error>
where
  E: Executor<'e, Database = Postgres>,
{
  let customer = Customer::new(emitter_id, details.clone());

  sqlx::query_as::<_, CustomerRow>(
    r#"
    INSERT INTO customers (
      id, emitter_id, name, email, phone, address_line, ubi_code, tax_id,
      is_active, created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    ON CONFLICT ON CONSTRAINT uq_customers_emitter_email DO UPDATE
    SET name = EXCLUDED.name,
        phone = COALESCE(EXCLUDED.phone, customers.phone),
        address_line = COALESCE(EXCLUDED.address_line, customers.address_line),
        ubi_code = COALESCE(EXCLUDED.ubi_code, customers.ubi_code),
        tax_id = COALESCE(EXCLUDED.tax_id, customers.tax_id),
        updated_at = EXCLUDED.updated_at
    RETURNING id, emitter_id, name, email, phone, address_line, ubi_code, tax_id,
              is_active, created_at, updated_at
    "#,
  )
  .bind(customer.id)
  .bind(customer.emitter_id)
  .bind(&customer.name)
  .bind(&customer.email)
  .bind(&customer.phone)
  .bind(&customer.address_line)
  .bind(&customer.ubi_code)
  .bind(&customer.tax_id)
  .bind(customer.is_active)
  .bind(customer.created_at)
  .bind(customer.updated_at)
  .fetch_one(executor)
  .await
}

pub struct PostgresCustomerRepository {
  pool: PgPool,
}

impl PostgresCustomerRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
  async fn upsert(
    &self,
    emitter_id: Uuid,
    details: &CustomerDetails,
  ) -> Result<Customer, InvoiceError> {
    let row = upsert_customer(&self.pool, emitter_id, details).await?;
    Ok(row.into())
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, InvoiceError> {
    let row = sqlx::query_as::<_, CustomerRow>(
      r#"
      SELECT id, emitter_id, name, email, phone, address_line, ubi_code, tax_id,
             is_active, created_at, updated_at
      FROM customers
      WHERE id = $1
      "#,
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Into::into))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::testing::sample_customer;
  use crate::infrastructure::persistence::postgres::test_support::{seed_emitter, setup_test_db};

  #[tokio::test]
  async fn test_upsert_reuses_customer_by_email() {
    let (pool, _container) = setup_test_db().await;
    let emitter = seed_emitter(&pool, "ACME").await;
    let repo = PostgresCustomerRepository::new(pool);

    let first = repo.upsert(emitter.id, &sample_customer()).await.unwrap();

    let mut renamed = sample_customer();
    renamed.name = "Cliente Renombrado".to_string();
    renamed.email = "CLIENTE@example.com".to_string();
    renamed.phone = Some("+507 6000-0000".to_string());
    let second = repo.upsert(emitter.id, &renamed).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.name, "Cliente Renombrado");
    assert_eq!(second.phone.as_deref(), Some("+507 6000-0000"));

    let found = repo.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(found.email, "cliente@example.com");
  }

  #[tokio::test]
  async fn test_customers_are_scoped_per_emitter() {
    let (pool, _container) = setup_test_db().await;
    let acme = seed_emitter(&pool, "ACME").await;
    let globex = seed_emitter(&pool, "GLOBEX").await;
    let repo = PostgresCustomerRepository::new(pool);

    let a = repo.upsert(acme.id, &sample_customer()).await.unwrap();
    let b = repo.upsert(globex.id, &sample_customer()).await.unwrap();

    assert_ne!(a.id, b.id);
  }
}
