use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::emitter::{ApiKey, ApiKeyRepository, EmitterError};

#[derive(Debug, FromRow)]
struct ApiKeyRow {
  id: Uuid,
  emitter_id: Uuid,
  name: String,
  key_hash: String,
  is_active: bool,
  created_at: DateTime<Utc>,
  last_used_at: Option<DateTime<Utc>>,
}

impl From<ApiKeyRow> for ApiKey {
  fn from(row: ApiKeyRow) -> Self {
    ApiKey {
      id: row.id,
      emitter_id: row.emitter_id,
      name: row.name,
      key_hash: row.key_hash,
      is_active: row.is_active,
      created_at: row.created_at,
      last_used_at: row.last_used_at,
    }
  }
}

pub struct PostgresApiKeyRepository {
  pool: PgPool,
}

impl PostgresApiKeyRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
  async fn create(&self, key: ApiKey) -> Result<ApiKey, EmitterError> {
    let row = sqlx::query_as::<_, ApiKeyRow>(
      r#"
      INSERT INTO api_keys (id, emitter_id, name, key_hash, is_active, created_at, last_used_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7)
      RETURNING id, emitter_id, name, key_hash, is_active, created_at, last_used_at
      "#,
    )
    .bind(key.id)
    .bind(key.emitter_id)
    .bind(&key.name)
    .bind(&key.key_hash)
    .bind(key.is_active)
    .bind(key.created_at)
    .bind(key.last_used_at)
    .fetch_one(&self.pool)
    .await?;

    Ok(row.into())
  }

  async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, EmitterError> {
    let row = sqlx::query_as::<_, ApiKeyRow>(
      r#"
      SELECT id, emitter_id, name, key_hash, is_active, created_at, last_used_at
      FROM api_keys
      WHERE key_hash = $1 AND is_active = TRUE
      "#,
    )
    .bind(key_hash)
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Into::into))
  }

  async fn touch(&self, id: Uuid) -> Result<(), EmitterError> {
    sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(())
  }
}
