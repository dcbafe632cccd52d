use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::emitter::{
  BranchCode, Branding, Emitter, EmitterError, EmitterRepository, Environment, FiscalCode,
  IssuingPoint, Ruc,
};

pub(crate) const EMITTER_COLUMNS: &str = r#"
  e.id, e.name, e.company_code, e.ruc_tipo, e.ruc_numero, e.ruc_dv, e.suc_em,
  e.pto_fac_default, e.iamb, e.itpemis_default, e.idoc_default, e.email, e.phone,
  e.address_line, e.ubi_code, e.brand_logo_url, e.brand_primary_color,
  e.brand_footer_html, e.is_active, e.created_at, e.updated_at
"#;

#[derive(Debug, FromRow)]
pub(crate) struct EmitterRow {
  id: Uuid,
  name: String,
  company_code: String,
  ruc_tipo: String,
  ruc_numero: String,
  ruc_dv: String,
  suc_em: String,
  pto_fac_default: String,
  iamb: i16,
  itpemis_default: String,
  idoc_default: String,
  email: String,
  phone: Option<String>,
  address_line: Option<String>,
  ubi_code: Option<String>,
  brand_logo_url: Option<String>,
  brand_primary_color: Option<String>,
  brand_footer_html: Option<String>,
  is_active: bool,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<EmitterRow> for Emitter {
  type Error = EmitterError;

  fn try_from(row: EmitterRow) -> Result<Self, Self::Error> {
    Ok(Emitter {
      id: row.id,
      name: row.name,
      company_code: row.company_code,
      ruc: Ruc::new(&row.ruc_tipo, &row.ruc_numero, &row.ruc_dv)?,
      branch: BranchCode::new(&row.suc_em)?,
      default_issuing_point: IssuingPoint::new(&row.pto_fac_default)?,
      environment: Environment::from_code(row.iamb)?,
      default_emission_type: FiscalCode::new(&row.itpemis_default)?,
      default_document_code: FiscalCode::new(&row.idoc_default)?,
      email: row.email,
      phone: row.phone,
      address_line: row.address_line,
      ubi_code: row.ubi_code,
      branding: Branding {
        logo_url: row.brand_logo_url,
        primary_color: row.brand_primary_color,
        footer_html: row.brand_footer_html,
      },
      is_active: row.is_active,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

pub struct PostgresEmitterRepository {
  pool: PgPool,
}

impl PostgresEmitterRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl EmitterRepository for PostgresEmitterRepository {
  async fn create(&self, emitter: Emitter) -> Result<Emitter, EmitterError> {
    let company_code = emitter.company_code.clone();

    let row = sqlx::query_as::<_, EmitterRow>(&format!(
      r#"
      INSERT INTO emitters AS e (
        id, name, company_code, ruc_tipo, ruc_numero, ruc_dv, suc_em, pto_fac_default,
        iamb, itpemis_default, idoc_default, email, phone, address_line, ubi_code,
        brand_logo_url, brand_primary_color, brand_footer_html, is_active, created_at, updated_at
      )
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)
      RETURNING {}
      "#,
      EMITTER_COLUMNS
    ))
    .bind(emitter.id)
    .bind(&emitter.name)
    .bind(&emitter.company_code)
    .bind(emitter.ruc.tipo())
    .bind(emitter.ruc.numero())
    .bind(emitter.ruc.dv())
    .bind(emitter.branch.value())
    .bind(emitter.default_issuing_point.value())
    .bind(emitter.environment.code())
    .bind(emitter.default_emission_type.value())
    .bind(emitter.default_document_code.value())
    .bind(&emitter.email)
    .bind(&emitter.phone)
    .bind(&emitter.address_line)
    .bind(&emitter.ubi_code)
    .bind(&emitter.branding.logo_url)
    .bind(&emitter.branding.primary_color)
    .bind(&emitter.branding.footer_html)
    .bind(emitter.is_active)
    .bind(emitter.created_at)
    .bind(emitter.updated_at)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| {
      if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23505")
          && db_err.constraint() == Some("uq_emitters_company_code")
        {
          return EmitterError::EmitterAlreadyExists(company_code.clone());
        }
      }
      EmitterError::Database(e)
    })?;

    row.try_into()
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Emitter>, EmitterError> {
    let row = sqlx::query_as::<_, EmitterRow>(&format!(
      "SELECT {} FROM emitters e WHERE e.id = $1",
      EMITTER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    row.map(|r| r.try_into()).transpose()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::testing::sample_new_emitter;
  use crate::infrastructure::persistence::postgres::test_support::setup_test_db;

  #[tokio::test]
  async fn test_create_and_find_emitter() {
    let (pool, _container) = setup_test_db().await;
    let repo = PostgresEmitterRepository::new(pool);

    let emitter = Emitter::new(sample_new_emitter("ACME"));
    let created = repo.create(emitter.clone()).await.unwrap();
    assert_eq!(created.id, emitter.id);
    assert_eq!(created.ruc_display(), "2-155596713-2-2015-59-0000");

    let found = repo.find_by_id(emitter.id).await.unwrap().unwrap();
    assert_eq!(found.name, "ACME S.A.");
    assert_eq!(found.default_issuing_point.value(), "001");
    assert!(found.is_active);
  }

  #[tokio::test]
  async fn test_duplicate_company_code_conflicts() {
    let (pool, _container) = setup_test_db().await;
    let repo = PostgresEmitterRepository::new(pool);

    repo
      .create(Emitter::new(sample_new_emitter("ACME")))
      .await
      .unwrap();
    let result = repo.create(Emitter::new(sample_new_emitter("ACME"))).await;

    assert!(matches!(result, Err(EmitterError::EmitterAlreadyExists(code)) if code == "acme"));
  }

  #[tokio::test]
  async fn test_find_missing_emitter() {
    let (pool, _container) = setup_test_db().await;
    let repo = PostgresEmitterRepository::new(pool);

    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
  }
}
