use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::invoice::{InvoiceArtifacts, errors::InvoiceError, ports::ArtifactRepository};

#[derive(Debug, FromRow)]
struct InvoiceFilesRow {
  id: Uuid,
  invoice_id: Uuid,
  pdf_data: Option<Vec<u8>>,
  xml_data: Option<Vec<u8>>,
  pdf_size: i64,
  xml_size: i64,
  pdf_url: Option<String>,
  xml_url: Option<String>,
  generated_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl From<InvoiceFilesRow> for InvoiceArtifacts {
  fn from(row: InvoiceFilesRow) -> Self {
    InvoiceArtifacts {
      id: row.id,
      invoice_id: row.invoice_id,
      pdf_data: row.pdf_data,
      xml_data: row.xml_data,
      pdf_size: row.pdf_size,
      xml_size: row.xml_size,
      pdf_url: row.pdf_url,
      xml_url: row.xml_url,
      generated_at: row.generated_at,
      updated_at: row.updated_at,
    }
  }
}

pub struct PostgresArtifactRepository {
  pool: PgPool,
}

impl PostgresArtifactRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl ArtifactRepository for PostgresArtifactRepository {
  async fn upsert(&self, artifacts: InvoiceArtifacts) -> Result<InvoiceArtifacts, InvoiceError> {
    let row = sqlx::query_as::<_, InvoiceFilesRow>(
      r#"
      INSERT INTO invoice_files (
        id, invoice_id, pdf_data, xml_data, pdf_size, xml_size, pdf_url, xml_url,
        generated_at, updated_at
      )
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
      ON CONFLICT ON CONSTRAINT uq_invoice_files_invoice DO UPDATE
      SET pdf_data = EXCLUDED.pdf_data,
          xml_data = EXCLUDED.xml_data,
          pdf_size = EXCLUDED.pdf_size,
          xml_size = EXCLUDED.xml_size,
          pdf_url = EXCLUDED.pdf_url,
          xml_url = EXCLUDED.xml_url,
          generated_at = EXCLUDED.generated_at,
          updated_at = EXCLUDED.updated_at
      RETURNING id, invoice_id, pdf_data, xml_data, pdf_size, xml_size, pdf_url, xml_url,
                generated_at, updated_at
      "#,
    )
    .bind(artifacts.id)
    .bind(artifacts.invoice_id)
    .bind(&artifacts.pdf_data)
    .bind(&artifacts.xml_data)
    .bind(artifacts.pdf_size)
    .bind(artifacts.xml_size)
    .bind(&artifacts.pdf_url)
    .bind(&artifacts.xml_url)
    .bind(artifacts.generated_at)
    .bind(artifacts.updated_at)
    .fetch_one(&self.pool)
    .await?;

    Ok(row.into())
  }

  async fn find_by_invoice_id(
    &self,
    invoice_id: Uuid,
  ) -> Result<Option<InvoiceArtifacts>, InvoiceError> {
    let row = sqlx::query_as::<_, InvoiceFilesRow>(
      r#"
      SELECT id, invoice_id, pdf_data, xml_data, pdf_size, xml_size, pdf_url, xml_url,
             generated_at, updated_at
      FROM invoice_files
      WHERE invoice_id = $1
      "#,
    )
    .bind(invoice_id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Into::into))
  }
}
