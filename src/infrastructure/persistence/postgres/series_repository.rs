use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::emitter::{EmitterError, IssuingPoint, Series, SeriesRepository};
use crate::domain::invoice::value_objects::DocumentKind;

#[derive(Debug, FromRow)]
struct SeriesRow {
  id: Uuid,
  emitter_id: Uuid,
  pto_fac_df: String,
  doc_kind: String,
  next_number: i64,
  issued_count: i64,
  authorized_count: i64,
  rejected_count: i64,
  is_active: bool,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<SeriesRow> for Series {
  type Error = EmitterError;

  fn try_from(row: SeriesRow) -> Result<Self, Self::Error> {
    let document_kind = row
      .doc_kind
      .parse::<DocumentKind>()
      .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Series {
      id: row.id,
      emitter_id: row.emitter_id,
      issuing_point: IssuingPoint::new(&row.pto_fac_df)?,
      document_kind,
      next_number: row.next_number,
      issued_count: row.issued_count,
      authorized_count: row.authorized_count,
      rejected_count: row.rejected_count,
      is_active: row.is_active,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

pub struct PostgresSeriesRepository {
  pool: PgPool,
}

impl PostgresSeriesRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl SeriesRepository for PostgresSeriesRepository {
  async fn create(&self, series: Series) -> Result<Series, EmitterError> {
    let row = sqlx::query_as::<_, SeriesRow>(
      r#"
      INSERT INTO emitter_series (
        id, emitter_id, pto_fac_df, doc_kind, next_number, issued_count,
        authorized_count, rejected_count, is_active, created_at, updated_at
      )
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
      RETURNING id, emitter_id, pto_fac_df, doc_kind, next_number, issued_count,
                authorized_count, rejected_count, is_active, created_at, updated_at
      "#,
    )
    .bind(series.id)
    .bind(series.emitter_id)
    .bind(series.issuing_point.value())
    .bind(series.document_kind.as_str())
    .bind(series.next_number)
    .bind(series.issued_count)
    .bind(series.authorized_count)
    .bind(series.rejected_count)
    .bind(series.is_active)
    .bind(series.created_at)
    .bind(series.updated_at)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| {
      if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23505")
          && db_err.constraint() == Some("uq_emitter_series")
        {
          return EmitterError::SeriesAlreadyExists {
            issuing_point: series.issuing_point.to_string(),
            document_kind: series.document_kind,
          };
        }
      }
      EmitterError::Database(e)
    })?;

    row.try_into()
  }

  async fn list_by_emitter(&self, emitter_id: Uuid) -> Result<Vec<Series>, EmitterError> {
    let rows = sqlx::query_as::<_, SeriesRow>(
      r#"
      SELECT id, emitter_id, pto_fac_df, doc_kind, next_number, issued_count,
             authorized_count, rejected_count, is_active, created_at, updated_at
      FROM emitter_series
      WHERE emitter_id = $1
      ORDER BY pto_fac_df ASC, doc_kind ASC
      "#,
    )
    .bind(emitter_id)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }

  async fn deactivate(&self, series_id: Uuid) -> Result<bool, EmitterError> {
    let result = sqlx::query(
      r#"
      UPDATE emitter_series
      SET is_active = FALSE, updated_at = NOW()
      WHERE id = $1
      "#,
    )
    .bind(series_id)
    .execute(&self.pool)
    .await?;

    Ok(result.rows_affected() > 0)
  }
}
