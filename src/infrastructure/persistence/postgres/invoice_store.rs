use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::customer_repository::{CustomerRow, upsert_customer};
use super::emitter_repository::{EMITTER_COLUMNS, EmitterRow};
use crate::domain::emitter::{DocumentNumber, Emitter};
use crate::domain::invoice::{
  AuthorityResponse, Customer, DocumentReference, Invoice, InvoiceDocument, InvoiceItem, NewInvoice,
  errors::InvoiceError,
  ports::InvoiceStore,
  value_objects::{DocumentKind, DocumentStatus, EmailStatus, TaxRate},
};

const INVOICE_COLUMNS: &str = r#"
  id, emitter_id, series_id, customer_id, doc_kind, d_nrodf, d_ptofacdf, status,
  email_status, ref_cufe, ref_nrodf, ref_ptofacdf, cufe, url_cufe, xml_response,
  xml_fe, xml_protocolo, cafe_pdf_url, iamb, itpemis, idoc, subtotal, itbms_amount,
  total_amount, idempotency_key, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct InvoiceRow {
  id: Uuid,
  emitter_id: Uuid,
  series_id: Uuid,
  customer_id: Uuid,
  doc_kind: String,
  d_nrodf: String,
  d_ptofacdf: String,
  status: String,
  email_status: String,
  ref_cufe: Option<String>,
  ref_nrodf: Option<String>,
  ref_ptofacdf: Option<String>,
  cufe: Option<String>,
  url_cufe: Option<String>,
  xml_response: Option<String>,
  xml_fe: Option<String>,
  xml_protocolo: Option<String>,
  cafe_pdf_url: Option<String>,
  iamb: i16,
  itpemis: String,
  idoc: String,
  subtotal: Decimal,
  itbms_amount: Decimal,
  total_amount: Decimal,
  idempotency_key: Option<String>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
  type Error = InvoiceError;

  fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
    let reference = match (row.ref_cufe, row.ref_nrodf, row.ref_ptofacdf) {
      (Some(cufe), Some(number), Some(issuing_point)) => Some(DocumentReference {
        cufe,
        number,
        issuing_point,
      }),
      _ => None,
    };

    Ok(Invoice {
      id: row.id,
      emitter_id: row.emitter_id,
      series_id: row.series_id,
      customer_id: row.customer_id,
      document_kind: row.doc_kind.parse::<DocumentKind>()?,
      document_number: row.d_nrodf,
      issuing_point: row.d_ptofacdf,
      status: row.status.parse::<DocumentStatus>()?,
      email_status: row.email_status.parse::<EmailStatus>()?,
      reference,
      authority: AuthorityResponse {
        cufe: row.cufe,
        url_cufe: row.url_cufe,
        xml_response: row.xml_response,
        xml_fe: row.xml_fe,
        xml_protocolo: row.xml_protocolo,
        cafe_pdf_url: row.cafe_pdf_url,
      },
      environment: row.iamb,
      emission_type: row.itpemis,
      document_code: row.idoc,
      subtotal: row.subtotal,
      itbms_amount: row.itbms_amount,
      total_amount: row.total_amount,
      idempotency_key: row.idempotency_key,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct InvoiceItemRow {
  id: Uuid,
  invoice_id: Uuid,
  line_no: i32,
  sku: Option<String>,
  description: String,
  qty: Decimal,
  unit_price: Decimal,
  itbms_rate: String,
  cpbs_abr: Option<String>,
  cpbs_cmp: Option<String>,
  line_total: Decimal,
  created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceItemRow> for InvoiceItem {
  type Error = InvoiceError;

  fn try_from(row: InvoiceItemRow) -> Result<Self, Self::Error> {
    Ok(InvoiceItem {
      id: row.id,
      invoice_id: row.invoice_id,
      line_no: row.line_no,
      sku: row.sku,
      description: row.description,
      quantity: row.qty,
      unit_price: row.unit_price,
      tax_rate: TaxRate::from_code(&row.itbms_rate)?,
      cpbs_abr: row.cpbs_abr,
      cpbs_cmp: row.cpbs_cmp,
      line_total: row.line_total,
      created_at: row.created_at,
    })
  }
}

fn is_unique_violation(e: &sqlx::Error, constraint: &str) -> bool {
  match e {
    sqlx::Error::Database(db_err) => {
      db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint)
    }
    _ => false,
  }
}

fn map_db_error(e: sqlx::Error) -> InvoiceError {
  if let sqlx::Error::Database(db_err) = &e {
    // query_canceled, raised when statement_timeout fires
    if db_err.code().as_deref() == Some("57014") {
      return InvoiceError::Timeout(db_err.message().to_string());
    }
  }
  InvoiceError::Database(e)
}

/// Invoices and their items on Postgres. Number allocation and insert share
/// one transaction; the series row lock taken by the increment serializes
/// concurrent commits on the same series.
pub struct PostgresInvoiceStore {
  pool: PgPool,
}

impl PostgresInvoiceStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  /// Atomically takes the next number of the active series.
  async fn allocate(
    tx: &mut Transaction<'_, Postgres>,
    invoice: &NewInvoice,
  ) -> Result<(Uuid, i64), InvoiceError> {
    let allocated = sqlx::query_as::<_, (Uuid, i64)>(
      r#"
      UPDATE emitter_series
      SET next_number = next_number + 1,
          issued_count = issued_count + 1,
          updated_at = NOW()
      WHERE emitter_id = $1 AND pto_fac_df = $2 AND doc_kind = $3 AND is_active = TRUE
      RETURNING id, next_number - 1
      "#,
    )
    .bind(invoice.emitter_id)
    .bind(&invoice.issuing_point)
    .bind(invoice.document_kind.as_str())
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_db_error)?;

    allocated.ok_or_else(|| InvoiceError::SeriesNotFound {
      emitter_id: invoice.emitter_id,
      issuing_point: invoice.issuing_point.clone(),
      document_kind: invoice.document_kind,
    })
  }

  async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    invoice: &NewInvoice,
    customer_id: Uuid,
    series_id: Uuid,
    number: i64,
  ) -> Result<InvoiceRow, sqlx::Error> {
    let now = Utc::now();
    let reference = invoice.reference.as_ref();

    let row = sqlx::query_as::<_, InvoiceRow>(&format!(
      r#"
      INSERT INTO invoices (
        id, emitter_id, series_id, customer_id, doc_kind, d_nrodf, d_ptofacdf, status,
        email_status, ref_cufe, ref_nrodf, ref_ptofacdf, iamb, itpemis, idoc,
        subtotal, itbms_amount, total_amount, idempotency_key, created_at, updated_at
      )
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $20)
      RETURNING {}
      "#,
      INVOICE_COLUMNS
    ))
    .bind(invoice.id)
    .bind(invoice.emitter_id)
    .bind(series_id)
    .bind(customer_id)
    .bind(invoice.document_kind.as_str())
    .bind(DocumentNumber::new(number).to_string())
    .bind(&invoice.issuing_point)
    .bind(DocumentStatus::Received.as_str())
    .bind(EmailStatus::Pending.as_str())
    .bind(reference.map(|r| r.cufe.as_str()))
    .bind(reference.map(|r| r.number.as_str()))
    .bind(reference.map(|r| r.issuing_point.as_str()))
    .bind(invoice.environment)
    .bind(&invoice.emission_type)
    .bind(&invoice.document_code)
    .bind(invoice.totals.subtotal)
    .bind(invoice.totals.itbms_amount)
    .bind(invoice.totals.total_amount)
    .bind(&invoice.idempotency_key)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    for item in &invoice.items {
      sqlx::query(
        r#"
        INSERT INTO invoice_items (
          id, invoice_id, line_no, sku, description, qty, unit_price,
          itbms_rate, cpbs_abr, cpbs_cmp, line_total, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
      )
      .bind(Uuid::new_v4())
      .bind(invoice.id)
      .bind(item.line_no)
      .bind(&item.sku)
      .bind(&item.description)
      .bind(item.quantity)
      .bind(item.unit_price)
      .bind(item.tax_rate.code())
      .bind(&item.cpbs_abr)
      .bind(&item.cpbs_cmp)
      .bind(item.line_total)
      .bind(now)
      .execute(&mut **tx)
      .await?;
    }

    Ok(row)
  }

  async fn find_items(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItem>, InvoiceError> {
    let rows = sqlx::query_as::<_, InvoiceItemRow>(
      r#"
      SELECT id, invoice_id, line_no, sku, description, qty, unit_price,
             itbms_rate, cpbs_abr, cpbs_cmp, line_total, created_at
      FROM invoice_items
      WHERE invoice_id = $1
      ORDER BY line_no
      "#,
    )
    .bind(invoice_id)
    .fetch_all(&self.pool)
    .await
    .map_err(map_db_error)?;

    rows.into_iter().map(|r| r.try_into()).collect()
  }
}

#[async_trait]
impl InvoiceStore for PostgresInvoiceStore {
  async fn commit(&self, invoice: NewInvoice) -> Result<Invoice, InvoiceError> {
    let mut tx = self.pool.begin().await.map_err(map_db_error)?;

    let (series_id, number) = Self::allocate(&mut tx, &invoice).await?;
    let customer: Customer = upsert_customer(&mut *tx, invoice.emitter_id, &invoice.customer)
      .await
      .map_err(map_db_error)?
      .into();

    let row = match Self::insert(&mut tx, &invoice, customer.id, series_id, number).await {
      Ok(row) => row,
      Err(e) if is_unique_violation(&e, "uq_invoices_idempotency_key") => {
        // the aborted transaction also gives the number back
        tx.rollback().await.map_err(map_db_error)?;
        let key = invoice.idempotency_key.as_deref().unwrap_or_default();
        let existing = self
          .find_by_idempotency_key(key)
          .await?
          .ok_or_else(|| InvoiceError::Internal("Idempotency winner not visible".to_string()))?;
        return Err(InvoiceError::DuplicateIdempotencyKey {
          existing_id: existing.id,
        });
      }
      Err(e) => return Err(map_db_error(e)),
    };

    tx.commit().await.map_err(map_db_error)?;

    tracing::debug!(
      invoice_id = %row.id,
      series_id = %series_id,
      number = number,
      "Invoice row committed"
    );

    row.try_into()
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError> {
    let row = sqlx::query_as::<_, InvoiceRow>(&format!(
      "SELECT {} FROM invoices WHERE id = $1",
      INVOICE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&self.pool)
    .await
    .map_err(map_db_error)?;

    row.map(|r| r.try_into()).transpose()
  }

  async fn find_document(&self, id: Uuid) -> Result<Option<InvoiceDocument>, InvoiceError> {
    let Some(invoice) = self.find_by_id(id).await? else {
      return Ok(None);
    };

    let emitter: Emitter = sqlx::query_as::<_, EmitterRow>(&format!(
      "SELECT {} FROM emitters e WHERE e.id = $1",
      EMITTER_COLUMNS
    ))
    .bind(invoice.emitter_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(map_db_error)?
    .ok_or(InvoiceError::EmitterNotFound(invoice.emitter_id))?
    .try_into()?;

    let customer: Customer = sqlx::query_as::<_, CustomerRow>(
      r#"
      SELECT id, emitter_id, name, email, phone, address_line, ubi_code, tax_id,
             is_active, created_at, updated_at
      FROM customers
      WHERE id = $1
      "#,
    )
    .bind(invoice.customer_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(map_db_error)?
    .ok_or(InvoiceError::CustomerNotFound(invoice.customer_id))?
    .into();

    let items = self.find_items(id).await?;

    Ok(Some(InvoiceDocument {
      invoice,
      emitter,
      customer,
      items,
    }))
  }

  async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Invoice>, InvoiceError> {
    let row = sqlx::query_as::<_, InvoiceRow>(&format!(
      "SELECT {} FROM invoices WHERE idempotency_key = $1",
      INVOICE_COLUMNS
    ))
    .bind(key)
    .fetch_optional(&self.pool)
    .await
    .map_err(map_db_error)?;

    row.map(|r| r.try_into()).transpose()
  }

  async fn update_status(
    &self,
    id: Uuid,
    expected: DocumentStatus,
    new: DocumentStatus,
    response: Option<&AuthorityResponse>,
  ) -> Result<Invoice, InvoiceError> {
    let empty = AuthorityResponse::default();
    let response = response.unwrap_or(&empty);
    let mut tx = self.pool.begin().await.map_err(map_db_error)?;

    let row = sqlx::query_as::<_, InvoiceRow>(&format!(
      r#"
      UPDATE invoices
      SET status = $3,
          cufe = COALESCE($4, cufe),
          url_cufe = COALESCE($5, url_cufe),
          xml_response = COALESCE($6, xml_response),
          xml_fe = COALESCE($7, xml_fe),
          xml_protocolo = COALESCE($8, xml_protocolo),
          cafe_pdf_url = COALESCE($9, cafe_pdf_url),
          updated_at = NOW()
      WHERE id = $1 AND status = $2
      RETURNING {}
      "#,
      INVOICE_COLUMNS
    ))
    .bind(id)
    .bind(expected.as_str())
    .bind(new.as_str())
    .bind(&response.cufe)
    .bind(&response.url_cufe)
    .bind(&response.xml_response)
    .bind(&response.xml_fe)
    .bind(&response.xml_protocolo)
    .bind(&response.cafe_pdf_url)
    .fetch_optional(&mut *tx)
    .await
    .map_err(map_db_error)?;

    let Some(row) = row else {
      tx.rollback().await.map_err(map_db_error)?;
      return match self.find_by_id(id).await? {
        Some(_) => Err(InvoiceError::ConcurrentModification(id)),
        None => Err(InvoiceError::InvoiceNotFound(id)),
      };
    };

    let counter = match new {
      DocumentStatus::Authorized => Some("authorized_count"),
      DocumentStatus::Rejected => Some("rejected_count"),
      _ => None,
    };
    if let Some(column) = counter {
      sqlx::query(&format!(
        "UPDATE emitter_series SET {col} = {col} + 1, updated_at = NOW() WHERE id = $1",
        col = column
      ))
      .bind(row.series_id)
      .execute(&mut *tx)
      .await
      .map_err(map_db_error)?;
    }

    tx.commit().await.map_err(map_db_error)?;
    row.try_into()
  }

  async fn update_email_status(&self, id: Uuid, status: EmailStatus) -> Result<(), InvoiceError> {
    let result = sqlx::query(
      "UPDATE invoices SET email_status = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(status.as_str())
    .execute(&self.pool)
    .await
    .map_err(map_db_error)?;

    if result.rows_affected() == 0 {
      return Err(InvoiceError::InvoiceNotFound(id));
    }
    Ok(())
  }

  async fn count_by_status(
    &self,
    emitter_id: Uuid,
    since: DateTime<Utc>,
  ) -> Result<Vec<(DocumentStatus, i64)>, InvoiceError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
      r#"
      SELECT status, COUNT(*)
      FROM invoices
      WHERE emitter_id = $1 AND created_at >= $2
      GROUP BY status
      "#,
    )
    .bind(emitter_id)
    .bind(since)
    .fetch_all(&self.pool)
    .await
    .map_err(map_db_error)?;

    rows
      .into_iter()
      .map(|(status, count)| Ok((status.parse::<DocumentStatus>()?, count)))
      .collect()
  }
}
