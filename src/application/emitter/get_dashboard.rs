use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use super::create_series::SeriesDto;
use crate::domain::emitter::EmitterService;
use crate::domain::invoice::{DocumentStatus, InvoiceError, InvoiceService};

#[derive(Debug, Clone)]
pub struct GetDashboardCommand {
  pub emitter_id: Uuid,
}

/// Invoice counts for the reporting month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardTotals {
  pub issued: i64,
  pub authorized: i64,
  pub rejected: i64,
  /// Not yet authorized or rejected, `ERROR` included
  pub in_progress: i64,
  pub by_status: BTreeMap<&'static str, i64>,
}

impl DashboardTotals {
  pub fn from_counts(counts: &[(DocumentStatus, i64)]) -> Self {
    counts
      .iter()
      .fold(DashboardTotals::default(), |mut totals, (status, count)| {
        totals.issued += count;
        match status {
          DocumentStatus::Authorized => totals.authorized += count,
          DocumentStatus::Rejected => totals.rejected += count,
          _ => totals.in_progress += count,
        }
        *totals.by_status.entry(status.as_str()).or_default() += count;
        totals
      })
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
  pub emitter_id: Uuid,
  /// `YYYY-MM`, UTC
  pub month: String,
  pub series: Vec<SeriesDto>,
  pub totals: DashboardTotals,
}

pub struct GetDashboardUseCase {
  emitter_service: Arc<EmitterService>,
  invoice_service: Arc<InvoiceService>,
}

impl GetDashboardUseCase {
  pub fn new(emitter_service: Arc<EmitterService>, invoice_service: Arc<InvoiceService>) -> Self {
    Self {
      emitter_service,
      invoice_service,
    }
  }

  pub async fn execute(
    &self,
    command: GetDashboardCommand,
  ) -> Result<DashboardResponse, InvoiceError> {
    let now = Utc::now();
    let since = month_start(now)?;

    let emitter = self.emitter_service.get_emitter(command.emitter_id).await?;
    let series = self.emitter_service.all_series(emitter.id).await?;
    let counts = self.invoice_service.status_counts(emitter.id, since).await?;

    Ok(DashboardResponse {
      emitter_id: emitter.id,
      month: now.format("%Y-%m").to_string(),
      series: series.into_iter().map(SeriesDto::from).collect(),
      totals: DashboardTotals::from_counts(&counts),
    })
  }
}

fn month_start(now: DateTime<Utc>) -> Result<DateTime<Utc>, InvoiceError> {
  Utc
    .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
    .single()
    .ok_or_else(|| InvoiceError::Internal(format!("No month start for {}", now)))
}
