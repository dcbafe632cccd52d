use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::adapters::http::dtos::HealthResponse;

/// Liveness plus a database round trip
/// GET /health
pub async fn health_handler(pool: web::Data<PgPool>) -> HttpResponse {
  match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
    Ok(_) => HttpResponse::Ok().json(HealthResponse {
      status: "ok",
      database: "ok",
    }),
    Err(e) => {
      tracing::error!(error = %e, "Health check database ping failed");
      HttpResponse::ServiceUnavailable().json(HealthResponse {
        status: "degraded",
        database: "unavailable",
      })
    }
  }
}
