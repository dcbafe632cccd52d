use actix_web::{
  HttpResponse,
  error::ResponseError,
  http::{StatusCode, header::ContentType},
};
use std::fmt;

use crate::domain::emitter::EmitterError;
use crate::domain::invoice::InvoiceError;
use crate::domain::product::ProductError;

use super::dtos::{ErrorBody, ErrorResponse, FieldIssue};

/// API error type that maps domain errors to HTTP responses
#[derive(Debug)]
pub enum ApiError {
  /// Malformed or out-of-range input (400)
  InvalidRequest {
    message: String,
    details: Vec<FieldIssue>,
  },

  /// Missing or invalid credentials (401)
  Unauthorized(String),

  /// Resource belongs to another emitter (403)
  Forbidden(String),

  /// Unknown resource (404)
  NotFound(String),

  /// Duplicate submission or state conflict (409)
  Conflict {
    message: String,
    details: Vec<FieldIssue>,
  },

  /// Saturated connection pool (429)
  RateLimited,

  /// Internal server error (500)
  Internal(String),
}

impl ApiError {
  pub fn invalid(message: impl Into<String>) -> Self {
    ApiError::InvalidRequest {
      message: message.into(),
      details: Vec::new(),
    }
  }

  pub fn invalid_field(message: impl Into<String>, field: &str, issue: impl Into<String>) -> Self {
    ApiError::InvalidRequest {
      message: message.into(),
      details: vec![FieldIssue::new(field, issue)],
    }
  }

  pub fn conflict(message: impl Into<String>) -> Self {
    ApiError::Conflict {
      message: message.into(),
      details: Vec::new(),
    }
  }

  /// Machine-readable code rendered in the error body
  pub fn code(&self) -> &'static str {
    match self {
      ApiError::InvalidRequest { .. } => "INVALID_REQUEST",
      ApiError::Unauthorized(_) => "UNAUTHORIZED",
      ApiError::Forbidden(_) => "FORBIDDEN",
      ApiError::NotFound(_) => "NOT_FOUND",
      ApiError::Conflict { .. } => "CONFLICT",
      ApiError::RateLimited => "RATE_LIMITED",
      ApiError::Internal(_) => "INTERNAL",
    }
  }
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiError::InvalidRequest { message, .. } => write!(f, "Invalid request: {}", message),
      ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
      ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
      ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
      ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
      ApiError::RateLimited => write!(f, "Rate limited"),
      ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
    }
  }
}

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict { .. } => StatusCode::CONFLICT,
      ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let (message, details) = match self {
      ApiError::InvalidRequest { message, details } | ApiError::Conflict { message, details } => {
        (message.clone(), details.clone())
      }
      ApiError::Unauthorized(msg) | ApiError::Forbidden(msg) | ApiError::NotFound(msg) => {
        (msg.clone(), Vec::new())
      }
      ApiError::RateLimited => (
        "Too many concurrent requests, retry later".to_string(),
        Vec::new(),
      ),
      ApiError::Internal(msg) => {
        // Don't expose internal error details
        tracing::error!("Internal error: {}", msg);
        ("An internal server error occurred".to_string(), Vec::new())
      }
    };

    HttpResponse::build(self.status_code())
      .content_type(ContentType::json())
      .json(ErrorResponse {
        error: ErrorBody {
          code: self.code(),
          message,
          details,
        },
      })
  }
}

fn database_error(error: sqlx::Error) -> ApiError {
  match error {
    sqlx::Error::PoolTimedOut => ApiError::RateLimited,
    other => ApiError::Internal(format!("Database error: {}", other)),
  }
}

impl From<InvoiceError> for ApiError {
  fn from(error: InvoiceError) -> Self {
    match error {
      InvoiceError::Validation(e) => ApiError::invalid(e.to_string()),
      InvoiceError::InvalidRequest(msg) => ApiError::invalid(msg),
      InvoiceError::InvalidTaxRate { line_no, ref code } => ApiError::invalid_field(
        error.to_string(),
        &format!("items[{}].tax_rate", line_no.saturating_sub(1)),
        format!("unknown tax rate code '{}'", code),
      ),
      InvoiceError::AmountOutOfRange {
        line_no,
        ref message,
      } => ApiError::invalid_field(
        error.to_string(),
        &format!("items[{}]", line_no.saturating_sub(1)),
        message.clone(),
      ),
      InvoiceError::AmountMismatch { computed, .. } => ApiError::invalid_field(
        error.to_string(),
        "payment.amount",
        format!("expected {}", computed),
      ),
      InvoiceError::SeriesNotFound { .. } => ApiError::invalid_field(
        error.to_string(),
        "pto_fac_df",
        "no active series for this issuing point and document type",
      ),
      InvoiceError::EmitterNotFound(_)
      | InvoiceError::CustomerNotFound(_)
      | InvoiceError::InvoiceNotFound(_)
      | InvoiceError::ArtifactNotFound { .. } => ApiError::NotFound(error.to_string()),
      InvoiceError::DuplicateIdempotencyKey { existing_id } => ApiError::Conflict {
        message: error.to_string(),
        details: vec![FieldIssue::new("invoice_id", existing_id.to_string())],
      },
      InvoiceError::InvalidStatusTransition { .. } | InvoiceError::ConcurrentModification(_) => {
        ApiError::conflict(error.to_string())
      }
      InvoiceError::Forbidden(_) => ApiError::Forbidden(error.to_string()),
      InvoiceError::Emitter(e) => ApiError::from(e),
      InvoiceError::Database(e) => database_error(e),
      InvoiceError::Generation(_)
      | InvoiceError::Storage(_)
      | InvoiceError::Timeout(_)
      | InvoiceError::Internal(_) => ApiError::Internal(error.to_string()),
    }
  }
}

impl From<EmitterError> for ApiError {
  fn from(error: EmitterError) -> Self {
    match error {
      EmitterError::Validation(e) => ApiError::invalid(e.to_string()),
      EmitterError::InvalidDocumentKind(ref kind) => {
        ApiError::invalid_field(error.to_string(), "doc_kind", format!("unknown kind '{}'", kind))
      }
      EmitterError::EmitterNotFound(_) | EmitterError::SeriesNotFound(_) => {
        ApiError::NotFound(error.to_string())
      }
      EmitterError::EmitterAlreadyExists(_) | EmitterError::SeriesAlreadyExists { .. } => {
        ApiError::conflict(error.to_string())
      }
      EmitterError::InvalidApiKey => ApiError::Unauthorized(error.to_string()),
      EmitterError::Database(e) => database_error(e),
    }
  }
}

impl From<ProductError> for ApiError {
  fn from(error: ProductError) -> Self {
    match error {
      ProductError::Validation(e) => ApiError::invalid(e.to_string()),
      ProductError::InvalidField { field, ref message } => {
        ApiError::invalid_field(error.to_string(), field, message.clone())
      }
      ProductError::SkuAlreadyExists(_) => ApiError::conflict(error.to_string()),
      ProductError::Emitter(e) => ApiError::from(e),
      ProductError::Database(e) => database_error(e),
    }
  }
}

/// Convert validation errors from validator crate
impl From<validator::ValidationErrors> for ApiError {
  fn from(errors: validator::ValidationErrors) -> Self {
    let mut details = Vec::new();
    collect_issues("", &errors, &mut details);
    details.sort_by(|a, b| a.field.cmp(&b.field));

    ApiError::InvalidRequest {
      message: "Request validation failed".to_string(),
      details,
    }
  }
}

// Flattens nested struct and list errors into dotted field paths
fn collect_issues(prefix: &str, errors: &validator::ValidationErrors, out: &mut Vec<FieldIssue>) {
  use validator::ValidationErrorsKind;

  for (field, kind) in errors.errors() {
    let path = if prefix.is_empty() {
      field.to_string()
    } else {
      format!("{}.{}", prefix, field)
    };
    match kind {
      ValidationErrorsKind::Field(field_errors) => {
        for error in field_errors {
          let issue = error
            .message
            .as_ref()
            .map(|m| m.to_string())
            .unwrap_or_else(|| error.code.to_string());
          out.push(FieldIssue::new(&path, issue));
        }
      }
      ValidationErrorsKind::Struct(nested) => collect_issues(&path, nested, out),
      ValidationErrorsKind::List(items) => {
        for (index, nested) in items {
          collect_issues(&format!("{}[{}]", path, index), nested, out);
        }
      }
    }
  }
}
