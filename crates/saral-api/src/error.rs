//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure leaves the server as `{"error": CODE, "detail": message}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use saral_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store failure. Rejected requests keep their domain message;
  /// anything else is logged and reported as an internal error.
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.as_core() {
      Some(core) => Self::from_core(core),
      None => {
        tracing::error!(error = %err, "store failure");
        Self::Internal(Box::new(err))
      }
    }
  }

  fn from_core(err: &saral_core::Error) -> Self {
    use saral_core::Error as E;
    let detail = err.to_string();
    match err {
      E::Validation(_) | E::UnknownScheme(_) => Self::Validation(detail),
      E::CaseNotFound(_) | E::UserNotFound(_) => Self::NotFound(detail),
      E::DuplicateCase { .. }
      | E::InvalidTransition { .. }
      | E::DispositionNotAllowed { .. } => Self::Conflict(detail),
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::Validation(_) => "VALIDATION_ERROR",
      Self::Unauthorized(_) => "UNAUTHORIZED",
      Self::Forbidden(_) => "FORBIDDEN",
      Self::NotFound(_) => "NOT_FOUND",
      Self::Conflict(_) => "CONFLICT",
      Self::Internal(_) => "INTERNAL_ERROR",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Validation(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

/// Domain errors raised while validating request input.
impl From<saral_core::Error> for ApiError {
  fn from(err: saral_core::Error) -> Self { Self::from_core(&err) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::Validation(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    Self::Validation(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let detail = match &self {
      // Internal details stay in the log.
      Self::Internal(_) => "internal server error".to_string(),
      other => other.to_string(),
    };
    let body = json!({ "error": self.code(), "detail": detail });
    (self.status(), Json(body)).into_response()
  }
}
