//! Service status and reference-data endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | Liveness banner |
//! | `GET`  | `/version` | Crate version |
//! | `GET`  | `/ops/health` | 503 if the database does not answer |
//! | `GET`  | `/schemes` | Seeded welfare schemes |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use saral_core::{scheme::Scheme, store::CaseStore};
use serde_json::{Value, json};

use crate::{AppState, VERSION, error::ApiError};

/// `GET /`
pub async fn root() -> Json<Value> {
  Json(json!({ "status": "ok", "service": "saral" }))
}

/// `GET /version`
pub async fn version() -> Json<Value> { Json(json!({ "version": VERSION })) }

/// `GET /ops/health`
pub async fn health<S>(State(state): State<AppState<S>>) -> Response
where
  S: CaseStore + Clone + 'static,
{
  let (status, database) = match state.store.ping().await {
    Ok(()) => (StatusCode::OK, "ok"),
    Err(e) => {
      tracing::error!(error = %e, "health check failed");
      (StatusCode::SERVICE_UNAVAILABLE, "error")
    }
  };
  let body = json!({
    "api": "online",
    "version": VERSION,
    "checks": { "database": database },
  });
  (status, Json(body)).into_response()
}

/// `GET /schemes`
pub async fn schemes<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Scheme>>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let schemes = state.store.list_schemes().await.map_err(ApiError::store)?;
  Ok(Json(schemes))
}
