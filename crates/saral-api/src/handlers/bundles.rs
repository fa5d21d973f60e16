//! Handlers for `/cases/{id}/bundles`: document metadata attached to a
//! case. The documents themselves live elsewhere; only their locators are
//! stored here.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use saral_core::{
  bundle::{Bundle, NewBundle},
  store::CaseStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::Operator,
  error::ApiError,
  handlers::parse_case_id,
};

#[derive(Debug, Deserialize)]
pub struct BundleBody {
  pub doc_type: String,
  pub locator:  String,
}

/// `POST /cases/{id}/bundles`, body: `{"doc_type":"…","locator":"…"}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  body: Result<Json<BundleBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let case_id = parse_case_id(&id)?;
  let Json(body) = body?;
  let input = NewBundle::parse(case_id, &body.doc_type, &body.locator)?;

  let (bundle, event) =
    state.store.add_bundle(input).await.map_err(ApiError::store)?;
  tracing::info!(
    %case_id,
    doc_type = %bundle.doc_type,
    event_id = event.event_id,
    "bundle attached"
  );
  Ok((StatusCode::CREATED, Json(bundle)))
}

/// `GET /cases/{id}/bundles`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _operator: Operator,
  Path(id): Path<String>,
) -> Result<Json<Vec<Bundle>>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let case_id = parse_case_id(&id)?;
  let bundles = state.store.list_bundles(case_id).await.map_err(ApiError::store)?;
  Ok(Json(bundles))
}
