//! `GET /metrics`: case counts for dashboards.

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use saral_core::{
  metrics::{Metrics, MetricsQuery},
  store::CaseStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct MetricsParams {
  /// Comma-separated subset of `scheme,status`.
  pub group: Option<String>,
  pub since: Option<String>,
}

/// `GET /metrics[?group=scheme,status&since=YYYY-MM-DD]`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<MetricsParams>, QueryRejection>,
) -> Result<Json<Metrics>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let Query(params) = params?;
  let query = MetricsQuery::parse(params.group.as_deref(), params.since.as_deref())?;
  let metrics = state.store.metrics(&query).await.map_err(ApiError::store)?;
  Ok(Json(metrics))
}
