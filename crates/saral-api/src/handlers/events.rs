//! Handlers for the `/events` feed.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/events` | Body: `{"case_id"?, "action"?, "payload"?}`; only `NOTE` |
//! | `GET`  | `/events/recent` | `?limit=` clamped to 1..=200, default 50 |

use axum::{
  Json,
  extract::{
    Query,
    State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use saral_core::{
  event::{Action, Event, NewNote, recent_limit},
  store::CaseStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Operator, error::ApiError};

// ─── Record ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NoteBody {
  pub case_id: Option<Uuid>,
  pub action:  Option<String>,
  pub payload: Option<serde_json::Value>,
}

/// `POST /events`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  operator: Operator,
  body: Result<Json<NoteBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let Json(body) = body?;
  let note = NewNote::parse(
    body.action.as_deref().unwrap_or(Action::Note.as_str()),
    body.case_id,
    operator.actor(),
    body.payload,
  )?;

  let event = state.store.record_note(note).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(event)))
}

// ─── Recent ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecentParams {
  pub limit: Option<usize>,
}

/// `GET /events/recent[?limit=N]`
pub async fn recent<S>(
  State(state): State<AppState<S>>,
  _operator: Operator,
  params: Result<Query<RecentParams>, QueryRejection>,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let Query(params) = params?;
  let events = state
    .store
    .recent_events(recent_limit(params.limit))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(events))
}
