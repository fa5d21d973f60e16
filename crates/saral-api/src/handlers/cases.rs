//! Handlers for `/cases` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/cases` | Citizen intake; `201 {id, status, triage?}` |
//! | `GET`    | `/cases` | Operator queue; `?scheme=&status=&since=&limit=&offset=` |
//! | `GET`    | `/cases/{id}` | 404 if not found |
//! | `PATCH`  | `/cases/{id}/status` | Body: `{"status":"IN_REVIEW"}` |
//! | `POST`   | `/cases/{id}/disposition` | Body: `{"final_action", "reason_code", "comment"?}` |
//! | `DELETE` | `/cases/{id}` | Supervisors only |
//! | `GET`    | `/cases/{id}/events` | Audit trail, oldest first |

use axum::{
  Json,
  extract::{
    Path,
    Query,
    State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use saral_core::{
  case::{CaseQuery, CaseStatus, CaseView, NewCase, StatusChange},
  disposition::Disposition,
  eligibility::{Profile, Triage, assess},
  event::Event,
  store::CaseStore,
  time::parse_since,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  APP_VERSION_HEADER,
  AppState,
  VERSION,
  auth::Operator,
  error::ApiError,
  handlers::parse_case_id,
};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub citizen_hash: String,
  pub scheme_code:  String,
  pub source:       String,
  pub locale:       Option<String>,
  /// Screened against the configured rules when present.
  pub profile:      Option<Profile>,
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub id:     Uuid,
  pub status: CaseStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub triage: Option<Triage>,
}

/// `POST /cases`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let Json(body) = body?;
  let input = NewCase::parse(
    &body.citizen_hash,
    &body.scheme_code,
    &body.source,
    body.locale.as_deref(),
  )?;
  let input = match &body.profile {
    Some(profile) => {
      profile.validate()?;
      let triage = assess(&state.config.eligibility, &input.scheme_code, profile);
      input.with_triage(triage)
    }
    None => input,
  };

  let (case, _) = state.store.create_case(input).await.map_err(ApiError::store)?;
  tracing::info!(
    case_id = %case.case_id,
    scheme = %case.scheme_code,
    source = %case.source,
    rule_result = ?case.triage.as_ref().map(|t| t.rule_result),
    "case created"
  );

  Ok((
    StatusCode::CREATED,
    [(APP_VERSION_HEADER, VERSION)],
    Json(Created {
      id:     case.case_id,
      status: case.status,
      triage: case.triage,
    }),
  ))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub scheme: Option<String>,
  pub status: Option<String>,
  pub since:  Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /cases[?scheme=&status=&since=&limit=&offset=]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _operator: Operator,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<CaseView>>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let Query(params) = params?;
  let query = CaseQuery {
    scheme_code: params.scheme,
    status:      params.status.as_deref().map(CaseStatus::parse).transpose()?,
    since:       params.since.as_deref().map(parse_since).transpose()?,
    limit:       params.limit,
    offset:      params.offset,
  };

  let cases = state.store.list_cases(&query).await.map_err(ApiError::store)?;
  Ok(Json(cases.into_iter().map(CaseView::from).collect()))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /cases/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<CaseView>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let id = parse_case_id(&id)?;
  let case = state
    .store
    .get_case(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("case not found: {id}")))?;
  Ok(Json(CaseView::from(case)))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `PATCH /cases/{id}/status`, body: `{"status":"APPROVED"}`
pub async fn update_status<S>(
  State(state): State<AppState<S>>,
  operator: Operator,
  Path(id): Path<String>,
  body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let id = parse_case_id(&id)?;
  let Json(body) = body?;
  let to = CaseStatus::parse(&body.status)?;

  let change = StatusChange {
    case_id: id,
    to,
    actor: operator.actor(),
    policy: state.config.transition_policy(),
  };
  let (case, event) = state.store.update_status(change).await.map_err(ApiError::store)?;
  tracing::info!(
    case_id = %case.case_id,
    status = %case.status,
    event_id = event.event_id,
    "case status changed"
  );

  Ok(Json(json!({ "ok": true })))
}

// ─── Disposition ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DispositionBody {
  pub final_action: String,
  pub reason_code:  String,
  pub comment:      Option<String>,
}

/// `POST /cases/{id}/disposition`
pub async fn dispose<S>(
  State(state): State<AppState<S>>,
  operator: Operator,
  Path(id): Path<String>,
  body: Result<Json<DispositionBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let id = parse_case_id(&id)?;
  let Json(body) = body?;
  let disposition = Disposition::parse(
    id,
    &body.final_action,
    &body.reason_code,
    body.comment.as_deref(),
    operator.actor(),
    state.config.transition_policy(),
  )?;

  let (case, event) = state
    .store
    .record_disposition(disposition)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    case_id = %case.case_id,
    final_action = %body.final_action,
    status = %case.status,
    event_id = event.event_id,
    "case disposed"
  );

  Ok(Json(json!({ "ok": true, "status": case.status })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /cases/{id}` removes the case with its events and bundles. A
/// `DELETE_CASE` event naming the supervisor is left in their place.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  operator: Operator,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let supervisor = operator.require_supervisor()?;
  let id = parse_case_id(&id)?;

  let event = state
    .store
    .delete_case(id, operator.actor())
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    case_id = %id,
    by = %supervisor.email,
    event_id = event.event_id,
    "case deleted"
  );

  Ok(StatusCode::NO_CONTENT)
}

// ─── Audit trail ──────────────────────────────────────────────────────────────

/// `GET /cases/{id}/events`
pub async fn events<S>(
  State(state): State<AppState<S>>,
  _operator: Operator,
  Path(id): Path<String>,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let id = parse_case_id(&id)?;
  state
    .store
    .get_case(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("case not found: {id}")))?;

  let events = state.store.case_events(id).await.map_err(ApiError::store)?;
  Ok(Json(events))
}
