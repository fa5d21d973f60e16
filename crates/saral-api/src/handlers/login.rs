//! `POST /auth/login`: stamp an operator's login and log it.

use axum::{Json, extract::State};
use saral_core::{store::CaseStore, user::User};

use crate::{AppState, auth::Operator, error::ApiError};

/// `POST /auth/login` with `X-Mock-OTP` and `X-Operator-Email`.
///
/// Returns the account without its OTP hash.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  operator: Operator,
) -> Result<Json<User>, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let Some(user) = operator.user else {
    return Err(ApiError::Unauthorized(
      "login requires X-Operator-Email".into(),
    ));
  };

  let (user, event) = state
    .store
    .record_login(user.user_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(email = %user.email, event_id = event.event_id, "operator logged in");

  Ok(Json(user))
}
