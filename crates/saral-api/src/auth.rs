//! Mock-OTP operator authentication.
//!
//! Operator endpoints require an `X-Mock-OTP` header. When the caller also
//! names itself with `X-Operator-Email`, the OTP is checked against that
//! account's argon2 hash and the account becomes the actor for any events
//! the request writes. Otherwise the OTP must match the shared development
//! code from [`ServerConfig::mock_otp`](crate::ServerConfig) and the caller
//! stays anonymous.

use argon2::{
  Argon2,
  PasswordHash,
  PasswordHasher,
  PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use rand_core::OsRng;
use saral_core::{
  event::Actor,
  store::CaseStore,
  user::{Role, User},
};

use crate::{AppState, error::ApiError};

pub const OTP_HEADER: &str = "x-mock-otp";
pub const EMAIL_HEADER: &str = "x-operator-email";

/// An authenticated caller of an operator endpoint.
#[derive(Debug, Clone)]
pub struct Operator {
  /// `None` when the shared development OTP was used.
  pub user: Option<User>,
}

impl Operator {
  pub fn actor(&self) -> Actor {
    Actor::operator(self.user.as_ref().map(|u| u.user_id))
  }

  /// Only identified supervisors may perform destructive operations.
  pub fn require_supervisor(&self) -> Result<&User, ApiError> {
    match &self.user {
      Some(user) if user.role == Role::Supervisor => Ok(user),
      Some(_) => Err(ApiError::Forbidden("supervisor role required".into())),
      None => Err(ApiError::Forbidden(
        "supervisor role required; identify with X-Operator-Email".into(),
      )),
    }
  }
}

/// Hash an OTP into an argon2 PHC string for storage.
pub fn hash_otp(otp: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(otp.as_bytes(), &salt)?
      .to_string(),
  )
}

fn verify_otp(otp: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .and_then(|parsed| {
      Argon2::default().verify_password(otp.as_bytes(), &parsed)
    })
    .is_ok()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

fn rejected() -> ApiError {
  ApiError::Unauthorized("missing or invalid X-Mock-OTP".into())
}

/// Verify the mock-OTP headers against configuration and the user table.
pub async fn authenticate<S>(
  headers: &HeaderMap,
  state:   &AppState<S>,
) -> Result<Operator, ApiError>
where
  S: CaseStore + Clone + 'static,
{
  let otp = header(headers, OTP_HEADER).ok_or_else(rejected)?;

  let Some(email) = header(headers, EMAIL_HEADER) else {
    if otp != state.config.mock_otp {
      tracing::warn!("rejected shared OTP");
      return Err(rejected());
    }
    return Ok(Operator { user: None });
  };

  let user = state
    .store
    .find_user_by_email(email.to_owned())
    .await
    .map_err(ApiError::store);

  // Unknown and malformed addresses look the same as a wrong OTP.
  match user {
    Ok(Some(user)) if verify_otp(otp, &user.otp_hash) => {
      Ok(Operator { user: Some(user) })
    }
    Ok(_) | Err(ApiError::Validation(_)) => {
      tracing::warn!(email, "rejected operator OTP");
      Err(rejected())
    }
    Err(e) => Err(e),
  }
}

impl<S> FromRequestParts<AppState<S>> for Operator
where
  S: CaseStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    authenticate(&parts.headers, state).await
  }
}
