//! Startup seeding of reference data from configuration.

use saral_core::{store::CaseStore, user::NewUser};
use thiserror::Error;

use crate::{ServerConfig, auth::hash_otp};

#[derive(Debug, Error)]
pub enum SeedError {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("cannot hash OTP for {email}: {reason}")]
  Hash { email: String, reason: String },
}

/// Insert configured schemes that are not yet present and upsert the
/// configured operator accounts, hashing their OTPs.
///
/// Safe to run on every start: existing schemes are left untouched and
/// accounts keep their ids.
pub async fn seed<S: CaseStore>(
  store:  &S,
  config: &ServerConfig,
) -> Result<(), SeedError> {
  for scheme in &config.schemes {
    let inserted = store
      .seed_scheme(scheme.clone())
      .await
      .map_err(|e| SeedError::Store(Box::new(e)))?;
    if inserted {
      tracing::info!(code = %scheme.code, "seeded scheme");
    }
  }

  for op in &config.operators {
    let otp_hash = hash_otp(&op.otp).map_err(|e| SeedError::Hash {
      email:  op.email.clone(),
      reason: e.to_string(),
    })?;
    let user = store
      .upsert_user(NewUser {
        name: op.name.clone(),
        role: op.role,
        email: op.email.clone(),
        otp_hash,
      })
      .await
      .map_err(|e| SeedError::Store(Box::new(e)))?;
    tracing::info!(email = %user.email, role = %user.role, "seeded operator");
  }

  Ok(())
}
