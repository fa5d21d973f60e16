//! HTTP API for SARAL, the welfare-case intake and triage service.
//!
//! Exposes an axum [`Router`] backed by any [`CaseStore`]. Citizen-facing
//! intake endpoints are open; operator endpoints require the mock-OTP
//! headers checked in [`auth`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod seed;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use saral_core::{
  eligibility::{SchemeRules, default_rules},
  lifecycle::TransitionPolicy,
  scheme::{Scheme, default_schemes},
  store::CaseStore,
  user::Role,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{bundles, cases, events, login, metrics, ops};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Response header carrying [`VERSION`] on case intake.
pub const APP_VERSION_HEADER: &str = "x-app-version";

// ─── Configuration ────────────────────────────────────────────────────────────

/// An operator account seeded at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct OperatorConfig {
  pub name:  String,
  pub email: String,
  pub role:  Role,
  /// Development-only OTP; stored as an argon2 hash.
  pub otp:   String,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `SARAL_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// Shared OTP accepted from anonymous operators.
  pub mock_otp:     String,
  /// Salt for `--hash-citizen`.
  pub citizen_salt: String,
  pub allow_reopen: bool,
  pub schemes:      Vec<Scheme>,
  /// Screening rules per scheme, applied when intake carries a profile.
  pub eligibility:  Vec<SchemeRules>,
  pub operators:    Vec<OperatorConfig>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         "127.0.0.1".to_string(),
      port:         8000,
      store_path:   PathBuf::from("saral.db"),
      mock_otp:     "123456".to_string(),
      citizen_salt: "dev_salt_change_me".to_string(),
      allow_reopen: false,
      schemes:      default_schemes(),
      eligibility:  default_rules(),
      operators:    Vec::new(),
    }
  }
}

impl ServerConfig {
  pub fn transition_policy(&self) -> TransitionPolicy {
    TransitionPolicy { allow_reopen: self.allow_reopen }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: CaseStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the SARAL API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CaseStore + Clone + 'static,
{
  Router::new()
    // Service
    .route("/",           get(ops::root))
    .route("/version",    get(ops::version))
    .route("/ops/health", get(ops::health::<S>))
    .route("/schemes",    get(ops::schemes::<S>))
    // Cases
    .route("/cases",             get(cases::list::<S>).post(cases::create::<S>))
    .route("/cases/{id}",        get(cases::get_one::<S>).delete(cases::delete::<S>))
    .route("/cases/{id}/status", patch(cases::update_status::<S>))
    .route("/cases/{id}/disposition", post(cases::dispose::<S>))
    .route("/cases/{id}/events", get(cases::events::<S>))
    .route("/cases/{id}/bundles", get(bundles::list::<S>).post(bundles::create::<S>))
    // Analytics and audit
    .route("/metrics",       get(metrics::handler::<S>))
    .route("/events",        post(events::create::<S>))
    .route("/events/recent", get(events::recent::<S>))
    .route("/auth/login",    post(login::handler::<S>))
    .with_state(state)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
