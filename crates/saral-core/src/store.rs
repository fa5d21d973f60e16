//! The `CaseStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `saral-store-sqlite`).
//! The API layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error,
  bundle::{Bundle, NewBundle},
  case::{Case, CaseQuery, NewCase, StatusChange},
  disposition::Disposition,
  event::{Actor, Event, NewNote},
  metrics::{Metrics, MetricsQuery},
  scheme::Scheme,
  user::{NewUser, User},
};

/// Backend errors must expose the domain failure they wrap, if any, so that
/// callers can tell a rejected request from a broken store.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&Error>;
}

/// Abstraction over a SARAL store backend.
///
/// Every method that changes a case writes exactly one [`Event`] in the same
/// transaction. Events are never updated; they disappear only when their
/// case is deleted.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CaseStore: Send + Sync {
  type Error: StoreError;

  /// Cheap liveness probe against the underlying database.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reference data ────────────────────────────────────────────────────

  /// Insert a scheme if its code is not yet present. Returns `true` if a
  /// row was inserted.
  fn seed_scheme(
    &self,
    scheme: Scheme,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_schemes(
    &self,
  ) -> impl Future<Output = Result<Vec<Scheme>, Self::Error>> + Send + '_;

  /// Insert or refresh an account keyed by email. The user id and
  /// `last_login_at` of an existing account are preserved.
  fn upsert_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn find_user_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Stamp `last_login_at` and append a `LOGIN` event.
  fn record_login(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(User, Event), Self::Error>> + Send + '_;

  // ── Cases ─────────────────────────────────────────────────────────────

  /// Insert a `NEW` case, with its triage if any, and its `CREATE_CASE`
  /// event.
  ///
  /// Fails with [`Error::UnknownScheme`] or [`Error::DuplicateCase`].
  fn create_case(
    &self,
    input: NewCase,
  ) -> impl Future<Output = Result<(Case, Event), Self::Error>> + Send + '_;

  fn get_case(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Case>, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_cases<'a>(
    &'a self,
    query: &'a CaseQuery,
  ) -> impl Future<Output = Result<Vec<Case>, Self::Error>> + Send + 'a;

  /// Apply a status change and append its `UPDATE_STATUS` event.
  ///
  /// Fails with [`Error::CaseNotFound`] or [`Error::InvalidTransition`];
  /// on failure nothing is written.
  fn update_status(
    &self,
    change: StatusChange,
  ) -> impl Future<Output = Result<(Case, Event), Self::Error>> + Send + '_;

  /// Apply an operator disposition and append its `OP_DISPOSITION` event.
  /// The case moves to the action's target status unless it is already
  /// there.
  ///
  /// Fails with [`Error::CaseNotFound`], [`Error::DispositionNotAllowed`]
  /// or [`Error::InvalidTransition`]; on failure nothing is written.
  fn record_disposition(
    &self,
    disposition: Disposition,
  ) -> impl Future<Output = Result<(Case, Event), Self::Error>> + Send + '_;

  /// Delete a case together with its events and bundles, leaving a
  /// `DELETE_CASE` event with no case reference in their place.
  fn delete_case(
    &self,
    id: Uuid,
    actor: Actor,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  /// Append a `NOTE` event. A referenced case must exist.
  fn record_note(
    &self,
    note: NewNote,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Events for one case, oldest first. Empty if the case does not exist.
  fn case_events(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// The most recent events across all cases, newest first.
  fn recent_events(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  // ── Bundles ───────────────────────────────────────────────────────────

  /// Attach a bundle and append its `ADD_BUNDLE` event. Fails with
  /// [`Error::CaseNotFound`] if the case does not exist.
  fn add_bundle(
    &self,
    input: NewBundle,
  ) -> impl Future<Output = Result<(Bundle, Event), Self::Error>> + Send + '_;

  /// Bundles for one case, oldest first. Fails with
  /// [`Error::CaseNotFound`] for an unknown case.
  fn list_bundles(
    &self,
    case_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Bundle>, Self::Error>> + Send + '_;

  // ── Analytics ─────────────────────────────────────────────────────────

  fn metrics<'a>(
    &'a self,
    query: &'a MetricsQuery,
  ) -> impl Future<Output = Result<Metrics, Self::Error>> + Send + 'a;
}
