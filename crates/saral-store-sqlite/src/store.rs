//! [`SqliteStore`], the SQLite implementation of [`CaseStore`].

use std::{collections::BTreeMap, path::Path};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension as _, params};
use serde_json::json;
use uuid::Uuid;

use saral_core::{
  Error as CoreError,
  bundle::{Bundle, NewBundle},
  case::{Case, CaseQuery, CaseStatus, NewCase, StatusChange},
  disposition::Disposition,
  eligibility::RuleResult,
  event::{Action, Actor, Event, NewNote},
  metrics::{Metrics, MetricsQuery},
  scheme::Scheme,
  store::CaseStore,
  user::{NewUser, User, normalize_email},
};

use crate::{
  Result,
  encode::{
    BUNDLE_COLUMNS, CASE_COLUMNS, EVENT_COLUMNS, RawBundle, RawCase, RawEvent,
    RawUser, USER_COLUMNS, encode_dt, encode_uuid, now,
  },
  schema::{MIGRATIONS, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A SARAL case store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let prior: i64 =
          conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        for (from, ddl) in MIGRATIONS {
          if prior > 0 && prior <= *from {
            conn.execute_batch(ddl)?;
          }
        }
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Transaction bodies ──────────────────────────────────────────────────────
//
// Each runs on the connection thread. Returning early with an error drops
// the open transaction, which rolls it back.

/// An event row waiting to be written inside a caller's transaction.
struct PendingEvent {
  case_id:     Option<Uuid>,
  actor:       Actor,
  action:      Action,
  payload:     Option<serde_json::Value>,
  recorded_at: DateTime<Utc>,
}

impl PendingEvent {
  fn insert(self, conn: &Connection) -> Result<Event> {
    let payload = self.payload.as_ref().map(|p| p.to_string());
    conn.execute(
      "INSERT INTO events (case_id, actor_id, action, actor_type, payload, recorded_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        self.case_id.map(encode_uuid),
        self.actor.user_id.map(encode_uuid),
        self.action.as_str(),
        self.actor.actor_type.as_str(),
        payload,
        encode_dt(self.recorded_at),
      ],
    )?;

    Ok(Event {
      event_id:    conn.last_insert_rowid(),
      case_id:     self.case_id,
      actor_id:    self.actor.user_id,
      action:      self.action,
      actor_type:  self.actor.actor_type,
      payload:     self.payload,
      recorded_at: self.recorded_at,
    })
  }
}

fn case_exists(conn: &Connection, case_id: &str) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM cases WHERE case_id = ?1",
        params![case_id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn select_case(conn: &Connection, case_id: &str) -> Result<Option<Case>> {
  conn
    .query_row(
      &format!("SELECT {CASE_COLUMNS} FROM cases WHERE case_id = ?1"),
      params![case_id],
      RawCase::from_row,
    )
    .optional()?
    .map(RawCase::into_case)
    .transpose()
}

fn select_user(conn: &Connection, column: &str, value: &str) -> Result<Option<User>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
      params![value],
      RawUser::from_row,
    )
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

fn create_case_tx(conn: &mut Connection, case: Case) -> Result<Event> {
  let tx = conn.transaction()?;

  let scheme_known = tx
    .query_row(
      "SELECT 1 FROM schemes WHERE code = ?1",
      params![case.scheme_code],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if !scheme_known {
    return Err(CoreError::UnknownScheme(case.scheme_code).into());
  }

  let duplicate = tx
    .query_row(
      "SELECT 1 FROM cases WHERE citizen_hash = ?1 AND scheme_code = ?2",
      params![case.citizen_hash, case.scheme_code],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if duplicate {
    return Err(
      CoreError::DuplicateCase { scheme_code: case.scheme_code }.into(),
    );
  }

  let triage = case.triage.as_ref().map(serde_json::to_string).transpose()?;
  tx.execute(
    "INSERT INTO cases (
       case_id, scheme_code, citizen_hash, status, source, locale,
       created_at, updated_at, triage
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    params![
      encode_uuid(case.case_id),
      case.scheme_code,
      case.citizen_hash,
      case.status.as_str(),
      case.source.as_str(),
      case.locale,
      encode_dt(case.created_at),
      encode_dt(case.updated_at),
      triage,
    ],
  )?;

  let mut payload = json!({
    "source": case.source,
    "locale": case.locale,
  });
  if let Some(triage) = &case.triage {
    payload["rule_result"] = json!(triage.rule_result);
  }
  let event = PendingEvent {
    case_id:     Some(case.case_id),
    actor:       Actor::citizen(),
    action:      Action::CreateCase,
    payload:     Some(payload),
    recorded_at: case.created_at,
  }
  .insert(&tx)?;

  tx.commit()?;
  Ok(event)
}

fn update_status_tx(
  conn: &mut Connection,
  change: StatusChange,
) -> Result<(Case, Event)> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(change.case_id);

  let current = select_case(&tx, &id_str)?
    .ok_or(CoreError::CaseNotFound(change.case_id))?;
  change.policy.check(current.status, change.to)?;

  // Keep updated_at strictly increasing even when two writes land within
  // the same microsecond.
  let at = now().max(current.updated_at + Duration::microseconds(1));

  tx.execute(
    "UPDATE cases SET status = ?1, updated_at = ?2 WHERE case_id = ?3",
    params![change.to.as_str(), encode_dt(at), id_str],
  )?;

  let event = PendingEvent {
    case_id:     Some(change.case_id),
    actor:       change.actor,
    action:      Action::UpdateStatus,
    payload:     Some(json!({ "from": current.status, "to": change.to })),
    recorded_at: at,
  }
  .insert(&tx)?;

  tx.commit()?;

  let updated = Case { status: change.to, updated_at: at, ..current };
  Ok((updated, event))
}

fn record_disposition_tx(
  conn: &mut Connection,
  d: Disposition,
) -> Result<(Case, Event)> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(d.case_id);

  let current =
    select_case(&tx, &id_str)?.ok_or(CoreError::CaseNotFound(d.case_id))?;
  // Cases taken in without a profile were never screened.
  let rule_result = current
    .triage
    .as_ref()
    .map_or(RuleResult::UnknownNeedsDocs, |t| t.rule_result);
  d.final_action.check(rule_result)?;

  let to = d.final_action.target_status();
  let at = now().max(current.updated_at + Duration::microseconds(1));
  let updated = if to == current.status {
    current.clone()
  } else {
    d.policy.check(current.status, to)?;
    tx.execute(
      "UPDATE cases SET status = ?1, updated_at = ?2 WHERE case_id = ?3",
      params![to.as_str(), encode_dt(at), id_str],
    )?;
    Case { status: to, updated_at: at, ..current.clone() }
  };

  let event = PendingEvent {
    case_id:     Some(d.case_id),
    actor:       d.actor,
    action:      Action::OpDisposition,
    payload:     Some(json!({
      "rule_result":  rule_result,
      "final_action": d.final_action,
      "reason_code":  d.reason_code,
      "comment":      d.comment,
      "from":         current.status,
      "to":           updated.status,
    })),
    recorded_at: at,
  }
  .insert(&tx)?;

  tx.commit()?;
  Ok((updated, event))
}

fn delete_case_tx(conn: &mut Connection, id: Uuid, actor: Actor) -> Result<Event> {
  let tx = conn.transaction()?;

  let deleted = tx.execute(
    "DELETE FROM cases WHERE case_id = ?1",
    params![encode_uuid(id)],
  )?;
  if deleted == 0 {
    return Err(CoreError::CaseNotFound(id).into());
  }

  // The case's own events went with it; this one must not reference it.
  let event = PendingEvent {
    case_id:     None,
    actor,
    action:      Action::DeleteCase,
    payload:     Some(json!({ "case_id": id })),
    recorded_at: now(),
  }
  .insert(&tx)?;

  tx.commit()?;
  Ok(event)
}

fn record_note_tx(conn: &mut Connection, note: NewNote) -> Result<Event> {
  let tx = conn.transaction()?;

  if let Some(case_id) = note.case_id
    && !case_exists(&tx, &encode_uuid(case_id))?
  {
    return Err(CoreError::CaseNotFound(case_id).into());
  }

  let event = PendingEvent {
    case_id:     note.case_id,
    actor:       note.actor,
    action:      Action::Note,
    payload:     note.payload,
    recorded_at: now(),
  }
  .insert(&tx)?;

  tx.commit()?;
  Ok(event)
}

fn record_login_tx(conn: &mut Connection, user_id: Uuid) -> Result<(User, Event)> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(user_id);
  let at = now();

  let touched = tx.execute(
    "UPDATE users SET last_login_at = ?1 WHERE user_id = ?2",
    params![encode_dt(at), id_str],
  )?;
  if touched == 0 {
    return Err(CoreError::UserNotFound(id_str).into());
  }

  let event = PendingEvent {
    case_id:     None,
    actor:       Actor::operator(Some(user_id)),
    action:      Action::Login,
    payload:     None,
    recorded_at: at,
  }
  .insert(&tx)?;

  let user = select_user(&tx, "user_id", &id_str)?
    .ok_or_else(|| CoreError::UserNotFound(id_str.clone()))?;

  tx.commit()?;
  Ok((user, event))
}

fn add_bundle_tx(conn: &mut Connection, bundle: Bundle) -> Result<Event> {
  let tx = conn.transaction()?;
  let case_id = encode_uuid(bundle.case_id);

  if !case_exists(&tx, &case_id)? {
    return Err(CoreError::CaseNotFound(bundle.case_id).into());
  }

  tx.execute(
    "INSERT INTO bundles (bundle_id, case_id, doc_type, locator, added_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      encode_uuid(bundle.bundle_id),
      case_id,
      bundle.doc_type,
      bundle.locator,
      encode_dt(bundle.added_at),
    ],
  )?;

  let event = PendingEvent {
    case_id:     Some(bundle.case_id),
    actor:       Actor::citizen(),
    action:      Action::AddBundle,
    payload:     Some(json!({
      "bundle_id": bundle.bundle_id,
      "doc_type":  bundle.doc_type,
    })),
    recorded_at: bundle.added_at,
  }
  .insert(&tx)?;

  tx.commit()?;
  Ok(event)
}

fn list_bundles_tx(conn: &mut Connection, case_id: Uuid) -> Result<Vec<Bundle>> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(case_id);

  if !case_exists(&tx, &id_str)? {
    return Err(CoreError::CaseNotFound(case_id).into());
  }

  let raws = {
    let mut stmt = tx.prepare(&format!(
      "SELECT {BUNDLE_COLUMNS} FROM bundles WHERE case_id = ?1
       ORDER BY added_at ASC, rowid ASC"
    ))?;
    stmt
      .query_map(params![id_str], RawBundle::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  tx.commit()?;
  raws.into_iter().map(RawBundle::into_bundle).collect()
}

/// `SELECT column, COUNT(*) … GROUP BY column` over cases created at or
/// after `since`.
fn group_counts(
  conn: &Connection,
  column: &'static str,
  since: Option<&str>,
) -> Result<BTreeMap<String, u64>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {column}, COUNT(*) FROM cases
     WHERE ?1 IS NULL OR created_at >= ?1
     GROUP BY {column}"
  ))?;
  let rows = stmt.query_map(params![since], |row| {
    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
  })?;

  let mut counts = BTreeMap::new();
  for row in rows {
    let (key, n) = row?;
    counts.insert(key, n as u64);
  }
  Ok(counts)
}

fn metrics_tx(conn: &mut Connection, query: MetricsQuery) -> Result<Metrics> {
  // One read transaction so the total and the breakdowns agree.
  let tx = conn.transaction()?;
  let since = query.since.map(encode_dt);

  let total: i64 = tx.query_row(
    "SELECT COUNT(*) FROM cases WHERE ?1 IS NULL OR created_at >= ?1",
    params![since],
    |row| row.get(0),
  )?;

  let by_scheme = query
    .by_scheme
    .then(|| group_counts(&tx, "scheme_code", since.as_deref()))
    .transpose()?;
  let by_status = query
    .by_status
    .then(|| group_counts(&tx, "status", since.as_deref()))
    .transpose()?;

  tx.commit()?;
  Ok(Metrics { total: total as u64, by_scheme, by_status })
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  type Error = crate::Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reference data ────────────────────────────────────────────────────────

  async fn seed_scheme(&self, scheme: Scheme) -> Result<bool> {
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO schemes (code, name) VALUES (?1, ?2)",
          params![scheme.code, scheme.name],
        )?)
      })
      .await?;
    Ok(inserted > 0)
  }

  async fn list_schemes(&self) -> Result<Vec<Scheme>> {
    let schemes = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT code, name FROM schemes ORDER BY code")?;
        let rows = stmt
          .query_map([], |row| Ok(Scheme { code: row.get(0)?, name: row.get(1)? }))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(schemes)
  }

  async fn upsert_user(&self, user: NewUser) -> Result<User> {
    let email = normalize_email(&user.email)?;
    let new_id = encode_uuid(Uuid::new_v4());
    let role = user.role.as_str();

    let user = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, name, role, email, otp_hash)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (email) DO UPDATE SET
             name     = excluded.name,
             role     = excluded.role,
             otp_hash = excluded.otp_hash",
          params![new_id, user.name, role, email, user.otp_hash],
        )?;
        Ok(select_user(conn, "email", &email))
      })
      .await??;

    user.ok_or_else(|| CoreError::UserNotFound("upserted user vanished".into()).into())
  }

  async fn find_user_by_email(&self, email: String) -> Result<Option<User>> {
    let email = normalize_email(&email)?;
    let user = self
      .conn
      .call(move |conn| Ok(select_user(conn, "email", &email)))
      .await??;
    Ok(user)
  }

  async fn record_login(&self, user_id: Uuid) -> Result<(User, Event)> {
    let result = self
      .conn
      .call(move |conn| Ok(record_login_tx(conn, user_id)))
      .await??;
    Ok(result)
  }

  // ── Cases ─────────────────────────────────────────────────────────────────

  async fn create_case(&self, input: NewCase) -> Result<(Case, Event)> {
    let at = now();
    let case = Case {
      case_id:      Uuid::new_v4(),
      scheme_code:  input.scheme_code,
      citizen_hash: input.citizen_hash,
      status:       CaseStatus::New,
      source:       input.source,
      locale:       input.locale,
      created_at:   at,
      updated_at:   at,
      triage:       input.triage,
    };

    let row = case.clone();
    let event = self
      .conn
      .call(move |conn| Ok(create_case_tx(conn, row)))
      .await??;

    Ok((case, event))
  }

  async fn get_case(&self, id: Uuid) -> Result<Option<Case>> {
    let id_str = encode_uuid(id);
    let case = self
      .conn
      .call(move |conn| Ok(select_case(conn, &id_str)))
      .await??;
    Ok(case)
  }

  async fn list_cases(&self, query: &CaseQuery) -> Result<Vec<Case>> {
    let scheme = query.scheme_code.clone();
    let status = query.status.map(CaseStatus::as_str);
    let since = query.since.map(encode_dt);
    let limit = query.effective_limit() as i64;
    let offset = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawCase> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CASE_COLUMNS} FROM cases
           WHERE (?1 IS NULL OR scheme_code = ?1)
             AND (?2 IS NULL OR status = ?2)
             AND (?3 IS NULL OR created_at >= ?3)
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            params![scheme, status, since, limit, offset],
            RawCase::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCase::into_case).collect()
  }

  async fn update_status(&self, change: StatusChange) -> Result<(Case, Event)> {
    let result = self
      .conn
      .call(move |conn| Ok(update_status_tx(conn, change)))
      .await??;
    Ok(result)
  }

  async fn record_disposition(
    &self,
    disposition: Disposition,
  ) -> Result<(Case, Event)> {
    let result = self
      .conn
      .call(move |conn| Ok(record_disposition_tx(conn, disposition)))
      .await??;
    Ok(result)
  }

  async fn delete_case(&self, id: Uuid, actor: Actor) -> Result<Event> {
    let event = self
      .conn
      .call(move |conn| Ok(delete_case_tx(conn, id, actor)))
      .await??;
    Ok(event)
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn record_note(&self, note: NewNote) -> Result<Event> {
    let event = self
      .conn
      .call(move |conn| Ok(record_note_tx(conn, note)))
      .await??;
    Ok(event)
  }

  async fn case_events(&self, case_id: Uuid) -> Result<Vec<Event>> {
    let id_str = encode_uuid(case_id);
    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events WHERE case_id = ?1
           ORDER BY event_id ASC"
        ))?;
        let rows = stmt
          .query_map(params![id_str], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn recent_events(&self, limit: usize) -> Result<Vec<Event>> {
    let limit = limit as i64;
    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events ORDER BY event_id DESC LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(params![limit], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  // ── Bundles ───────────────────────────────────────────────────────────────

  async fn add_bundle(&self, input: NewBundle) -> Result<(Bundle, Event)> {
    let bundle = Bundle {
      bundle_id: Uuid::new_v4(),
      case_id:   input.case_id,
      doc_type:  input.doc_type,
      locator:   input.locator,
      added_at:  now(),
    };

    let row = bundle.clone();
    let event = self
      .conn
      .call(move |conn| Ok(add_bundle_tx(conn, row)))
      .await??;

    Ok((bundle, event))
  }

  async fn list_bundles(&self, case_id: Uuid) -> Result<Vec<Bundle>> {
    let bundles = self
      .conn
      .call(move |conn| Ok(list_bundles_tx(conn, case_id)))
      .await??;
    Ok(bundles)
  }

  // ── Analytics ─────────────────────────────────────────────────────────────

  async fn metrics(&self, query: &MetricsQuery) -> Result<Metrics> {
    let query = *query;
    let metrics = self
      .conn
      .call(move |conn| Ok(metrics_tx(conn, query)))
      .await??;
    Ok(metrics)
  }
}
