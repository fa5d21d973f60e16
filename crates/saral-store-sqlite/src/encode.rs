//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings in UTC with fixed microsecond precision
//! and a `Z` suffix, so string comparison in SQL orders them correctly.
//! Enums are stored by their `SCREAMING_SNAKE_CASE` names. UUIDs are stored
//! as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use saral_core::{
  bundle::Bundle,
  case::{Case, CaseStatus},
  eligibility::Triage,
  event::Event,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// The current time at the precision timestamps are stored with, so values
/// handed back to callers equal what a later read returns.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Decode any enum column through its `FromStr` impl.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

pub fn decode_status(s: &str) -> Result<CaseStatus> { decode_enum("status", s) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const CASE_COLUMNS: &str = "case_id, scheme_code, citizen_hash, status, \
                                source, locale, created_at, updated_at, triage";

/// Raw strings read directly from a `cases` row.
pub struct RawCase {
  pub case_id:      String,
  pub scheme_code:  String,
  pub citizen_hash: String,
  pub status:       String,
  pub source:       String,
  pub locale:       String,
  pub created_at:   String,
  pub updated_at:   String,
  pub triage:       Option<String>,
}

impl RawCase {
  /// Row mapper for queries selecting [`CASE_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      case_id:      row.get(0)?,
      scheme_code:  row.get(1)?,
      citizen_hash: row.get(2)?,
      status:       row.get(3)?,
      source:       row.get(4)?,
      locale:       row.get(5)?,
      created_at:   row.get(6)?,
      updated_at:   row.get(7)?,
      triage:       row.get(8)?,
    })
  }

  pub fn into_case(self) -> Result<Case> {
    Ok(Case {
      case_id:      decode_uuid(&self.case_id)?,
      scheme_code:  self.scheme_code,
      citizen_hash: self.citizen_hash,
      status:       decode_status(&self.status)?,
      source:       decode_enum("source", &self.source)?,
      locale:       self.locale,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
      triage:       self
        .triage
        .as_deref()
        .map(serde_json::from_str::<Triage>)
        .transpose()?,
    })
  }
}

pub const EVENT_COLUMNS: &str =
  "event_id, case_id, actor_id, action, actor_type, payload, recorded_at";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:    i64,
  pub case_id:     Option<String>,
  pub actor_id:    Option<String>,
  pub action:      String,
  pub actor_type:  String,
  pub payload:     Option<String>,
  pub recorded_at: String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:    row.get(0)?,
      case_id:     row.get(1)?,
      actor_id:    row.get(2)?,
      action:      row.get(3)?,
      actor_type:  row.get(4)?,
      payload:     row.get(5)?,
      recorded_at: row.get(6)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:    self.event_id,
      case_id:     self.case_id.as_deref().map(decode_uuid).transpose()?,
      actor_id:    self.actor_id.as_deref().map(decode_uuid).transpose()?,
      action:      decode_enum("action", &self.action)?,
      actor_type:  decode_enum("actor_type", &self.actor_type)?,
      payload:     self
        .payload
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()?,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

pub const BUNDLE_COLUMNS: &str =
  "bundle_id, case_id, doc_type, locator, added_at";

pub struct RawBundle {
  pub bundle_id: String,
  pub case_id:   String,
  pub doc_type:  String,
  pub locator:   String,
  pub added_at:  String,
}

impl RawBundle {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bundle_id: row.get(0)?,
      case_id:   row.get(1)?,
      doc_type:  row.get(2)?,
      locator:   row.get(3)?,
      added_at:  row.get(4)?,
    })
  }

  pub fn into_bundle(self) -> Result<Bundle> {
    Ok(Bundle {
      bundle_id: decode_uuid(&self.bundle_id)?,
      case_id:   decode_uuid(&self.case_id)?,
      doc_type:  self.doc_type,
      locator:   self.locator,
      added_at:  decode_dt(&self.added_at)?,
    })
  }
}

pub const USER_COLUMNS: &str =
  "user_id, name, role, email, otp_hash, last_login_at";

pub struct RawUser {
  pub user_id:       String,
  pub name:          String,
  pub role:          String,
  pub email:         String,
  pub otp_hash:      String,
  pub last_login_at: Option<String>,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      name:          row.get(1)?,
      role:          row.get(2)?,
      email:         row.get(3)?,
      otp_hash:      row.get(4)?,
      last_login_at: row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      name:          self.name,
      role:          decode_enum("role", &self.role)?,
      email:         self.email,
      otp_hash:      self.otp_hash,
      last_login_at: self.last_login_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1);
    let c = a + chrono::Duration::seconds(1);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea, "2025-01-01T00:00:00.000000Z");
    assert!(ea < eb && eb < ec);
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn unknown_enum_value_is_a_decode_error() {
    let err = decode_status("ARCHIVED").unwrap_err();
    assert!(matches!(err, Error::Decode { column: "status", .. }));
  }
}
