//! A citizen's application under a welfare scheme.
//!
//! Cases are the only mutable entity in the store. Every mutation is paired
//! with an [`Event`](crate::event::Event) written in the same transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Error,
  Result,
  eligibility::Triage,
  event::Actor,
  lifecycle::TransitionPolicy,
};

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Where a case sits in the triage lifecycle.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
  #[default]
  New,
  InReview,
  Approved,
  Rejected,
}

impl CaseStatus {
  pub const ALL: [CaseStatus; 4] =
    [Self::New, Self::InReview, Self::Approved, Self::Rejected];

  pub fn as_str(self) -> &'static str { self.into() }

  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Approved | Self::Rejected)
  }

  /// Parse a status name as sent by a client.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::validation(format!("unrecognised status: {s:?}")))
  }
}

/// The intake channel a case arrived through.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
  Sms,
  Web,
}

impl Source {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::validation(format!("unrecognised source: {s:?}")))
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
  pub case_id:      Uuid,
  pub scheme_code:  String,
  /// Salted hash of the citizen identifier; raw identifiers are never stored.
  pub citizen_hash: String,
  pub status:       CaseStatus,
  pub source:       Source,
  pub locale:       String,
  pub created_at:   DateTime<Utc>,
  /// Moves only when a mutable field (status) actually changes.
  pub updated_at:   DateTime<Utc>,
  /// Screening outcome, present when intake supplied a profile.
  pub triage:       Option<Triage>,
}

/// Public projection of a case. The citizen hash stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseView {
  pub id:          Uuid,
  pub scheme_code: String,
  pub status:      CaseStatus,
  pub source:      Source,
  pub locale:      String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub triage:      Option<Triage>,
}

impl From<Case> for CaseView {
  fn from(c: Case) -> Self {
    Self {
      id:          c.case_id,
      scheme_code: c.scheme_code,
      status:      c.status,
      source:      c.source,
      locale:      c.locale,
      created_at:  c.created_at,
      updated_at:  c.updated_at,
      triage:      c.triage,
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

pub const DEFAULT_LOCALE: &str = "en";

/// A validated intake request. Scheme existence is checked by the store,
/// inside the same transaction as the insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCase {
  pub citizen_hash: String,
  pub scheme_code:  String,
  pub source:       Source,
  pub locale:       String,
  pub triage:       Option<Triage>,
}

impl NewCase {
  /// Validate raw intake fields. A missing locale falls back to
  /// [`DEFAULT_LOCALE`]. The result carries no triage; see
  /// [`with_triage`](Self::with_triage).
  pub fn parse(
    citizen_hash: &str,
    scheme_code: &str,
    source: &str,
    locale: Option<&str>,
  ) -> Result<Self> {
    if !is_citizen_hash(citizen_hash) {
      return Err(Error::validation(
        "citizen_hash must be 1-64 characters of [A-Za-z0-9_-$]",
      ));
    }
    let scheme_code = scheme_code.trim();
    if scheme_code.is_empty() {
      return Err(Error::validation("scheme_code is required"));
    }
    let source = Source::parse(source)?;
    let locale = locale.unwrap_or(DEFAULT_LOCALE);
    if !is_locale(locale) {
      return Err(Error::validation(format!("malformed locale: {locale:?}")));
    }

    Ok(Self {
      citizen_hash: citizen_hash.to_owned(),
      scheme_code: scheme_code.to_owned(),
      source,
      locale: locale.to_owned(),
      triage: None,
    })
  }

  pub fn with_triage(self, triage: Triage) -> Self {
    Self { triage: Some(triage), ..self }
  }
}

fn is_citizen_hash(s: &str) -> bool {
  (1..=64).contains(&s.len())
    && s
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '$'))
}

fn is_locale(s: &str) -> bool {
  (2..=16).contains(&s.len())
    && s.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
}

/// A requested status change, checked against `policy` inside the store
/// transaction so the check and the write see the same row.
#[derive(Debug, Clone)]
pub struct StatusChange {
  pub case_id: Uuid,
  pub to:      CaseStatus,
  pub actor:   Actor,
  pub policy:  TransitionPolicy,
}

// ─── Query type ──────────────────────────────────────────────────────────────

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const MAX_LIST_LIMIT: usize = 500;

/// Parameters for [`CaseStore::list_cases`](crate::store::CaseStore::list_cases).
#[derive(Debug, Clone, Default)]
pub struct CaseQuery {
  pub scheme_code: Option<String>,
  pub status:      Option<CaseStatus>,
  /// Only cases created at or after this instant.
  pub since:       Option<DateTime<Utc>>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

impl CaseQuery {
  pub fn effective_limit(&self) -> usize {
    self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
  }
}
