//! Audit events.
//!
//! Events are append-only. They are written by the store in the same
//! transaction as the mutation they describe and are only ever removed by
//! cascade when their case is deleted. The `DELETE_CASE` event that records
//! a deletion carries no case reference, so it outlives the case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

/// What happened.
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
pub enum Action {
  CreateCase,
  UpdateStatus,
  DeleteCase,
  AddBundle,
  OpDisposition,
  Login,
  /// Free-form operator note; the only action clients may write directly.
  Note,
}

impl Action {
  pub fn as_str(self) -> &'static str { self.into() }

  /// Lifecycle actions are written by the store alongside their mutation
  /// and can never be appended on their own.
  pub fn is_reserved(self) -> bool { !matches!(self, Self::Note) }
}

/// Who performed the action.
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
pub enum ActorType {
  Citizen,
  Operator,
  System,
}

impl ActorType {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// The actor attached to an event. `user_id` is set only for identified
/// operator accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub user_id:    Option<Uuid>,
  pub actor_type: ActorType,
}

impl Actor {
  pub fn citizen() -> Self {
    Self { user_id: None, actor_type: ActorType::Citizen }
  }

  pub fn operator(user_id: Option<Uuid>) -> Self {
    Self { user_id, actor_type: ActorType::Operator }
  }

  pub fn system() -> Self {
    Self { user_id: None, actor_type: ActorType::System }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
  pub event_id:    i64,
  pub case_id:     Option<Uuid>,
  pub actor_id:    Option<Uuid>,
  pub action:      Action,
  pub actor_type:  ActorType,
  pub payload:     Option<serde_json::Value>,
  pub recorded_at: DateTime<Utc>,
}

/// A client-authored note, optionally attached to a case.
#[derive(Debug, Clone)]
pub struct NewNote {
  pub case_id: Option<Uuid>,
  pub actor:   Actor,
  pub payload: Option<serde_json::Value>,
}

impl NewNote {
  /// Build a note from a client-supplied action name. Anything but `NOTE`
  /// is rejected.
  pub fn parse(
    action: &str,
    case_id: Option<Uuid>,
    actor: Actor,
    payload: Option<serde_json::Value>,
  ) -> Result<Self> {
    let action: Action = action
      .parse()
      .map_err(|_| Error::validation(format!("unrecognised action: {action:?}")))?;
    if action.is_reserved() {
      return Err(Error::validation(format!(
        "{action} events are recorded by the server and cannot be posted"
      )));
    }
    Ok(Self { case_id, actor, payload })
  }
}

pub const DEFAULT_RECENT_LIMIT: usize = 50;
pub const MAX_RECENT_LIMIT: usize = 200;

/// Clamp a requested page size for the recent-events feed.
pub fn recent_limit(requested: Option<usize>) -> usize {
  requested
    .unwrap_or(DEFAULT_RECENT_LIMIT)
    .clamp(1, MAX_RECENT_LIMIT)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_notes_can_be_posted() {
    let note = NewNote::parse("NOTE", None, Actor::operator(None), None);
    assert!(note.is_ok());

    for reserved in [
      "CREATE_CASE",
      "UPDATE_STATUS",
      "DELETE_CASE",
      "ADD_BUNDLE",
      "OP_DISPOSITION",
      "LOGIN",
    ] {
      let err =
        NewNote::parse(reserved, None, Actor::operator(None), None).unwrap_err();
      assert!(matches!(err, Error::Validation(_)), "{reserved}");
    }

    assert!(NewNote::parse("SHRUG", None, Actor::system(), None).is_err());
  }

  #[test]
  fn recent_limit_bounds() {
    assert_eq!(recent_limit(None), DEFAULT_RECENT_LIMIT);
    assert_eq!(recent_limit(Some(0)), 1);
    assert_eq!(recent_limit(Some(999)), MAX_RECENT_LIMIT);
    assert_eq!(recent_limit(Some(7)), 7);
  }
}
