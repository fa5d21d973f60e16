//! Error types for `saral-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{
  case::CaseStatus,
  disposition::FinalAction,
  eligibility::RuleResult,
};

#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or out-of-range input.
  #[error("{0}")]
  Validation(String),

  #[error("unknown scheme: {0:?}")]
  UnknownScheme(String),

  #[error("case not found: {0}")]
  CaseNotFound(Uuid),

  /// A case already exists for this citizen under the same scheme.
  #[error("a case for this citizen already exists under scheme {scheme_code}")]
  DuplicateCase { scheme_code: String },

  #[error("cannot move a case from {from} to {to}")]
  InvalidTransition { from: CaseStatus, to: CaseStatus },

  #[error("user not found: {0}")]
  UserNotFound(String),

  /// The screening outcome rules out this operator action.
  #[error("{action} is not available for a case screened {rule_result}")]
  DispositionNotAllowed { action: FinalAction, rule_result: RuleResult },
}

impl Error {
  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
