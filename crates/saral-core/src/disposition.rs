//! Operator dispositions: the recorded decision an operator takes on a
//! screened case.
//!
//! A disposition names a [`FinalAction`] and a [`ReasonCode`]. Each action
//! accepts only some reasons, and the case's [`RuleResult`] limits which
//! actions are open: an applicant the rules found ineligible cannot be
//! approved without escalation. Applying a disposition moves the case to
//! the action's target status through the ordinary transition table.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Error,
  Result,
  case::CaseStatus,
  eligibility::RuleResult,
  event::Actor,
  lifecycle::TransitionPolicy,
};

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
pub enum FinalAction {
  Approve,
  RequestDocs,
  Escalate,
  Reject,
}

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
pub enum ReasonCode {
  RuleFail,
  DocsMissing,
  Mismatch,
  FraudSuspected,
  Other,
}

impl FinalAction {
  pub fn allowed_reasons(self) -> &'static [ReasonCode] {
    use ReasonCode::*;
    match self {
      Self::Approve => &[Other],
      Self::RequestDocs => &[DocsMissing, Mismatch, Other],
      Self::Escalate => &[Mismatch, Other],
      Self::Reject => &[RuleFail, Mismatch, FraudSuspected, DocsMissing, Other],
    }
  }

  /// Actions open to an operator given the screening outcome.
  pub fn allowed_for(rule_result: RuleResult) -> &'static [FinalAction] {
    use FinalAction::*;
    match rule_result {
      RuleResult::EligibleByRule => &[Approve, RequestDocs, Escalate, Reject],
      RuleResult::UnknownNeedsDocs => &[RequestDocs, Escalate, Reject],
      RuleResult::IneligibleByRule => &[Escalate, Reject],
    }
  }

  pub fn target_status(self) -> CaseStatus {
    match self {
      Self::Approve => CaseStatus::Approved,
      Self::Reject => CaseStatus::Rejected,
      Self::RequestDocs | Self::Escalate => CaseStatus::InReview,
    }
  }

  /// Fails with [`Error::DispositionNotAllowed`] when the screening outcome
  /// rules this action out.
  pub fn check(self, rule_result: RuleResult) -> Result<()> {
    if Self::allowed_for(rule_result).contains(&self) {
      Ok(())
    } else {
      Err(Error::DispositionNotAllowed { action: self, rule_result })
    }
  }
}

pub const MAX_COMMENT_LEN: usize = 1000;

/// A validated disposition, applied by the store in one transaction with
/// its `OP_DISPOSITION` event.
#[derive(Debug, Clone)]
pub struct Disposition {
  pub case_id:      Uuid,
  pub final_action: FinalAction,
  pub reason_code:  ReasonCode,
  pub comment:      Option<String>,
  pub actor:        Actor,
  pub policy:       TransitionPolicy,
}

impl Disposition {
  pub fn parse(
    case_id: Uuid,
    final_action: &str,
    reason_code: &str,
    comment: Option<&str>,
    actor: Actor,
    policy: TransitionPolicy,
  ) -> Result<Self> {
    let final_action: FinalAction = final_action.parse().map_err(|_| {
      Error::validation(format!("unrecognised final_action: {final_action:?}"))
    })?;
    let reason_code: ReasonCode = reason_code.parse().map_err(|_| {
      Error::validation(format!("unrecognised reason_code: {reason_code:?}"))
    })?;
    if !final_action.allowed_reasons().contains(&reason_code) {
      return Err(Error::validation(format!(
        "reason {reason_code} does not apply to {final_action}"
      )));
    }

    let comment = comment.map(str::trim).filter(|c| !c.is_empty());
    if comment.is_some_and(|c| c.len() > MAX_COMMENT_LEN) {
      return Err(Error::validation(format!(
        "comment exceeds {MAX_COMMENT_LEN} bytes"
      )));
    }

    Ok(Self {
      case_id,
      final_action,
      reason_code,
      comment: comment.map(str::to_owned),
      actor,
      policy,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(action: &str, reason: &str) -> Result<Disposition> {
    Disposition::parse(
      Uuid::nil(),
      action,
      reason,
      None,
      Actor::operator(None),
      TransitionPolicy::default(),
    )
  }

  #[test]
  fn accepts_matching_action_and_reason() {
    let d = parse("REQUEST_DOCS", "DOCS_MISSING").unwrap();
    assert_eq!(d.final_action, FinalAction::RequestDocs);
    assert_eq!(d.reason_code, ReasonCode::DocsMissing);
    assert_eq!(d.final_action.target_status(), CaseStatus::InReview);
  }

  #[test]
  fn rejects_unknown_names() {
    assert!(matches!(parse("SHRUG", "OTHER").unwrap_err(), Error::Validation(_)));
    assert!(matches!(parse("APPROVE", "VIBES").unwrap_err(), Error::Validation(_)));
    assert!(parse("approve", "OTHER").is_err());
  }

  #[test]
  fn reason_must_fit_action() {
    assert!(parse("APPROVE", "FRAUD_SUSPECTED").is_err());
    assert!(parse("ESCALATE", "RULE_FAIL").is_err());
    assert!(parse("REJECT", "FRAUD_SUSPECTED").is_ok());
  }

  #[test]
  fn ineligible_cases_cannot_be_approved() {
    use FinalAction::*;
    assert!(Approve.check(RuleResult::EligibleByRule).is_ok());
    let err = Approve.check(RuleResult::IneligibleByRule).unwrap_err();
    assert!(matches!(err, Error::DispositionNotAllowed { .. }));
    assert!(Approve.check(RuleResult::UnknownNeedsDocs).is_err());
    assert!(RequestDocs.check(RuleResult::IneligibleByRule).is_err());
    assert!(Escalate.check(RuleResult::IneligibleByRule).is_ok());
  }

  #[test]
  fn comment_is_trimmed_and_bounded() {
    let d = Disposition::parse(
      Uuid::nil(),
      "ESCALATE",
      "MISMATCH",
      Some("  name differs on ration card "),
      Actor::operator(None),
      TransitionPolicy::default(),
    )
    .unwrap();
    assert_eq!(d.comment.as_deref(), Some("name differs on ration card"));

    let long = "x".repeat(MAX_COMMENT_LEN + 1);
    let err = Disposition::parse(
      Uuid::nil(),
      "ESCALATE",
      "OTHER",
      Some(&long),
      Actor::operator(None),
      TransitionPolicy::default(),
    );
    assert!(err.is_err());
  }
}
