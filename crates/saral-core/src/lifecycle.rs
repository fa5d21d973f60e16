//! Case lifecycle transition table.
//!
//! `NEW` cases may be triaged into review or decided directly. Decisions
//! (`APPROVED`, `REJECTED`) are terminal unless the deployment enables
//! re-opening, in which case they may go back to `IN_REVIEW`. Moving a case
//! to the status it already has is never a transition.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, case::CaseStatus};

/// Deployment-level knobs for the transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionPolicy {
  /// Allow `APPROVED`/`REJECTED` cases to return to `IN_REVIEW`.
  #[serde(default)]
  pub allow_reopen: bool,
}

impl TransitionPolicy {
  pub fn allowed_targets(&self, from: CaseStatus) -> &'static [CaseStatus] {
    use CaseStatus::*;
    match from {
      New => &[InReview, Approved, Rejected],
      InReview => &[Approved, Rejected],
      Approved | Rejected if self.allow_reopen => &[InReview],
      Approved | Rejected => &[],
    }
  }

  pub fn check(&self, from: CaseStatus, to: CaseStatus) -> Result<()> {
    if self.allowed_targets(from).contains(&to) {
      Ok(())
    } else {
      Err(Error::InvalidTransition { from, to })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use CaseStatus::*;

  #[test]
  fn forward_transitions_allowed() {
    let p = TransitionPolicy::default();
    assert!(p.check(New, InReview).is_ok());
    assert!(p.check(New, Approved).is_ok());
    assert!(p.check(New, Rejected).is_ok());
    assert!(p.check(InReview, Approved).is_ok());
    assert!(p.check(InReview, Rejected).is_ok());
  }

  #[test]
  fn no_self_transitions() {
    let p = TransitionPolicy { allow_reopen: true };
    for s in CaseStatus::ALL {
      assert!(p.check(s, s).is_err(), "{s} -> {s}");
    }
  }

  #[test]
  fn nothing_returns_to_new() {
    let p = TransitionPolicy { allow_reopen: true };
    for s in CaseStatus::ALL {
      assert!(p.check(s, New).is_err(), "{s} -> NEW");
    }
  }

  #[test]
  fn terminal_states_locked_by_default() {
    let p = TransitionPolicy::default();
    for from in [Approved, Rejected] {
      assert!(from.is_terminal());
      for to in CaseStatus::ALL {
        let err = p.check(from, to).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
      }
    }
  }

  #[test]
  fn reopen_only_to_review() {
    let p = TransitionPolicy { allow_reopen: true };
    assert!(p.check(Approved, InReview).is_ok());
    assert!(p.check(Rejected, InReview).is_ok());
    assert!(p.check(Approved, Rejected).is_err());
    assert!(p.check(Rejected, Approved).is_err());
  }
}
