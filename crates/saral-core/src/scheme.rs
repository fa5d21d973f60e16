//! Static reference data for the welfare programmes a case can
//! target. Seeded at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
  /// Short unique code, e.g. `UJJ`.
  pub code: String,
  pub name: String,
}

impl Scheme {
  pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
    Self { code: code.into(), name: name.into() }
  }
}

/// Schemes seeded when the configuration names none.
pub fn default_schemes() -> Vec<Scheme> {
  vec![
    Scheme::new("UJJ", "PM Ujjwala Yojana"),
    Scheme::new("PMAY", "PM Awas Yojana"),
  ]
}
