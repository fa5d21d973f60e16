//! Operator and supervisor accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

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
pub enum Role {
  Operator,
  Supervisor,
}

impl Role {
  pub fn as_str(self) -> &'static str { self.into() }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub name:          String,
  pub role:          Role,
  /// Always lower-case.
  pub email:         String,
  /// Argon2 PHC string of the user's dev-only mock OTP.
  #[serde(skip_serializing)]
  pub otp_hash:      String,
  pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for seeding an account. The OTP must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:     String,
  pub role:     Role,
  pub email:    String,
  pub otp_hash: String,
}

/// Lower-case and trim an email address; reject anything without an `@`
/// between two non-empty parts.
pub fn normalize_email(email: &str) -> Result<String> {
  let email = email.trim().to_lowercase();
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
      Ok(email)
    }
    _ => Err(Error::validation(format!("malformed email: {email:?}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn emails_are_normalised() {
    assert_eq!(
      normalize_email("  Asha@Example.ORG ").unwrap(),
      "asha@example.org"
    );
    assert!(normalize_email("nobody").is_err());
    assert!(normalize_email("@example.org").is_err());
  }

  #[test]
  fn otp_hash_is_not_serialised() {
    let user = User {
      user_id:       Uuid::nil(),
      name:          "Asha".into(),
      role:          Role::Supervisor,
      email:         "asha@example.org".into(),
      otp_hash:      "$argon2id$secret".into(),
      last_login_at: None,
    };
    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("argon2"));
    assert!(json.contains("\"SUPERVISOR\""));
  }
}
