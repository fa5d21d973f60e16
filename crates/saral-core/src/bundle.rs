//! Metadata for a document attached to a case. The document
//! itself lives in external storage; only its locator is recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
  pub bundle_id: Uuid,
  pub case_id:   Uuid,
  /// Kind of document, e.g. `ration_card`.
  pub doc_type:  String,
  pub locator:   String,
  pub added_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBundle {
  pub case_id:  Uuid,
  pub doc_type: String,
  pub locator:  String,
}

impl NewBundle {
  pub fn parse(case_id: Uuid, doc_type: &str, locator: &str) -> Result<Self> {
    let doc_type = doc_type.trim();
    let locator = locator.trim();
    if doc_type.is_empty() || doc_type.len() > 64 {
      return Err(Error::validation("doc_type must be 1-64 characters"));
    }
    if locator.is_empty() || locator.len() > 1024 {
      return Err(Error::validation("locator must be 1-1024 characters"));
    }
    Ok(Self {
      case_id,
      doc_type: doc_type.to_owned(),
      locator: locator.to_owned(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trims_and_validates() {
    let b = NewBundle::parse(Uuid::nil(), " aadhaar ", "s3://docs/1.jpg").unwrap();
    assert_eq!(b.doc_type, "aadhaar");
    assert!(NewBundle::parse(Uuid::nil(), "", "x").is_err());
    assert!(NewBundle::parse(Uuid::nil(), "id", "   ").is_err());
  }
}
