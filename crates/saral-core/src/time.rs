//! Parsing of client-supplied time filters.

use chrono::{DateTime, NaiveDate, Utc};

use crate::{Error, Result};

/// Parse a `since` filter: either RFC 3339 or a bare `YYYY-MM-DD`, which is
/// read as midnight UTC.
pub fn parse_since(s: &str) -> Result<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
    .ok_or_else(|| {
      Error::Validation(format!(
        "invalid since {s:?}; use YYYY-MM-DD or RFC 3339"
      ))
    })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn date_only_is_midnight_utc() {
    let dt = parse_since("2025-01-01").unwrap();
    assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
  }

  #[test]
  fn rfc3339_offsets_normalised() {
    let dt = parse_since("2025-01-01T05:30:00+05:30").unwrap();
    assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
  }

  #[test]
  fn garbage_rejected() {
    assert!(matches!(parse_since("yesterday"), Err(Error::Validation(_))));
    assert!(parse_since("2025-13-01").is_err());
  }
}
