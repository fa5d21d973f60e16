//! Analytics aggregation types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, time::parse_since};

/// Which dimensions to group case counts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsQuery {
  pub by_scheme: bool,
  pub by_status: bool,
  /// Only count cases created at or after this instant.
  pub since:     Option<DateTime<Utc>>,
}

impl Default for MetricsQuery {
  fn default() -> Self {
    Self { by_scheme: true, by_status: true, since: None }
  }
}

impl MetricsQuery {
  /// Parse the `group` (comma-separated `scheme`/`status`) and `since`
  /// query parameters. A missing or blank `group` selects both dimensions.
  pub fn parse(group: Option<&str>, since: Option<&str>) -> Result<Self> {
    let mut query = Self::default();

    if let Some(group) = group.map(str::trim).filter(|g| !g.is_empty()) {
      query.by_scheme = false;
      query.by_status = false;
      for dim in group.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        match dim {
          "scheme" => query.by_scheme = true,
          "status" => query.by_status = true,
          other => {
            return Err(Error::Validation(format!(
              "unknown group {other:?}; expected scheme or status"
            )));
          }
        }
      }
    }

    query.since = since
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(parse_since)
      .transpose()?;

    Ok(query)
  }
}

/// Case counts at the time of the call. Dimensions that were not requested
/// are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
  pub total:     u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub by_scheme: Option<BTreeMap<String, u64>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub by_status: Option<BTreeMap<String, u64>>,
}
