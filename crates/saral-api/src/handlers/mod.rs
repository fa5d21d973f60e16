pub mod bundles;
pub mod cases;
pub mod events;
pub mod login;
pub mod metrics;
pub mod ops;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a case id from a path segment. Anything that is not a UUID cannot
/// name a case, so it is reported as not found.
pub(crate) fn parse_case_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw)
    .map_err(|_| ApiError::NotFound(format!("case not found: {raw}")))
}
