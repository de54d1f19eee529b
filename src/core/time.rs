//! Timestamp helpers shared by ride validation and the audit trail.

use crate::core::error::{Result, RideLogError};
use ulid::Ulid;

/// Earliest accepted instant: 0001-01-01T00:00:00Z.
pub const MIN_EPOCH_SECS: i64 = -62_135_596_800;
/// Latest accepted instant: 9999-12-31T23:59:59Z.
pub const MAX_EPOCH_SECS: i64 = 253_402_300_799;

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Parse an integer epoch-seconds value for `field`.
///
/// Surrounding whitespace is ignored. Fractional or out-of-calendar values
/// are rejected.
pub fn parse_epoch_seconds(field: &str, raw: &str) -> Result<i64> {
    let secs: i64 = raw.trim().parse().map_err(|_| {
        RideLogError::ValidationError(format!(
            "{} must be integer epoch seconds, got '{}'",
            field, raw
        ))
    })?;
    check_epoch_seconds(field, secs)
}

pub fn check_epoch_seconds(field: &str, secs: i64) -> Result<i64> {
    if !(MIN_EPOCH_SECS..=MAX_EPOCH_SECS).contains(&secs) {
        return Err(RideLogError::ValidationError(format!(
            "{} {} is outside the supported calendar range",
            field, secs
        )));
    }
    Ok(secs)
}
