use chrono::{DateTime, TimeDelta, Utc};

/// Unix seconds to an instant; out-of-range values saturate to the representable bounds.
pub fn from_unix(secs: i64) -> DateTime<Utc> {
    match DateTime::from_timestamp(secs, 0) {
        Some(at) => at,
        None if secs > 0 => DateTime::<Utc>::MAX_UTC,
        None => DateTime::<Utc>::MIN_UTC,
    }
}

/// `now + secs`, or `None` when it would overflow.
pub fn expires_in(secs: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(secs).ok()?;
    Utc::now().checked_add_signed(TimeDelta::try_seconds(secs)?)
}
