use chrono::{DateTime, Utc};

/// Cache entry: the raw token and the instant taken from its `exp` claim.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: String,
    pub expiry: DateTime<Utc>,
}

impl CachedToken {
    pub fn new(token: String, expiry: DateTime<Utc>) -> Self {
        Self { token, expiry }
    }

    /// No token yet, zero expiry.
    pub fn empty() -> Self {
        Self {
            token: String::new(),
            expiry: DateTime::UNIX_EPOCH,
        }
    }
}
