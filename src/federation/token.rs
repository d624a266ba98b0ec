use chrono::{DateTime, Utc};

/// Access token returned by a federated exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    /// `None` means the token does not expire.
    pub expiry: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(access_token: String, token_type: String, expiry: Option<DateTime<Utc>>) -> Self {
        Self { access_token, token_type, expiry }
    }

    /// Non-empty and not past its expiry.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| now >= expiry)
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}
