//! Error kinds shared by providers, caches, suppliers and token sources.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Provider configuration is missing a required field; raised before any I/O.
    #[error("configuration is incomplete: {0}")]
    IncompleteConfig(String),

    /// Federation configuration is missing one or more required fields.
    #[error("missing required WIF config fields: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to get token from {endpoint}")]
    TokenFetchFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },

    #[error("token response from {0} has no id_token")]
    IdTokenMissing(String),

    #[error("invalid token format: expected at least 2 dot-separated segments")]
    MalformedToken,

    #[error("token payload is not valid base64url")]
    DecodeFailure(#[source] base64::DecodeError),

    #[error("token payload is not a JSON object")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("exp not found in token")]
    MissingExpiry,

    #[error("subject token unavailable")]
    SubjectTokenUnavailable(#[source] BoxError),

    #[error("token exchange with {endpoint} failed")]
    ExchangeFailed {
        endpoint: String,
        #[source]
        source: BoxError,
    },
}

impl TokenError {
    pub fn fetch_failed(endpoint: &str, source: impl Into<BoxError>) -> Self {
        TokenError::TokenFetchFailed {
            endpoint: endpoint.to_owned(),
            source: source.into(),
        }
    }

    pub fn exchange_failed(endpoint: &str, source: impl Into<BoxError>) -> Self {
        TokenError::ExchangeFailed {
            endpoint: endpoint.to_owned(),
            source: source.into(),
        }
    }

    /// True for the errors that describe a structurally unusable JWT.
    pub fn is_malformed_token(&self) -> bool {
        matches!(
            self,
            TokenError::MalformedToken
                | TokenError::DecodeFailure(_)
                | TokenError::InvalidPayload(_)
                | TokenError::MissingExpiry
        )
    }
}
