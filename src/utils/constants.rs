//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

/// Cached identity tokens are refreshed this long before their `exp`.
pub const REFRESH_BUFFER_SECS: i64 = 60;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

// OIDC
pub const OPENID_SCOPE: &str = "openid";
pub const KEYCLOAK_TOKEN_PATH: &str = "/protocol/openid-connect/token";
pub const CLIENT_CREDENTIALS_GRANT_TYPE: &str = "client_credentials";

// STS (RFC 8693)
pub const TOKEN_EXCHANGE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
pub const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";
pub const JWT_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:jwt";
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
pub const IMPERSONATION_LIFETIME: &str = "3600s";
