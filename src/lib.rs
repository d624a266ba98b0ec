//! # OIDC Token Agent Library
//!
//! Obtains OIDC identity tokens from Keycloak with the client-credentials
//! grant, caches them until shortly before `exp`, and trades them for Google
//! Cloud access tokens through Workload Identity Federation.
//!
//! Modules:
//! - `providers` - token providers (Keycloak client credentials)
//! - `cache` - per-provider identity token cache
//! - `jwt` - unverified `exp` extraction
//! - `federation` - STS token exchange, suppliers and the validating wrapper
//! - `config` - agent YAML configuration, loading and validation
//! - `sinks` - token files written by the agent

pub mod cache;
pub mod config;
pub mod error;
pub mod federation;
pub mod helpers;
pub mod jwt;
pub mod providers;
pub mod resilience;
pub mod sinks;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::token_cache::TokenCache;
pub use crate::error::TokenError;
pub use crate::federation::config::WifConfig;
pub use crate::federation::source::{get_gcp_token_source, get_validating_gcp_token_source, TokenSource};
pub use crate::federation::supplier::TokenSupplier;
pub use crate::federation::token::AccessToken;
pub use crate::federation::validating::ValidatingTokenSource;
pub use crate::jwt::expiry::jwt_expiry;
pub use crate::providers::keycloak::{KeycloakConfig, KeycloakTokenProvider};
pub use crate::providers::TokenProvider;
