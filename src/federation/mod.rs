//! Google Cloud Workload Identity Federation.
//!
//! A [`supplier::TokenSupplier`] produces the OIDC subject token, the STS
//! source trades it for a Google access token, and
//! [`validating::ValidatingTokenSource`] reuses that access token until it is
//! about to expire.

pub mod config;
pub mod source;
pub mod sts;
pub mod supplier;
pub mod token;
pub mod validating;
