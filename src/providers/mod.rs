//! Providers module
//!
//! A provider produces a freshly fetched identity token on every call. Caching
//! is layered on top by [`crate::cache::token_cache::TokenCache`].

use std::future::Future;
use std::sync::Arc;

use crate::error::TokenError;

pub mod keycloak;

pub trait TokenProvider: Send + Sync {
    /// Fetch a new token. Cancellation is by dropping the returned future.
    fn fetch_token(&self) -> impl Future<Output = Result<String, TokenError>> + Send;
}

impl<P: TokenProvider> TokenProvider for Arc<P> {
    fn fetch_token(&self) -> impl Future<Output = Result<String, TokenError>> + Send {
        (**self).fetch_token()
    }
}
