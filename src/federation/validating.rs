use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tracing::{debug, info};

use crate::error::TokenError;
use crate::federation::source::TokenSource;
use crate::federation::token::AccessToken;

/// Keeps the last access token of a source and hands it out until it is
/// within `leeway` of its expiry.
///
/// `token` takes `&mut self`; to share one instance between tasks put it
/// behind a lock such as `tokio::sync::Mutex`.
#[derive(Debug)]
pub struct ValidatingTokenSource<S> {
    source: S,
    leeway: Duration,
    cached_token: Option<AccessToken>,
}

impl<S: TokenSource> ValidatingTokenSource<S> {
    pub fn new(source: S, leeway: Duration) -> Self {
        Self {
            source,
            leeway,
            cached_token: None,
        }
    }

    /// Cached token if still valid, otherwise a fresh one from the wrapped source.
    ///
    /// On error the previous token stays cached; [`is_valid`](Self::is_valid) keeps reporting it as invalid.
    pub async fn token(&mut self) -> Result<AccessToken, TokenError> {
        if let Some(token) = self.cached_token.as_ref().filter(|_| self.is_valid()) {
            debug!(expires_at = ?token.expiry, "reusing cached access token");
            return Ok(token.clone());
        }

        let token = self.source.token().await?;
        info!(expires_at = ?token.expiry, "access token refreshed");
        self.cached_token = Some(token.clone());
        Ok(token)
    }

    pub fn is_valid(&self) -> bool {
        let Some(token) = &self.cached_token else {
            return false;
        };
        if !token.is_valid() {
            return false;
        }
        match token.expiry {
            Some(expiry) if !self.leeway.is_zero() => TimeDelta::from_std(self.leeway)
                .ok()
                .and_then(|leeway| Utc::now().checked_add_signed(leeway))
                .is_some_and(|deadline| deadline < expiry),
            _ => true,
        }
    }

    pub fn cached_token(&self) -> Option<&AccessToken> {
        self.cached_token.as_ref()
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Hands out `token-N` with the configured lifetime, or an error when `fail` is set.
    struct CountingSource {
        calls: AtomicUsize,
        lifetime: Option<TimeDelta>,
        fail: Mutex<bool>,
    }

    impl CountingSource {
        fn new(lifetime: Option<TimeDelta>) -> Self {
            Self { calls: AtomicUsize::new(0), lifetime, fail: Mutex::new(false) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn token(&self) -> Result<AccessToken, TokenError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if *self.fail.lock().unwrap() {
                return Err(TokenError::exchange_failed("https://sts", "invalid_grant"));
            }
            Ok(AccessToken::new(
                format!("token-{n}"),
                "Bearer".into(),
                self.lifetime.map(|lifetime| Utc::now() + lifetime),
            ))
        }
    }

    fn with_cached(leeway: Duration, expiry: Option<TimeDelta>) -> ValidatingTokenSource<CountingSource> {
        let mut source = ValidatingTokenSource::new(CountingSource::new(None), leeway);
        source.cached_token = Some(AccessToken::new(
            "cached".into(),
            "Bearer".into(),
            expiry.map(|delta| Utc::now() + delta),
        ));
        source
    }

    #[test]
    fn empty_source_is_invalid() {
        let source = ValidatingTokenSource::new(CountingSource::new(None), Duration::ZERO);
        assert!(!source.is_valid());
        assert!(source.cached_token().is_none());
    }

    #[test]
    fn leeway_window() {
        // expiry 30 s away
        assert!(!with_cached(Duration::from_secs(60), Some(TimeDelta::seconds(30))).is_valid());
        assert!(!with_cached(Duration::from_secs(30), Some(TimeDelta::seconds(30))).is_valid());
        assert!(with_cached(Duration::from_secs(10), Some(TimeDelta::seconds(30))).is_valid());
        assert!(with_cached(Duration::ZERO, Some(TimeDelta::seconds(30))).is_valid());
    }

    #[test]
    fn expired_or_empty_cached_token_is_invalid() {
        assert!(!with_cached(Duration::ZERO, Some(TimeDelta::seconds(-1))).is_valid());

        let mut source = with_cached(Duration::ZERO, None);
        assert!(source.is_valid());
        source.cached_token.as_mut().unwrap().access_token.clear();
        assert!(!source.is_valid());
    }

    #[test]
    fn no_expiry_ignores_leeway() {
        assert!(with_cached(Duration::from_secs(3600), None).is_valid());
    }

    #[test]
    fn huge_leeway_never_validates() {
        assert!(!with_cached(Duration::MAX, Some(TimeDelta::hours(1))).is_valid());
    }

    #[tokio::test]
    async fn reuses_valid_token() {
        let mut source = ValidatingTokenSource::new(
            CountingSource::new(Some(TimeDelta::hours(1))),
            Duration::from_secs(60),
        );

        let first = source.token().await.unwrap();
        let second = source.token().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.source().calls(), 1);
        assert!(source.is_valid());
    }

    #[tokio::test]
    async fn refreshes_inside_leeway() {
        // every token lives 30 s; a 60 s leeway makes each one immediately stale
        let mut source = ValidatingTokenSource::new(
            CountingSource::new(Some(TimeDelta::seconds(30))),
            Duration::from_secs(60),
        );

        assert_eq!(source.token().await.unwrap().access_token, "token-1");
        assert_eq!(source.token().await.unwrap().access_token, "token-2");
        assert_eq!(source.source().calls(), 2);
    }

    #[tokio::test]
    async fn error_keeps_stale_token_but_reports_invalid() {
        let mut source = ValidatingTokenSource::new(
            CountingSource::new(Some(TimeDelta::seconds(30))),
            Duration::from_secs(60),
        );
        source.token().await.unwrap();
        *source.source().fail.lock().unwrap() = true;

        let err = source.token().await.unwrap_err();
        assert!(matches!(err, TokenError::ExchangeFailed { .. }));
        assert_eq!(source.cached_token().unwrap().access_token, "token-1");
        assert!(!source.is_valid());
    }
}
