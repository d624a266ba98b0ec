use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::token::CachedToken;
use crate::error::TokenError;
use crate::helpers::time::from_unix;
use crate::jwt::expiry::jwt_expiry;
use crate::providers::TokenProvider;
use crate::utils::constants::REFRESH_BUFFER_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CacheState {
    Empty,
    Valid,
    Expired,
}

/// Caches the identity token of one provider and refreshes it shortly before `exp`.
///
/// The lock is held for the whole check-fetch-store sequence, network call
/// included, so at most one fetch is in flight per cache. Concurrent callers
/// wait for it and then reuse its result.
#[derive(Debug)]
pub struct TokenCache<P> {
    provider: P,
    entry: Mutex<CachedToken>,
}

impl<P: TokenProvider> TokenCache<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            entry: Mutex::new(CachedToken::empty()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Return the cached token while `now + 1m < exp`, otherwise fetch, parse and store a new one.
    ///
    /// On any error the previous entry is left untouched.
    pub async fn get_valid_token(&self) -> Result<String, TokenError> {
        let mut entry = self.entry.lock().await;

        match state_at(&entry, Utc::now()) {
            CacheState::Valid => {
                debug!(expires_at = %entry.expiry, "reusing cached token");
                return Ok(entry.token.clone());
            }
            CacheState::Empty => info!("token cache empty, fetching token"),
            CacheState::Expired => info!(expired_at = %entry.expiry, "cached token expired, fetching token"),
        }

        let token = self.provider.fetch_token().await.inspect_err(|e| {
            warn!(error = %e, "token fetch failed");
        })?;

        let exp = jwt_expiry(&token).inspect_err(|e| {
            warn!(error = %e, "fetched token rejected, not caching");
        })?;

        *entry = CachedToken::new(token, from_unix(exp));
        info!(expires_at = %entry.expiry, "token cached");
        Ok(entry.token.clone())
    }

    /// Overwrite the stored expiry; the token string is kept and the next
    /// [`get_valid_token`](Self::get_valid_token) decides whether to refetch.
    /// Intended for tests and operational tooling.
    pub async fn force_expire(&self, at: DateTime<Utc>) {
        let mut entry = self.entry.lock().await;
        entry.expiry = at;
    }

    #[cfg(test)]
    pub(crate) async fn state(&self) -> CacheState {
        let entry = self.entry.lock().await;
        state_at(&entry, Utc::now())
    }
}

fn state_at(entry: &CachedToken, now: DateTime<Utc>) -> CacheState {
    if entry.token.is_empty() {
        return CacheState::Empty;
    }
    match now.checked_add_signed(TimeDelta::seconds(REFRESH_BUFFER_SECS)) {
        Some(deadline) if deadline < entry.expiry => CacheState::Valid,
        _ => CacheState::Expired,
    }
}
