use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::error::TokenError;
use crate::federation::config::WifConfig;
use crate::federation::sts::StsTokenSource;
use crate::federation::token::AccessToken;
use crate::federation::validating::ValidatingTokenSource;

/// Anything that can hand out a Google access token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<AccessToken, TokenError>;
}

#[async_trait]
impl<S: TokenSource + ?Sized> TokenSource for Arc<S> {
    async fn token(&self) -> Result<AccessToken, TokenError> {
        (**self).token().await
    }
}

/// Build an STS-backed token source for Workload Identity Federation.
///
/// The configuration is validated here and never again. Each `token()` call
/// on the result is an independent exchange: tokens obtained in parallel from
/// the same configuration are all valid at once and do not invalidate each
/// other, as long as the subject token is still fresh at exchange time.
pub fn get_gcp_token_source(config: WifConfig) -> Result<StsTokenSource, TokenError> {
    config.validate()?;

    let WifConfig {
        audience,
        subject_token_type,
        token_url,
        scopes,
        service_account_impersonation_url,
        token_supplier,
    } = config;
    let supplier = token_supplier.ok_or(TokenError::MissingConfig(vec!["token_supplier"]))?;

    info!(audience = %audience, token_url = %token_url, impersonation = service_account_impersonation_url.is_some(), "GCP WIF token source created");
    StsTokenSource::new(
        audience,
        subject_token_type,
        token_url,
        scopes,
        service_account_impersonation_url,
        supplier,
    )
}

/// [`get_gcp_token_source`] wrapped in a [`ValidatingTokenSource`] with the given leeway.
pub fn get_validating_gcp_token_source(
    config: WifConfig,
    leeway: Duration,
) -> Result<ValidatingTokenSource<StsTokenSource>, TokenError> {
    get_gcp_token_source(config).map(|source| ValidatingTokenSource::new(source, leeway))
}
