//! Secure Token Service exchange (RFC 8693) with optional service account impersonation.
//!
//! Every call to [`TokenSource::token`] performs a fresh exchange: the subject
//! token is pulled from the supplier and traded at the STS endpoint. When an
//! impersonation URL is configured the result is traded again at IAM Credentials.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TokenError;
use crate::federation::source::TokenSource;
use crate::federation::supplier::TokenSupplier;
use crate::federation::token::AccessToken;
use crate::helpers::time::expires_in;
use crate::utils::constants::{
    ACCESS_TOKEN_TYPE, CLOUD_PLATFORM_SCOPE, DEFAULT_HTTP_TIMEOUT_MS, IMPERSONATION_LIFETIME,
    TOKEN_EXCHANGE_GRANT_TYPE,
};

#[derive(Debug, Deserialize)]
struct StsResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
struct GenerateAccessTokenRequest<'a> {
    scope: &'a [String],
    lifetime: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenResponse {
    #[serde(default)]
    access_token: String,
    expire_time: Option<DateTime<Utc>>,
}

/// Exchange-backed token source. Built by
/// [`get_gcp_token_source`](crate::federation::source::get_gcp_token_source),
/// which validates the configuration first.
#[derive(Clone)]
pub struct StsTokenSource {
    audience: String,
    subject_token_type: String,
    token_url: String,
    scopes: Vec<String>,
    impersonation_url: Option<String>,
    supplier: Arc<dyn TokenSupplier>,
    client: Client,
}

impl std::fmt::Debug for StsTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StsTokenSource")
            .field("audience", &self.audience)
            .field("token_url", &self.token_url)
            .field("impersonation_url", &self.impersonation_url)
            .finish_non_exhaustive()
    }
}

impl StsTokenSource {
    pub(crate) fn new(
        audience: String,
        subject_token_type: String,
        token_url: String,
        scopes: Vec<String>,
        impersonation_url: Option<String>,
        supplier: Arc<dyn TokenSupplier>,
    ) -> Result<Self, TokenError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS))
            .build()
            .map_err(TokenError::HttpClient)?;
        Ok(Self {
            audience,
            subject_token_type,
            token_url,
            scopes,
            impersonation_url,
            supplier,
            client,
        })
    }

    /// Scope sent to STS. With impersonation the STS token only needs to call
    /// IAM Credentials; the configured scopes go to `generateAccessToken`.
    fn sts_scope(&self) -> String {
        if self.impersonation_url.is_some() {
            CLOUD_PLATFORM_SCOPE.to_owned()
        } else {
            self.scopes.join(" ")
        }
    }

    async fn exchange(&self, subject_token: &str) -> Result<AccessToken, TokenError> {
        let scope = self.sts_scope();
        let mut form = vec![
            ("grant_type", TOKEN_EXCHANGE_GRANT_TYPE),
            ("requested_token_type", ACCESS_TOKEN_TYPE),
            ("audience", self.audience.as_str()),
            ("subject_token", subject_token),
            ("subject_token_type", self.subject_token_type.as_str()),
        ];
        if !scope.is_empty() {
            form.push(("scope", scope.as_str()));
        }

        info!(token_url = %self.token_url, audience = %self.audience, "exchanging subject token");
        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| TokenError::exchange_failed(&self.token_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::exchange_failed(
                &self.token_url,
                format!("status {}: {}", status, body),
            ));
        }

        let body: StsResponse = response
            .json()
            .await
            .map_err(|e| TokenError::exchange_failed(&self.token_url, e))?;
        if body.access_token.is_empty() {
            return Err(TokenError::exchange_failed(
                &self.token_url,
                "response missing access_token",
            ));
        }

        let expiry = body.expires_in.filter(|secs| *secs > 0).and_then(expires_in);
        debug!(expires_at = ?expiry, "sts exchange succeeded");
        Ok(AccessToken::new(
            body.access_token,
            body.token_type.unwrap_or_else(|| "Bearer".to_owned()),
            expiry,
        ))
    }

    async fn impersonate(&self, url: &str, sts_token: &AccessToken) -> Result<AccessToken, TokenError> {
        let request = GenerateAccessTokenRequest {
            scope: &self.scopes,
            lifetime: IMPERSONATION_LIFETIME,
        };

        info!(url = %url, "impersonating service account");
        let response = self
            .client
            .post(url)
            .bearer_auth(&sts_token.access_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| TokenError::exchange_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::exchange_failed(
                url,
                format!("status {}: {}", status, body),
            ));
        }

        let body: GenerateAccessTokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::exchange_failed(url, e))?;
        if body.access_token.is_empty() {
            return Err(TokenError::exchange_failed(url, "response missing accessToken"));
        }

        Ok(AccessToken::new(body.access_token, "Bearer".to_owned(), body.expire_time))
    }
}

#[async_trait]
impl TokenSource for StsTokenSource {
    async fn token(&self) -> Result<AccessToken, TokenError> {
        let subject_token = self.supplier.subject_token().await?;
        let sts_token = self.exchange(&subject_token).await?;

        match &self.impersonation_url {
            Some(url) => self.impersonate(url, &sts_token).await,
            None => Ok(sts_token),
        }
    }
}
