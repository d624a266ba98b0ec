use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::TokenError;
use crate::providers::TokenProvider;
use crate::utils::constants::{
    CLIENT_CREDENTIALS_GRANT_TYPE, DEFAULT_HTTP_TIMEOUT_MS, KEYCLOAK_TOKEN_PATH, OPENID_SCOPE,
};

/// Keycloak realm and client credentials.
///
/// `realm_url` includes the realm path, e.g. `https://sso.example.com/realms/workloads`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeycloakConfig {
    pub realm_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// OIDC scopes, `["openid"]` when empty
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl KeycloakConfig {
    pub fn new(realm_url: &str, client_id: &str, client_secret: &str, scopes: Vec<String>) -> Self {
        Self {
            realm_url: realm_url.to_owned(),
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
            scopes,
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.realm_url.trim_end_matches('/'), KEYCLOAK_TOKEN_PATH)
    }

    pub fn effective_scopes(&self) -> Vec<String> {
        match self.scopes.first() {
            Some(first) if !first.is_empty() => self.scopes.clone(),
            _ => vec![OPENID_SCOPE.to_owned()],
        }
    }

    fn ensure_complete(&self) -> Result<(), TokenError> {
        let missing: Vec<&str> = [
            ("realm_url", &self.realm_url),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TokenError::IncompleteConfig(format!(
                "keycloak {} must be provided",
                missing.join(", ")
            )))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClientCredentialsResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
}

/// Client-credentials provider returning the `id_token` of a Keycloak token response.
///
/// Holds configuration and the HTTP client only, never a token.
#[derive(Debug, Clone)]
pub struct KeycloakTokenProvider {
    config: KeycloakConfig,
    client: Client,
}

impl KeycloakTokenProvider {
    /// `insecure` disables TLS certificate verification. Only for development
    /// against self-signed realms.
    pub fn new(config: KeycloakConfig, insecure: bool) -> Result<Self, TokenError> {
        let mut builder =
            Client::builder().timeout(Duration::from_millis(DEFAULT_HTTP_TIMEOUT_MS));
        if insecure {
            warn!(realm_url = %config.realm_url, "TLS certificate verification disabled for keycloak provider");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().map_err(TokenError::HttpClient)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }
}

impl TokenProvider for KeycloakTokenProvider {
    async fn fetch_token(&self) -> Result<String, TokenError> {
        self.config.ensure_complete()?;

        let token_url = self.config.token_url();
        let scope = self.config.effective_scopes().join(" ");
        let form = [
            ("grant_type", CLIENT_CREDENTIALS_GRANT_TYPE),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        info!(token_url = %token_url, scope = %scope, "requesting keycloak token");
        let response = self
            .client
            .post(&token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| TokenError::fetch_failed(&token_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::fetch_failed(
                &token_url,
                format!("status {}: {}", status, body),
            ));
        }

        let body: ClientCredentialsResponse = response
            .json()
            .await
            .map_err(|e| TokenError::fetch_failed(&token_url, e))?;

        if body.access_token.is_empty() {
            return Err(TokenError::fetch_failed(
                &token_url,
                "server response missing access_token",
            ));
        }

        body.id_token
            .filter(|id_token| !id_token.is_empty())
            .ok_or(TokenError::IdTokenMissing(token_url))
    }
}
