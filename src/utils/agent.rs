use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::info;

use crate::cache::token_cache::TokenCache;
use crate::config::types::{AgentConfig, SubjectTokenConfig, WifSection};
use crate::federation::config::WifConfig;
use crate::federation::source::get_validating_gcp_token_source;
use crate::federation::sts::StsTokenSource;
use crate::federation::supplier::{FileTokenSupplier, StaticTokenSupplier, TokenSupplier};
use crate::federation::validating::ValidatingTokenSource;
use crate::providers::keycloak::KeycloakTokenProvider;
use crate::resilience::retry::RetrySettings;
use crate::sinks::file::TokenFileSink;

type IdTokenCache = Arc<TokenCache<KeycloakTokenProvider>>;

/// Wires the configured provider, cache, federation source and token files together.
pub struct Agent {
    id_tokens: Option<IdTokenCache>,
    access_tokens: Option<Mutex<ValidatingTokenSource<StsTokenSource>>>,
    id_token_sink: Option<TokenFileSink>,
    access_token_sink: Option<TokenFileSink>,
    retry: RetrySettings,
    refresh_interval: Duration,
}

impl Agent {
    pub fn from_config(cfg: &AgentConfig) -> Result<Self> {
        let id_tokens = cfg
            .keycloak
            .as_ref()
            .map(|kc| -> Result<IdTokenCache> {
                let provider = KeycloakTokenProvider::new(kc.client.clone(), kc.insecure)
                    .context("failed to create keycloak provider")?;
                Ok(Arc::new(TokenCache::new(provider)))
            })
            .transpose()?;

        let access_tokens = match &cfg.wif {
            Some(wif) => {
                let supplier = subject_token_supplier(wif, id_tokens.as_ref())?;
                let leeway = Duration::from_secs(cfg.settings.leeway_seconds);
                let source = get_validating_gcp_token_source(wif_config(wif, supplier), leeway)
                    .context("failed to create GCP token source")?;
                Some(Mutex::new(source))
            }
            None => None,
        };

        info!(
            keycloak = id_tokens.is_some(),
            wif = access_tokens.is_some(),
            "agent configured"
        );

        Ok(Self {
            id_tokens,
            access_tokens,
            id_token_sink: cfg.outputs.id_token_path.as_deref().map(TokenFileSink::new),
            access_token_sink: cfg.outputs.access_token_path.as_deref().map(TokenFileSink::new),
            retry: RetrySettings::from_config(cfg.settings.retry.as_ref()),
            refresh_interval: Duration::from_secs(cfg.settings.refresh_interval_seconds),
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// One refresh round: every configured token is fetched (or reused) and written out.
    pub async fn refresh(&self) -> Result<()> {
        if let Some(cache) = &self.id_tokens {
            let cache = cache.as_ref();
            let id_token = self
                .retry
                .run_with_retry(move || async move { cache.get_valid_token().await })
                .await
                .context("failed to get keycloak id token")?;
            if let Some(sink) = &self.id_token_sink {
                sink.write(&id_token).await?;
            }
        }

        if let Some(source) = &self.access_tokens {
            let access_token = self
                .retry
                .run_with_retry(move || async move { source.lock().await.token().await })
                .await
                .context("failed to get GCP access token")?;
            info!(expires_at = ?access_token.expiry, "GCP access token ready");
            if let Some(sink) = &self.access_token_sink {
                sink.write(&access_token.access_token).await?;
            }
        }

        Ok(())
    }

    /// Remove the token files written so far.
    pub async fn cleanup(&self) -> Result<()> {
        for sink in self.id_token_sink.iter().chain(self.access_token_sink.iter()) {
            sink.cleanup().await?;
        }
        Ok(())
    }
}

fn subject_token_supplier(
    wif: &WifSection,
    id_tokens: Option<&IdTokenCache>,
) -> Result<Arc<dyn TokenSupplier>> {
    let supplier: Arc<dyn TokenSupplier> = match &wif.subject_token {
        SubjectTokenConfig::Literal { value } => Arc::new(StaticTokenSupplier::new(value.clone())),
        SubjectTokenConfig::FromFile { path } => Arc::new(FileTokenSupplier::new(path)),
        SubjectTokenConfig::FromKeycloak { .. } => {
            let cache = id_tokens
                .context("wif.subject_token.from_keycloak requires a 'keycloak' section")?;
            Arc::clone(cache) as Arc<dyn TokenSupplier>
        }
    };
    Ok(supplier)
}

fn wif_config(wif: &WifSection, supplier: Arc<dyn TokenSupplier>) -> WifConfig {
    WifConfig::new(
        &wif.audience,
        &wif.subject_token_type,
        &wif.token_url,
        wif.scopes.clone(),
        wif.service_account_impersonation_url.as_deref().unwrap_or_default(),
        supplier,
    )
}
