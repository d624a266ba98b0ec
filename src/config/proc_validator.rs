//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks that something is configured, that the WIF subject token source
//!   can be resolved, and the retry invariants

use tracing::{error, info};

use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::config::types::{AgentConfig, SubjectTokenConfig, WifSection};

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_agent_config(cfg: &AgentConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    if cfg.keycloak.is_none() && cfg.wif.is_none() {
        errors.push("config: at least one of 'keycloak' or 'wif' is required".to_string());
    }

    if let Some(wif) = &cfg.wif {
        validate_wif(wif, cfg.keycloak.is_some(), &mut errors);
    }

    if cfg.outputs.access_token_path.is_some() && cfg.wif.is_none() {
        errors.push("outputs.access_token_path requires a 'wif' section".to_string());
    }
    if cfg.outputs.id_token_path.is_some() && cfg.keycloak.is_none() {
        errors.push("outputs.id_token_path requires a 'keycloak' section".to_string());
    }

    if errors.is_empty() {
        info!("config is valid");
        Ok(())
    } else {
        for e in &errors {
            error!("config validation: {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.refresh_interval_seconds == 0 {
        errors.push("settings.refresh_interval_seconds must be > 0".to_string());
    }
    if let Some(retry) = &settings.retry {
        validate_retry(retry, errors);
    }
}

fn validate_retry(retry: &RetryConfig, errors: &mut Vec<String>) {
    if retry.attempts == Some(0) {
        errors.push("settings.retry.attempts must be >= 1".to_string());
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if max < base {
            errors.push(format!(
                "settings.retry.max_delay_ms ({}) must be >= base_delay_ms ({})",
                max, base
            ));
        }
    }
}

fn validate_wif(wif: &WifSection, has_keycloak: bool, errors: &mut Vec<String>) {
    if wif.audience.is_empty() {
        errors.push("wif.audience must not be empty".to_string());
    }
    if wif.token_url.is_empty() {
        errors.push("wif.token_url must not be empty".to_string());
    }
    if wif.subject_token_type.is_empty() {
        errors.push("wif.subject_token_type must not be empty".to_string());
    }
    match &wif.subject_token {
        SubjectTokenConfig::Literal { value } if value.is_empty() => {
            errors.push("wif.subject_token.value must not be empty".to_string());
        }
        SubjectTokenConfig::FromFile { path } if path.is_empty() => {
            errors.push("wif.subject_token.path must not be empty".to_string());
        }
        SubjectTokenConfig::FromKeycloak { from_keycloak: false } => {
            errors.push("wif.subject_token.from_keycloak must be true when set".to_string());
        }
        SubjectTokenConfig::FromKeycloak { from_keycloak: true } if !has_keycloak => {
            errors.push(
                "wif.subject_token.from_keycloak requires a 'keycloak' section".to_string(),
            );
        }
        _ => {}
    }
}
