use serde::Deserialize;

use crate::config::settings::SettingsConfig;
use crate::providers::keycloak::KeycloakConfig;
use crate::utils::constants::JWT_TOKEN_TYPE;

/// ================================
/// Full agent configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub keycloak: Option<KeycloakSection>,
    pub wif: Option<WifSection>,
    #[serde(default)]
    pub outputs: OutputsConfig,
}

/// ================================
/// Keycloak client-credentials provider
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct KeycloakSection {
    #[serde(flatten)]
    pub client: KeycloakConfig,
    /// skip TLS verification, development only
    #[serde(default)]
    pub insecure: bool,
}

/// ================================
/// Workload Identity Federation
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct WifSection {
    pub audience: String,
    #[serde(default = "default_subject_token_type")]
    pub subject_token_type: String,
    pub token_url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub service_account_impersonation_url: Option<String>,
    pub subject_token: SubjectTokenConfig,
}

/// Where the subject token comes from
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum SubjectTokenConfig {
    Literal {
        value: String,
    },
    FromFile {
        path: String,
    },
    /// the cached id token of the `keycloak` section
    FromKeycloak {
        from_keycloak: bool,
    },
}

/// ================================
/// Token files
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputsConfig {
    pub id_token_path: Option<String>,
    pub access_token_path: Option<String>,
}

fn default_subject_token_type() -> String {
    JWT_TOKEN_TYPE.to_owned()
}
