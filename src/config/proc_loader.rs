use std::path::Path;
use std::sync::LazyLock;

use anyhow::{anyhow, Context, Result};
use regex::{Captures, Regex};
use tracing::{debug, error};

use crate::config::proc_validator::validate_agent_config;
use crate::config::settings::LoggingConfig;
use crate::config::types::AgentConfig;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}").expect("env var pattern is valid")
});

/// Load, expand and validate config from a YAML file
pub async fn file_to_config(path: &Path) -> Result<AgentConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read config {}", path.display()))?;

    let expanded = expand_env_vars(&content);
    parse_config(&expanded)
}

pub fn parse_config(content: &str) -> Result<AgentConfig> {
    let mut agent_config: AgentConfig = serde_yaml::from_str(content)
        .inspect_err(|e| error!("parse config error: {}", e))?;

    // Apply defaults
    if agent_config.settings.logging.is_none() {
        agent_config.settings.logging = Some(LoggingConfig::default());
    }

    debug!("validation config ...");
    validate_agent_config(&agent_config)
        .map_err(|errors| anyhow!("config is not valid: {}", errors.join("; ")))?;

    Ok(agent_config)
}

/// Replace `${VAR}` and `${VAR:default}` with the environment value, the default, or "".
pub fn expand_env_vars(input: &str) -> String {
    ENV_VAR
        .replace_all(input, |caps: &Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string()
}
