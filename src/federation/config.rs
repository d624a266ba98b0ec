use std::fmt;
use std::sync::Arc;

use crate::error::TokenError;
use crate::federation::supplier::TokenSupplier;

/// Workload Identity Federation request configuration.
///
/// `token_supplier` is any implementation returning a valid OIDC token.
#[derive(Clone, Default)]
pub struct WifConfig {
    pub audience: String,
    pub subject_token_type: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    pub service_account_impersonation_url: Option<String>,
    pub token_supplier: Option<Arc<dyn TokenSupplier>>,
}

impl WifConfig {
    /// All parameters explicit, no hardcoded defaults. An empty impersonation URL means none.
    pub fn new(
        audience: &str,
        subject_token_type: &str,
        token_url: &str,
        scopes: Vec<String>,
        service_account_impersonation_url: &str,
        token_supplier: Arc<dyn TokenSupplier>,
    ) -> Self {
        Self {
            audience: audience.to_owned(),
            subject_token_type: subject_token_type.to_owned(),
            token_url: token_url.to_owned(),
            scopes,
            service_account_impersonation_url: Some(service_account_impersonation_url.to_owned())
                .filter(|url| !url.is_empty()),
            token_supplier: Some(token_supplier),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), TokenError> {
        let mut missing = Vec::new();
        if self.audience.is_empty() {
            missing.push("audience");
        }
        if self.subject_token_type.is_empty() {
            missing.push("subject_token_type");
        }
        if self.token_url.is_empty() {
            missing.push("token_url");
        }
        if self.token_supplier.is_none() {
            missing.push("token_supplier");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TokenError::MissingConfig(missing))
        }
    }
}

impl fmt::Debug for WifConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifConfig")
            .field("audience", &self.audience)
            .field("subject_token_type", &self.subject_token_type)
            .field("token_url", &self.token_url)
            .field("scopes", &self.scopes)
            .field(
                "service_account_impersonation_url",
                &self.service_account_impersonation_url,
            )
            .field("token_supplier", &self.token_supplier.as_ref().map(|_| "..."))
            .finish()
    }
}
