use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::token_cache::TokenCache;
use crate::error::TokenError;
use crate::providers::TokenProvider;

/// Produces the OIDC subject token presented to the STS exchange.
///
/// Called once per exchange, possibly from several tasks at the same time.
#[async_trait]
pub trait TokenSupplier: Send + Sync {
    async fn subject_token(&self) -> Result<String, TokenError>;
}

/// Fixed, preconfigured subject token.
#[derive(Debug, Clone)]
pub struct StaticTokenSupplier {
    pub token: String,
}

impl StaticTokenSupplier {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenSupplier for StaticTokenSupplier {
    async fn subject_token(&self) -> Result<String, TokenError> {
        Ok(self.token.clone())
    }
}

/// Reads the subject token from a file on every call, e.g. a projected
/// Kubernetes service account token that is rotated in place.
#[derive(Debug, Clone)]
pub struct FileTokenSupplier {
    pub path: PathBuf,
}

impl FileTokenSupplier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenSupplier for FileTokenSupplier {
    async fn subject_token(&self) -> Result<String, TokenError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| TokenError::SubjectTokenUnavailable(Box::new(e)))?;
        let token = content.trim();
        if token.is_empty() {
            return Err(TokenError::SubjectTokenUnavailable(
                format!("subject token file {} is empty", self.path.display()).into(),
            ));
        }
        debug!(path = %self.path.display(), "subject token read from file");
        Ok(token.to_owned())
    }
}

/// A provider cache is itself a supplier: the cached identity token becomes the subject token.
#[async_trait]
impl<P: TokenProvider> TokenSupplier for TokenCache<P> {
    async fn subject_token(&self) -> Result<String, TokenError> {
        self.get_valid_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::jwt_expiring_in;
    use std::sync::Arc;

    #[tokio::test]
    async fn static_supplier_never_fails() {
        let supplier = StaticTokenSupplier::new("subject");
        assert_eq!(supplier.subject_token().await.unwrap(), "subject");
        assert_eq!(supplier.subject_token().await.unwrap(), "subject");
    }

    #[tokio::test]
    async fn file_supplier_trims_and_rereads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "first\n").unwrap();

        let supplier = FileTokenSupplier::new(&path);
        assert_eq!(supplier.subject_token().await.unwrap(), "first");

        std::fs::write(&path, "second").unwrap();
        assert_eq!(supplier.subject_token().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn file_supplier_rejects_missing_or_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let supplier = FileTokenSupplier::new(&path);
        assert!(matches!(
            supplier.subject_token().await,
            Err(TokenError::SubjectTokenUnavailable(_))
        ));

        std::fs::write(&path, "  \n").unwrap();
        assert!(matches!(
            supplier.subject_token().await,
            Err(TokenError::SubjectTokenUnavailable(_))
        ));
    }

    struct FixedProvider(String);

    impl TokenProvider for FixedProvider {
        async fn fetch_token(&self) -> Result<String, TokenError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn cache_supplies_its_identity_token() {
        let token = jwt_expiring_in(3600);
        let supplier: Arc<dyn TokenSupplier> =
            Arc::new(TokenCache::new(FixedProvider(token.clone())));
        assert_eq!(supplier.subject_token().await.unwrap(), token);
    }
}
