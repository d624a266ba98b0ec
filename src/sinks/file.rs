use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// Writes raw token strings to a file, atomically (tmp -> rename) and owner-readable only.
#[derive(Debug, Clone)]
pub struct TokenFileSink {
    pub path: PathBuf,
}

impl TokenFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn write(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("tmp");
        // a leftover tmp file would keep its old mode
        remove_if_exists(&tmp).await?;

        let mut file = open_private(&tmp)
            .await
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        file.write_all(token.as_bytes())
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        file.sync_all()
            .await
            .with_context(|| format!("failed to flush {}", tmp.display()))?;
        drop(file);

        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to move token into {}", self.path.display()))?;

        info!(path = %self.path.display(), "token written");
        Ok(())
    }

    /// Remove the file if present; used on shutdown.
    pub async fn cleanup(&self) -> Result<()> {
        if remove_if_exists(&self.path).await? {
            info!(path = %self.path.display(), "token file removed");
        }
        Ok(())
    }
}

async fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}

/// Owner-only from creation on unix; the token is never world-readable, not even briefly.
async fn open_private(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);
    options.open(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn atomic_write_and_permissions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("id_token.txt");
        let sink = TokenFileSink::new(&path);

        sink.write("token-value-123").await.unwrap();
        sink.write("token-value-456").await.unwrap();

        let got = std::fs::read_to_string(&path).unwrap();
        assert_eq!(got, "token-value-456", "file content mismatch");
        assert!(!path.with_extension("tmp").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600, "permissions mismatch (expected 0600)");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stale_tmp_file_does_not_leak_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("google_token.txt");
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, "old").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        let created = open_private(&dir.path().join("fresh.tmp")).await.unwrap();
        let mode = created.metadata().await.unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & 0o077, 0, "tmp file created group/world accessible: {mode:o}");

        TokenFileSink::new(&path).write("secret").await.unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = TokenFileSink::new(dir.path().join("gone.txt"));
        sink.cleanup().await.unwrap();

        sink.write("x").await.unwrap();
        sink.cleanup().await.unwrap();
        assert!(!sink.path.exists());
    }
}
