use std::path::{Path, PathBuf};

use fs2::FileExt;
use tokio::fs;

use crate::errors::{AuthError, Result};
use crate::session::CredentialChain;
use crate::store::TokenStore;

/// File-based token store.
///
/// The credential chain artifact is the sole contents of one JSON file.
/// Writes go through an advisory lock plus a temp-file-then-rename, so
/// a launch attempt racing another process never observes a partially
/// written cache.
///
/// # Directory Structure
/// ```text
/// ~/.config/ember-mc/auth/
/// ├── msa-auth.json          # Credential chain artifact
/// └── lock                   # Advisory lock file
/// ```
#[derive(Debug)]
pub struct FileTokenStore {
    cache_file: PathBuf,
    lock_file: PathBuf,
}

impl FileTokenStore {
    /// Create a store rooted at `storage_dir`, creating it if needed
    pub async fn new(storage_dir: impl AsRef<Path>) -> Result<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        fs::create_dir_all(&storage_dir).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&storage_dir, perms)?;
        }

        Ok(Self {
            cache_file: storage_dir.join("msa-auth.json"),
            lock_file: storage_dir.join("lock"),
        })
    }

    /// Default storage directory for the current platform
    pub fn default_storage_dir() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("com", "ember", "ember-mc")
            .ok_or_else(|| {
                AuthError::InvalidResponse("Could not determine config directory".to_string())
            })?;

        Ok(project_dirs.config_dir().join("auth"))
    }

    fn acquire_lock(&self) -> Result<std::fs::File> {
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_file)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| AuthError::CacheLocked)?;

        Ok(lock_file)
    }

    async fn read_chain(&self) -> Result<Option<CredentialChain>> {
        if !self.cache_file.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.cache_file).await?;
        let chain: CredentialChain = serde_json::from_str(&content)
            .map_err(|e| AuthError::InvalidResponse(format!("Invalid token cache: {}", e)))?;

        Ok(Some(chain))
    }

    async fn write_chain(&self, chain: &CredentialChain) -> Result<()> {
        let json = serde_json::to_string_pretty(chain)?;

        // Atomic write: temp file, sync, rename over the cache file
        let temp_path = self.cache_file.with_extension("tmp");
        fs::write(&temp_path, json).await?;

        let file = std::fs::File::open(&temp_path)?;
        file.sync_all()?;

        fs::rename(&temp_path, &self.cache_file).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.cache_file, perms)?;
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Option<CredentialChain> {
        match self.read_chain().await {
            Ok(chain) => chain,
            Err(e) => {
                tracing::error!("Failed to load token cache: {}", e);
                None
            }
        }
    }

    async fn save(&self, chain: &CredentialChain) -> Result<()> {
        let _lock = self.acquire_lock()?;
        self.write_chain(chain).await
    }

    async fn invalidate(&self) -> Result<()> {
        let _lock = self.acquire_lock()?;

        if let Some(mut chain) = self.read_chain().await? {
            chain.invalidated = true;
            self.write_chain(&chain).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MsTokenResponse;
    use tempfile::TempDir;

    fn chain() -> CredentialChain {
        CredentialChain::from_response(MsTokenResponse {
            token_type: "bearer".to_string(),
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            scope: None,
            user_id: Some("uid".to_string()),
        })
    }

    async fn create_test_store() -> (FileTokenStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path()).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let (store, _temp) = create_test_store().await;

        let original = chain();
        store.save(&original).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn load_without_cache_is_none() {
        let (store, _temp) = create_test_store().await;
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn invalidate_keeps_the_file() {
        let (store, temp) = create_test_store().await;

        store.save(&chain()).await.unwrap();
        store.invalidate().await.unwrap();

        assert!(temp.path().join("msa-auth.json").exists());
        let loaded = store.load().await.unwrap();
        assert!(loaded.invalidated);
        assert!(!loaded.can_refresh());
    }

    #[tokio::test]
    async fn save_clears_a_previous_invalidation() {
        let (store, _temp) = create_test_store().await;

        store.save(&chain()).await.unwrap();
        store.invalidate().await.unwrap();
        store.save(&chain()).await.unwrap();

        assert!(!store.load().await.unwrap().invalidated);
    }

    #[tokio::test]
    async fn corrupt_cache_loads_as_none() {
        let (store, temp) = create_test_store().await;
        fs::write(temp.path().join("msa-auth.json"), "not json {{{")
            .await
            .unwrap();
        assert!(store.load().await.is_none());
    }
}
