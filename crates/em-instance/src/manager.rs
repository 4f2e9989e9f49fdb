use std::path::PathBuf;

use anyhow::Context;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::instance::{Instance, default_instances_dir};

/// Catalog of instances below one root directory.
///
/// The root is injectable; production callers use
/// [`InstanceManager::with_default_root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceManager {
    root: PathBuf,
    instances: Vec<Instance>,
}

impl InstanceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            instances: Vec::new(),
        }
    }

    pub fn with_default_root() -> Result<Self, InstanceManagerError> {
        let root = default_instances_dir().map_err(|e| {
            error!("Failed to determine instances directory: {}", e);
            InstanceManagerError::ProjectDirectoriesUnavailable
        })?;
        Ok(Self::new(root))
    }

    #[instrument(skip(self), level = "info")]
    pub async fn load_instances(&mut self) -> Result<(), InstanceManagerError> {
        info!("Loading instances from {}", self.root.display());
        self.ensure_root().await?;

        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .context("Failed to read instances directory")
            .map_err(|e| {
                error!("Failed to read instances directory {}: {}", self.root.display(), e);
                InstanceManagerError::DirectoryReadFailed {
                    path: self.root.clone(),
                    source: e,
                }
            })?;

        self.instances.clear();
        let mut loaded_count = 0;
        let mut failed_count = 0;

        while let Some(entry) = entries
            .next_entry()
            .await
            .context("Failed to read directory entry")
            .map_err(|e| InstanceManagerError::DirectoryEntryReadFailed {
                directory: self.root.clone(),
                source: e,
            })?
        {
            let path = entry.path();
            if !path.is_dir() {
                debug!("Skipping non-directory entry: {}", path.display());
                continue;
            }

            match self.load_instance(path.clone()).await {
                Ok(_) => loaded_count += 1,
                Err(e) => {
                    failed_count += 1;
                    warn!("Failed to load instance from {}: {}. Skipping...", path.display(), e);
                }
            }
        }

        info!("Finished loading instances: {} loaded, {} failed", loaded_count, failed_count);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn load_instance(&mut self, path: PathBuf) -> Result<(), InstanceManagerError> {
        let instance_file = path.join("instance.toml");
        debug!("Loading instance from: {}", instance_file.display());

        if !instance_file.exists() {
            return Err(InstanceManagerError::InstanceFileNotFound {
                path: instance_file,
            });
        }

        let content = tokio::fs::read_to_string(&instance_file)
            .await
            .context("Failed to read instance.toml file")
            .map_err(|e| {
                error!("Failed to read instance file {}: {}", instance_file.display(), e);
                InstanceManagerError::InstanceFileReadFailed {
                    path: instance_file.clone(),
                    source: e,
                }
            })?;

        let instance: Instance = toml::from_str(&content)
            .context("Failed to parse instance.toml file")
            .map_err(|e| {
                error!("Failed to parse instance file {}: {}", instance_file.display(), e);
                InstanceManagerError::InstanceParsingFailed {
                    path: instance_file.clone(),
                    source: e,
                }
            })?;

        info!("Loaded instance '{}' from {}", instance.name, path.display());
        self.instances.push(instance);

        Ok(())
    }

    #[instrument(skip(self, instance), fields(name = %instance.name), level = "debug")]
    pub async fn add_instance(&mut self, instance: Instance) -> Result<(), InstanceManagerError> {
        self.ensure_root().await?;
        instance
            .save(&self.root)
            .await
            .map_err(|e| InstanceManagerError::InstanceWriteFailed {
                name: instance.name.clone(),
                source: e,
            })?;
        self.instances.push(instance);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn save_instance(&self, index: usize) -> Result<(), InstanceManagerError> {
        let instance =
            self.instances
                .get(index)
                .ok_or_else(|| InstanceManagerError::InstanceDoesntExist {
                    tried_index: index,
                    instances_count: self.instances.len(),
                })?;

        instance
            .save(&self.root)
            .await
            .map_err(|e| InstanceManagerError::InstanceWriteFailed {
                name: instance.name.clone(),
                source: e,
            })?;

        info!("Saved instance '{}'", instance.name);
        Ok(())
    }

    async fn ensure_root(&self) -> Result<(), InstanceManagerError> {
        if tokio::fs::metadata(&self.root).await.is_err() {
            info!("Instances directory doesn't exist, creating: {}", self.root.display());
            tokio::fs::create_dir_all(&self.root)
                .await
                .context("Failed to create instances directory")
                .map_err(|e| InstanceManagerError::DirectoryCreationFailed {
                    path: self.root.clone(),
                    source: e,
                })?;
        }
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name == name)
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[derive(Debug, Error)]
pub enum InstanceManagerError {
    #[error(
        "Project directories are unavailable - this usually indicates an unsupported OS or missing home directory"
    )]
    ProjectDirectoriesUnavailable,

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read directory '{path}': {source}")]
    DirectoryReadFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read directory entry in '{directory}': {source}")]
    DirectoryEntryReadFailed {
        directory: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Instance file not found: '{path}'")]
    InstanceFileNotFound { path: PathBuf },

    #[error("Failed to read instance file '{path}': {source}")]
    InstanceFileReadFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to parse instance file '{path}': {source}")]
    InstanceParsingFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write instance '{name}': {source}")]
    InstanceWriteFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "Instance of index '{tried_index}' doesn't exist, the instances len is '{instances_count}'"
    )]
    InstanceDoesntExist {
        tried_index: usize,
        instances_count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InstanceConfig;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn loads_every_instance_below_the_root() {
        let dir = tempdir().unwrap();
        let mut manager = InstanceManager::new(dir.path());

        manager
            .add_instance(Instance::new("alpha", InstanceConfig::for_version("1.20.4")))
            .await
            .unwrap();
        manager
            .add_instance(Instance::new("beta", InstanceConfig::for_version("1.19.2")))
            .await
            .unwrap();

        let mut fresh = InstanceManager::new(dir.path());
        fresh.load_instances().await.unwrap();

        assert_eq!(fresh.instance_count(), 2);
        assert_eq!(fresh.find("alpha").unwrap().config.game_version, "1.20.4");
    }

    #[tokio::test]
    async fn missing_instance_file_is_reported() {
        let dir = tempdir().unwrap();
        let instance_dir = dir.path().join("hollow");
        fs::create_dir_all(&instance_dir).unwrap();

        let mut manager = InstanceManager::new(dir.path());
        let result = manager.load_instance(instance_dir.clone()).await;

        match result {
            Err(InstanceManagerError::InstanceFileNotFound { path }) => {
                assert_eq!(path, instance_dir.join("instance.toml"));
            }
            other => panic!("Expected InstanceFileNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn broken_instances_are_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("instance.toml"), "invalid toml {{{").unwrap();

        let mut manager = InstanceManager::new(dir.path());
        manager
            .add_instance(Instance::new("fine", InstanceConfig::for_version("1.20.4")))
            .await
            .unwrap();

        manager.load_instances().await.unwrap();
        assert_eq!(manager.instance_count(), 1);
        assert!(manager.find("fine").is_some());
    }

    #[tokio::test]
    async fn saving_an_out_of_range_index_fails() {
        let manager = InstanceManager::new("/nonexistent");
        let result = manager.save_instance(0).await;

        assert!(matches!(
            result,
            Err(InstanceManagerError::InstanceDoesntExist {
                tried_index: 0,
                instances_count: 0,
            })
        ));
    }
}
