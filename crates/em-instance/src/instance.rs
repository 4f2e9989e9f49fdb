use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::config::InstanceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub config: InstanceConfig,
}

impl Instance {
    pub fn new(name: impl Into<String>, config: InstanceConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub async fn load(instances_dir: &Path, folder_name: &str) -> anyhow::Result<Self> {
        let file_path = instances_dir.join(folder_name).join("instance.toml");
        let content = tokio::fs::read_to_string(&file_path)
            .await
            .with_context(|| format!("Failed to read {}", file_path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", file_path.display()))
    }

    pub async fn save(&self, instances_dir: &Path) -> anyhow::Result<()> {
        let instance_path = instances_dir.join(&self.name);

        tokio::fs::create_dir_all(&instance_path)
            .await
            .context("Failed to create instance directory")?;

        let toml = toml::to_string_pretty(&self).context("Failed to serialize instance to TOML")?;
        let file_path = instance_path.join("instance.toml");

        tokio::fs::write(&file_path, toml)
            .await
            .context("Failed to write instance.toml file")?;

        Ok(())
    }

    /// Directory this instance's game files live under
    pub fn game_dir(&self, instances_dir: &Path) -> PathBuf {
        instances_dir.join(&self.name)
    }
}

pub fn default_instances_dir() -> anyhow::Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "ember", "ember-mc")
        .context("Failed to get project directories")?;
    Ok(proj_dirs.data_dir().join("instances"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JavaConfig, ModLoader, ModLoaderConfig, WindowConfig};
    use tempfile::tempdir;

    fn full_config() -> InstanceConfig {
        InstanceConfig {
            game_version: "1.20.4".to_string(),
            window: Some(WindowConfig {
                width: 1920,
                height: 1080,
            }),
            java: Some(JavaConfig {
                path: "/usr/bin/java".to_string(),
                min_memory: 2048,
                max_memory: 4096,
                stack_size: Some(1),
            }),
            modloader: Some(ModLoaderConfig {
                loader: ModLoader::Fabric,
                version: "0.15.6".to_string(),
                version_id: "fabric-loader-0.15.6-1.20.4".to_string(),
                main_class: Some("net.fabricmc.loader.impl.launch.knot.KnotClient".to_string()),
            }),
            additional_class_paths: vec!["mods/api.jar".to_string()],
            extra_jvm_args: vec!["-XX:+UseG1GC".to_string()],
            extra_game_args: vec!["--demo".to_string()],
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let instance = Instance::new("survival", full_config());

        instance.save(dir.path()).await.unwrap();
        assert!(dir.path().join("survival").join("instance.toml").exists());

        let loaded = Instance::load(dir.path(), "survival").await.unwrap();
        assert_eq!(loaded, instance);
    }

    #[tokio::test]
    async fn minimal_config_round_trips() {
        let dir = tempdir().unwrap();
        let instance = Instance::new("plain", InstanceConfig::for_version("1.20.4"));

        instance.save(dir.path()).await.unwrap();
        let loaded = Instance::load(dir.path(), "plain").await.unwrap();

        assert_eq!(loaded.config.game_version, "1.20.4");
        assert!(loaded.config.modloader.is_none());
        assert!(loaded.config.extra_jvm_args.is_empty());
    }

    #[tokio::test]
    async fn loading_a_missing_instance_fails() {
        let dir = tempdir().unwrap();
        assert!(Instance::load(dir.path(), "nope").await.is_err());
    }

    #[tokio::test]
    async fn loading_invalid_toml_fails() {
        let dir = tempdir().unwrap();
        let instance_dir = dir.path().join("broken");
        tokio::fs::create_dir_all(&instance_dir).await.unwrap();
        tokio::fs::write(instance_dir.join("instance.toml"), "invalid toml [[[")
            .await
            .unwrap();

        assert!(Instance::load(dir.path(), "broken").await.is_err());
    }
}
