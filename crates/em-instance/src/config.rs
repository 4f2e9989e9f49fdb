use serde::{Deserialize, Serialize};

/// Per-instance settings persisted in `instance.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Game version id this instance tracks
    pub game_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java: Option<JavaConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modloader: Option<ModLoaderConfig>,

    /// Class path entries appended between the platform libraries and
    /// the client jar
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_class_paths: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_jvm_args: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_game_args: Vec<String>,
}

impl InstanceConfig {
    pub fn for_version(game_version: impl Into<String>) -> Self {
        Self {
            game_version: game_version.into(),
            window: None,
            java: None,
            modloader: None,
            additional_class_paths: Vec::new(),
            extra_jvm_args: Vec::new(),
            extra_game_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub width: u64,
    pub height: u64,
}

/// Java runtime settings; memory sizes are in megabytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavaConfig {
    pub path: String,
    pub min_memory: u64,
    pub max_memory: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_size: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModLoader {
    Fabric,
    Forge,
    Quilt,
}

/// Loader settings; `version_id` names the loader-specific entry under
/// `versions/` whose jar replaces the vanilla client on the classpath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModLoaderConfig {
    pub loader: ModLoader,
    pub version: String,
    pub version_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
}
