use std::path::{Path, PathBuf};

use em_meta::ArtifactDescriptor;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::Result;

/// Last-known-good state for one game version, persisted as
/// `versions/<id>/cache.json` under the game root.
///
/// Created after the first fully successful download pass, read on
/// every launch attempt to short-circuit re-validation, and rewritten
/// whole after any successful re-download. Never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    /// Version id this record describes
    pub version_id: String,
    /// Asset index id; the raw index lives at `assets/indexes/<id>.json`
    pub asset_index: String,
    /// Library descriptors, rules included
    pub libraries: Vec<ArtifactDescriptor>,
    /// Logical path of the client jar
    pub client_jar: String,
    pub main_class: String,
}

impl ValidationRecord {
    fn file_path(root: &Path, version_id: &str) -> PathBuf {
        root.join("versions").join(version_id).join("cache.json")
    }

    /// Load the record for `version_id`, if one exists.
    ///
    /// A corrupt record is treated as absent; the next successful
    /// download pass overwrites it.
    pub async fn load(root: &Path, version_id: &str) -> Option<Self> {
        let path = Self::file_path(root, version_id);
        let content = tokio::fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Ignoring corrupt validation record {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Atomically persist the record (whole-file rewrite, temp then
    /// rename, so readers never see a partial record).
    pub async fn save(&self, root: &Path) -> Result<()> {
        let path = Self::file_path(root, &self.version_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        Ok(())
    }
}
