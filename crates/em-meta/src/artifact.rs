use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::rules::{HostPlatform, Rule, rules_allow};

/// One required file, resolved from a manifest.
///
/// Immutable once resolved: the validation and acquisition passes both
/// work from the same descriptor list within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Path below the game root, always with forward slashes
    pub logical_path: String,
    pub remote_url: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
}

impl ArtifactDescriptor {
    /// Whether this artifact is in scope on `host`.
    ///
    /// Out-of-scope artifacts are excluded from validation and
    /// acquisition alike; they never count as missing.
    pub fn applies_to(&self, host: &HostPlatform) -> bool {
        rules_allow(&self.rules, host)
    }

    /// Absolute destination under the game root
    pub fn destination(&self, root: &Path) -> PathBuf {
        self.logical_path.split('/').fold(root.to_path_buf(), |p, seg| p.join(seg))
    }
}
