use serde::{Deserialize, Serialize};
use url::Url;

/// Top-level version manifest: the catalog of every published game
/// version plus the current release/snapshot pointers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: Url,
    #[serde(rename = "releaseTime", default, skip_serializing_if = "Option::is_none")]
    pub release_time: Option<String>,
}

impl VersionManifest {
    /// Look up a version by exact id
    pub fn find(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// The entry the `latest.release` pointer names
    pub fn latest_release(&self) -> Option<&VersionEntry> {
        self.find(&self.latest.release)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "latest": { "release": "1.20.4", "snapshot": "24w07a" },
        "versions": [
            { "id": "24w07a", "type": "snapshot", "url": "https://piston-meta.mojang.com/v1/packages/aa/24w07a.json", "releaseTime": "2024-02-14T10:00:00+00:00" },
            { "id": "1.20.4", "type": "release", "url": "https://piston-meta.mojang.com/v1/packages/bb/1.20.4.json", "releaseTime": "2023-12-07T12:56:20+00:00" }
        ]
    }"#;

    #[test]
    fn parses_and_finds_versions() {
        let manifest: VersionManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.find("1.20.4").unwrap().kind, "release");
        assert!(manifest.find("1.0").is_none());
    }

    #[test]
    fn latest_release_follows_the_pointer() {
        let manifest: VersionManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.latest_release().unwrap().id, "1.20.4");
    }
}
