use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use em_meta::{ArtifactDescriptor, HostPlatform};
use tracing::{debug, instrument, warn};

/// Negative validation results are normal outcomes, not errors: the
/// `missing` list is the acquisition work list.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub missing: Vec<ArtifactDescriptor>,
}

impl ValidationOutcome {
    pub fn ok(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn merge(&mut self, other: ValidationOutcome) {
        self.missing.extend(other.missing);
    }
}

/// Checks artifact presence and size against the local game root.
#[derive(Debug, Clone)]
pub struct Validator {
    host: HostPlatform,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self {
            host: HostPlatform::current(),
        }
    }

    /// Evaluate applicability rules against a fixed host instead of the
    /// running one
    pub fn with_host(host: HostPlatform) -> Self {
        Self { host }
    }

    pub fn host(&self) -> HostPlatform {
        self.host
    }

    /// Check that every in-scope artifact exists at its destination
    /// with the expected size.
    ///
    /// Artifacts whose rules reject the host are skipped entirely; they
    /// never count as missing. Descriptors sharing a destination are
    /// checked once.
    #[instrument(skip(self, artifacts, local_root), fields(count = artifacts.len()))]
    pub async fn validate(
        &self,
        artifacts: &[ArtifactDescriptor],
        local_root: &Path,
    ) -> ValidationOutcome {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut missing = Vec::new();

        for artifact in artifacts {
            if !artifact.applies_to(&self.host) {
                debug!("Skipping {} (not applicable to host)", artifact.logical_path);
                continue;
            }

            let destination = artifact.destination(local_root);
            if !seen.insert(destination.clone()) {
                continue;
            }

            if !file_matches(&destination, artifact.expected_size).await {
                missing.push(artifact.clone());
            }
        }

        if !missing.is_empty() {
            warn!("{} artifact(s) missing or mismatched", missing.len());
        }
        ValidationOutcome { missing }
    }

    /// Validate content-addressed assets by scanning `assets/objects`
    /// once and comparing the on-disk filename-to-size map against the
    /// descriptors' hash and size.
    ///
    /// Upstream indexes list the same content hash under several
    /// logical names; the callers hand in hash-collapsed descriptors,
    /// so one object on disk satisfies all of them.
    #[instrument(skip(self, artifacts, local_root), fields(count = artifacts.len()))]
    pub async fn validate_assets(
        &self,
        artifacts: &[ArtifactDescriptor],
        local_root: &Path,
    ) -> ValidationOutcome {
        let on_disk = scan_objects(&local_root.join("assets").join("objects")).await;

        let mut missing = Vec::new();
        for artifact in artifacts {
            let Some(hash) = artifact.expected_hash.as_deref() else {
                continue;
            };
            match (on_disk.get(hash), artifact.expected_size) {
                (Some(&size), Some(expected)) if size == expected => {}
                (Some(_), None) => {}
                _ => missing.push(artifact.clone()),
            }
        }

        if !missing.is_empty() {
            warn!("{} asset object(s) missing or mismatched", missing.len());
        }
        ValidationOutcome { missing }
    }
}

async fn file_matches(path: &Path, expected_size: Option<u64>) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            metadata.is_file() && expected_size.is_none_or(|size| metadata.len() == size)
        }
        Err(_) => false,
    }
}

/// Filename-to-size map of every object file; object filenames are the
/// content hashes themselves.
async fn scan_objects(objects_dir: &Path) -> HashMap<String, u64> {
    let mut sizes = HashMap::new();
    let mut pending = vec![objects_dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if metadata.is_dir() {
                pending.push(path);
            } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                sizes.insert(name.to_string(), metadata.len());
            }
        }
    }

    sizes
}
