use std::path::{Path, PathBuf};

use em_meta::{ManifestResolver, MetaConfig};
use tracing::{info, instrument};

use crate::acquire::{AcquireOutcome, Acquirer, ProgressCallback};
use crate::errors::Result;
use crate::record::ValidationRecord;
use crate::validate::Validator;

/// Result of a prepare pass: the record describing the version plus
/// whatever acquisition could not deliver.
#[derive(Debug)]
pub struct PrepareReport {
    pub record: ValidationRecord,
    pub downloaded: Vec<PathBuf>,
    pub failed: Vec<(em_meta::ArtifactDescriptor, crate::errors::LaunchError)>,
}

impl PrepareReport {
    /// Every artifact is in place
    pub fn complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether a launch can be attempted at all. Missing libraries or
    /// assets degrade the game; a missing client jar prevents it.
    pub fn launchable(&self) -> bool {
        self.failed
            .iter()
            .all(|(artifact, _)| artifact.logical_path != self.record.client_jar)
    }
}

/// Drives resolve, validate and acquire for one game root.
///
/// The three acquisition phases (assets, libraries, client jar) run
/// concurrently; the call returns only after all of them finish.
#[derive(Debug, Clone)]
pub struct Launcher {
    root: PathBuf,
    resolver: ManifestResolver,
    validator: Validator,
    acquirer: Acquirer,
}

impl Launcher {
    pub fn new(root: impl Into<PathBuf>, config: MetaConfig) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            resolver: ManifestResolver::new(config)?,
            validator: Validator::new(),
            acquirer: Acquirer::new()?,
        })
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Bring the game root up to date for `version` (`None` means the
    /// current release). `force` re-downloads everything in scope
    /// regardless of disk state.
    ///
    /// Per-artifact download failures are collected in the report, not
    /// raised; resolution and I/O failures outside the download fan-out
    /// are errors.
    #[instrument(skip(self, progress), fields(root = %self.root.display()))]
    pub async fn prepare(
        &self,
        version: Option<&str>,
        force: bool,
        progress: Option<ProgressCallback>,
    ) -> Result<PrepareReport> {
        // Fatal before any network work: a host outside the runtime
        // matrix has no artifact key and no fallback.
        self.validator.host().java_runtime_key()?;

        let manifest = self.resolver.fetch_version_manifest().await?;
        let entry = self.resolver.find_version(&manifest, version)?;
        let detail = self.resolver.fetch_version_detail(entry).await?;
        let (asset_index, raw_index) = self.resolver.fetch_asset_index(&detail).await?;

        // The game reads the index back from disk at startup.
        let indexes_dir = self.root.join("assets").join("indexes");
        tokio::fs::create_dir_all(&indexes_dir).await?;
        tokio::fs::write(
            indexes_dir.join(format!("{}.json", detail.asset_index.id)),
            &raw_index,
        )
        .await?;

        let libraries = self.resolver.library_artifacts(&detail);
        let client = self.resolver.client_artifact(&detail);
        let assets = self.resolver.asset_artifacts(&asset_index)?;

        let record = ValidationRecord {
            version_id: detail.id.clone(),
            asset_index: detail.asset_index.id.clone(),
            client_jar: client.logical_path.clone(),
            main_class: detail.main_class.clone(),
            libraries: libraries.clone(),
        };

        let client_set = [client];
        let (missing_assets, missing_libraries, missing_client) = if force {
            (assets.clone(), libraries.clone(), client_set.to_vec())
        } else {
            let (assets_outcome, libraries_outcome, client_outcome) = tokio::join!(
                self.validator.validate_assets(&assets, &self.root),
                self.validator.validate(&libraries, &self.root),
                self.validator.validate(&client_set, &self.root),
            );
            (
                assets_outcome.missing,
                libraries_outcome.missing,
                client_outcome.missing,
            )
        };

        let cached = ValidationRecord::load(&self.root, &detail.id).await;
        if !force
            && cached.is_some()
            && missing_assets.is_empty()
            && missing_libraries.is_empty()
            && missing_client.is_empty()
        {
            info!("Validation passed for {}, nothing to acquire", detail.id);
            return Ok(PrepareReport {
                record,
                downloaded: Vec::new(),
                failed: Vec::new(),
            });
        }

        let (assets_outcome, libraries_outcome, client_outcome) = tokio::join!(
            self.acquirer
                .acquire(&missing_assets, &self.root, progress.clone()),
            self.acquirer
                .acquire(&missing_libraries, &self.root, progress.clone()),
            self.acquirer
                .acquire(&missing_client, &self.root, progress.clone()),
        );

        let mut outcome = AcquireOutcome::default();
        outcome.merge(assets_outcome);
        outcome.merge(libraries_outcome);
        outcome.merge(client_outcome);

        if outcome.failed.is_empty() {
            record.save(&self.root).await?;
            info!(
                "Prepared {} ({} file(s) downloaded)",
                detail.id,
                outcome.downloaded.len()
            );
        } else {
            info!(
                "Prepared {} with {} failure(s); record not updated",
                detail.id,
                outcome.failed.len()
            );
        }

        Ok(PrepareReport {
            record,
            downloaded: outcome.downloaded,
            failed: outcome.failed,
        })
    }
}
