use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::artifact::ArtifactDescriptor;
use crate::assets::{AssetIndex, RESOURCES_BASE_URL};
use crate::errors::{MetaError, Result};
use crate::manifest::{VersionEntry, VersionManifest};
use crate::piston::VersionDetail;

/// Default production endpoint for the version manifest
pub const VERSION_MANIFEST_URL: &str =
    "https://launchermeta.mojang.com/mc/game/version_manifest.json";

/// Configuration for [`ManifestResolver`].
///
/// Endpoint URLs are plain fields so tests can point resolution at a
/// local mock server.
#[derive(Debug, Clone)]
pub struct MetaConfig {
    pub manifest_url: Url,
    /// Base the asset object paths are joined onto; must end with `/`
    pub resources_base: Url,
    pub request_timeout: Duration,
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            manifest_url: Url::parse(VERSION_MANIFEST_URL).expect("valid manifest URL"),
            resources_base: Url::parse(&format!("{}/", RESOURCES_BASE_URL))
                .expect("valid resources URL"),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Resolves the version catalog into concrete artifact descriptors.
///
/// Resolution is read-only: nothing here touches the disk, so the
/// output can be validated or acquired by the caller at any later
/// point in the same run.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    config: MetaConfig,
    http: Client,
}

impl ManifestResolver {
    pub fn new(config: MetaConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, http })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MetaError::Http {
                status,
                body_snippet: body.chars().take(200).collect(),
            });
        }
        Ok(response.json().await?)
    }

    /// Fetch the top-level version manifest
    #[instrument(skip(self))]
    pub async fn fetch_version_manifest(&self) -> Result<VersionManifest> {
        debug!("Fetching version manifest");
        self.get_json(self.config.manifest_url.clone()).await
    }

    /// Resolve a version id to its catalog entry; `None` means the
    /// current release pointer.
    pub fn find_version<'a>(
        &self,
        manifest: &'a VersionManifest,
        id: Option<&str>,
    ) -> Result<&'a VersionEntry> {
        match id {
            Some(id) => manifest
                .find(id)
                .ok_or_else(|| MetaError::UnknownVersion(id.to_string())),
            None => manifest
                .latest_release()
                .ok_or_else(|| MetaError::UnknownVersion(manifest.latest.release.clone())),
        }
    }

    /// Fetch the per-version detail document
    #[instrument(skip(self, entry), fields(version = %entry.id))]
    pub async fn fetch_version_detail(&self, entry: &VersionEntry) -> Result<VersionDetail> {
        debug!("Fetching version detail");
        self.get_json(entry.url.clone()).await
    }

    /// Fetch the asset index, returning both the parsed form and the
    /// raw document so the caller can persist it verbatim.
    #[instrument(skip(self, detail), fields(index = %detail.asset_index.id))]
    pub async fn fetch_asset_index(&self, detail: &VersionDetail) -> Result<(AssetIndex, String)> {
        debug!("Fetching asset index");
        let response = self.http.get(detail.asset_index.url.clone()).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MetaError::Http {
                status,
                body_snippet: body.chars().take(200).collect(),
            });
        }
        let raw = response.text().await?;
        let index: AssetIndex = serde_json::from_str(&raw)?;
        Ok((index, raw))
    }

    /// Library descriptors for a version, rooted at `libraries/`
    pub fn library_artifacts(&self, detail: &VersionDetail) -> Vec<ArtifactDescriptor> {
        detail
            .libraries
            .iter()
            .filter_map(|lib| {
                let artifact = lib.downloads.artifact.as_ref()?;
                Some(ArtifactDescriptor {
                    logical_path: format!("libraries/{}", artifact.path),
                    remote_url: artifact.url.clone(),
                    expected_size: Some(artifact.size),
                    expected_hash: Some(artifact.sha1.clone()),
                    rules: lib.rules.clone(),
                })
            })
            .collect()
    }

    /// Asset object descriptors, collapsed by content hash.
    ///
    /// The index maps many logical names onto fewer objects; one
    /// descriptor per distinct hash keeps the download count honest.
    pub fn asset_artifacts(&self, index: &AssetIndex) -> Result<Vec<ArtifactDescriptor>> {
        let mut seen = std::collections::HashSet::new();
        let mut artifacts = Vec::new();
        for object in index.objects.values() {
            if !seen.insert(object.hash.clone()) {
                continue;
            }
            artifacts.push(ArtifactDescriptor {
                logical_path: object.relative_path()?,
                remote_url: object.url(&self.config.resources_base)?,
                expected_size: Some(object.size),
                expected_hash: Some(object.hash.clone()),
                rules: Vec::new(),
            });
        }
        Ok(artifacts)
    }

    /// Descriptor for the client jar at `versions/<id>/client.jar`
    pub fn client_artifact(&self, detail: &VersionDetail) -> ArtifactDescriptor {
        ArtifactDescriptor {
            logical_path: format!("versions/{}/client.jar", detail.id),
            remote_url: detail.downloads.client.url.clone(),
            expected_size: Some(detail.downloads.client.size),
            expected_hash: Some(detail.downloads.client.sha1.clone()),
            rules: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetObject;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_resolver(server: &MockServer) -> ManifestResolver {
        let config = MetaConfig {
            manifest_url: Url::parse(&format!("{}/mc/game/version_manifest.json", server.uri()))
                .unwrap(),
            resources_base: Url::parse(&format!("{}/resources/", server.uri())).unwrap(),
            request_timeout: Duration::from_secs(5),
        };
        ManifestResolver::new(config).unwrap()
    }

    fn manifest_body(server: &MockServer) -> serde_json::Value {
        serde_json::json!({
            "latest": { "release": "1.20.4", "snapshot": "24w07a" },
            "versions": [
                { "id": "24w07a", "type": "snapshot", "url": format!("{}/v1/24w07a.json", server.uri()) },
                { "id": "1.20.4", "type": "release", "url": format!("{}/v1/1.20.4.json", server.uri()) }
            ]
        })
    }

    #[tokio::test]
    async fn resolves_an_explicit_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mc/game/version_manifest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(manifest_body(&server)))
            .mount(&server)
            .await;

        let resolver = test_resolver(&server);
        let manifest = resolver.fetch_version_manifest().await.unwrap();

        let entry = resolver.find_version(&manifest, Some("24w07a")).unwrap();
        assert_eq!(entry.kind, "snapshot");
    }

    #[tokio::test]
    async fn defaults_to_the_latest_release() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mc/game/version_manifest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(manifest_body(&server)))
            .mount(&server)
            .await;

        let resolver = test_resolver(&server);
        let manifest = resolver.fetch_version_manifest().await.unwrap();

        assert_eq!(resolver.find_version(&manifest, None).unwrap().id, "1.20.4");
        assert!(matches!(
            resolver.find_version(&manifest, Some("0.0.0")),
            Err(MetaError::UnknownVersion(_))
        ));
    }

    #[tokio::test]
    async fn http_error_carries_status_and_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
            .mount(&server)
            .await;

        let resolver = test_resolver(&server);
        match resolver.fetch_version_manifest().await {
            Err(MetaError::Http {
                status,
                body_snippet,
            }) => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body_snippet, "backend unavailable");
            }
            other => panic!("expected Http error, got {:?}", other.err()),
        }
    }

    #[test]
    fn asset_artifacts_collapse_duplicate_hashes() {
        let server_less = ManifestResolver::new(MetaConfig::default()).unwrap();
        let mut objects = std::collections::HashMap::new();
        let shared = AssetObject {
            hash: "bdf48ef6b5d0d23bbb02e17d04865216179f510a".to_string(),
            size: 3665,
        };
        objects.insert("icons/icon_16x16.png".to_string(), shared.clone());
        objects.insert("icons/icon_32x32.png".to_string(), shared);
        objects.insert(
            "minecraft/sounds/cave1.ogg".to_string(),
            AssetObject {
                hash: "b4f986b6a4d8af8eca1d9c31bfa9b2fe0f6b9f14".to_string(),
                size: 69522,
            },
        );

        let artifacts = server_less
            .asset_artifacts(&AssetIndex { objects })
            .unwrap();
        assert_eq!(artifacts.len(), 2);
    }

    #[test]
    fn client_artifact_lands_in_the_version_directory() {
        let resolver = ManifestResolver::new(MetaConfig::default()).unwrap();
        let detail: VersionDetail = serde_json::from_str(
            r#"{
                "id": "1.20.4",
                "mainClass": "net.minecraft.client.main.Main",
                "assetIndex": { "id": "12", "url": "https://example.invalid/12.json" },
                "assets": "12",
                "downloads": {
                    "client": { "sha1": "fd19", "size": 10, "url": "https://example.invalid/client.jar" }
                },
                "libraries": []
            }"#,
        )
        .unwrap();

        let artifact = resolver.client_artifact(&detail);
        assert_eq!(artifact.logical_path, "versions/1.20.4/client.jar");
        assert_eq!(artifact.expected_size, Some(10));
    }

    #[test]
    fn library_artifacts_keep_rules_and_prefix_paths() {
        let resolver = ManifestResolver::new(MetaConfig::default()).unwrap();
        let detail: VersionDetail = serde_json::from_str(
            r#"{
                "id": "1.20.4",
                "mainClass": "net.minecraft.client.main.Main",
                "assetIndex": { "id": "12", "url": "https://example.invalid/12.json" },
                "assets": "12",
                "downloads": {
                    "client": { "sha1": "fd19", "size": 10, "url": "https://example.invalid/client.jar" }
                },
                "libraries": [
                    {
                        "name": "ca.weblite:java-objc-bridge:1.1",
                        "downloads": {
                            "artifact": {
                                "path": "ca/weblite/java-objc-bridge-1.1.jar",
                                "sha1": "1227",
                                "size": 1330045,
                                "url": "https://libraries.minecraft.net/ca/weblite/java-objc-bridge-1.1.jar"
                            }
                        },
                        "rules": [{ "action": "allow", "os": { "name": "osx" } }]
                    },
                    { "name": "meta-only", "downloads": {} }
                ]
            }"#,
        )
        .unwrap();

        let artifacts = resolver.library_artifacts(&detail);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(
            artifacts[0].logical_path,
            "libraries/ca/weblite/java-objc-bridge-1.1.jar"
        );
        assert_eq!(artifacts[0].rules.len(), 1);
    }
}
