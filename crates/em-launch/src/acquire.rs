use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use em_meta::ArtifactDescriptor;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::errors::{LaunchError, Result};

/// Per-file progress: logical path plus percentage (0.0 to 100.0).
/// Percentage stays at 0.0 when the server does not announce a length.
pub type ProgressCallback = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// Result of one acquisition pass.
///
/// Failures are collected per artifact, never thrown: one bad download
/// must not cancel its siblings, and the caller decides whether the
/// remainder is launchable.
#[derive(Debug, Default)]
pub struct AcquireOutcome {
    pub downloaded: Vec<PathBuf>,
    pub failed: Vec<(ArtifactDescriptor, LaunchError)>,
}

impl AcquireOutcome {
    pub fn merge(&mut self, other: AcquireOutcome) {
        self.downloaded.extend(other.downloaded);
        self.failed.extend(other.failed);
    }
}

/// Concurrent artifact downloader: one task per artifact, join-all.
#[derive(Debug, Clone)]
pub struct Acquirer {
    http: Client,
}

impl Acquirer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: Client::builder().build()?,
        })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Download every artifact in `missing` below `local_root`.
    ///
    /// Descriptors resolving to the same destination trigger exactly
    /// one download. All tasks are awaited before returning.
    #[instrument(skip(self, missing, local_root, progress), fields(count = missing.len()))]
    pub async fn acquire(
        &self,
        missing: &[ArtifactDescriptor],
        local_root: &Path,
        progress: Option<ProgressCallback>,
    ) -> AcquireOutcome {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut tasks = Vec::new();

        for artifact in missing {
            let destination = artifact.destination(local_root);
            if !seen.insert(destination.clone()) {
                debug!("Skipping duplicate destination {}", destination.display());
                continue;
            }

            let http = self.http.clone();
            let artifact = artifact.clone();
            let progress = progress.clone();
            tasks.push(tokio::spawn(async move {
                let result = download_one(&http, &artifact, &destination, progress).await;
                (artifact, result)
            }));
        }

        let mut outcome = AcquireOutcome::default();
        for task in futures::future::join_all(tasks).await {
            match task {
                Ok((_, Ok(path))) => outcome.downloaded.push(path),
                Ok((artifact, Err(e))) => {
                    warn!("Failed to download {}: {}", artifact.logical_path, e);
                    outcome.failed.push((artifact, e));
                }
                Err(e) => warn!("Download task panicked: {}", e),
            }
        }

        outcome
    }
}

/// Stream one artifact to disk: parent directories are created lazily,
/// and the file lands under a `.part` name until fully written.
async fn download_one(
    http: &Client,
    artifact: &ArtifactDescriptor,
    destination: &Path,
    progress: Option<ProgressCallback>,
) -> Result<PathBuf> {
    let response = http.get(artifact.remote_url.clone()).send().await?;
    if !response.status().is_success() {
        return Err(LaunchError::Http {
            status: response.status(),
            url: artifact.remote_url.to_string(),
        });
    }

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let total = response
        .content_length()
        .or(artifact.expected_size)
        .unwrap_or(0);
    // Appended, not substituted: `a.jar` and `a.zip` must not share a
    // temp path.
    let part_path = {
        let mut name = destination.as_os_str().to_os_string();
        name.push(".part");
        PathBuf::from(name)
    };
    let mut file = tokio::fs::File::create(&part_path).await?;

    let mut received: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        received += chunk.len() as u64;
        if let Some(progress) = &progress {
            let percent = if total > 0 {
                (received as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            progress(&artifact.logical_path, percent.min(100.0));
        }
    }

    file.flush().await?;
    drop(file);
    tokio::fs::rename(&part_path, destination).await?;

    debug!("Downloaded {} ({} bytes)", artifact.logical_path, received);
    Ok(destination.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn artifact(server: &MockServer, remote: &str, logical: &str) -> ArtifactDescriptor {
        ArtifactDescriptor {
            logical_path: logical.to_string(),
            remote_url: Url::parse(&format!("{}{}", server.uri(), remote)).unwrap(),
            expected_size: None,
            expected_hash: None,
            rules: Vec::new(),
        }
    }

    #[tokio::test]
    async fn downloads_every_artifact_and_creates_directories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/a.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"aaaa".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/b.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bb".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let missing = [
            artifact(&server, "/files/a.jar", "libraries/deep/nested/a.jar"),
            artifact(&server, "/files/b.jar", "libraries/b.jar"),
        ];

        let outcome = Acquirer::new()
            .unwrap()
            .acquire(&missing, dir.path(), None)
            .await;

        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.downloaded.len(), 2);
        let a = dir
            .path()
            .join("libraries")
            .join("deep")
            .join("nested")
            .join("a.jar");
        assert_eq!(tokio::fs::read(a).await.unwrap(), b"aaaa");
    }

    #[tokio::test]
    async fn one_failure_does_not_cancel_siblings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/good.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/bad.jar"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let missing = [
            artifact(&server, "/files/good.jar", "libraries/good.jar"),
            artifact(&server, "/files/bad.jar", "libraries/bad.jar"),
        ];

        let outcome = Acquirer::new()
            .unwrap()
            .acquire(&missing, dir.path(), None)
            .await;

        assert_eq!(outcome.downloaded.len(), 1);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0.logical_path, "libraries/bad.jar");
        assert!(matches!(outcome.failed[0].1, LaunchError::Http { .. }));
        // The failed download leaves no destination file behind.
        assert!(!dir.path().join("libraries").join("bad.jar").exists());
    }

    #[tokio::test]
    async fn sibling_artifacts_differing_only_by_extension_do_not_collide() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/client.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jar bytes".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/client.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let missing = [
            artifact(&server, "/files/client.jar", "versions/1.20.4/client.jar"),
            artifact(&server, "/files/client.zip", "versions/1.20.4/client.zip"),
        ];

        let outcome = Acquirer::new()
            .unwrap()
            .acquire(&missing, dir.path(), None)
            .await;

        assert!(outcome.failed.is_empty());
        let version_dir = dir.path().join("versions").join("1.20.4");
        assert_eq!(
            tokio::fs::read(version_dir.join("client.jar")).await.unwrap(),
            b"jar bytes"
        );
        assert_eq!(
            tokio::fs::read(version_dir.join("client.zip")).await.unwrap(),
            b"zip bytes"
        );
    }

    #[tokio::test]
    async fn duplicate_destinations_download_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/shared"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let missing = [
            artifact(&server, "/files/shared", "assets/objects/bd/bdf48e"),
            artifact(&server, "/files/shared", "assets/objects/bd/bdf48e"),
        ];

        let outcome = Acquirer::new()
            .unwrap()
            .acquire(&missing, dir.path(), None)
            .await;

        assert_eq!(outcome.downloaded.len(), 1);
    }

    #[tokio::test]
    async fn progress_reaches_one_hundred_percent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/a.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 1024]))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let reports: Arc<Mutex<Vec<(String, f64)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let progress: ProgressCallback = Arc::new(move |name, pct| {
            sink.lock().unwrap().push((name.to_string(), pct));
        });

        Acquirer::new()
            .unwrap()
            .acquire(
                &[artifact(&server, "/files/a.jar", "libraries/a.jar")],
                dir.path(),
                Some(progress),
            )
            .await;

        let reports = reports.lock().unwrap();
        assert!(!reports.is_empty());
        let (name, last) = reports.last().unwrap();
        assert_eq!(name, "libraries/a.jar");
        assert!((last - 100.0).abs() < f64::EPSILON);
    }
}
