//! File transfer boundary: fetching mod artifacts into the mods directory.
//!
//! The engine only sees this trait; the HTTP implementation streams the
//! download to a temporary file and renames it into place, so an
//! interrupted transfer never leaves a partial artifact under the final
//! name. A file that is already present is kept as-is, which is what makes
//! re-running a partially failed plan cheap.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
#[cfg(test)]
use mockall::automock;
use tempfile::NamedTempFile;

use mp_core::{Error, File};

#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// Ensure the artifact for `file` exists in `dest_dir`, returning its
    /// final path. May fail with `NetworkFailure`.
    async fn fetch(&self, file: &File, dest_dir: &Path) -> Result<PathBuf, Error>;
}

pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent("modpacker/0.1")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }
}

impl Default for HttpTransfer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileTransfer for HttpTransfer {
    async fn fetch(&self, file: &File, dest_dir: &Path) -> Result<PathBuf, Error> {
        let dest = dest_dir.join(&file.file_name);

        // Already transferred by a previous (possibly interrupted) run.
        if dest.exists() {
            return Ok(dest);
        }

        fs::create_dir_all(dest_dir).map_err(|e| Error::NetworkFailure {
            message: format!("failed to create mods directory: {e}"),
        })?;

        let response = self
            .client
            .get(&file.url)
            .send()
            .await
            .map_err(|e| Error::NetworkFailure {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(Error::NetworkFailure {
                message: format!("HTTP {} while fetching {}", response.status(), file.file_name),
            });
        }

        let mut tmp = NamedTempFile::new_in(dest_dir).map_err(|e| Error::NetworkFailure {
            message: format!("failed to create temporary file: {e}"),
        })?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::NetworkFailure {
                message: format!("download interrupted: {e}"),
            })?;
            tmp.write_all(&chunk).map_err(|e| Error::NetworkFailure {
                message: format!("failed to write artifact: {e}"),
            })?;
        }

        tmp.flush().map_err(|e| Error::NetworkFailure {
            message: format!("failed to flush artifact: {e}"),
        })?;

        tmp.persist(&dest).map_err(|e| Error::NetworkFailure {
            message: format!("failed to move artifact into place: {e}"),
        })?;

        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use mp_core::ReleaseChannel;
    use std::collections::BTreeSet;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn file_for(url: String) -> File {
        File {
            id: 2001,
            mod_id: 50,
            display_name: "1.0".to_string(),
            file_name: "forge-multipart-1.0.jar".to_string(),
            date: Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap(),
            release: ReleaseChannel::Release,
            game_versions: BTreeSet::from(["1.10.2".to_string()]),
            dependencies: Vec::new(),
            url,
        }
    }

    #[tokio::test]
    async fn fetch_writes_artifact_atomically() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/2001"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jar bytes".to_vec()))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let transfer = HttpTransfer::new();
        let file = file_for(format!("{}/files/2001", server.uri()));

        let dest = transfer.fetch(&file, tmp.path()).await.unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"jar bytes");
        assert_eq!(dest.file_name().unwrap(), "forge-multipart-1.0.jar");
    }

    #[tokio::test]
    async fn fetch_skips_existing_artifact() {
        let server = MockServer::start().await;
        // No mock mounted: any request would fail.

        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("forge-multipart-1.0.jar"), b"already here").unwrap();

        let transfer = HttpTransfer::new();
        let file = file_for(format!("{}/files/2001", server.uri()));

        let dest = transfer.fetch(&file, tmp.path()).await.unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"already here");
    }

    #[tokio::test]
    async fn server_error_is_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/2001"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let transfer = HttpTransfer::new();
        let file = file_for(format!("{}/files/2001", server.uri()));

        let err = transfer.fetch(&file, tmp.path()).await.unwrap_err();
        assert!(matches!(err, Error::NetworkFailure { .. }));

        // Nothing, not even a partial file, under the final name.
        assert!(!tmp.path().join("forge-multipart-1.0.jar").exists());
    }
}
