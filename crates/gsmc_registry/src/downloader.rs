//! Streaming artifact downloader.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::client::default_user_agent;
use crate::hash::{HashError, HashVerifier};

/// Default maximum artifact size (512 MiB).
pub const DEFAULT_MAX_SIZE: u64 = 512 * 1024 * 1024;

/// Default request timeout for artifact transfers.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Error type for artifact downloads.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network request failed.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The URL answered with a non-success status.
    #[error("Corrupted url {url}: server answered {status}")]
    CorruptedUrl { url: String, status: u16 },

    /// File size exceeds the maximum allowed.
    #[error("File too large: {size} bytes exceeds maximum of {max} bytes")]
    TooLarge { size: u64, max: u64 },

    /// The downloaded bytes do not match the published digest.
    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("Invalid target path: {}", .0.display())]
    InvalidTarget(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DownloadError {
    pub fn is_hash_mismatch(&self) -> bool {
        matches!(self, Self::Hash(HashError::Mismatch { .. }))
    }
}

/// A file that was written to its final location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub path: PathBuf,
    pub size: u64,
    /// SHA-512 of the written bytes (lowercase hex).
    pub sha512: String,
}

/// Downloads artifacts to disk without holding them in memory.
#[derive(Debug, Clone)]
pub struct ArtifactDownloader {
    http: reqwest::Client,
    max_size: u64,
}

impl ArtifactDownloader {
    /// Create a downloader with default settings.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_options(&default_user_agent(), DEFAULT_MAX_SIZE, DEFAULT_TIMEOUT)
    }

    /// Create a downloader with a custom maximum file size.
    pub fn with_max_size(max_size: u64) -> Result<Self, DownloadError> {
        Self::with_options(&default_user_agent(), max_size, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        user_agent: &str,
        max_size: u64,
        timeout: Duration,
    ) -> Result<Self, DownloadError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, max_size })
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Stream `url` into `target`.
    ///
    /// Bytes go to a hidden `.<name>.<random>.part` file next to the target
    /// while the SHA-512 is computed on the fly. Only a complete transfer
    /// whose digest matches `expected_sha512` (when given) is renamed over
    /// `target`; any failure removes the partial file and leaves `target` as
    /// it was. Each call gets its own part file.
    pub async fn download_to(
        &self,
        url: &str,
        target: &Path,
        expected_sha512: Option<&str>,
    ) -> Result<Downloaded, DownloadError> {
        let part = self.part_file(target).await?;
        let (file, part) = part.into_parts();
        let mut file = fs::File::from_std(file);

        // `part` removes itself when dropped on the error path.
        let (size, sha512) = self.stream_to(url, &mut file, expected_sha512).await?;
        drop(file);
        part.persist(target).map_err(|e| DownloadError::IoError(e.error))?;

        debug!("Wrote {} ({} bytes)", target.display(), size);
        Ok(Downloaded {
            path: target.to_path_buf(),
            size,
            sha512,
        })
    }

    async fn part_file(&self, target: &Path) -> Result<NamedTempFile, DownloadError> {
        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DownloadError::InvalidTarget(target.to_path_buf()))?;
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).await?;

        let prefix = format!(".{name}.");
        let part = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".part")
                .tempfile_in(&parent)
        })
        .await
        .map_err(std::io::Error::other)??;
        Ok(part)
    }

    async fn stream_to(
        &self,
        url: &str,
        file: &mut fs::File,
        expected_sha512: Option<&str>,
    ) -> Result<(u64, String), DownloadError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::CorruptedUrl {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length()
            && len > self.max_size
        {
            return Err(DownloadError::TooLarge {
                size: len,
                max: self.max_size,
            });
        }

        let mut hash = HashVerifier::incremental();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let size = hash.len() + chunk.len() as u64;
            if size > self.max_size {
                return Err(DownloadError::TooLarge {
                    size,
                    max: self.max_size,
                });
            }
            hash.update(&chunk);
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        let size = hash.len();
        let actual = hash.finish();
        if let Some(expected) = expected_sha512 {
            HashVerifier::verify_hex(&actual, expected)?;
        }
        Ok((size, actual))
    }

    /// HEAD `url` and report whether it answers with a success status.
    pub async fn probe(&self, url: &str) -> Result<u16, DownloadError> {
        let response = self.http.head(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(DownloadError::CorruptedUrl {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

/// Size in MiB, rounded to two decimals.
pub fn mebibytes(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}
