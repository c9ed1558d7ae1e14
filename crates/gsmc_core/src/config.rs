//! Run configuration.

use std::path::{Path, PathBuf};

use gsmc_registry::client::DEFAULT_BASE_URL;
use gsmc_registry::downloader::DEFAULT_MAX_SIZE;
use gsmc_registry::{
    ArtifactDownloader, DownloadError, ModrinthClient, RegistryError, RetryPolicy,
    default_user_agent,
};

use crate::layout::Layout;

/// Default pack directory.
pub const DEFAULT_PACK_DIR: &str = "pack";

/// Settings shared by every component of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackConfig {
    pub pack_dir: PathBuf,
    pub layout: Layout,
    /// Overwrite files that already exist.
    pub force: bool,
    /// Pull required peers into the run and flag incompatible ones.
    pub check_peers: bool,
    pub verbose: bool,
    /// Attach supported-version hints to unsupported sources (test only).
    pub show_nearest: bool,
    pub registry_url: String,
    pub user_agent: String,
    pub retry: RetryPolicy,
    pub max_artifact_size: u64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            pack_dir: PathBuf::from(DEFAULT_PACK_DIR),
            layout: Layout::Flat,
            force: false,
            check_peers: false,
            verbose: false,
            show_nearest: false,
            registry_url: DEFAULT_BASE_URL.to_string(),
            user_agent: default_user_agent(),
            retry: RetryPolicy::default(),
            max_artifact_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl PackConfig {
    pub fn new(pack_dir: impl AsRef<Path>) -> Self {
        Self {
            pack_dir: pack_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_check_peers(mut self, check_peers: bool) -> Self {
        self.check_peers = check_peers;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_show_nearest(mut self, show_nearest: bool) -> Self {
        self.show_nearest = show_nearest;
        self
    }

    /// Point the registry client somewhere else (mirrors, mock servers).
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_artifact_size(mut self, max: u64) -> Self {
        self.max_artifact_size = max;
        self
    }

    /// Registry client configured from these settings.
    pub fn registry_client(&self) -> Result<ModrinthClient, RegistryError> {
        ModrinthClient::builder()
            .base_url(&self.registry_url)
            .user_agent(&self.user_agent)
            .retry_policy(self.retry.clone())
            .build()
    }

    /// Artifact downloader configured from these settings.
    pub fn downloader(&self) -> Result<ArtifactDownloader, DownloadError> {
        ArtifactDownloader::with_options(
            &self.user_agent,
            self.max_artifact_size,
            gsmc_registry::downloader::DEFAULT_TIMEOUT,
        )
    }
}
