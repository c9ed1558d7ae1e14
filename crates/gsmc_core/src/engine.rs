//! Per-source resolve, sync and reachability test.

use std::path::PathBuf;

use gsmc_registry::{
    ArtifactDownloader, PlatformSupport, ResolvedRelease, TieBreak, VersionResolver, mebibytes,
};
use tokio::fs;
use tracing::{debug, info};

use crate::config::PackConfig;
use crate::error::PackError;
use crate::origin::{Source, SourceKind};
use crate::report::{Outcome, SkipReason};

/// What a source resolved to before any file is touched.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Nothing to look up (assumed and direct sources).
    Local,
    Release(ResolvedRelease),
    /// The registry has no release for the platform and game version.
    Unsupported,
}

/// A concrete file to fetch or probe.
struct Artifact<'a> {
    url: &'a str,
    target: PathBuf,
    sha512: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct SyncEngine {
    config: PackConfig,
    resolver: VersionResolver,
    downloader: ArtifactDownloader,
}

impl SyncEngine {
    pub fn new(config: PackConfig) -> Result<Self, PackError> {
        let resolver = VersionResolver::new(config.registry_client()?);
        let downloader = config.downloader()?;
        Ok(Self {
            config,
            resolver,
            downloader,
        })
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// Look up the release for registry sources. Other sources resolve locally.
    pub async fn resolve(&self, source: &Source) -> Result<Resolution, PackError> {
        let SourceKind::Modrinth {
            platform,
            game_version,
        } = &source.kind
        else {
            return Ok(Resolution::Local);
        };

        let release = self
            .resolver
            .resolve(
                &source.label,
                Some(platform.as_str()),
                Some(game_version.as_str()),
                TieBreak::Newest,
            )
            .await?;

        Ok(match release {
            Some(release) => {
                debug!(
                    "Resolved '{}' to {} ({})",
                    source.label, release.filename, release.version_number
                );
                Resolution::Release(release)
            }
            None => Resolution::Unsupported,
        })
    }

    /// Where the artifact of `source` lands, if it has one.
    pub fn target_path(
        &self,
        source: &Source,
        resolution: &Resolution,
    ) -> Result<Option<PathBuf>, PackError> {
        let (category, file_name) = match (&source.kind, resolution) {
            (SourceKind::Direct {
                file_name,
                category,
                ..
            }, _) => (*category, file_name.as_str()),
            (SourceKind::Modrinth { .. }, Resolution::Release(release)) => {
                (release.category, release.filename.as_str())
            }
            _ => return Ok(None),
        };
        self.config
            .layout
            .target_path(&self.config.pack_dir, category, file_name)
            .map(Some)
    }

    /// Resolve and sync in one step.
    pub async fn sync_source(&self, source: &Source) -> Outcome {
        match self.resolve(source).await {
            Ok(resolution) => self.sync(source, &resolution).await,
            Err(error) => Outcome::failed(error),
        }
    }

    /// Fetch the artifact of an already resolved source.
    ///
    /// An existing target is kept unless `force` is set. The file is only
    /// written once the transfer is complete and, for registry releases, the
    /// SHA-512 matches.
    pub async fn sync(&self, source: &Source, resolution: &Resolution) -> Outcome {
        if matches!(source.kind, SourceKind::Assume) {
            return Outcome::Skipped(SkipReason::Assumed);
        }
        if source.flags.no_sync {
            return Outcome::Skipped(SkipReason::Flagged);
        }

        let artifact = match self.artifact(source, resolution) {
            Ok(artifact) => artifact,
            Err(outcome) => return outcome,
        };

        if !self.config.force && fs::try_exists(&artifact.target).await.unwrap_or(false) {
            debug!("{} already exists", artifact.target.display());
            return Outcome::Skipped(SkipReason::Exists(artifact.target));
        }

        match self
            .downloader
            .download_to(artifact.url, &artifact.target, artifact.sha512)
            .await
        {
            Ok(written) => {
                info!("Synced {}", written.path.display());
                Outcome::Synced {
                    path: written.path,
                    size_mib: mebibytes(written.size),
                }
            }
            Err(error) => Outcome::failed(error.into()),
        }
    }

    /// Check that the artifact of a resolved source is downloadable.
    pub async fn test(&self, source: &Source, resolution: &Resolution) -> Outcome {
        if matches!(source.kind, SourceKind::Assume) {
            return Outcome::Skipped(SkipReason::Assumed);
        }
        if source.flags.no_test {
            return Outcome::Skipped(SkipReason::Flagged);
        }

        let artifact = match self.artifact(source, resolution) {
            Ok(artifact) => artifact,
            Err(Outcome::Failed {
                error: error @ PackError::Unsupported { .. },
                ..
            }) if self.config.show_nearest => {
                return Outcome::Failed {
                    error,
                    nearest: self.nearest(source).await,
                };
            }
            Err(outcome) => return outcome,
        };

        match self.downloader.probe(artifact.url).await {
            Ok(status) => Outcome::Passed { status },
            Err(error) => Outcome::failed(error.into()),
        }
    }

    /// Supported game version ranges per loader for a registry source.
    pub async fn nearest(&self, source: &Source) -> Vec<PlatformSupport> {
        if !source.is_registry() {
            return Vec::new();
        }
        match self.resolver.supported_ranges(&source.label).await {
            Ok(Some(ranges)) => ranges,
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!("No nearest versions for '{}': {}", source.label, e);
                Vec::new()
            }
        }
    }

    fn artifact<'a>(
        &self,
        source: &'a Source,
        resolution: &'a Resolution,
    ) -> Result<Artifact<'a>, Outcome> {
        let target = self
            .target_path(source, resolution)
            .map_err(Outcome::failed)?;
        match (&source.kind, resolution, target) {
            (SourceKind::Direct { url, .. }, _, Some(target)) => Ok(Artifact {
                url,
                target,
                sha512: None,
            }),
            (SourceKind::Modrinth { .. }, Resolution::Release(release), Some(target)) => {
                Ok(Artifact {
                    url: &release.download_url,
                    target,
                    sha512: Some(release.sha512.as_str()),
                })
            }
            (
                SourceKind::Modrinth {
                    platform,
                    game_version,
                },
                _,
                _,
            ) => Err(Outcome::failed(PackError::Unsupported {
                platform: platform.clone(),
                game_version: game_version.clone(),
            })),
            _ => Err(Outcome::Skipped(SkipReason::NotApplicable)),
        }
    }
}
