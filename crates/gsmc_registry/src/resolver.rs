//! Release resolution: picks the file to download for a project, loader and
//! game version.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tracing::debug;

use crate::client::ModrinthClient;
use crate::error::RegistryError;
use crate::model::{Category, Dependency, DependencyType, Project, Version};

/// Which end of the publish-date ordering wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    #[default]
    Newest,
    /// Only used for "nearest supported version" diagnostics.
    Oldest,
}

/// Peer project IDs declared by a release, split by dependency tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub required: Vec<String>,
    pub incompatible: Vec<String>,
    pub optional: Vec<String>,
}

impl Dependencies {
    /// Partitions declared dependencies by tag.
    ///
    /// Entries without a project reference, embedded and unknown tags are
    /// dropped. An ID lands in at most one set; the first tag seen wins.
    pub fn classify(dependencies: &[Dependency]) -> Self {
        let mut seen = HashSet::new();
        let mut result = Self::default();

        for dependency in dependencies {
            let Some(id) = dependency.project_id.as_deref() else {
                continue;
            };
            let bucket = match dependency.dependency_type {
                DependencyType::Required => &mut result.required,
                DependencyType::Incompatible => &mut result.incompatible,
                DependencyType::Optional => &mut result.optional,
                DependencyType::Embedded | DependencyType::Unknown => continue,
            };
            if seen.insert(id.to_string()) {
                bucket.push(id.to_string());
            }
        }

        result
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.incompatible.is_empty() && self.optional.is_empty()
    }
}

/// The concrete file selected for a Modrinth source.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRelease {
    pub project_id: String,
    pub slug: String,
    pub category: Category,
    pub version_id: String,
    pub version_number: String,
    pub published: DateTime<Utc>,
    pub filename: String,
    pub sha512: String,
    pub size: u64,
    pub download_url: String,
    pub platforms: Vec<String>,
    pub game_versions: Vec<String>,
    pub dependencies: Dependencies,
}

/// Game versions supported by the oldest and newest release for one loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSupport {
    pub platform: String,
    pub oldest: Vec<String>,
    pub newest: Vec<String>,
}

/// Picks the release for a project from an already filtered version list.
///
/// Versions without files are unusable and dropped. The remaining versions are
/// ordered by publish date (stable, so equal dates keep server order) and the
/// first one wins. Inside it the `primary` file is taken, or the first file
/// when none is flagged.
pub fn select_release(
    project: &Project,
    mut versions: Vec<Version>,
    tie_break: TieBreak,
) -> Option<ResolvedRelease> {
    versions.retain(|v| !v.files.is_empty());
    match tie_break {
        TieBreak::Newest => versions.sort_by(|a, b| b.date_published.cmp(&a.date_published)),
        TieBreak::Oldest => versions.sort_by(|a, b| a.date_published.cmp(&b.date_published)),
    }

    let version = versions.into_iter().next()?;
    let file = version
        .files
        .iter()
        .find(|f| f.primary)
        .or_else(|| version.files.first())?
        .clone();

    Some(ResolvedRelease {
        project_id: project.id.clone(),
        slug: project.slug.clone(),
        category: Category::from_project_type(&project.project_type),
        dependencies: Dependencies::classify(&version.dependencies),
        version_id: version.id,
        version_number: version.version_number,
        published: version.date_published,
        filename: file.filename,
        sha512: file.hashes.sha512,
        size: file.size,
        download_url: file.url,
        platforms: version.loaders,
        game_versions: version.game_versions,
    })
}

/// Resolves Modrinth projects into downloadable releases.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    client: ModrinthClient,
}

impl VersionResolver {
    pub fn new(client: ModrinthClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ModrinthClient {
        &self.client
    }

    /// Fetch project metadata; `None` when the project does not exist.
    pub async fn project(&self, id: &str) -> Result<Option<Project>, RegistryError> {
        self.client.get_json(&format!("project/{id}"), &[]).await
    }

    /// Fetch the version list, filtered server-side by loader and game version.
    pub async fn versions(
        &self,
        id: &str,
        platform: Option<&str>,
        game_version: Option<&str>,
    ) -> Result<Option<Vec<Version>>, RegistryError> {
        let mut query = Vec::new();
        if let Some(platform) = platform {
            query.push(("loaders", json_list(platform)));
        }
        if let Some(game_version) = game_version {
            query.push(("game_versions", json_list(game_version)));
        }
        self.client
            .get_json(&format!("project/{id}/version"), &query)
            .await
    }

    /// Resolve the release to use for `id` on `platform` and `game_version`.
    ///
    /// `Ok(None)` means the project is unknown or has no matching release,
    /// which is a normal outcome rather than an error.
    pub async fn resolve(
        &self,
        id: &str,
        platform: Option<&str>,
        game_version: Option<&str>,
        tie_break: TieBreak,
    ) -> Result<Option<ResolvedRelease>, RegistryError> {
        let Some(project) = self.project(id).await? else {
            debug!("Project '{}' not found", id);
            return Ok(None);
        };
        let Some(versions) = self.versions(id, platform, game_version).await? else {
            return Ok(None);
        };
        Ok(select_release(&project, versions, tie_break))
    }

    /// For every loader the project lists, the game versions of its oldest and
    /// newest release. `Ok(None)` when the project does not exist.
    pub async fn supported_ranges(
        &self,
        id: &str,
    ) -> Result<Option<Vec<PlatformSupport>>, RegistryError> {
        let Some(project) = self.project(id).await? else {
            return Ok(None);
        };

        let project = &project;
        let ranges = join_all(project.loaders.iter().map(|loader| async move {
            let versions = self.versions(id, Some(loader.as_str()), None).await?;
            let Some(versions) = versions else {
                return Ok::<_, RegistryError>(None);
            };
            let newest = select_release(project, versions.clone(), TieBreak::Newest);
            let oldest = select_release(project, versions, TieBreak::Oldest);
            Ok(newest.zip(oldest).map(|(newest, oldest)| PlatformSupport {
                platform: loader.clone(),
                oldest: oldest.game_versions,
                newest: newest.game_versions,
            }))
        }))
        .await;

        let mut supports = Vec::new();
        for range in ranges {
            if let Some(support) = range? {
                supports.push(support);
            }
        }
        Ok(Some(supports))
    }
}

/// Modrinth expects list filters as JSON arrays in the query string.
fn json_list(value: &str) -> String {
    serde_json::Value::from(vec![value]).to_string()
}
