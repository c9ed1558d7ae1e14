//! Wire types for the subset of the Modrinth API the resolver reads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `GET /project/{id}` and the entries of `GET /projects`.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub loaders: Vec<String>,
}

/// One entry of `GET /project/{id}/version`.
#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    pub id: String,
    #[serde(default)]
    pub version_number: String,
    pub date_published: DateTime<Utc>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub game_versions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionFile {
    pub filename: String,
    pub url: String,
    pub hashes: FileHashes,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileHashes {
    pub sha512: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dependency {
    pub project_id: Option<String>,
    pub dependency_type: DependencyType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Required,
    Optional,
    Incompatible,
    Embedded,
    #[serde(other)]
    Unknown,
}

/// Placement category of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Mod,
    Resource,
    Shader,
    #[default]
    Unknown,
}

impl Category {
    /// Maps a Modrinth `project_type`.
    pub fn from_project_type(project_type: &str) -> Self {
        match project_type {
            "mod" => Self::Mod,
            "resourcepack" => Self::Resource,
            "shader" => Self::Shader,
            _ => Self::Unknown,
        }
    }

    /// Maps the category hint written in an origin.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_ascii_lowercase().as_str() {
            "mod" => Self::Mod,
            "resource" => Self::Resource,
            "shader" => Self::Shader,
            _ => Self::Unknown,
        }
    }

    /// Directory used by the structured layout.
    pub fn directory(&self) -> &'static str {
        match self {
            Self::Mod => "mods",
            Self::Resource => "resourcepacks",
            Self::Shader => "shaderpacks",
            Self::Unknown => "unknown",
        }
    }
}
