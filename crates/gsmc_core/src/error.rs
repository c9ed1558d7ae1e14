//! Error types for pack operations.

use std::path::PathBuf;

use gsmc_registry::{DownloadError, HashError, RegistryError};
use thiserror::Error;

/// An origin string that could not be turned into a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Missing or empty fields for a known method.
    #[error("Malformed origin '{origin}', expected '{pattern}'")]
    MalformedOrigin {
        origin: String,
        pattern: &'static str,
    },

    /// The first field names no known method.
    #[error("Unknown method '{method}' in origin '{origin}'")]
    UnknownMethod { origin: String, method: String },
}

/// The origin manifest could not be loaded. Always fatal.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Cannot read manifest {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSONC in manifest: {0}")]
    InvalidJsonc(String),

    #[error("Manifest must be an array of origins or an object with an \"origins\" array")]
    WrongShape,

    #[error("Manifest entry {index} is not a string")]
    NonStringEntry { index: usize },
}

/// Per-source failure. Stored in the report, never propagated past the
/// orchestrator.
#[derive(Debug, Error)]
pub enum PackError {
    #[error(transparent)]
    MalformedOrigin(#[from] ParseError),

    /// The registry broke its rate-limit header contract.
    #[error("Registry protocol error: {0}")]
    RegistryProtocol(#[source] RegistryError),

    #[error("Registry unreachable: {0}")]
    RegistryUnreachable(#[source] RegistryError),

    #[error("Corrupted URL {url} (HTTP {status})")]
    CorruptedUrl { url: String, status: u16 },

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// No release matches the requested platform and game version.
    #[error("Not supported on {platform} {game_version}")]
    Unsupported {
        platform: String,
        game_version: String,
    },

    /// The registry published a digest that is not SHA-512 hex.
    #[error("Invalid published hash '{0}'")]
    InvalidHash(String),

    #[error("File too large: {size} bytes exceeds maximum of {max} bytes")]
    TooLarge { size: u64, max: u64 },

    /// A file name that is not a single path component.
    #[error("Invalid file name '{0}'")]
    InvalidFileName(String),

    #[error("Network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RegistryError> for PackError {
    fn from(error: RegistryError) -> Self {
        if error.is_protocol_error() {
            Self::RegistryProtocol(error)
        } else {
            Self::RegistryUnreachable(error)
        }
    }
}

impl From<DownloadError> for PackError {
    fn from(error: DownloadError) -> Self {
        match error {
            DownloadError::CorruptedUrl { url, status } => Self::CorruptedUrl { url, status },
            DownloadError::Hash(HashError::Mismatch { expected, actual }) => {
                Self::HashMismatch { expected, actual }
            }
            DownloadError::Hash(HashError::InvalidFormat(hash)) => Self::InvalidHash(hash),
            DownloadError::TooLarge { size, max } => Self::TooLarge { size, max },
            DownloadError::IoError(e) => Self::Io(e),
            DownloadError::NetworkError(e) => Self::Network(Box::new(e)),
            e @ DownloadError::InvalidTarget(_) => Self::Io(std::io::Error::other(e)),
        }
    }
}

impl PackError {
    /// Short cause shown on the diagnostic line.
    pub fn cause(&self) -> &'static str {
        match self {
            Self::MalformedOrigin(_) => "malformed origin",
            Self::RegistryProtocol(_) => "registry protocol error",
            Self::RegistryUnreachable(_) => "registry unreachable",
            Self::CorruptedUrl { .. } => "corrupted URL",
            Self::HashMismatch { .. } => "hash mismatch",
            Self::Unsupported { .. } => "not supported",
            Self::InvalidHash(_) => "invalid hash",
            Self::TooLarge { .. } => "file too large",
            Self::InvalidFileName(_) => "invalid file name",
            Self::Network(_) => "network error",
            Self::Io(_) => "I/O error",
        }
    }
}
