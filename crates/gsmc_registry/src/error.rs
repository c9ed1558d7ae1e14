//! Error types for registry operations.

use thiserror::Error;

/// Error type for requests issued against the Modrinth API.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Network request failed.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// A response arrived without one of the mandatory rate-limit headers.
    ///
    /// The registry contract requires both headers on every response, so this
    /// is never retried.
    #[error("Missing header '{0}' in registry response")]
    MissingRateLimitHeader(&'static str),

    /// A rate-limit header was present but not a number.
    #[error("Header '{header}' has non-numeric value '{value}'")]
    InvalidRateLimitHeader { header: &'static str, value: String },

    /// The retry ceiling was exhausted while the quota stayed depleted.
    #[error("Cannot reach Modrinth API at '{endpoint}' after {attempts} attempts")]
    Unreachable { endpoint: String, attempts: u32 },

    /// The endpoint could not be joined onto the base URL.
    #[error("Invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

impl RegistryError {
    /// Returns true for errors that signal a change in the registry contract.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::MissingRateLimitHeader(_) | Self::InvalidRateLimitHeader { .. }
        )
    }
}
