//! Modrinth registry access for gsmc-pack.
//!
//! Provides a rate-limit aware API client, release resolution, peer label
//! lookup and a streaming artifact downloader with SHA-512 verification.

pub mod client;
pub mod downloader;
pub mod error;
pub mod hash;
pub mod model;
pub mod peers;
pub mod resolver;
pub mod retry;

pub use client::{DEFAULT_BASE_URL, ModrinthClient, ModrinthClientBuilder, RateLimit, default_user_agent};
pub use downloader::{ArtifactDownloader, DownloadError, Downloaded, mebibytes};
pub use error::RegistryError;
pub use hash::{HashError, HashVerifier};
pub use model::Category;
pub use peers::PeerResolver;
pub use resolver::{Dependencies, PlatformSupport, ResolvedRelease, TieBreak, VersionResolver};
pub use retry::RetryPolicy;
