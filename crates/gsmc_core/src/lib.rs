//! # gsmc_core
//!
//! Pack semantics for gsmc-pack.
//!
//! This crate provides:
//! - Origin parsing into typed sources
//! - The idempotent, hash-verified sync engine
//! - Peer dependency checking
//! - The `Orchestrator` that runs an action over a whole manifest
//!
//! ## Example
//!
//! ```rust,ignore
//! use gsmc_core::{Action, Orchestrator, PackConfig, manifest};
//!
//! let origins = manifest::load("pack.jsonc")?;
//! let orchestrator = Orchestrator::new(PackConfig::new("pack"))?;
//!
//! let report = orchestrator.run(&origins, Action::Sync).await;
//! println!("{}", report.summary());
//! ```

mod config;
pub mod deps;
pub mod engine;
mod error;
mod layout;
pub mod manifest;
pub mod orchestrator;
pub mod origin;
pub mod report;

pub use config::{DEFAULT_PACK_DIR, PackConfig};
pub use deps::{DependencyChecker, PeerLabels, Satisfaction};
pub use engine::{Resolution, SyncEngine};
pub use error::{ManifestError, PackError, ParseError};
pub use layout::Layout;
pub use orchestrator::{Admitted, Orchestrator, RunState};
pub use origin::{Flags, Source, SourceKind};
pub use report::{Action, Entry, Outcome, Report, SkipReason};
