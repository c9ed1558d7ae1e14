//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gsmc_core::manifest::DEFAULT_MANIFEST;
use gsmc_core::{DEFAULT_PACK_DIR, Layout, PackConfig};

/// gsmc-pack - Resolve and fetch a Modrinth mod pack
#[derive(Parser)]
#[command(name = "gsmc-pack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Origin manifest (JSONC)
    #[arg(short, long, global = true, default_value = DEFAULT_MANIFEST)]
    pub file: PathBuf,

    /// Pack directory
    #[arg(short, long, global = true, default_value = DEFAULT_PACK_DIR)]
    pub directory: PathBuf,

    /// Overwrite files that already exist
    #[arg(short = 'F', long, global = true)]
    pub force: bool,

    /// Place files in mods/, resourcepacks/, shaderpacks/ by type
    #[arg(short = 'M', long, global = true)]
    pub structured: bool,

    /// Add required peers to the run and flag incompatible ones
    #[arg(short = 'P', long, global = true)]
    pub check_peers: bool,

    /// Show the supported game versions of unsupported sources (test only)
    #[arg(short = 'N', long, global = true)]
    pub show_nearest: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Registry API root
    #[arg(long, global = true, hide = true)]
    pub registry_url: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Download missing artifacts into the pack directory
    Sync {
        /// Remove the pack directory first
        #[arg(long)]
        clean: bool,
    },

    /// Check that every artifact can be downloaded
    #[command(alias = "check")]
    Test,

    /// Check peer dependencies of registry sources
    Dep,
}

impl Cli {
    /// Run configuration from the global flags.
    pub fn pack_config(&self) -> PackConfig {
        let clean = matches!(self.command, Commands::Sync { clean: true });
        let layout = if self.structured {
            Layout::Structured
        } else {
            Layout::Flat
        };

        let config = PackConfig::new(&self.directory)
            .with_layout(layout)
            .with_force(self.force || clean)
            .with_check_peers(self.check_peers)
            .with_verbose(self.verbose)
            .with_show_nearest(self.show_nearest);

        match &self.registry_url {
            Some(url) => config.with_registry_url(url),
            None => config,
        }
    }
}
