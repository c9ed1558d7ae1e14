//! sync / test / dep

use miette::{IntoDiagnostic, Result};
use tracing::{debug, info};

use gsmc_core::{Action, Orchestrator, manifest};

use crate::cli::{Cli, Commands};
use crate::output::output_report;

pub fn run_pack(cli: &Cli) -> Result<()> {
    let (action, clean) = match cli.command {
        Commands::Sync { clean } => (Action::Sync, clean),
        Commands::Test => (Action::Test, false),
        Commands::Dep => (Action::Dep, false),
    };

    let origins = manifest::load(&cli.file)
        .map_err(|e| miette::miette!("Failed to load manifest: {}", e))?;
    debug!("{} origins in {}", origins.len(), cli.file.display());

    let config = cli.pack_config();
    let orchestrator = Orchestrator::new(config)
        .map_err(|e| miette::miette!("Failed to set up registry access: {}", e))?;

    let report = super::runtime()?.block_on(async {
        if clean {
            info!("Cleaning {}", orchestrator.config().pack_dir.display());
            orchestrator.clean().await.into_diagnostic()?;
        }
        Ok::<_, miette::Report>(orchestrator.run(&origins, action).await)
    })?;

    output_report(&report, cli.verbose);
    Ok(())
}
