//! Command implementations

mod pack;

pub use pack::run_pack;

use miette::{IntoDiagnostic, Result};
use tokio::runtime::Runtime;

fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("gsmc-pack")
        .build()
        .into_diagnostic()
}
