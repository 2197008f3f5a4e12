mod commands;
pub mod core;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use crate::commands::{fetch_libraries, fetch_libraries_with, Cli};
pub use crate::core::config::FetchConfig;
pub use crate::core::error::{FetchError, FetchResult};
use crate::core::libraries::FetchSummary;

/// Status for any failed run.
const FAILURE_STATUS: u8 = 1;

/// Command-line entry point. Returns the process exit status.
pub fn run() -> ExitCode {
    let config = Cli::parse().into_config();

    // Initialize structured logging
    let filter = if config.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,mclibs_lib=debug"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // One fetch at a time on a single thread.
    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(FetchError::Runtime)
        .and_then(|runtime| runtime.block_on(fetch_libraries(&config)));

    ExitCode::from(finish(&result, config.quiet))
}

/// Log the outcome of a run and pick its exit status.
fn finish(result: &FetchResult<FetchSummary>, quiet: bool) -> u8 {
    match result {
        Ok(summary) => {
            if let Ok(json) = serde_json::to_string(summary) {
                info!("Summary: {json}");
            }
            0
        }
        Err(err) => {
            if should_report(err, quiet) {
                error!("{err}");
            }
            FAILURE_STATUS
        }
    }
}

/// Quiet mode hides transfer failures only; integrity, manifest and
/// platform errors are always reported.
fn should_report(err: &FetchError, quiet: bool) -> bool {
    !(quiet && err.is_network())
}
