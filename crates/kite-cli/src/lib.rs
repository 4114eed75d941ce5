//! KitePaint command-line front end
//!
//! Offline composition plus thin wrappers over the catalog and design
//! storage services. The `kitepaint` binary wires these to clap.

#![warn(missing_docs)]

pub mod commands;
pub mod config;

pub use commands::ListOptions;
pub use config::CliConfig;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "KITEPAINT_LOG";

/// Install the global tracing subscriber.
///
/// The filter comes from `KITEPAINT_LOG` when set, `info` otherwise
/// (`debug` with `verbose`). Logs go to stderr so command output stays
/// clean on stdout.
pub fn setup_tracing(verbose: bool) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    // A subscriber may already be installed (tests, embedding).
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}
