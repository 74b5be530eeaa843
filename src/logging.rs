//! Tracing subscriber setup for the `userbook` binary.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Directive used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

/// Build the filter: `RUST_LOG` wins, otherwise `info` (or `debug` when verbose).
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber. Logs go to stderr so they never mix with
/// the interactive prompt output.
pub fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let builder = fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
