//! CLI infrastructure for the grid-world toolkit
//!
//! This module provides the command-line interface for training TD learners,
//! solving scenarios with the model-based planners, and evaluating saved
//! agents.

pub mod commands;
pub mod config;
pub mod output;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `--verbose` turns on crate debug logs. Otherwise `RUST_LOG` applies,
/// falling back to warnings only. Calling this twice is harmless.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("gridmdp=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridmdp=warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
