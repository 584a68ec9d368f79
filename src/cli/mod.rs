//! CLI argument parsing and output formatting
//!
//! Uses clap for ergonomic CLI argument definitions.

pub mod args;
pub mod output;

pub use args::{Cli, Commands};

use env_logger::{Builder, Env};

/// Logger for a parsed command line; `RUST_LOG` still wins when set
pub fn logger(env: Env<'_>, verbose: bool) -> Builder {
    let default_filter = if verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(env.default_filter_or(default_filter));
    builder.format_timestamp_secs();
    builder
}
