//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use crate::notify::CHANNEL_NAMES;
use clap::builder::PossibleValuesParser;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// GPU idle watchdog for cluster jobs
///
/// Watches a job on the cluster platform and stops it once its GPUs have
/// been idle for too long, notifying you along the way.
#[derive(Parser, Debug)]
#[command(name = "idleguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "IDLEGUARD_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch a job and stop it when the GPU goes idle
    Watch(WatchArgs),

    /// Query the job once and print its status and GPU memory
    Probe(JobArgs),

    /// Log in and print a fresh API token
    Token,

    /// Send a test notification through the configured channels
    TestNotify(TestNotifyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Job selection shared by commands that talk to the platform
#[derive(Args, Debug, Clone, Default)]
pub struct JobArgs {
    /// Scheduler event line ("Successfully assigned <ns>/<pod> to <node>")
    #[arg(long)]
    pub schedule_log: Option<String>,

    /// Cluster name
    #[arg(long)]
    pub cluster: Option<String>,
}

/// Arguments for the watch command
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub job: JobArgs,

    /// Seconds between checks
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// GPU memory (MB) below which a check counts as idle
    #[arg(long)]
    pub idle_threshold: Option<f64>,

    /// Consecutive idle checks before the shutdown warning
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_idle: Option<u32>,

    /// Keep watching for idleness after the job leaves the queue
    #[arg(long)]
    pub continue_after_queue: bool,
}

/// Arguments for the test-notify command
#[derive(Args, Debug, Clone)]
pub struct TestNotifyArgs {
    /// Only test this channel (default: all enabled channels)
    #[arg(long, value_parser = PossibleValuesParser::new(CHANNEL_NAMES))]
    pub channel: Option<String>,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
