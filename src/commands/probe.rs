//! Probe command implementation
//!
//! Logs in once and reports the job's status and GPU memory.

use super::{job_identity, load_config};
use crate::api::{HttpMonitorClient, MonitorApi, PasswordTokenProvider, TokenProvider};
use crate::cli::args::{JobArgs, OutputFormat};
use crate::cli::output::{print_output, ProbeReport};
use crate::error::Result;

/// Execute the probe command
pub fn run_probe(args: &JobArgs, config_path: Option<&str>, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path, args)?.build()?;
    let job = job_identity(&config)?;

    let provider = PasswordTokenProvider::new(&config.api, &config.auth)?;
    let credential = provider.acquire()?;
    let client = HttpMonitorClient::new(&config.api)?;

    let status = client.job_status(&job, &credential);
    let usage = client.latest_memory_mb(&job, &credential);

    let report = ProbeReport::new(job, status, usage, config.monitor.idle_threshold_mb);
    print_output(&report, format)?;

    Ok(())
}
