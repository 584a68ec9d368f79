//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod probe;
pub mod test_notify;
pub mod token;
pub mod watch;

pub use probe::run_probe;
pub use test_notify::run_test_notify;
pub use token::run_token;
pub use watch::run_watch;

use crate::cli::args::JobArgs;
use crate::config::{Config, ConfigBuilder};
use crate::domain::JobIdentity;
use crate::error::{AppError, Result};

/// Config from file, job selection flags and secret env vars
fn load_config(path: Option<&str>, job: &JobArgs) -> Result<ConfigBuilder> {
    Ok(ConfigBuilder::new()
        .with_file(path)?
        .with_cluster(job.cluster.clone())
        .with_schedule_log(job.schedule_log.clone())
        .with_env_secrets())
}

/// Resolve the job identity, refusing to run with missing parts
fn job_identity(config: &Config) -> Result<JobIdentity> {
    let job = config.job.identity();
    if !job.is_complete() {
        return Err(AppError::IncompleteIdentity(format!(
            "missing {}",
            job.missing_fields().join(", ")
        )));
    }
    Ok(job)
}
