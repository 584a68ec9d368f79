//! Watch command implementation
//!
//! Runs the monitor for one job until it leaves the queue, is stopped, or
//! the platform becomes unreachable.

use super::{job_identity, load_config};
use crate::api::{CredentialSession, HttpMonitorClient, PasswordTokenProvider};
use crate::cli::args::{OutputFormat, WatchArgs};
use crate::cli::output::{print_output, WatchSummary};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::notify::{NotificationManager, Notice};
use crate::services::{Monitor, MonitorOutcome};

/// Execute the watch command
pub fn run_watch(args: &WatchArgs, config_path: Option<&str>, format: OutputFormat) -> Result<()> {
    let config = watch_config(args, config_path)?;
    let job = job_identity(&config)?;

    log::info!("Watching {}", job);
    log::info!("  Interval: {}s", config.monitor.check_interval_secs);
    log::info!("  Idle threshold: {} MB", config.monitor.idle_threshold_mb);
    log::info!("  Max idle checks: {}", config.monitor.max_idle_count);

    let notifier = NotificationManager::from_config(&config.notify)?;
    let client = HttpMonitorClient::new(&config.api)?;
    let provider = PasswordTokenProvider::new(&config.api, &config.auth)?;

    log::info!("Initializing token...");
    let session = match CredentialSession::establish(Box::new(provider)) {
        Ok(session) => session,
        Err(e) => {
            notifier.send_all(&Notice::startup_failed(&job, &e));
            return Err(e.into());
        }
    };

    let mut monitor = Monitor::new(client, session, notifier, job.clone(), config.monitor.clone());
    let outcome = monitor.run();
    log::info!("Monitor finished in phase {}", monitor.phase());

    print_output(
        &WatchSummary {
            job_id: job.job_id,
            outcome,
        },
        format,
    )?;

    match outcome {
        MonitorOutcome::Failed => Err(AppError::MonitorFailed {
            attempts: config.monitor.max_fail_count,
        }),
        MonitorOutcome::QueueFinished | MonitorOutcome::Terminated => Ok(()),
    }
}

fn watch_config(args: &WatchArgs, config_path: Option<&str>) -> Result<Config> {
    let config = load_config(config_path, &args.job)?
        .with_interval(args.interval)
        .with_idle_threshold(args.idle_threshold)
        .with_max_idle(args.max_idle)
        .with_continue_after_queue(args.continue_after_queue)
        .build()?;
    Ok(config)
}
