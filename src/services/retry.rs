//! Connectivity retry policy
//!
//! Entered whenever a poll comes back without data. Treats the failure as a
//! likely expired credential: refresh it a bounded number of times, backing
//! off between failed attempts, then give up.

use super::Sleeper;
use crate::api::CredentialSession;
use crate::config::MonitorSettings;
use crate::domain::JobIdentity;
use crate::notify::{NotificationManager, Notice};

use std::time::Duration;

/// Result of one recovery episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The credential was refreshed; poll again immediately
    Resume,
    /// Retries are exhausted; the monitor must stop
    GiveUp,
}

/// Bounded refresh-and-backoff policy
#[derive(Debug, Clone)]
pub struct ConnectivityRetry {
    max_fail_count: u32,
    backoff: Duration,
}

impl ConnectivityRetry {
    /// Create a policy allowing `max_fail_count` refresh attempts per episode
    pub fn new(max_fail_count: u32, backoff: Duration) -> Self {
        Self {
            max_fail_count,
            backoff,
        }
    }

    /// Policy from monitor settings
    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self::new(settings.max_fail_count, settings.retry_backoff())
    }

    /// Maximum refresh attempts per episode
    pub fn max_fail_count(&self) -> u32 {
        self.max_fail_count
    }

    /// Run one recovery episode
    ///
    /// The failure counter is local to the call, so every episode starts
    /// with the full budget.
    pub fn recover(
        &self,
        session: &mut CredentialSession,
        notifier: &NotificationManager,
        sleeper: &dyn Sleeper,
        job: &JobIdentity,
    ) -> RetryOutcome {
        let mut failures: u32 = 1;

        loop {
            log::warn!(
                "Could not fetch data (failure {}/{})",
                failures,
                self.max_fail_count
            );

            if failures > self.max_fail_count {
                log::error!("Too many consecutive failures; stopping the monitor");
                notifier.send_all(&Notice::monitor_exiting(job, self.max_fail_count));
                return RetryOutcome::GiveUp;
            }

            log::info!("Refreshing credential");
            match session.refresh() {
                Ok(()) => return RetryOutcome::Resume,
                Err(e) => {
                    log::warn!("Credential refresh failed: {}", e);
                    notifier.send_all(&Notice::token_refresh_failed(job, &e));
                    failures += 1;
                }
            }

            log::info!("Retrying in {:?}", self.backoff);
            sleeper.sleep(self.backoff);
        }
    }
}
