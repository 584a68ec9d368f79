//! Service layer for job monitoring
//!
//! Services hold the policies that sit between the platform API and the
//! notification channels: the monitor state machine and the connectivity
//! retry it falls back on.

pub mod monitor;
pub mod retry;

pub use monitor::{queue_transition, Monitor, MonitorOutcome, Phase, QueueTransition};
pub use retry::{ConnectivityRetry, RetryOutcome};

use std::time::Duration;

/// Blocking pause between polls
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        log::debug!("Sleeping for {:?}", duration);
        std::thread::sleep(duration);
    }
}
