//! Idle detection
//!
//! Tracks the trailing run of GPU memory samples below the idle threshold
//! and decides when that run warrants a warning or a shutdown.

use serde::{Deserialize, Serialize};

/// Outcome of feeding one usage sample to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleObservation {
    /// Sample was below threshold; `count` is the new run length
    Idle { count: u32 },
    /// Sample was busy and no idle run was in progress
    Active,
    /// Sample was busy and ended an idle run of `previous` samples
    Recovered { previous: u32 },
}

/// What the monitor should do after an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Escalation {
    /// Nothing to do
    None,
    /// Idle run reached the limit: warn and give the operator one interval
    Warn,
    /// Idle run passed the limit: stop the job
    Terminate,
}

/// Consecutive-idle counter with its threshold
///
/// # Examples
///
/// ```
/// use idleguard::domain::{Escalation, IdleTracker};
///
/// let mut tracker = IdleTracker::new(3.0);
/// tracker.observe(5.0);
/// tracker.observe(2.0);
/// assert_eq!(tracker.count(), 1);
/// assert_eq!(tracker.escalation(1), Escalation::Warn);
///
/// tracker.observe(1.0);
/// assert_eq!(tracker.escalation(1), Escalation::Terminate);
/// ```
#[derive(Debug, Clone)]
pub struct IdleTracker {
    threshold_mb: f64,
    count: u32,
}

impl IdleTracker {
    /// Create a tracker; samples strictly below `threshold_mb` count as idle
    pub fn new(threshold_mb: f64) -> Self {
        Self {
            threshold_mb,
            count: 0,
        }
    }

    /// Feed one usage sample in MB
    pub fn observe(&mut self, usage_mb: f64) -> IdleObservation {
        if usage_mb < self.threshold_mb {
            self.count = self.count.saturating_add(1);
            IdleObservation::Idle { count: self.count }
        } else if self.count > 0 {
            let previous = self.count;
            self.count = 0;
            IdleObservation::Recovered { previous }
        } else {
            IdleObservation::Active
        }
    }

    /// Length of the current idle run
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Idle threshold in MB
    pub fn threshold_mb(&self) -> f64 {
        self.threshold_mb
    }

    /// Escalation for the current run against `max_idle_count`
    pub fn escalation(&self, max_idle_count: u32) -> Escalation {
        if self.count > max_idle_count {
            Escalation::Terminate
        } else if self.count == max_idle_count && self.count > 0 {
            Escalation::Warn
        } else {
            Escalation::None
        }
    }
}
