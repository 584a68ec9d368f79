//! Platform API abstraction layer
//!
//! Trait seams over the cluster platform so the monitor can be driven by
//! scripted fakes in tests and by the HTTP client in production.

pub mod auth;
pub mod client;
pub mod session;
pub mod types;

pub use auth::PasswordTokenProvider;
pub use client::HttpMonitorClient;
pub use session::CredentialSession;

use crate::domain::{Credential, JobIdentity, JobStatus};
use crate::error::AuthError;

/// Queries and control calls against the monitoring platform
///
/// Every method swallows transport and application failures: "no data" is
/// `None` (or `false`) and is never confused with a real reading. Recovery
/// is the caller's business.
pub trait MonitorApi {
    /// Latest GPU memory usage in MB, the maximum across the job's devices
    fn latest_memory_mb(&self, job: &JobIdentity, credential: &Credential) -> Option<f64>;

    /// Current run status of the job
    fn job_status(&self, job: &JobIdentity, credential: &Credential) -> Option<JobStatus>;

    /// Stop the job; true only when the platform confirmed it
    fn terminate_job(&self, job: &JobIdentity, credential: &Credential) -> bool;
}

/// Source of fresh bearer credentials
pub trait TokenProvider {
    /// Acquire a new credential
    fn acquire(&self) -> Result<Credential, AuthError>;
}
