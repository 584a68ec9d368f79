//! Domain models for idleguard
//!
//! This module contains the data the monitor reasons about: who the job is,
//! what state the platform reports for it, and how long it has been idle.

pub mod credential;
pub mod idle;
pub mod job;
pub mod status;

pub use credential::Credential;
pub use idle::{Escalation, IdleObservation, IdleTracker};
pub use job::JobIdentity;
pub use status::JobStatus;
