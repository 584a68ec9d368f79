//! idleguard - GPU idle watchdog for cluster jobs
//!
//! This library watches a job on the cluster platform, follows it from the
//! scheduler queue into execution, and stops it once its GPU memory has
//! stayed below a threshold for too many consecutive checks.
//!
//! # Modules
//!
//! - [`api`]: Platform API client, login and credential session
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Domain models
//! - [`error`]: Error types
//! - [`notify`]: Notification channels and fan-out
//! - [`services`]: Monitor state machine and retry policy

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
