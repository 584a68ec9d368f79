//! Unified error types for idleguard
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the monitoring API
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Error acquiring a bearer credential
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error delivering a notification
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// The job identity could not be derived from configuration
    #[error("Job identity is incomplete: {0}")]
    IncompleteIdentity(String),

    /// The monitor gave up after exhausting its connectivity retries
    #[error("Monitor stopped after {attempts} failed credential refresh attempts")]
    MonitorFailed { attempts: u32 },

    /// IO error (file operations, console output)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from monitoring API queries
///
/// All of these are transient from the monitor's point of view: the caller
/// treats them as "no data" and escalates through the retry policy.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, TLS or timeout failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// The API answered with a non-200 application code
    #[error("API returned code {code}: {info}")]
    Status { code: i64, info: String },

    /// Unexpected HTTP status on the transport layer
    #[error("Unexpected HTTP status {0}")]
    Http(u16),

    /// The response could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The metric response listed no devices
    #[error("No device data in metric response")]
    NoDevices,

    /// Devices were listed but none carried a sample
    #[error("No samples in metric response")]
    NoSamples,

    /// The job identity is incomplete so no request was issued
    #[error("Job identity is incomplete; request skipped")]
    IncompleteIdentity,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Errors from credential acquisition
#[derive(Error, Debug)]
pub enum AuthError {
    /// The login request could not be sent
    #[error("Login request failed: {0}")]
    Request(String),

    /// The auth endpoint refused the login
    #[error("Login rejected with HTTP status {status}")]
    Rejected { status: u16 },

    /// The response did not contain a token
    #[error("Login response did not contain a token")]
    MissingToken,
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Request(err.to_string())
    }
}

/// Errors from a single notification channel
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The channel could not be reached
    #[error("Delivery failed: {0}")]
    Transport(String),

    /// The channel answered but refused the message
    #[error("{channel} rejected the message: {message}")]
    Rejected { channel: String, message: String },

    /// The message or transport could not be built from configuration
    #[error("Invalid channel setup: {0}")]
    Build(String),

    /// Console output failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.to_string())
    }
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required config field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
