//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::domain::JobIdentity;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Which job to watch
    pub job: JobConfig,
    /// Idle detection and polling cadence
    pub monitor: MonitorSettings,
    /// Platform endpoints
    pub api: ApiConfig,
    /// Account used to obtain bearer tokens
    pub auth: AuthConfig,
    /// Notification channels
    pub notify: NotifyConfig,
}

/// Job selection
///
/// The identity is normally derived from the scheduler event line; explicit
/// `pod`, `node` and `job_id` values win over the derived ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Cluster name used in API paths and queries
    pub cluster: String,
    /// Scheduler event line ("Successfully assigned ns/pod to node")
    pub schedule_log: Option<String>,
    /// Explicit pod name
    pub pod: Option<String>,
    /// Explicit node name
    pub node: Option<String>,
    /// Explicit job id
    pub job_id: Option<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            cluster: "k8s_xingyiAI".to_string(),
            schedule_log: None,
            pod: None,
            node: None,
            job_id: None,
        }
    }
}

impl JobConfig {
    /// Resolve the job identity
    ///
    /// Never fails: missing parts stay empty and the caller decides how to
    /// treat an incomplete identity.
    pub fn identity(&self) -> JobIdentity {
        let mut job = self
            .schedule_log
            .as_deref()
            .and_then(|line| JobIdentity::from_schedule_log(&self.cluster, line))
            .unwrap_or_else(|| JobIdentity::new(self.cluster.clone(), "", "", ""));

        if let Some(pod) = &self.pod {
            job.pod = pod.clone();
            if self.job_id.is_none() && job.job_id.is_empty() {
                job.job_id = crate::domain::job::job_id_from_pod(pod);
            }
        }
        if let Some(node) = &self.node {
            job.node = node.clone();
        }
        if let Some(job_id) = &self.job_id {
            job.job_id = job_id.clone();
        }

        job
    }
}

/// Monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// GPU memory below this (MB) counts as idle
    pub idle_threshold_mb: f64,
    /// Consecutive idle checks before the shutdown warning
    pub max_idle_count: u32,
    /// Seconds between checks
    pub check_interval_secs: u64,
    /// Credential refresh attempts per connectivity episode
    pub max_fail_count: u32,
    /// Seconds to wait after a failed credential refresh
    pub retry_backoff_secs: u64,
    /// Keep watching for idleness after the queue finishes
    pub continue_after_queue: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            idle_threshold_mb: 3.0,
            max_idle_count: 1,
            check_interval_secs: 120,
            max_fail_count: 2,
            retry_backoff_secs: 120,
            continue_after_queue: false,
        }
    }
}

impl MonitorSettings {
    /// Interval between checks
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Backoff after a failed refresh
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

/// Platform endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// GPU metric query endpoint
    pub metric_url: String,
    /// Job status endpoint; `{cluster}` and `{job_id}` are substituted
    pub status_url: String,
    /// Job stop endpoint (DELETE); `{cluster}` and `{job_id}` are substituted
    pub delete_url: String,
    /// Token endpoint
    pub auth_url: String,
    /// Origin sent with the login request
    pub origin: String,
    /// Header carrying the bearer token
    pub token_header: String,
    /// User agent for all platform requests
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Skip TLS certificate verification on metric/status queries; stop
    /// requests always verify
    pub accept_invalid_certs: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            metric_url: "https://starlight.nscc-gz.cn/api/monitor/metric".to_string(),
            status_url: "https://starlight.nscc-gz.cn/api/job/running/{cluster}/{job_id}"
                .to_string(),
            delete_url: "https://starlight.nscc-gz.cn/api/job/running/{cluster}/{job_id}"
                .to_string(),
            auth_url: "https://starlight.nscc-gz.cn/api/keystone/short_term_token/name"
                .to_string(),
            origin: "https://starlight.nscc-gz.cn".to_string(),
            token_header: "bihu-token".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36"
                .to_string(),
            request_timeout_secs: 15,
            accept_invalid_certs: false,
        }
    }
}

impl ApiConfig {
    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Login account
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Account name
    pub username: String,
    /// Plain password (base64-encoded on the wire)
    pub password: String,
}

/// Notification channel settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotifyConfig {
    pub email: EmailConfig,
    pub serverchan: ServerChanConfig,
    pub dingtalk: DingTalkConfig,
    pub console: ConsoleConfig,
}

/// SMTP email channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: String,
    /// Implicit-TLS port (465 for most providers)
    pub smtp_port: u16,
    pub sender: String,
    pub password: String,
    pub receiver: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: "smtp.qq.com".to_string(),
            smtp_port: 465,
            sender: String::new(),
            password: String::new(),
            receiver: String::new(),
        }
    }
}

/// ServerChan (WeChat push relay) channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerChanConfig {
    pub enabled: bool,
    pub send_key: String,
    /// Relay base URL; the key is appended as `/{key}.send`
    pub base_url: String,
}

impl Default for ServerChanConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            send_key: String::new(),
            base_url: "https://sctapi.ftqq.com".to_string(),
        }
    }
}

/// DingTalk robot channel
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DingTalkConfig {
    pub enabled: bool,
    pub webhook: String,
    /// Signing secret; empty disables signing
    pub secret: String,
}

/// Console channel (prints notices locally)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
}

impl Config {
    /// Validate value ranges and enabled-channel requirements
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.monitor;
        if m.check_interval_secs == 0 {
            return Err(invalid("monitor.check_interval_secs", "must be at least 1"));
        }
        if m.max_idle_count == 0 {
            return Err(invalid("monitor.max_idle_count", "must be at least 1"));
        }
        if !m.idle_threshold_mb.is_finite() || m.idle_threshold_mb < 0.0 {
            return Err(invalid(
                "monitor.idle_threshold_mb",
                "must be a non-negative number",
            ));
        }
        if m.max_fail_count == 0 {
            return Err(invalid("monitor.max_fail_count", "must be at least 1"));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(invalid("api.request_timeout_secs", "must be at least 1"));
        }

        let email = &self.notify.email;
        if email.enabled {
            require(&email.smtp_server, "notify.email.smtp_server")?;
            require(&email.sender, "notify.email.sender")?;
            require(&email.receiver, "notify.email.receiver")?;
        }
        if self.notify.serverchan.enabled {
            require(&self.notify.serverchan.send_key, "notify.serverchan.send_key")?;
        }
        if self.notify.dingtalk.enabled {
            require(&self.notify.dingtalk.webhook, "notify.dingtalk.webhook")?;
        }

        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn require(value: &str, key: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingField(key.to_string()))
    } else {
        Ok(())
    }
}
