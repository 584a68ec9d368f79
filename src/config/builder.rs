//! Configuration builder
//!
//! Merges configuration from files, CLI arguments and secret environment
//! variables.

use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;

/// Environment variable holding the platform account password
pub const PASSWORD_ENV: &str = "IDLEGUARD_PASSWORD";

/// Environment variable holding the SMTP password
pub const SMTP_PASSWORD_ENV: &str = "IDLEGUARD_SMTP_PASSWORD";

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from a file, or from the default locations
    ///
    /// An explicit path must exist; the default locations are optional.
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        let file_config = match path {
            Some(path) => Some(ConfigFile::load(path)?),
            None => ConfigFile::load_default()?,
        };

        if let Some(cfg) = file_config {
            self.config = cfg;
        }

        Ok(self)
    }

    /// Override with CLI check interval
    pub fn with_interval(mut self, interval: Option<u64>) -> Self {
        if let Some(i) = interval {
            self.config.monitor.check_interval_secs = i;
        }
        self
    }

    /// Override with CLI idle threshold
    pub fn with_idle_threshold(mut self, threshold_mb: Option<f64>) -> Self {
        if let Some(t) = threshold_mb {
            self.config.monitor.idle_threshold_mb = t;
        }
        self
    }

    /// Override with CLI max idle count
    pub fn with_max_idle(mut self, count: Option<u32>) -> Self {
        if let Some(c) = count {
            self.config.monitor.max_idle_count = c;
        }
        self
    }

    /// Override with CLI cluster name
    pub fn with_cluster(mut self, cluster: Option<String>) -> Self {
        if let Some(c) = cluster {
            self.config.job.cluster = c;
        }
        self
    }

    /// Override with CLI scheduler event line
    pub fn with_schedule_log(mut self, line: Option<String>) -> Self {
        if let Some(l) = line {
            self.config.job.schedule_log = Some(l);
        }
        self
    }

    /// Enable continuing into idle watch after the queue finishes
    pub fn with_continue_after_queue(mut self, enabled: bool) -> Self {
        if enabled {
            self.config.monitor.continue_after_queue = true;
        }
        self
    }

    /// Override the account password
    pub fn with_password(mut self, password: Option<String>) -> Self {
        if let Some(p) = password.filter(|p| !p.is_empty()) {
            self.config.auth.password = p;
        }
        self
    }

    /// Override the SMTP password
    pub fn with_smtp_password(mut self, password: Option<String>) -> Self {
        if let Some(p) = password.filter(|p| !p.is_empty()) {
            self.config.notify.email.password = p;
        }
        self
    }

    /// Apply secrets from `IDLEGUARD_PASSWORD` / `IDLEGUARD_SMTP_PASSWORD`
    pub fn with_env_secrets(self) -> Self {
        self.with_password(std::env::var(PASSWORD_ENV).ok())
            .with_smtp_password(std::env::var(SMTP_PASSWORD_ENV).ok())
    }

    /// Validate and return the final configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
