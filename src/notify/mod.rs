//! Notification system
//!
//! Best-effort fan-out of monitor events to email, ServerChan, DingTalk and
//! the local console.

mod dingtalk;
mod email;
mod message;
mod notifier;
mod serverchan;

pub use dingtalk::{markdown_payload, sign, signed_url, DingTalkNotifier};
pub use email::EmailNotifier;
pub use message::{Notice, NoticeKind};
pub use notifier::{ConsoleNotifier, DeliveryReport, NotificationManager, Notifier};
pub use serverchan::{send_url, ServerChanNotifier};

use crate::config::NotifyConfig;
use crate::error::NotifyError;
use std::time::Duration;

/// Request timeout for webhook channels
pub(crate) const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Channel names in registration order
pub const CHANNEL_NAMES: [&str; 4] = ["email", "serverchan", "dingtalk", "console"];

/// Build one channel by name, whether or not it is enabled
pub fn build_channel(name: &str, config: &NotifyConfig) -> Result<Box<dyn Notifier>, NotifyError> {
    match name {
        "email" => Ok(Box::new(EmailNotifier::new(&config.email)?)),
        "serverchan" => Ok(Box::new(ServerChanNotifier::new(&config.serverchan)?)),
        "dingtalk" => Ok(Box::new(DingTalkNotifier::new(&config.dingtalk)?)),
        "console" => Ok(Box::new(ConsoleNotifier::new())),
        other => Err(NotifyError::Build(format!(
            "unknown channel '{}' (expected one of: {})",
            other,
            CHANNEL_NAMES.join(", ")
        ))),
    }
}

/// Names of the channels enabled in `config`, in registration order
pub fn enabled_channels(config: &NotifyConfig) -> Vec<&'static str> {
    let flags = [
        config.email.enabled,
        config.serverchan.enabled,
        config.dingtalk.enabled,
        config.console.enabled,
    ];
    CHANNEL_NAMES
        .iter()
        .zip(flags)
        .filter(|(_, enabled)| *enabled)
        .map(|(name, _)| *name)
        .collect()
}

impl NotificationManager {
    /// Register every enabled channel
    ///
    /// A channel that cannot be built from its settings is an error here, so
    /// misconfiguration surfaces at startup rather than at the first event.
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let mut manager = Self::new();
        for name in enabled_channels(config) {
            manager.add_notifier(build_channel(name, config)?);
            log::info!("Notification channel enabled: {}", name);
        }
        if manager.notifier_count() == 0 {
            log::warn!("No notification channels enabled; events will only be logged");
        }
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_channels_by_default() {
        let config = NotifyConfig::default();
        assert!(enabled_channels(&config).is_empty());
        let manager = NotificationManager::from_config(&config).unwrap();
        assert_eq!(manager.notifier_count(), 0);
    }

    #[test]
    fn test_enabled_channels_in_order() {
        let mut config = NotifyConfig::default();
        config.console.enabled = true;
        config.serverchan.enabled = true;
        config.serverchan.send_key = "SCT1".to_string();

        assert_eq!(enabled_channels(&config), vec!["serverchan", "console"]);
        let manager = NotificationManager::from_config(&config).unwrap();
        assert_eq!(manager.channel_names(), vec!["serverchan", "console"]);
    }

    #[test]
    fn test_bad_channel_settings_fail_startup() {
        let mut config = NotifyConfig::default();
        config.dingtalk.enabled = true;
        config.dingtalk.webhook = "::not a url::".to_string();
        assert!(NotificationManager::from_config(&config).is_err());
    }

    #[test]
    fn test_unknown_channel() {
        let result = build_channel("pager", &NotifyConfig::default());
        assert!(matches!(result, Err(NotifyError::Build(_))));
    }
}
