//! Test-notify command implementation
//!
//! Sends a test notice through every enabled channel, or just one, and
//! reports what each channel said.

use crate::cli::args::{OutputFormat, TestNotifyArgs};
use crate::cli::output::{print_output, DeliverySummary};
use crate::config::{ConfigBuilder, NotifyConfig};
use crate::error::{NotifyError, Result};
use crate::notify::{build_channel, enabled_channels, NotificationManager, Notice};

/// Execute the test-notify command
pub fn run_test_notify(
    args: &TestNotifyArgs,
    config_path: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let config = ConfigBuilder::new()
        .with_file(config_path)?
        .with_env_secrets()
        .build()?;

    let manager = channels(args.channel.as_deref(), &config.notify)?;
    log::info!("Testing channels: {:?}", manager.channel_names());

    let reports = manager.deliver(&Notice::test());
    let summary = DeliverySummary::from_reports(&reports);
    print_output(&summary, format)?;

    let failed = summary.channels.len() - summary.delivered();
    if failed > 0 {
        return Err(NotifyError::Transport(format!(
            "{} of {} channels failed",
            failed,
            summary.channels.len()
        ))
        .into());
    }

    Ok(())
}

fn channels(only: Option<&str>, config: &NotifyConfig) -> Result<NotificationManager> {
    let manager = match only {
        Some(name) => {
            if !enabled_channels(config).iter().any(|c| *c == name) {
                log::warn!("Channel '{}' is not enabled; testing it anyway", name);
            }
            NotificationManager::new().with_notifier(build_channel(name, config)?)
        }
        None => NotificationManager::from_config(config)?,
    };
    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_channel_even_if_disabled() {
        let config = NotifyConfig::default();
        let manager = channels(Some("console"), &config).unwrap();
        assert_eq!(manager.channel_names(), vec!["console"]);
    }

    #[test]
    fn test_all_enabled_channels() {
        let mut config = NotifyConfig::default();
        config.console.enabled = true;
        let manager = channels(None, &config).unwrap();
        assert_eq!(manager.channel_names(), vec!["console"]);
    }
}
