//! Notification channels and fan-out
//!
//! Provides the channel trait, a console channel, and the manager that
//! dispatches a notice to every registered channel.

use super::message::Notice;
use crate::error::NotifyError;
use chrono::Local;
use std::io::{self, Write};

/// Notification channel trait
pub trait Notifier {
    /// Deliver a message; `Ok` only when the channel accepted it
    fn send(&self, title: &str, body: &str) -> Result<(), NotifyError>;

    /// Channel name for identification
    fn name(&self) -> &str;
}

/// Console notifier
///
/// Prints notices to stdout/stderr, with color when the terminal allows it
pub struct ConsoleNotifier {
    /// Use stderr instead of stdout
    use_stderr: bool,
    /// Use colors (ANSI escape codes)
    use_colors: bool,
}

impl ConsoleNotifier {
    /// Create a new console notifier
    pub fn new() -> Self {
        Self {
            use_stderr: true,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier that uses stdout
    pub fn stdout() -> Self {
        Self {
            use_stderr: false,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier without colors
    pub fn no_color() -> Self {
        Self {
            use_stderr: true,
            use_colors: false,
        }
    }

    /// Check if terminal supports colors
    fn supports_color() -> bool {
        std::env::var("TERM")
            .map(|term| term != "dumb")
            .unwrap_or(false)
    }

    /// Format a notice for the terminal
    fn format_notice(&self, title: &str, body: &str) -> String {
        let timestamp = Local::now().format("%H:%M:%S");
        let title = if self.use_colors {
            format!("\x1b[1m{}\x1b[0m", title)
        } else {
            title.to_string()
        };

        let mut out = format!("[{}] {}", timestamp, title);
        for line in body.lines() {
            out.push_str("\n    ");
            out.push_str(line);
        }
        out
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ConsoleNotifier {
    fn send(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.format_notice(title, body);

        if self.use_stderr {
            let stderr = io::stderr();
            let mut handle = stderr.lock();
            writeln!(handle, "{}", message)?;
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", message)?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Result of delivering one notice through one channel
#[derive(Debug)]
pub struct DeliveryReport {
    pub channel: String,
    pub result: Result<(), NotifyError>,
}

/// Notification manager
///
/// Holds the channels registered at startup, in order, and delivers every
/// notice to all of them. A failing channel never affects the others.
pub struct NotificationManager {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotificationManager {
    /// Create a new notification manager with no channels
    pub fn new() -> Self {
        Self {
            notifiers: Vec::new(),
        }
    }

    /// Add a notifier
    pub fn add_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Builder form of [`add_notifier`](Self::add_notifier)
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.add_notifier(notifier);
        self
    }

    /// Deliver to every channel and report each result
    pub fn deliver(&self, notice: &Notice) -> Vec<DeliveryReport> {
        self.notifiers
            .iter()
            .map(|notifier| {
                let result = notifier.send(&notice.title, &notice.body);
                match &result {
                    Ok(()) => log::info!("Sent '{}' via {}", notice.title, notifier.name()),
                    Err(e) => {
                        log::warn!("Failed to notify via {}: {}", notifier.name(), e)
                    }
                }
                DeliveryReport {
                    channel: notifier.name().to_string(),
                    result,
                }
            })
            .collect()
    }

    /// Send a notice to all channels, best-effort
    ///
    /// Never fails; returns how many channels accepted the notice.
    pub fn send_all(&self, notice: &Notice) -> usize {
        if self.notifiers.is_empty() {
            log::debug!("No notification channels configured; '{}' not sent", notice.title);
            return 0;
        }

        log::info!("Sending notification: {}", notice.title);
        self.deliver(notice)
            .iter()
            .filter(|report| report.result.is_ok())
            .count()
    }

    /// Names of the registered channels, in order
    pub fn channel_names(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Get number of registered notifiers
    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}
