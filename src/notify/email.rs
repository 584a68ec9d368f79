//! Email channel over SMTP

use super::Notifier;
use crate::config::EmailConfig;
use crate::error::NotifyError;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Port that speaks TLS from the first byte; anything else upgrades with STARTTLS
const IMPLICIT_TLS_PORT: u16 = 465;

/// Email notifier
///
/// Sends plain-text mail from the configured account to a single receiver.
pub struct EmailNotifier {
    transport: SmtpTransport,
    sender: Mailbox,
    receiver: Mailbox,
}

impl EmailNotifier {
    /// Create a notifier; addresses are checked here rather than per send
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        let sender: Mailbox = config
            .sender
            .trim()
            .parse()
            .map_err(|e| NotifyError::Build(format!("invalid sender address: {}", e)))?;
        let receiver: Mailbox = config
            .receiver
            .trim()
            .parse()
            .map_err(|e| NotifyError::Build(format!("invalid receiver address: {}", e)))?;

        let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&config.smtp_server)
        } else {
            SmtpTransport::starttls_relay(&config.smtp_server)
        }
        .map_err(|e| NotifyError::Build(format!("invalid SMTP server: {}", e)))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.trim().to_string(),
                config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            transport,
            sender,
            receiver,
        })
    }

    fn build_message(&self, title: &str, body: &str) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.sender.clone())
            .to(self.receiver.clone())
            .subject(title)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Build(e.to_string()))
    }
}

impl Notifier for EmailNotifier {
    fn send(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(title, body)?;
        self.transport
            .send(&message)
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        log::debug!("Mail delivered to {}", self.receiver);
        Ok(())
    }

    fn name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            sender: "sender@example.com".to_string(),
            password: "app-password".to_string(),
            receiver: "receiver@example.com".to_string(),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_new_with_valid_addresses() {
        let notifier = EmailNotifier::new(&config()).unwrap();
        assert_eq!(notifier.name(), "email");
    }

    #[test]
    fn test_invalid_receiver_rejected_at_construction() {
        let mut config = config();
        config.receiver = "not-an-address".to_string();
        assert!(matches!(
            EmailNotifier::new(&config),
            Err(NotifyError::Build(_))
        ));
    }

    #[test]
    fn test_message_headers() {
        let notifier = EmailNotifier::new(&config()).unwrap();
        let message = notifier.build_message("Job stopped", "Job: x").unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();

        assert!(raw.contains("sender@example.com"));
        assert!(raw.contains("receiver@example.com"));
        assert!(raw.contains("Subject: Job stopped"));
        assert!(raw.contains("Job: x"));
    }

    #[test]
    fn test_starttls_port() {
        let mut config = config();
        config.smtp_port = 587;
        assert!(EmailNotifier::new(&config).is_ok());
    }
}
