//! ServerChan push channel

use super::{Notifier, WEBHOOK_TIMEOUT};
use crate::config::ServerChanConfig;
use crate::error::NotifyError;

use reqwest::blocking::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ServerChanResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// ServerChan notifier
///
/// Posts the title and body as a form to `{base_url}/{send_key}.send`.
pub struct ServerChanNotifier {
    http: Client,
    url: String,
}

impl ServerChanNotifier {
    /// Create a notifier from channel settings
    pub fn new(config: &ServerChanConfig) -> Result<Self, NotifyError> {
        let http = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        Ok(Self {
            http,
            url: send_url(&config.base_url, &config.send_key),
        })
    }
}

impl Notifier for ServerChanNotifier {
    fn send(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.url)
            .form(&[("title", title), ("desp", body)])
            .send()?;

        let result: ServerChanResponse = response.json()?;
        check_response(&result)
    }

    fn name(&self) -> &str {
        "serverchan"
    }
}

/// Push endpoint for a send key
pub fn send_url(base_url: &str, send_key: &str) -> String {
    format!("{}/{}.send", base_url.trim_end_matches('/'), send_key.trim())
}

fn check_response(response: &ServerChanResponse) -> Result<(), NotifyError> {
    match response.code {
        Some(0) => Ok(()),
        code => Err(NotifyError::Rejected {
            channel: "serverchan".to_string(),
            message: response
                .message
                .clone()
                .unwrap_or_else(|| format!("code {:?}", code)),
        }),
    }
}
