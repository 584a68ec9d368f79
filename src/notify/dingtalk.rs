//! DingTalk robot channel
//!
//! Posts markdown messages to a robot webhook, optionally signed with the
//! robot's secret.

use super::{Notifier, WEBHOOK_TIMEOUT};
use crate::config::DingTalkConfig;
use crate::error::NotifyError;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct DingTalkResponse {
    #[serde(default)]
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: Option<String>,
}

/// DingTalk robot notifier
pub struct DingTalkNotifier {
    http: Client,
    webhook: String,
    secret: Option<String>,
}

impl DingTalkNotifier {
    /// Create a notifier from channel settings
    pub fn new(config: &DingTalkConfig) -> Result<Self, NotifyError> {
        Url::parse(&config.webhook)
            .map_err(|e| NotifyError::Build(format!("invalid DingTalk webhook: {}", e)))?;

        let http = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let secret = Some(config.secret.trim().to_string()).filter(|s| !s.is_empty());

        Ok(Self {
            http,
            webhook: config.webhook.clone(),
            secret,
        })
    }

    fn request_url(&self) -> Result<Url, NotifyError> {
        match &self.secret {
            Some(secret) => signed_url(&self.webhook, secret, chrono::Utc::now().timestamp_millis()),
            None => Url::parse(&self.webhook)
                .map_err(|e| NotifyError::Build(format!("invalid DingTalk webhook: {}", e))),
        }
    }
}

impl Notifier for DingTalkNotifier {
    fn send(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.request_url()?)
            .json(&markdown_payload(title, body))
            .send()?;

        let result: DingTalkResponse = response.json()?;
        check_response(&result)
    }

    fn name(&self) -> &str {
        "dingtalk"
    }
}

/// Signature for a request: base64(HMAC-SHA256(secret, "{timestamp}\n{secret}"))
pub fn sign(secret: &str, timestamp_ms: i64) -> Result<String, NotifyError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| NotifyError::Build(format!("invalid signing secret: {}", e)))?;
    mac.update(format!("{}\n{}", timestamp_ms, secret).as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Webhook URL extended with `timestamp` and URL-escaped `sign`
pub fn signed_url(webhook: &str, secret: &str, timestamp_ms: i64) -> Result<Url, NotifyError> {
    let mut url = Url::parse(webhook)
        .map_err(|e| NotifyError::Build(format!("invalid DingTalk webhook: {}", e)))?;
    let signature = sign(secret, timestamp_ms)?;

    url.query_pairs_mut()
        .append_pair("timestamp", &timestamp_ms.to_string())
        .append_pair("sign", &signature);

    Ok(url)
}

/// Markdown message body
pub fn markdown_payload(title: &str, body: &str) -> Value {
    json!({
        "msgtype": "markdown",
        "markdown": {
            "title": title,
            "text": format!("### {}\n\n{}", title, body),
        }
    })
}

fn check_response(response: &DingTalkResponse) -> Result<(), NotifyError> {
    if response.errcode == Some(0) {
        Ok(())
    } else {
        Err(NotifyError::Rejected {
            channel: "dingtalk".to_string(),
            message: response
                .errmsg
                .clone()
                .unwrap_or_else(|| format!("errcode {:?}", response.errcode)),
        })
    }
}
